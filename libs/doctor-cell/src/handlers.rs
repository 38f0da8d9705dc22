use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_database::{DocumentStore, SupabaseDocumentStore};
use shared_models::error::AppError;
use shared_models::scheduling::{Doctor, Slot};

use crate::models::{AvailableSlotsResponse, DoctorError, DoctorFacets, DoctorSearchFilters};
use crate::services::{clock_for, DoctorDirectory, SlotRepository};

const STORE_UNAVAILABLE: &str = "Doctor directory is unavailable, please try again later";

fn store_for(state: &AppConfig, token: Option<&str>) -> Arc<dyn DocumentStore> {
    Arc::new(SupabaseDocumentStore::new(state, token))
}

impl From<DoctorError> for AppError {
    fn from(error: DoctorError) -> Self {
        match error {
            DoctorError::InvalidFilter(msg) => AppError::ValidationError(msg),
            DoctorError::Store(detail) => {
                error!("Doctor store failure: {}", detail);
                AppError::ExternalService(STORE_UNAVAILABLE.to_string())
            }
        }
    }
}

/// Public doctor search.
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(filters): Query<DoctorSearchFilters>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    debug!("Searching doctors with {:?}", filters);

    let directory = DoctorDirectory::new(store_for(&state, None), state.store_timeout());
    Ok(Json(directory.list_doctors(&filters).await?))
}

pub async fn get_doctor_facets(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<DoctorFacets>, AppError> {
    let directory = DoctorDirectory::new(store_for(&state, None), state.store_timeout());
    Ok(Json(directory.facets().await?))
}

/// Candidate slots for the booking picker. A failing store yields an empty
/// list rather than an error.
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<String>,
) -> Json<AvailableSlotsResponse> {
    let repository = SlotRepository::new(store_for(&state, Some(auth.token())), state.store_timeout())
        .with_clock(clock_for(&state));
    let slots = repository.load_available_slots(&doctor_id).await;

    Json(AvailableSlotsResponse { doctor_id, slots })
}

/// A single slot with its current booking flag.
pub async fn get_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((doctor_id, slot_id)): Path<(String, String)>,
) -> Result<Json<Slot>, AppError> {
    let repository = SlotRepository::new(store_for(&state, Some(auth.token())), state.store_timeout());

    repository
        .find_slot(&doctor_id, &slot_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Slot {} not found for doctor {}", slot_id, doctor_id)))
}

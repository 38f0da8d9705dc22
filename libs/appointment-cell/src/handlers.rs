use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{DocumentStore, SupabaseDocumentStore};
use shared_models::auth::{Identity, User};
use shared_models::error::AppError;

use crate::models::{BookingConfirmation, BookingError, SubmitBookingRequest};
use crate::services::{BookingCoordinator, BookingReadModels};

fn store_for(state: &AppConfig, token: &str) -> Arc<dyn DocumentStore> {
    Arc::new(SupabaseDocumentStore::new(state, Some(token)))
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::Unavailable => AppError::Conflict(error.to_string()),
            // Store detail was logged where it happened.
            BookingError::Store(_) => AppError::ExternalService(error.to_string()),
        }
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

pub async fn submit_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<SubmitBookingRequest>,
) -> Result<(StatusCode, Json<BookingConfirmation>), AppError> {
    let identity = Identity::from(&user);
    let coordinator = BookingCoordinator::from_config(store_for(&state, auth.token()), &state);

    let confirmation = coordinator
        .submit_booking(Some(&identity), &doctor_id, &request.date, &request.time)
        .await?;

    Ok((StatusCode::CREATED, Json(confirmation)))
}

// ==============================================================================
// READ MODELS
// ==============================================================================

pub async fn get_my_bookings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let identity = Identity::from(&user);
    let read_models = BookingReadModels::new(store_for(&state, auth.token()), state.store_timeout());

    let bookings = read_models.my_bookings(Some(&identity)).await?;

    Ok(Json(json!({
        "user_id": identity.uid,
        "bookings": bookings,
        "total": bookings.len()
    })))
}

/// Only the doctor themselves or an admin may list a doctor's bookings.
pub async fn get_doctor_bookings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let is_own_bookings = user.id == doctor_id && user.has_role("doctor");
    if !is_own_bookings && !user.has_role("admin") {
        debug!("User {} refused bookings of doctor {}", user.id, doctor_id);
        return Err(AppError::Forbidden("Not authorized to view bookings for this doctor".to_string()));
    }

    let read_models = BookingReadModels::new(store_for(&state, auth.token()), state.store_timeout());
    let bookings = read_models.doctor_bookings(&doctor_id).await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "bookings": bookings,
        "total": bookings.len()
    })))
}

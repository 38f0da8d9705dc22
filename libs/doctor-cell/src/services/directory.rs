use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use shared_database::DocumentStore;
use shared_models::scheduling::Doctor;

use crate::models::{DoctorError, DoctorFacets, DoctorSearchFilters};

pub struct DoctorDirectory {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl DoctorDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn all_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        timeout(self.timeout, self.store.list_doctors())
            .await
            .map_err(|_| DoctorError::Store(format!("listing doctors timed out after {:?}", self.timeout)))?
            .map_err(|e| DoctorError::Store(e.to_string()))
    }

    pub async fn list_doctors(&self, filters: &DoctorSearchFilters) -> Result<Vec<Doctor>, DoctorError> {
        if let Some(min_rating) = filters.min_rating {
            if !(0.0..=5.0).contains(&min_rating) {
                return Err(DoctorError::InvalidFilter(format!(
                    "min_rating must be between 0 and 5, got {}",
                    min_rating
                )));
            }
        }

        let doctors = self.all_doctors().await?;
        let total = doctors.len();
        let matched = apply_filters(doctors, filters);
        debug!("Doctor search matched {} of {}", matched.len(), total);

        Ok(matched)
    }

    pub async fn facets(&self) -> Result<DoctorFacets, DoctorError> {
        Ok(collect_facets(&self.all_doctors().await?))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn apply_filters(doctors: Vec<Doctor>, filters: &DoctorSearchFilters) -> Vec<Doctor> {
    let specialty = non_empty(&filters.specialty);
    let governorate = non_empty(&filters.governorate);
    let search = non_empty(&filters.search).map(str::to_lowercase);

    doctors
        .into_iter()
        .filter(|doctor| specialty.map_or(true, |s| doctor.specialty == s))
        .filter(|doctor| governorate.map_or(true, |g| doctor.governorate == g))
        .filter(|doctor| filters.min_rating.map_or(true, |r| doctor.review >= r))
        .filter(|doctor| filters.price.map_or(true, |band| band.contains(doctor.price)))
        .filter(|doctor| {
            search.as_deref().map_or(true, |needle| {
                [&doctor.name, &doctor.specialty, &doctor.governorate]
                    .iter()
                    .any(|field| field.to_lowercase().contains(needle))
            })
        })
        .collect()
}

/// Distinct non-empty specialties and governorates, first-seen order.
pub fn collect_facets(doctors: &[Doctor]) -> DoctorFacets {
    let mut facets = DoctorFacets::default();

    for doctor in doctors {
        if !doctor.specialty.is_empty() && !facets.specialties.contains(&doctor.specialty) {
            facets.specialties.push(doctor.specialty.clone());
        }
        if !doctor.governorate.is_empty() && !facets.governorates.contains(&doctor.governorate) {
            facets.governorates.push(doctor.governorate.clone());
        }
    }

    facets
}

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error};

use shared_database::DocumentStore;
use shared_models::auth::Identity;
use shared_models::scheduling::BookingRecord;

use crate::models::BookingError;

/// Read-only projections over the booking records.
pub struct BookingReadModels {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl BookingReadModels {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Bookings made by the signed-in patient, newest first.
    pub async fn my_bookings(&self, identity: Option<&Identity>) -> Result<Vec<BookingRecord>, BookingError> {
        let identity = identity
            .filter(|identity| !identity.uid.trim().is_empty())
            .ok_or_else(|| BookingError::Validation("Please sign in to view your bookings".to_string()))?;

        debug!("Loading bookings of patient {}", identity.uid);

        let mut bookings = self
            .run("patient bookings", self.store.query_bookings_by_patient(&identity.uid))
            .await?;
        newest_first(&mut bookings);
        Ok(bookings)
    }

    /// Bookings held with one doctor, newest first.
    pub async fn doctor_bookings(&self, doctor_id: &str) -> Result<Vec<BookingRecord>, BookingError> {
        if doctor_id.trim().is_empty() {
            return Err(BookingError::Validation("Doctor id is required".to_string()));
        }

        debug!("Loading bookings of doctor {}", doctor_id);

        let mut bookings = self
            .run("doctor bookings", self.store.list_doctor_bookings(doctor_id))
            .await?;
        newest_first(&mut bookings);
        Ok(bookings)
    }

    async fn run<F>(&self, what: &str, query: F) -> Result<Vec<BookingRecord>, BookingError>
    where
        F: std::future::Future<Output = anyhow::Result<Vec<BookingRecord>>>,
    {
        match timeout(self.timeout, query).await {
            Ok(Ok(bookings)) => Ok(bookings),
            Ok(Err(e)) => {
                error!("Failed to load {}: {}", what, e);
                Err(BookingError::Store(e.to_string()))
            }
            Err(_) => {
                error!("Loading {} timed out after {:?}", what, self.timeout);
                Err(BookingError::Store(format!("timed out after {:?}", self.timeout)))
            }
        }
    }
}

// Stores are not required to order results.
fn newest_first(bookings: &mut [BookingRecord]) {
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Local, NaiveDateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_database::DocumentStore;
use shared_models::scheduling::Slot;

use crate::models::DoctorError;

/// Source of "now" for the past-slot cutoff, in clinic local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Server local time. Only correct when the server runs in the clinic's zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Wall-clock time at a fixed UTC offset, independent of the server zone.
pub struct ClinicClock(pub FixedOffset);

impl Clock for ClinicClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.0).naive_local()
    }
}

pub fn clock_for(config: &AppConfig) -> Arc<dyn Clock> {
    match config.clinic_offset() {
        Some(offset) => Arc::new(ClinicClock(offset)),
        None => Arc::new(SystemClock),
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Read path over a doctor's slot collection: produces the candidate list
/// a patient may pick from.
pub struct SlotRepository {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SlotRepository {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            timeout,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Unbooked, not-yet-started slots. Store failures are logged and
    /// produce an empty list.
    pub async fn load_available_slots(&self, doctor_id: &str) -> Vec<Slot> {
        match self.fetch_available_slots(doctor_id).await {
            Ok(slots) => slots,
            Err(e) => {
                error!("Failed to load slots for doctor {}: {}", doctor_id, e);
                Vec::new()
            }
        }
    }

    pub async fn fetch_available_slots(&self, doctor_id: &str) -> Result<Vec<Slot>, DoctorError> {
        let slots = timeout(self.timeout, self.store.list_slots(doctor_id))
            .await
            .map_err(|_| DoctorError::Store(format!("listing slots timed out after {:?}", self.timeout)))?
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        let total = slots.len();
        let available = filter_available_slots(slots, self.clock.now());
        debug!("Doctor {}: {} of {} slots available", doctor_id, available.len(), total);

        Ok(available)
    }

    /// One slot by id, booked or not. Lets a client re-check a candidate
    /// before submitting it.
    pub async fn find_slot(&self, doctor_id: &str, slot_id: &str) -> Result<Option<Slot>, DoctorError> {
        timeout(self.timeout, self.store.get_slot(doctor_id, slot_id))
            .await
            .map_err(|_| DoctorError::Store(format!("reading slot timed out after {:?}", self.timeout)))?
            .map_err(|e| DoctorError::Store(e.to_string()))
    }
}

/// Drops booked slots and slots whose start (date and time) is before
/// `now`, then orders chronologically. Equal start times keep storage order.
pub fn filter_available_slots(slots: Vec<Slot>, now: NaiveDateTime) -> Vec<Slot> {
    let mut available: Vec<Slot> = slots
        .into_iter()
        .filter(|slot| !slot.is_booked && slot.starts_at() >= now)
        .collect();

    available.sort_by_key(Slot::starts_at);
    available
}

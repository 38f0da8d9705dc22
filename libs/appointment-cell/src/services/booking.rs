use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use shared_config::{AppConfig, ClaimProtocol};
use shared_database::DocumentStore;
use shared_models::auth::Identity;
use shared_models::scheduling::{NewBookingRecord, Slot};

use crate::models::{BookingConfirmation, BookingError, BookingSelection};

/// Turns a slot selection into one booked slot plus one booking record.
///
/// The candidate list a patient picked from may be stale, so every claim
/// re-reads the doctor's slots before writing. With
/// [`ClaimProtocol::Conditional`] the slot flip is a compare-and-set and a
/// lost race is reported as [`BookingError::Unavailable`].
/// [`ClaimProtocol::Legacy`] flips the flag unconditionally: two claims that
/// both pass the re-read before either writes will both succeed.
///
/// The deadline covers the re-read and the flag flip only. Once the flip has
/// landed the record insert runs to completion. The two are separate writes:
/// if the insert fails the slot stays booked without a record; this is
/// logged, not undone.
pub struct BookingCoordinator {
    store: Arc<dyn DocumentStore>,
    protocol: ClaimProtocol,
    timeout: Duration,
}

impl BookingCoordinator {
    pub fn new(store: Arc<dyn DocumentStore>, protocol: ClaimProtocol, timeout: Duration) -> Self {
        Self {
            store,
            protocol,
            timeout,
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self::new(store, config.claim_protocol, config.store_timeout())
    }

    pub fn protocol(&self) -> ClaimProtocol {
        self.protocol
    }

    /// Entry point for raw form input (`YYYY-MM-DD`, `HH:MM`).
    pub async fn submit_booking(
        &self,
        identity: Option<&Identity>,
        doctor_id: &str,
        date: &str,
        time: &str,
    ) -> Result<BookingConfirmation, BookingError> {
        let selection = BookingSelection::parse(date, time)?;
        self.submit(identity, doctor_id, selection).await
    }

    pub async fn submit(
        &self,
        identity: Option<&Identity>,
        doctor_id: &str,
        selection: BookingSelection,
    ) -> Result<BookingConfirmation, BookingError> {
        let (identity, date, time) = check_preconditions(identity, selection)?;

        info!(
            "Claiming {} {} with doctor {} for {} ({} protocol)",
            date, time, doctor_id, identity.uid, self.protocol
        );

        let slot = match timeout(self.timeout, self.reserve(doctor_id, date, time)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Claim of {} {} with doctor {} timed out after {:?}",
                    date, time, doctor_id, self.timeout
                );
                return Err(BookingError::Store(format!("timed out after {:?}", self.timeout)));
            }
        };

        // The slot is ours from here on; the insert is never cancelled.
        self.record_booking(identity, doctor_id, slot, date, time).await
    }

    /// Re-read and flag write. Runs under the coordinator deadline.
    async fn reserve(&self, doctor_id: &str, date: NaiveDate, time: NaiveTime) -> Result<Slot, BookingError> {
        let slots = self
            .store
            .list_slots(doctor_id)
            .await
            .map_err(|e| store_failure("re-reading slots", doctor_id, e))?;

        let slot = match self.locate(&slots, date, time) {
            Some(slot) => slot.clone(),
            None => {
                debug!("No claimable slot {} {} among {} for doctor {}", date, time, slots.len(), doctor_id);
                return Err(BookingError::Unavailable);
            }
        };

        match self.protocol {
            ClaimProtocol::Conditional => {
                let claimed = self
                    .store
                    .claim_slot(doctor_id, &slot.id)
                    .await
                    .map_err(|e| store_failure("claiming slot", doctor_id, e))?;

                if !claimed {
                    warn!("Slot {} of doctor {} was booked by someone else first", slot.id, doctor_id);
                    return Err(BookingError::Unavailable);
                }
            }
            ClaimProtocol::Legacy => {
                self.store
                    .set_slot_booked(doctor_id, &slot.id)
                    .await
                    .map_err(|e| store_failure("marking slot booked", doctor_id, e))?;
            }
        }

        Ok(slot)
    }

    async fn record_booking(
        &self,
        identity: &Identity,
        doctor_id: &str,
        slot: Slot,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<BookingConfirmation, BookingError> {
        let record = NewBookingRecord {
            doctor_id: doctor_id.to_string(),
            user_id: identity.uid.clone(),
            date,
            time,
            patient_name: identity.display_name.clone(),
            patient_email: identity.email.clone(),
            created_at: Utc::now(),
        };

        let booking = self.store.create_booking_record(record).await.map_err(|e| {
            error!(
                "Slot {} of doctor {} is booked but has no booking record for {}",
                slot.id, doctor_id, identity.uid
            );
            store_failure("creating booking record", doctor_id, e)
        })?;

        info!("Booked slot {} of doctor {} as {}", slot.id, doctor_id, booking.id);

        Ok(BookingConfirmation {
            slot_id: slot.id,
            protocol: self.protocol,
            booking,
        })
    }

    fn locate<'a>(&self, slots: &'a [Slot], date: NaiveDate, time: NaiveTime) -> Option<&'a Slot> {
        match self.protocol {
            // The legacy lookup ignores `is_booked`.
            ClaimProtocol::Legacy => slots.iter().find(|slot| slot.matches(date, time)),
            ClaimProtocol::Conditional => slots
                .iter()
                .find(|slot| slot.matches(date, time) && !slot.is_booked),
        }
    }
}

/// Local checks only; nothing here touches the store.
pub fn check_preconditions(
    identity: Option<&Identity>,
    selection: BookingSelection,
) -> Result<(&Identity, NaiveDate, NaiveTime), BookingError> {
    let (date, time) = match (selection.date, selection.time) {
        (Some(date), Some(time)) => (date, time),
        _ => {
            return Err(BookingError::Validation(
                "Please choose an appointment date and time".to_string(),
            ))
        }
    };

    let identity = identity
        .filter(|identity| !identity.uid.trim().is_empty())
        .ok_or_else(|| BookingError::Validation("Please sign in to book an appointment".to_string()))?;

    Ok((identity, date, time))
}

fn store_failure(step: &str, doctor_id: &str, error: anyhow::Error) -> BookingError {
    error!("Store failure while {} for doctor {}: {}", step, doctor_id, error);
    BookingError::Store(error.to_string())
}

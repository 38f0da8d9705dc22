use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{Barrier, Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use shared_models::scheduling::{BookingRecord, Doctor, NewBookingRecord, Slot};

use crate::store::DocumentStore;

/// One store operation as seen by the in-memory store, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListSlots { doctor_id: String },
    GetSlot { doctor_id: String, slot_id: String },
    SetSlotBooked { doctor_id: String, slot_id: String },
    ClaimSlot { doctor_id: String, slot_id: String },
    CreateBookingRecord { doctor_id: String, user_id: String },
    QueryBookingsByPatient { patient_id: String },
    ListDoctorBookings { doctor_id: String },
    ListDoctors,
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StoreCall::SetSlotBooked { .. }
                | StoreCall::ClaimSlot { .. }
                | StoreCall::CreateBookingRecord { .. }
        )
    }
}

#[derive(Default)]
struct StoreState {
    // Vec keeps storage order per doctor.
    slots: HashMap<String, Vec<Slot>>,
    bookings: Vec<BookingRecord>,
    doctors: Vec<Doctor>,
}

struct ListGate {
    barrier: Arc<Barrier>,
    remaining: usize,
}

/// Process-local `DocumentStore`. Journals every call and can inject
/// failures, which makes the booking protocol observable in tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<StoreState>,
    calls: Mutex<Vec<StoreCall>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_record_writes: AtomicBool,
    list_gate: Mutex<Option<ListGate>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctor(mut self, doctor: Doctor) -> Self {
        self.state.get_mut().doctors.push(doctor);
        self
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.state
            .get_mut()
            .slots
            .entry(slot.doctor_id.clone())
            .or_default()
            .push(slot);
        self
    }

    pub fn with_booking(mut self, booking: BookingRecord) -> Self {
        self.state.get_mut().bookings.push(booking);
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail only booking-record inserts; slot writes still succeed.
    pub fn set_fail_record_writes(&self, fail: bool) {
        self.fail_record_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold the next `parties` calls to `list_slots` until all of them have
    /// read their snapshot. Lets concurrent claims observe the same state.
    pub async fn gate_list_slots(&self, parties: usize) {
        let mut gate = self.list_gate.lock().await;
        *gate = if parties == 0 {
            None
        } else {
            Some(ListGate {
                barrier: Arc::new(Barrier::new(parties)),
                remaining: parties,
            })
        };
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub async fn write_calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    pub async fn bookings(&self) -> Vec<BookingRecord> {
        self.state.read().await.bookings.clone()
    }

    pub async fn slot(&self, doctor_id: &str, slot_id: &str) -> Option<Slot> {
        self.state
            .read()
            .await
            .slots
            .get(doctor_id)
            .and_then(|slots| slots.iter().find(|slot| slot.id == slot_id))
            .cloned()
    }

    async fn record(&self, call: StoreCall) {
        self.calls.lock().await.push(call);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("API error (503): store unavailable"));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("Authentication error: permission denied"));
        }
        Ok(())
    }

    async fn pass_list_gate(&self) {
        let barrier = {
            let mut gate = self.list_gate.lock().await;
            let entry = gate.as_mut().map(|g| {
                g.remaining -= 1;
                (Arc::clone(&g.barrier), g.remaining)
            });
            match entry {
                Some((barrier, 0)) => {
                    *gate = None;
                    Some(barrier)
                }
                Some((barrier, _)) => Some(barrier),
                None => None,
            }
        };

        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_slots(&self, doctor_id: &str) -> Result<Vec<Slot>> {
        self.record(StoreCall::ListSlots { doctor_id: doctor_id.to_string() }).await;
        self.check_reads()?;

        let snapshot = self
            .state
            .read()
            .await
            .slots
            .get(doctor_id)
            .cloned()
            .unwrap_or_default();

        self.pass_list_gate().await;
        Ok(snapshot)
    }

    async fn get_slot(&self, doctor_id: &str, slot_id: &str) -> Result<Option<Slot>> {
        self.record(StoreCall::GetSlot {
            doctor_id: doctor_id.to_string(),
            slot_id: slot_id.to_string(),
        })
        .await;
        self.check_reads()?;

        Ok(self.slot(doctor_id, slot_id).await)
    }

    async fn set_slot_booked(&self, doctor_id: &str, slot_id: &str) -> Result<()> {
        self.record(StoreCall::SetSlotBooked {
            doctor_id: doctor_id.to_string(),
            slot_id: slot_id.to_string(),
        })
        .await;
        self.check_writes()?;

        let mut state = self.state.write().await;
        let slot = state
            .slots
            .get_mut(doctor_id)
            .and_then(|slots| slots.iter_mut().find(|slot| slot.id == slot_id))
            .ok_or_else(|| anyhow!("Resource not found: slot {} of doctor {}", slot_id, doctor_id))?;

        slot.is_booked = true;
        Ok(())
    }

    async fn claim_slot(&self, doctor_id: &str, slot_id: &str) -> Result<bool> {
        self.record(StoreCall::ClaimSlot {
            doctor_id: doctor_id.to_string(),
            slot_id: slot_id.to_string(),
        })
        .await;
        self.check_writes()?;

        // Check and set under one write lock.
        let mut state = self.state.write().await;
        let slot = state
            .slots
            .get_mut(doctor_id)
            .and_then(|slots| slots.iter_mut().find(|slot| slot.id == slot_id));

        match slot {
            Some(slot) if !slot.is_booked => {
                slot.is_booked = true;
                Ok(true)
            }
            _ => {
                debug!("Conditional claim of slot {} rejected", slot_id);
                Ok(false)
            }
        }
    }

    async fn create_booking_record(&self, record: NewBookingRecord) -> Result<BookingRecord> {
        self.record(StoreCall::CreateBookingRecord {
            doctor_id: record.doctor_id.clone(),
            user_id: record.user_id.clone(),
        })
        .await;
        self.check_writes()?;
        if self.fail_record_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("API error (500): insert into patient_bookings failed"));
        }

        let booking = record.into_record(Uuid::new_v4().to_string());
        self.state.write().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn query_bookings_by_patient(&self, patient_id: &str) -> Result<Vec<BookingRecord>> {
        self.record(StoreCall::QueryBookingsByPatient { patient_id: patient_id.to_string() })
            .await;
        self.check_reads()?;

        let mut bookings: Vec<BookingRecord> = self
            .state
            .read()
            .await
            .bookings
            .iter()
            .filter(|booking| booking.user_id == patient_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_doctor_bookings(&self, doctor_id: &str) -> Result<Vec<BookingRecord>> {
        self.record(StoreCall::ListDoctorBookings { doctor_id: doctor_id.to_string() })
            .await;
        self.check_reads()?;

        let mut bookings: Vec<BookingRecord> = self
            .state
            .read()
            .await
            .bookings
            .iter()
            .filter(|booking| booking.doctor_id == doctor_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>> {
        self.record(StoreCall::ListDoctors).await;
        self.check_reads()?;

        Ok(self.state.read().await.doctors.clone())
    }
}

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, warn};
use urlencoding::encode;

use shared_config::AppConfig;
use shared_models::scheduling::{BookingRecord, Doctor, NewBookingRecord, Slot};

use crate::supabase::{representation_headers, SupabaseClient};

const SLOTS_PATH: &str = "/rest/v1/doctor_slots";
const BOOKINGS_PATH: &str = "/rest/v1/patient_bookings";
const DOCTORS_PATH: &str = "/rest/v1/doctors";

/// Logical operations of the remote document store. There are no
/// cross-document transactions; `claim_slot` is the only conditional write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All slots of one doctor, in storage order.
    async fn list_slots(&self, doctor_id: &str) -> Result<Vec<Slot>>;

    /// One slot by id; backs the slot detail lookup.
    async fn get_slot(&self, doctor_id: &str, slot_id: &str) -> Result<Option<Slot>>;

    /// Unconditional `is_booked = true`.
    async fn set_slot_booked(&self, doctor_id: &str, slot_id: &str) -> Result<()>;

    /// Compare-and-set `is_booked: false -> true`. Returns `false` when the
    /// slot is missing or already booked; nothing is written in that case.
    async fn claim_slot(&self, doctor_id: &str, slot_id: &str) -> Result<bool>;

    /// Append-only insert into the doctor's booking sub-collection.
    async fn create_booking_record(&self, record: NewBookingRecord) -> Result<BookingRecord>;

    /// Cross-doctor aggregation of one patient's bookings.
    async fn query_bookings_by_patient(&self, patient_id: &str) -> Result<Vec<BookingRecord>>;

    async fn list_doctor_bookings(&self, doctor_id: &str) -> Result<Vec<BookingRecord>>;

    async fn list_doctors(&self) -> Result<Vec<Doctor>>;
}

/// PostgREST-backed store. Row level security applies through the caller's
/// bearer token, so one instance is built per authenticated request.
pub struct SupabaseDocumentStore {
    supabase: SupabaseClient,
    auth_token: Option<String>,
}

impl SupabaseDocumentStore {
    pub fn new(config: &AppConfig, auth_token: Option<&str>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            auth_token: auth_token.map(str::to_string),
        }
    }

    fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    fn slot_path(doctor_id: &str, slot_id: &str) -> String {
        format!(
            "{}?doctor_id=eq.{}&id=eq.{}",
            SLOTS_PATH,
            encode(doctor_id),
            encode(slot_id)
        )
    }

    async fn patch_slot(&self, path: &str) -> Result<Vec<Slot>> {
        self.supabase
            .request_with_headers(
                Method::PATCH,
                path,
                self.token(),
                Some(json!({ "is_booked": true })),
                Some(representation_headers()),
            )
            .await
    }
}

#[async_trait]
impl DocumentStore for SupabaseDocumentStore {
    async fn list_slots(&self, doctor_id: &str) -> Result<Vec<Slot>> {
        debug!("Listing slots for doctor {}", doctor_id);

        let path = format!("{}?doctor_id=eq.{}&select=*", SLOTS_PATH, encode(doctor_id));
        self.supabase.request(Method::GET, &path, self.token(), None).await
    }

    async fn get_slot(&self, doctor_id: &str, slot_id: &str) -> Result<Option<Slot>> {
        let path = Self::slot_path(doctor_id, slot_id);
        let mut rows: Vec<Slot> = self.supabase.request(Method::GET, &path, self.token(), None).await?;

        if rows.len() > 1 {
            warn!("Slot {} of doctor {} is not unique ({} rows)", slot_id, doctor_id, rows.len());
        }

        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn set_slot_booked(&self, doctor_id: &str, slot_id: &str) -> Result<()> {
        debug!("Marking slot {} of doctor {} as booked", slot_id, doctor_id);

        let updated = self.patch_slot(&Self::slot_path(doctor_id, slot_id)).await?;
        if updated.is_empty() {
            return Err(anyhow!("Slot {} of doctor {} not found", slot_id, doctor_id));
        }

        Ok(())
    }

    async fn claim_slot(&self, doctor_id: &str, slot_id: &str) -> Result<bool> {
        debug!("Conditionally claiming slot {} of doctor {}", slot_id, doctor_id);

        let path = format!("{}&is_booked=eq.false", Self::slot_path(doctor_id, slot_id));
        let updated = self.patch_slot(&path).await?;

        Ok(!updated.is_empty())
    }

    async fn create_booking_record(&self, record: NewBookingRecord) -> Result<BookingRecord> {
        debug!("Creating booking record for doctor {} / user {}", record.doctor_id, record.user_id);

        let mut created: Vec<BookingRecord> = self
            .supabase
            .request_with_headers(
                Method::POST,
                BOOKINGS_PATH,
                self.token(),
                Some(serde_json::to_value(&record)?),
                Some(representation_headers()),
            )
            .await?;

        if created.is_empty() {
            return Err(anyhow!("Failed to create booking record"));
        }

        Ok(created.swap_remove(0))
    }

    async fn query_bookings_by_patient(&self, patient_id: &str) -> Result<Vec<BookingRecord>> {
        let path = format!(
            "{}?user_id=eq.{}&order=created_at.desc",
            BOOKINGS_PATH,
            encode(patient_id)
        );
        self.supabase.request(Method::GET, &path, self.token(), None).await
    }

    async fn list_doctor_bookings(&self, doctor_id: &str) -> Result<Vec<BookingRecord>> {
        let path = format!(
            "{}?doctor_id=eq.{}&order=created_at.desc",
            BOOKINGS_PATH,
            encode(doctor_id)
        );
        self.supabase.request(Method::GET, &path, self.token(), None).await
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>> {
        let path = format!("{}?select=*", DOCTORS_PATH);
        self.supabase.request(Method::GET, &path, self.token(), None).await
    }
}

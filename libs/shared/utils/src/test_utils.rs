use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, ClaimProtocol};
use shared_models::auth::{Identity, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub claim_protocol: ClaimProtocol,
    pub store_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            claim_protocol: ClaimProtocol::Conditional,
            store_timeout_secs: 5,
        }
    }
}

impl TestConfig {
    /// Point the store at a mock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            store_timeout_secs: self.store_timeout_secs,
            claim_protocol: self.claim_protocol,
            clinic_utc_offset_minutes: None,
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub full_name: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "patient")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
            full_name: "Test User".to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: Some(json!({ "full_name": self.full_name })),
            created_at: Some(Utc::now()),
        }
    }

    pub fn to_identity(&self) -> Identity {
        Identity::from(&self.to_user())
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "user_metadata": { "full_name": user.full_name },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }
}

/// PostgREST row shapes for wiremock responses.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn slot_response(id: &str, doctor_id: &str, date: &str, start_time: &str, is_booked: bool) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "date": date,
            "start_time": format!("{}:00", start_time),
            "end_time": "23:59:00",
            "is_booked": is_booked
        })
    }

    pub fn booking_response(doctor_id: &str, user_id: &str, date: &str, time: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "doctor_id": doctor_id,
            "user_id": user_id,
            "date": date,
            "time": format!("{}:00", time),
            "patient_name": "Test User",
            "patient_email": "test@example.com",
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn doctor_response(id: &str, name: &str, specialty: &str, governorate: &str, price: f64, review: f64) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "specialty": specialty,
            "governorate": governorate,
            "price": price,
            "review": review
        })
    }
}

use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/appointments", appointment_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use shared_config::{AppConfig, ClaimProtocol};
    use tower::ServiceExt;

    fn state() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            supabase_url: "http://127.0.0.1:9".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            store_timeout_secs: 1,
            claim_protocol: ClaimProtocol::Conditional,
            clinic_utc_offset_minutes: None,
            port: 0,
        })
    }

    #[tokio::test]
    async fn liveness_route_responds() {
        let response = create_router(state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cells_are_nested_behind_auth() {
        for uri in ["/appointments/mine", "/doctors/doc-1/slots", "/auth/me"] {
            let response = create_router(state())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn booking_post(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_booking_requires_authentication() {
    let mock_server = MockServer::start().await;
    let app = appointment_routes(TestConfig::with_supabase_url(&mock_server.uri()).to_arc());

    let request = booking_post("/doctors/doc-1", None, json!({ "date": "2099-01-01", "time": "10:00" }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_with_expired_token_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let app = appointment_routes(config.to_arc());
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);

    let request = booking_post("/doctors/doc-1", Some(&token), json!({ "date": "2099-01-01", "time": "10:00" }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_booking_without_selection_is_bad_request() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let app = appointment_routes(config.to_arc());
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);

    let request = booking_post("/doctors/doc-1", Some(&token), json!({}));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json_response["error"].is_string());
}

#[tokio::test]
async fn test_booking_end_to_end_returns_created() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response("s1", "doc-1", "2099-01-01", "10:00", false),
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response("s1", "doc-1", "2099-01-01", "10:00", true),
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patient_bookings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::booking_response("doc-1", &user.id, "2099-01-01", "10:00"),
        ])))
        .mount(&mock_server)
        .await;

    let app = appointment_routes(config.to_arc());
    let request = booking_post("/doctors/doc-1", Some(&token), json!({ "date": "2099-01-01", "time": "10:00" }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["slot_id"], "s1");
    assert_eq!(json_response["protocol"], "conditional");
    assert_eq!(json_response["booking"]["time"], "10:00");
}

#[tokio::test]
async fn test_taken_slot_is_conflict() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response("s1", "doc-1", "2099-01-01", "10:00", true),
        ])))
        .mount(&mock_server)
        .await;

    let app = appointment_routes(config.to_arc());
    let request = booking_post("/doctors/doc-1", Some(&token), json!({ "date": "2099-01-01", "time": "10:00" }));

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::router::doctor_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn mock_store() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response("d1", "Ahmed Salem", "Cardiology", "Cairo", 250.0, 4.5),
            MockSupabaseResponses::doctor_response("d2", "Sara Nabil", "Dermatology", "Giza", 80.0, 3.9),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response("s1", "d1", "2099-01-01", "10:00", false),
        ])))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_search_endpoint_with_query_string() {
    let mock_server = mock_store().await;
    let app = doctor_routes(TestConfig::with_supabase_url(&mock_server.uri()).to_arc());

    let request = Request::builder()
        .uri("/?search=giza&price=under_100")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doctors: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(doctors.as_array().unwrap().len(), 1);
    assert_eq!(doctors[0]["id"], "d2");
}

#[tokio::test]
async fn test_unknown_price_band_is_rejected() {
    let mock_server = mock_store().await;
    let app = doctor_routes(TestConfig::with_supabase_url(&mock_server.uri()).to_arc());

    let request = Request::builder()
        .uri("/?price=cheap")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_slots_require_authentication() {
    let mock_server = mock_store().await;
    let app = doctor_routes(TestConfig::with_supabase_url(&mock_server.uri()).to_arc());

    let request = Request::builder()
        .uri("/d1/slots")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_slots_with_valid_token() {
    let mock_server = mock_store().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let app = doctor_routes(config.to_arc());
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);

    let request = Request::builder()
        .uri("/d1/slots")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json_response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json_response["doctor_id"], "d1");
    assert_eq!(json_response["slots"][0]["id"], "s1");
    assert_eq!(json_response["slots"][0]["start_time"], "10:00");
}

#[tokio::test]
async fn test_slot_detail_requires_authentication() {
    let mock_server = mock_store().await;
    let app = doctor_routes(TestConfig::with_supabase_url(&mock_server.uri()).to_arc());

    let request = Request::builder()
        .uri("/d1/slots/s1")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::router::booking_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn create_test_app(config: AppConfig) -> Router {
    booking_routes(Arc::new(config))
}

fn config_for(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    config
}

fn patch_status(token: &str, appointment_id: Uuid, status: &str) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(format!("/{}/status", appointment_id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": status }).to_string()))
        .unwrap()
}

async fn mock_get_appointment(mock_server: &MockServer, appointment_id: Uuid, user_id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row_with_id(appointment_id, user_id, status)
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_operator_confirms_pending_appointment() {
    let mock_server = MockServer::start().await;
    let operator = TestUser::operator("operator@example.com");
    let customer_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4();

    let config = config_for(&mock_server);
    let token = JwtTestUtils::create_test_token(&operator, &config.supabase_jwt_secret, Some(24));
    let app = create_test_app(config).await;

    mock_get_appointment(&mock_server, appointment_id, &customer_id, "pending").await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row_with_id(appointment_id, &customer_id, "confirmed")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(patch_status(&token, appointment_id, "confirmed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["persisted"], json!(true));
    assert_eq!(body["warning"], json!(null));
    assert_eq!(body["appointment"]["status"], json!("confirmed"));
}

#[tokio::test]
async fn test_non_operator_cannot_change_status() {
    let mock_server = MockServer::start().await;
    let customer = TestUser::customer("customer@example.com");
    let appointment_id = Uuid::new_v4();

    let config = config_for(&mock_server);
    let token = JwtTestUtils::create_test_token(&customer, &config.supabase_jwt_secret, Some(24));
    let app = create_test_app(config).await;

    // Authorization is decided before any backend traffic
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(patch_status(&token, appointment_id, "confirmed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_failed_persistence_keeps_local_update_with_warning() {
    let mock_server = MockServer::start().await;
    let operator = TestUser::operator("operator@example.com");
    let customer_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4();

    let config = config_for(&mock_server);
    let token = JwtTestUtils::create_test_token(&operator, &config.supabase_jwt_secret, Some(24));
    let app = create_test_app(config).await;

    mock_get_appointment(&mock_server, appointment_id, &customer_id, "pending").await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(patch_status(&token, appointment_id, "confirmed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    // Local view shows the new status, but the caller is told it never synced
    assert_eq!(body["appointment"]["status"], json!("confirmed"));
    assert_eq!(body["persisted"], json!(false));
    assert!(body["warning"].as_str().unwrap().contains("will not persist"));
}

#[tokio::test]
async fn test_invalid_transition_rejected() {
    let mock_server = MockServer::start().await;
    let operator = TestUser::operator("operator@example.com");
    let customer_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4();

    let config = config_for(&mock_server);
    let token = JwtTestUtils::create_test_token(&operator, &config.supabase_jwt_secret, Some(24));
    let app = create_test_app(config).await;

    mock_get_appointment(&mock_server, appointment_id, &customer_id, "completed").await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(patch_status(&token, appointment_id, "confirmed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_operator_sees_all_appointments_with_classification() {
    let mock_server = MockServer::start().await;
    let operator = TestUser::operator("operator@example.com");
    let customer_id = Uuid::new_v4().to_string();

    let config = config_for(&mock_server);
    let token = JwtTestUtils::create_test_token(&operator, &config.supabase_jwt_secret, Some(24));
    let app = create_test_app(config).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(&customer_id, "pending"),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/all?status=pending,confirmed")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let rows = body["appointments"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    // "accident" in the message text maps to the collision category
    assert_eq!(rows[0]["service_type"], json!("collision"));
}

#[tokio::test]
async fn test_customer_cannot_list_all_appointments() {
    let mock_server = MockServer::start().await;
    let customer = TestUser::customer("customer@example.com");

    let config = config_for(&mock_server);
    let token = JwtTestUtils::create_test_token(&customer, &config.supabase_jwt_secret, Some(24));
    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("GET")
        .uri("/all")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

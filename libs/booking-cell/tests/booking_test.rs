use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::BookAppointmentRequest;
use booking_cell::router::booking_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn create_test_app(config: AppConfig) -> Router {
    booking_routes(Arc::new(config))
}

fn test_setup(mock_server: &MockServer) -> (AppConfig, TestUser, String) {
    let user = TestUser::customer("customer@example.com");
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));
    (config, user, token)
}

fn booking_request() -> BookAppointmentRequest {
    BookAppointmentRequest {
        name: "John Doe".to_string(),
        phone: "614-649-1542".to_string(),
        car_model: "Honda Civic 2020".to_string(),
        message: Some("Rear bumper dent after a parking lot accident".to_string()),
        preferred_date: Utc::now() + Duration::days(2),
    }
}

fn post_booking(token: &str, body: &BookAppointmentRequest) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

/// Mounts the count-only daily limit query with the given total.
async fn mock_daily_count(mock_server: &MockServer, total: i64) {
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-range", format!("*/{}", total).as_str()),
        )
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_book_appointment_success() {
    let mock_server = MockServer::start().await;
    let (config, user, token) = test_setup(&mock_server);
    let app = create_test_app(config).await;

    mock_daily_count(&mock_server, 0).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_row(&user.id, "pending")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app.oneshot(post_booking(&token, &booking_request())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], json!("pending"));
}

#[tokio::test]
async fn test_fourth_same_day_booking_blocked_before_persistence() {
    let mock_server = MockServer::start().await;
    let (config, _user, token) = test_setup(&mock_server);
    let app = create_test_app(config).await;

    // Three bookings already made today
    mock_daily_count(&mock_server, 3).await;

    // The insert must never be issued
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = app.oneshot(post_booking(&token, &booking_request())).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("3 appointments per day"));
}

#[tokio::test]
async fn test_overlong_message_rejected_without_network_call() {
    let mock_server = MockServer::start().await;
    let (config, _user, token) = test_setup(&mock_server);
    let app = create_test_app(config).await;

    // Validation failures must not reach the backend at all
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut request = booking_request();
    request.message = Some("a".repeat(1001));

    let response = app.oneshot(post_booking(&token, &request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_name_and_phone_rejected() {
    let mock_server = MockServer::start().await;
    let (config, _user, token) = test_setup(&mock_server);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut bad_name = booking_request();
    bad_name.name = "J0hn D03".to_string();
    let app = create_test_app(config.clone()).await;
    let response = app.oneshot(post_booking(&token, &bad_name)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_phone = booking_request();
    bad_phone.phone = "12345".to_string();
    let app = create_test_app(config).await;
    let response = app.oneshot(post_booking(&token, &bad_phone)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unauthenticated_booking_rejected() {
    let mock_server = MockServer::start().await;
    let (config, _user, _token) = test_setup(&mock_server);
    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&booking_request()).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_daily_usage_reports_remaining() {
    let mock_server = MockServer::start().await;
    let (config, _user, token) = test_setup(&mock_server);
    let app = create_test_app(config).await;

    mock_daily_count(&mock_server, 2).await;

    let request = Request::builder()
        .method("GET")
        .uri("/usage/today")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["limit"], json!(3));
    assert_eq!(body["remaining"], json!(1));
}

#[tokio::test]
async fn test_my_appointments_listing() {
    let mock_server = MockServer::start().await;
    let (config, user, token) = test_setup(&mock_server);
    let app = create_test_app(config).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row(&user.id, "confirmed"),
            MockSupabaseResponses::appointment_row(&user.id, "pending"),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/mine")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["appointments"].as_array().unwrap().len(), 2);
}

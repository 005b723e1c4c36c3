// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    // Every booking operation requires an authenticated identity
    let protected_routes = Router::new()
        // Customer-facing booking and dashboard
        .route("/", post(handlers::book_appointment))
        .route("/mine", get(handlers::get_my_appointments))
        .route("/usage/today", get(handlers::get_daily_usage))
        .route("/{appointment_id}", get(handlers::get_appointment))

        // Operator management
        .route("/all", get(handlers::list_appointments))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}

use std::sync::Arc;

use axum::{
    routing::get,
    Router,
};

use booking_cell::router::booking_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Bodyshop booking API is running!" }))
        .nest("/appointments", booking_routes(state))
}

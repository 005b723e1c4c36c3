// libs/booking-cell/src/handlers.rs
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::authz::{AuthorizationPolicy, RoleBasedPolicy};

use crate::models::{
    AppointmentListFilters, AppointmentStatus, BookAppointmentRequest, BookingError,
    ServiceType, UpdateStatusRequest,
};
use crate::services::booking::BookingService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct MyAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ListAppointmentsQuery {
    /// Comma-separated status names, e.g. `pending,confirmed`.
    pub status: Option<String>,
    pub service_type: Option<ServiceType>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service.book_appointment(&user, request, token).await
        .map_err(|e| match e {
            BookingError::DailyLimitReached(_) => {
                AppError::LimitExceeded(e.to_string())
            },
            BookingError::CarModelMissing
            | BookingError::CarModelTooLong(_)
            | BookingError::InvalidName
            | BookingError::InvalidPhone
            | BookingError::MessageTooLong(_) => {
                AppError::ValidationError(e.to_string())
            },
            BookingError::MissingEmail | BookingError::InvalidIdentity => {
                AppError::Auth(e.to_string())
            },
            BookingError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "We'll contact you shortly to confirm your appointment."
    })))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(params): Query<MyAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointments = booking_service.list_for_user(&user, params.status, token).await
        .map_err(|e| match e {
            BookingError::InvalidIdentity => AppError::Auth(e.to_string()),
            BookingError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn get_daily_usage(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let usage = booking_service.daily_usage(&user, token).await
        .map_err(|e| match e {
            BookingError::InvalidIdentity => AppError::Auth(e.to_string()),
            BookingError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!(usage)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service.get_appointment(appointment_id, token).await
        .map_err(|e| match e {
            BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            BookingError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    // Only the owner or the operator may view
    let policy = RoleBasedPolicy;
    let is_owner = appointment.user_id.to_string() == user.id;
    if !is_owner && !policy.can_manage_appointments(&user) {
        return Err(AppError::Auth("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(json!(appointment)))
}

// ==============================================================================
// OPERATOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(params): Query<ListAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let policy = RoleBasedPolicy;
    if !policy.can_manage_appointments(&user) {
        return Err(AppError::Auth("Not authorized to view all appointments".to_string()));
    }

    let statuses = parse_status_filter(params.status.as_deref())?;
    let filters = AppointmentListFilters {
        statuses,
        service_type: params.service_type,
        limit: params.limit,
        offset: params.offset,
    };

    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointments = booking_service.list_all(filters, token).await
        .map_err(|e| match e {
            BookingError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let policy = RoleBasedPolicy;
    if !policy.can_manage_appointments(&user) {
        return Err(AppError::Auth("Only the operator can update appointment statuses".to_string()));
    }

    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let outcome = booking_service
        .transition_status(appointment_id, request.status.clone(), token)
        .await
        .map_err(|e| match e {
            BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            BookingError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
            BookingError::DatabaseError(msg) => AppError::Database(msg),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(json!({
        "success": true,
        "appointment": outcome.appointment,
        "persisted": outcome.persisted,
        "warning": outcome.warning,
        "message": format!("Appointment status changed to {}", request.status)
    })))
}

fn parse_status_filter(raw: Option<&str>) -> Result<Vec<AppointmentStatus>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            AppointmentStatus::from_str(s)
                .map_err(|msg| AppError::BadRequest(msg))
        })
        .collect()
}

// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Local, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_utils::events::{EventTracker, TracingEventTracker};

use crate::models::{
    Appointment, AppointmentListFilters, AppointmentStatus, BookAppointmentRequest,
    BookingError, BookingValidationRules, ClassifiedAppointment, DailyUsage,
    TransitionOutcome,
};
use crate::services::classify::detect_service_type;
use crate::services::lifecycle::LifecycleService;
use crate::services::limit::DailyLimitService;
use crate::services::validation::BookingValidator;

/// Warning attached to a transition whose backend write failed. The local
/// result is kept; nothing is rolled back.
pub const SYNC_FAILED_WARNING: &str =
    "Status updated locally but server sync failed. Changes will not persist after a refresh.";

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    validator: BookingValidator,
    limit_service: DailyLimitService,
    lifecycle_service: LifecycleService,
    tracker: Arc<dyn EventTracker>,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_tracker(config, Arc::new(TracingEventTracker))
    }

    pub fn with_tracker(config: &AppConfig, tracker: Arc<dyn EventTracker>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let rules = BookingValidationRules::default();
        let limit_service =
            DailyLimitService::new(Arc::clone(&supabase), rules.max_appointments_per_day);

        Self {
            validator: BookingValidator::new(rules),
            limit_service,
            lifecycle_service: LifecycleService::new(),
            tracker,
            supabase,
        }
    }

    /// Book a service appointment for the authenticated user.
    ///
    /// Validation happens before any network traffic; the daily cap is
    /// re-checked here rather than trusting whatever the client saw at form
    /// load. The inserted row always starts as pending.
    pub async fn book_appointment(
        &self,
        user: &User,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        let user_id = Uuid::parse_str(&user.id).map_err(|_| BookingError::InvalidIdentity)?;
        let email = user.email.clone().ok_or(BookingError::MissingEmail)?;

        let draft = self.validator.validate(&request)?;

        let count = self.limit_service.count_today(user_id, auth_token).await?;
        if self.limit_service.is_reached(count) {
            info!("User {} hit the daily booking cap ({})", user_id, count);
            return Err(BookingError::DailyLimitReached(self.limit_service.limit()));
        }

        let now = Utc::now();
        let appointment_data = json!({
            "user_id": user_id,
            "name": draft.name,
            "email": email,
            "phone": draft.phone,
            "car_model": draft.car_model,
            "message": draft.message,
            "preferred_date": request.preferred_date.to_rfc3339(),
            "request_date": Local::now().date_naive().to_string(),
            "status": AppointmentStatus::Pending.to_string(),
            "created_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(appointment_data),
            Some(headers),
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::DatabaseError("Failed to create appointment".to_string()));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse created appointment: {}", e)))?;

        self.tracker.track_event("appointment_booked", json!({
            "appointment_id": appointment.id,
            "car_model": appointment.car_model,
            "service_type": detect_service_type(
                appointment.message.as_deref().unwrap_or(&appointment.car_model)
            ).to_string(),
        }));

        info!("Appointment {} booked for user {}", appointment.id, user_id);
        Ok(appointment)
    }

    /// Get appointment by ID.
    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, BookingError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(BookingError::NotFound);
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointment: {}", e)))?;

        Ok(appointment)
    }

    /// The caller's own appointments, newest first.
    pub async fn list_for_user(
        &self,
        user: &User,
        status: Option<AppointmentStatus>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let user_id = Uuid::parse_str(&user.id).map_err(|_| BookingError::InvalidIdentity)?;

        let mut path = format!(
            "/rest/v1/appointments?user_id=eq.{}&order=created_at.desc",
            user_id
        );
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }

        self.fetch_appointments(&path, auth_token).await
    }

    /// Every appointment in the system, newest first, annotated with a
    /// derived service category. Operator-only at the handler layer.
    pub async fn list_all(
        &self,
        filters: AppointmentListFilters,
        auth_token: &str,
    ) -> Result<Vec<ClassifiedAppointment>, BookingError> {
        let mut query_parts = Vec::new();

        if !filters.statuses.is_empty() {
            let statuses: Vec<String> = filters.statuses.iter().map(|s| s.to_string()).collect();
            query_parts.push(format!("status=in.({})", statuses.join(",")));
        }
        query_parts.push("order=created_at.desc".to_string());

        if let Some(limit) = filters.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = filters.offset {
            query_parts.push(format!("offset={}", offset));
        }

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        let appointments = self.fetch_appointments(&path, auth_token).await?;

        let classified = appointments
            .into_iter()
            .map(|appointment| {
                let text = appointment.message.as_deref().unwrap_or(&appointment.car_model);
                let service_type = detect_service_type(text);
                ClassifiedAppointment { appointment, service_type }
            })
            .filter(|row| {
                filters.service_type.is_none() || filters.service_type == Some(row.service_type)
            })
            .collect();

        Ok(classified)
    }

    /// Today's booking usage for the caller.
    pub async fn daily_usage(&self, user: &User, auth_token: &str) -> Result<DailyUsage, BookingError> {
        let user_id = Uuid::parse_str(&user.id).map_err(|_| BookingError::InvalidIdentity)?;
        self.limit_service.usage_for(user_id, auth_token).await
    }

    /// Transition an appointment to a new status.
    ///
    /// The transition table is enforced first. The new status is then applied
    /// optimistically: if the backend write fails, the locally-updated
    /// appointment is still returned with `persisted: false` and a warning,
    /// trading strict consistency for operator responsiveness. There is no
    /// retry; the backend's view wins on the next fetch.
    pub async fn transition_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<TransitionOutcome, BookingError> {
        let current = self.get_appointment(appointment_id, auth_token).await?;

        self.lifecycle_service
            .validate_status_transition(&current.status, &new_status)?;

        let mut optimistic = current.clone();
        optimistic.status = new_status.clone();

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let update_data = json!({ "status": new_status.to_string() });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let persisted: Result<Vec<Value>, _> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(update_data),
            Some(headers),
        ).await;

        match persisted {
            Ok(rows) => {
                let appointment = match rows.first() {
                    Some(row) => serde_json::from_value(row.clone()).map_err(|e| {
                        BookingError::DatabaseError(format!("Failed to parse updated appointment: {}", e))
                    })?,
                    None => optimistic,
                };

                self.tracker.track_event("appointment_status_changed", json!({
                    "appointment_id": appointment_id,
                    "new_status": new_status.to_string(),
                }));

                info!("Appointment {} moved to {}", appointment_id, new_status);
                Ok(TransitionOutcome {
                    appointment,
                    persisted: true,
                    warning: None,
                })
            }
            Err(e) => {
                warn!("Status update for {} did not persist: {}", appointment_id, e);
                Ok(TransitionOutcome {
                    appointment: optimistic,
                    persisted: false,
                    warning: Some(SYNC_FAILED_WARNING.to_string()),
                })
            }
        }
    }

    async fn fetch_appointments(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Appointment> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| BookingError::DatabaseError(format!("Failed to parse appointments: {}", e)))?;

        Ok(appointments)
    }
}

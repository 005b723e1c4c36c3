// libs/booking-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub car_model: String,
    pub message: Option<String>,
    pub preferred_date: DateTime<Utc>,
    pub request_date: NaiveDate,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(format!("Unknown appointment status: {}", other)),
        }
    }
}

/// Service category derived from the request text. Never stored; computed
/// fresh on every operator listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Collision,
    Paint,
    Mechanical,
    Maintenance,
    General,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceType::Collision => write!(f, "collision"),
            ServiceType::Paint => write!(f, "paint"),
            ServiceType::Mechanical => write!(f, "mechanical"),
            ServiceType::Maintenance => write!(f, "maintenance"),
            ServiceType::General => write!(f, "general"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub name: String,
    pub phone: String,
    pub car_model: String,
    pub message: Option<String>,
    pub preferred_date: DateTime<Utc>,
}

/// Sanitized field values that passed every validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub name: String,
    pub phone: String,
    pub car_model: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentListFilters {
    pub statuses: Vec<AppointmentStatus>,
    pub service_type: Option<ServiceType>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// Operator-facing listing row: the stored appointment plus its derived
/// service category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub service_type: ServiceType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyUsage {
    pub count: i64,
    pub limit: i64,
    pub remaining: i64,
}

/// Result of a status transition.
///
/// `persisted: false` means the write to the backend failed and the returned
/// appointment reflects a local-only update. There is no automatic retry or
/// reconciliation; the backend state reappears on the next listing fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub appointment: Appointment,
    pub persisted: bool,
    pub warning: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum BookingError {
    #[error("Please enter your car model")]
    CarModelMissing,

    #[error("Car model must be at most {0} characters")]
    CarModelTooLong(usize),

    #[error("Please enter a valid name (letters only)")]
    InvalidName,

    #[error("Please enter a valid phone number (e.g., 123-456-7890)")]
    InvalidPhone,

    #[error("Service details must be less than {0} characters")]
    MessageTooLong(usize),

    #[error("You can only schedule up to {0} appointments per day. Please try again tomorrow.")]
    DailyLimitReached(i64),

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Authenticated identity has no email address")]
    MissingEmail,

    #[error("Authenticated identity is not a valid user id")]
    InvalidIdentity,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

// ==============================================================================
// VALIDATION MODELS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingValidationRules {
    pub max_appointments_per_day: i64,
    pub max_message_chars: usize,
    pub max_car_model_chars: usize,
    pub min_name_chars: usize,
}

impl Default for BookingValidationRules {
    fn default() -> Self {
        Self {
            max_appointments_per_day: 3,
            max_message_chars: 1000,
            max_car_model_chars: 25,
            min_name_chars: 2,
        }
    }
}

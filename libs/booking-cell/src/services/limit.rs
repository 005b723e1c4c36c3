// libs/booking-cell/src/services/limit.rs
use std::sync::Arc;

use chrono::Local;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{BookingError, DailyUsage};

/// Enforces the per-user, per-calendar-day booking cap.
///
/// The day boundary is the server's local calendar day, matching the
/// `request_date` column written at insert time.
pub struct DailyLimitService {
    supabase: Arc<SupabaseClient>,
    max_per_day: i64,
}

impl DailyLimitService {
    pub fn new(supabase: Arc<SupabaseClient>, max_per_day: i64) -> Self {
        Self { supabase, max_per_day }
    }

    pub fn limit(&self) -> i64 {
        self.max_per_day
    }

    /// Count the caller's bookings made today. Count-only query; no row
    /// bodies cross the wire.
    pub async fn count_today(&self, user_id: Uuid, auth_token: &str) -> Result<i64, BookingError> {
        let today = Local::now().date_naive();
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&request_date=eq.{}",
            user_id, today
        );

        let count = self
            .supabase
            .count(&path, Some(auth_token))
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        debug!("User {} has {} booking(s) today", user_id, count);
        Ok(count)
    }

    pub async fn usage_for(&self, user_id: Uuid, auth_token: &str) -> Result<DailyUsage, BookingError> {
        let count = self.count_today(user_id, auth_token).await?;
        Ok(DailyUsage {
            count,
            limit: self.max_per_day,
            remaining: (self.max_per_day - count).max(0),
        })
    }

    pub fn is_reached(&self, count: i64) -> bool {
        count >= self.max_per_day
    }
}

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, ConflictCheckResponse};
use crate::store::AppointmentStore;

/// Half-open overlap of `[a_start, a_end)` and `[b_start, b_end)`.
/// Back-to-back intervals do not overlap.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Active appointments in `existing` that overlap `[start, end)`, skipping `exclude_id`.
pub fn find_conflicts<'a>(
    existing: &'a [Appointment],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<Uuid>,
) -> Vec<&'a Appointment> {
    existing
        .iter()
        .filter(|a| a.status.is_active())
        .filter(|a| Some(a.id) != exclude_id)
        .filter(|a| intervals_overlap(start, end, a.start_time, a.end_time()))
        .collect()
}

pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    pub async fn check_conflicts(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
        exclude_id: Option<Uuid>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let end_time = start_time
            .checked_add_signed(Duration::minutes(duration_minutes as i64))
            .ok_or_else(|| AppointmentError::ValidationError("Appointment ends out of range".to_string()))?;
        debug!("Checking conflicts for professional {} from {} to {}",
               professional_id, start_time, end_time);

        let existing = self.store.list_active_appointments(professional_id, exclude_id).await?;
        let conflicting: Vec<Uuid> = find_conflicts(&existing, start_time, end_time, exclude_id)
            .into_iter()
            .map(|a| a.id)
            .collect();

        if !conflicting.is_empty() {
            warn!("Conflict detected for professional {} - {} conflicting appointments",
                  professional_id, conflicting.len());
        }

        Ok(ConflictCheckResponse {
            can_book: conflicting.is_empty(),
            start_time,
            end_time,
            conflicting_appointments: conflicting,
        })
    }

    pub async fn can_book(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        Ok(self
            .check_conflicts(professional_id, start_time, duration_minutes, exclude_id)
            .await?
            .can_book)
    }
}

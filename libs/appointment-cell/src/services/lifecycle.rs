// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService {
    max_duration_minutes: i32,
}

impl AppointmentLifecycleService {
    pub fn new(max_duration_minutes: i32) -> Self {
        Self { max_duration_minutes }
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }
        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            // Terminal
            AppointmentStatus::Cancelled | AppointmentStatus::Completed => &[],
        }
    }

    /// `start_time` must be strictly after `now`.
    pub fn validate_start_time(&self, start_time: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), AppointmentError> {
        if start_time <= now {
            debug!("Rejected start time {} (now: {})", start_time, now);
            return Err(AppointmentError::PastDate);
        }
        Ok(())
    }

    pub fn validate_duration(&self, duration_minutes: i32) -> Result<(), AppointmentError> {
        if duration_minutes <= 0 {
            return Err(AppointmentError::ValidationError(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }
        if duration_minutes > self.max_duration_minutes {
            return Err(AppointmentError::ValidationError(format!(
                "Duration cannot exceed {} minutes",
                self.max_duration_minutes
            )));
        }
        Ok(())
    }
}

// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use professional_cell::models::ProfessionalError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// COP
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Saturates at the last representable instant.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time
            .checked_add_signed(Duration::minutes(self.duration_minutes as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.client_id == user_id || self.professional_id == user_id
    }
}

/// One canonical lowercase form on the wire; legacy upper-case and Spanish
/// spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[serde(alias = "PENDING", alias = "pendiente", alias = "PENDIENTE")]
    Pending,
    #[serde(alias = "CONFIRMED", alias = "confirmada", alias = "CONFIRMADA")]
    Confirmed,
    #[serde(alias = "CANCELLED", alias = "canceled", alias = "cancelada", alias = "CANCELADA")]
    Cancelled,
    #[serde(alias = "COMPLETED", alias = "completada", alias = "COMPLETADA")]
    Completed,
}

impl AppointmentStatus {
    /// Active appointments block their time slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(AppointmentStatus::Pending),
            "confirmed" | "confirmada" => Ok(AppointmentStatus::Confirmed),
            "cancelled" | "canceled" | "cancelada" => Ok(AppointmentStatus::Cancelled),
            "completed" | "completada" => Ok(AppointmentStatus::Completed),
            other => Err(AppointmentError::ValidationError(format!("Unknown appointment status: {}", other))),
        }
    }
}

/// Which side of an appointment a caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    Client(Uuid),
    Professional(Uuid),
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

fn default_duration() -> i32 {
    crate::services::booking::DEFAULT_DURATION_MINUTES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub professional_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,
    pub reason: Option<String>,
    pub notes: Option<String>,
    /// Defaults to the professional's consultation price.
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    #[serde(alias = "start_time")]
    pub new_start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.status.map_or(true, |s| appointment.status == s)
            && self.from.map_or(true, |from| appointment.start_time >= from)
            && self.to.map_or(true, |to| appointment.start_time < to)
    }
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub professional_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictCheckResponse {
    pub can_book: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub conflicting_appointments: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct FreeSlotsQuery {
    pub date: NaiveDate,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreeSlotsResponse {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub slots: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AgendaQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
    pub upcoming: usize,
}

/// A client as seen from a professional's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSummary {
    pub client_id: Uuid,
    pub total_appointments: usize,
    pub last_appointment: DateTime<Utc>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Appointment start time must be in the future")]
    PastDate,

    #[error("Requested time conflicts with an existing appointment")]
    ConflictDetected,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error("Cannot reschedule a {0} appointment")]
    NotReschedulable(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(e: anyhow::Error) -> Self {
        AppointmentError::DatabaseError(e.to_string())
    }
}

impl From<ProfessionalError> for AppointmentError {
    fn from(e: ProfessionalError) -> Self {
        match e {
            ProfessionalError::NotFound => AppointmentError::ProfessionalNotFound,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

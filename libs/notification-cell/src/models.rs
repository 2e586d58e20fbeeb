use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    AppointmentBooked,
    #[serde(alias = "CITA_CONFIRMADA")]
    AppointmentConfirmed,
    #[serde(alias = "CITA_CANCELADA")]
    AppointmentCancelled,
    #[serde(alias = "CITA_REAGENDADA")]
    AppointmentRescheduled,
    #[serde(alias = "RECORDATORIO")]
    Reminder,
    #[serde(alias = "PAGO_EXITOSO")]
    PaymentSucceeded,
    #[serde(alias = "PAGO_FALLIDO")]
    PaymentFailed,
    #[serde(alias = "MENSAJE")]
    Message,
    #[serde(alias = "SISTEMA")]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A notification waiting to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub appointment_id: Option<Uuid>,
}

impl NewNotification {
    pub fn new(user_id: Uuid, kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            appointment_id: None,
        }
    }

    pub fn for_appointment(mut self, appointment_id: Uuid) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            read: false,
            appointment_id: self.appointment_id,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<usize>,
}

/// The parts of an appointment that notification messages mention.
#[derive(Debug, Clone)]
pub struct AppointmentEvent {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub previous_start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelledBy {
    Client,
    Professional,
}

#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Option<Uuid>,
    /// COP
    pub amount: i64,
    pub reference: String,
}

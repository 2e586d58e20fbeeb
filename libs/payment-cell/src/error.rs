use thiserror::Error;

use appointment_cell::AppointmentError;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Payment not found or already processed")]
    AlreadyProcessed,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("You do not have permission for this payment")]
    NotOwner,

    #[error("This appointment already has a completed payment")]
    AlreadyPaid,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Payment gateway error: {0}")]
    GatewayError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for PaymentError {
    fn from(e: anyhow::Error) -> Self {
        PaymentError::DatabaseError(e.to_string())
    }
}

impl From<AppointmentError> for PaymentError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound => PaymentError::AppointmentNotFound,
            other => PaymentError::DatabaseError(other.to_string()),
        }
    }
}

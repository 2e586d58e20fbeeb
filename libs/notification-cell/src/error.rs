use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<anyhow::Error> for NotificationError {
    fn from(e: anyhow::Error) -> Self {
        NotificationError::DatabaseError(e.to_string())
    }
}

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use error::NotificationError;
pub use models::{AppointmentEvent, NewNotification, Notification, NotificationKind, PaymentEvent};
pub use services::NotificationService;

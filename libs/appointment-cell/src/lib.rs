pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod supabase;

pub use models::{Appointment, AppointmentError, AppointmentStatus};
pub use services::booking::AppointmentBookingService;
pub use store::AppointmentStore;

pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod supabase;

pub use error::PaymentError;
pub use gateway::{PaymentGateway, SimulatedPayPalGateway};
pub use models::{Payment, PaymentFilter, PaymentStatus};
pub use services::PaymentService;
pub use store::PaymentStore;

pub mod events;
pub mod notifier;

pub use notifier::NotificationService;

pub mod booking;
pub mod clock;
pub mod conflict;
pub mod lifecycle;
pub mod listing;
pub mod locks;
pub mod slots;

pub use booking::AppointmentBookingService;
pub use clock::{Clock, FixedClock, SystemClock};
pub use conflict::ConflictDetectionService;
pub use lifecycle::AppointmentLifecycleService;
pub use listing::AppointmentQueryService;
pub use locks::KeyedLocks;
pub use slots::SlotGrid;

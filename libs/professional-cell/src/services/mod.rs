pub mod availability;
pub mod directory;
pub mod favorites;

pub use availability::AvailabilityService;
pub use directory::ProfessionalService;
pub use favorites::FavoriteService;

// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use notification_cell::router::NotificationState;
use professional_cell::router::ProfessionalState;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{AppointmentBookingService, AppointmentQueryService};
use crate::store::{AppointmentStore, InMemoryAppointmentStore};
use crate::supabase::SupabaseAppointmentStore;

#[derive(Clone)]
pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub booking: Arc<AppointmentBookingService>,
    pub queries: Arc<AppointmentQueryService>,
}

impl AppointmentState {
    /// Wires the booking kernel over `store`, sharing the professional
    /// directory and notification fan-out of the sibling cells.
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn AppointmentStore>,
        professionals: &ProfessionalState,
        notifications: &NotificationState,
    ) -> Self {
        let booking = AppointmentBookingService::new(
            &config,
            Arc::clone(&store),
            professionals.professionals.directory(),
            professionals.availability.store(),
            Arc::clone(&notifications.notifications),
        );
        Self::from_booking(config, booking)
    }

    pub fn from_booking(config: Arc<AppConfig>, booking: AppointmentBookingService) -> Self {
        let queries = AppointmentQueryService::new(booking.store(), booking.clock());
        Self {
            config,
            booking: Arc::new(booking),
            queries: Arc::new(queries),
        }
    }

    pub fn in_memory(
        config: Arc<AppConfig>,
        professionals: &ProfessionalState,
        notifications: &NotificationState,
    ) -> Self {
        Self::new(config, Arc::new(InMemoryAppointmentStore::new()), professionals, notifications)
    }

    pub fn with_supabase(
        config: Arc<AppConfig>,
        supabase: Arc<SupabaseClient>,
        professionals: &ProfessionalState,
        notifications: &NotificationState,
    ) -> Self {
        Self::new(config, Arc::new(SupabaseAppointmentStore::new(supabase)), professionals, notifications)
    }
}

pub fn appointment_routes(state: AppointmentState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/professionals/{professional_id}/slots", get(handlers::get_free_slots));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/mine", get(handlers::list_my_appointments))
        .route("/upcoming", get(handlers::upcoming_appointments))
        .route("/stats", get(handlers::appointment_stats))
        .route("/patients", get(handlers::my_patients))
        .route("/admin/all", get(handlers::all_appointments))
        .route("/conflicts/check", get(handlers::check_conflicts))
        .route("/professionals/{professional_id}/agenda", get(handlers::professional_agenda))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

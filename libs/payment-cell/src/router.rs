use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use appointment_cell::router::AppointmentState;
use notification_cell::router::NotificationState;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::extractor::auth_middleware;

use crate::gateway::{PaymentGateway, SimulatedPayPalGateway};
use crate::handlers;
use crate::services::PaymentService;
use crate::store::{InMemoryPaymentStore, PaymentStore};
use crate::supabase::SupabasePaymentStore;

#[derive(Clone)]
pub struct PaymentState {
    pub config: Arc<AppConfig>,
    pub payments: Arc<PaymentService>,
}

impl PaymentState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        appointments: &AppointmentState,
        notifications: &NotificationState,
    ) -> Self {
        let payments = PaymentService::new(
            store,
            appointments.booking.store(),
            gateway,
            Arc::clone(&notifications.notifications),
        );
        Self { config, payments: Arc::new(payments) }
    }

    pub fn in_memory(
        config: Arc<AppConfig>,
        appointments: &AppointmentState,
        notifications: &NotificationState,
    ) -> Self {
        let gateway = Arc::new(SimulatedPayPalGateway::from_config(&config));
        Self::new(config, Arc::new(InMemoryPaymentStore::new()), gateway, appointments, notifications)
    }

    pub fn with_supabase(
        config: Arc<AppConfig>,
        supabase: Arc<SupabaseClient>,
        appointments: &AppointmentState,
        notifications: &NotificationState,
    ) -> Self {
        let gateway = Arc::new(SimulatedPayPalGateway::from_config(&config));
        Self::new(config, Arc::new(SupabasePaymentStore::new(supabase)), gateway, appointments, notifications)
    }
}

pub fn payment_routes(state: PaymentState) -> Router {
    Router::new()
        .route("/", post(handlers::process_payment))
        .route("/mine", get(handlers::list_my_payments))
        .route("/stats", get(handlers::payment_stats))
        .route("/received", get(handlers::received_payments))
        .route("/received/stats", get(handlers::received_payment_stats))
        .route("/paypal/checkout", post(handlers::create_checkout))
        .route("/paypal/execute", post(handlers::execute_checkout))
        .route("/paypal/status/{gateway_payment_id}", get(handlers::checkout_status))
        .route("/{payment_id}", get(handlers::get_payment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}

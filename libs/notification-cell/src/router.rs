use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::NotificationService;
use crate::store::{InMemoryNotificationStore, NotificationStore, SupabaseNotificationStore};

#[derive(Clone)]
pub struct NotificationState {
    pub config: Arc<AppConfig>,
    pub notifications: Arc<NotificationService>,
}

impl NotificationState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn NotificationStore>) -> Self {
        Self {
            config,
            notifications: Arc::new(NotificationService::new(store)),
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        Self::new(config, Arc::new(InMemoryNotificationStore::new()))
    }

    pub fn with_supabase(config: Arc<AppConfig>, supabase: Arc<SupabaseClient>) -> Self {
        Self::new(config, Arc::new(SupabaseNotificationStore::new(supabase)))
    }
}

pub fn notification_routes(state: NotificationState) -> Router {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/unread-count", get(handlers::unread_count))
        .route("/read-all", post(handlers::mark_all_read))
        .route("/{notification_id}/read", post(handlers::mark_read))
        .route("/{notification_id}", delete(handlers::delete_notification))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}

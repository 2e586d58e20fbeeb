use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{AvailabilityService, FavoriteService, ProfessionalService};
use crate::store::{
    AvailabilityStore, FavoriteStore, InMemoryAvailabilityStore, InMemoryFavoriteStore,
    InMemoryProfessionalDirectory, ProfessionalDirectory,
};
use crate::supabase::{SupabaseAvailabilityStore, SupabaseFavoriteStore, SupabaseProfessionalDirectory};

#[derive(Clone)]
pub struct ProfessionalState {
    pub config: Arc<AppConfig>,
    pub professionals: Arc<ProfessionalService>,
    pub availability: Arc<AvailabilityService>,
    pub favorites: Arc<FavoriteService>,
}

impl ProfessionalState {
    pub fn new(
        config: Arc<AppConfig>,
        directory: Arc<dyn ProfessionalDirectory>,
        availability: Arc<dyn AvailabilityStore>,
        favorites: Arc<dyn FavoriteStore>,
    ) -> Self {
        Self {
            config,
            professionals: Arc::new(ProfessionalService::new(Arc::clone(&directory))),
            availability: Arc::new(AvailabilityService::new(availability)),
            favorites: Arc::new(FavoriteService::new(favorites, directory)),
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryProfessionalDirectory::new()),
            Arc::new(InMemoryAvailabilityStore::new()),
            Arc::new(InMemoryFavoriteStore::new()),
        )
    }

    pub fn with_supabase(config: Arc<AppConfig>, supabase: Arc<SupabaseClient>) -> Self {
        Self::new(
            config,
            Arc::new(SupabaseProfessionalDirectory::new(Arc::clone(&supabase))),
            Arc::new(SupabaseAvailabilityStore::new(Arc::clone(&supabase))),
            Arc::new(SupabaseFavoriteStore::new(supabase)),
        )
    }
}

pub fn professional_routes(state: ProfessionalState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/search", get(handlers::search_professionals))
        .route("/specialties", get(handlers::list_specialties))
        .route("/cities", get(handlers::list_cities))
        .route("/{professional_id}", get(handlers::get_professional))
        .route("/{professional_id}/availability", get(handlers::get_professional_availability));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/me", put(handlers::upsert_my_profile))
        .route(
            "/me/availability",
            get(handlers::list_my_availability).post(handlers::create_availability),
        )
        .route("/me/availability/weekly", put(handlers::replace_weekly_schedule))
        .route(
            "/me/availability/{block_id}",
            put(handlers::update_availability).delete(handlers::delete_availability),
        )
        .route("/favorites", get(handlers::list_favorites).post(handlers::add_favorite))
        .route("/favorites/{professional_id}", axum::routing::delete(handlers::remove_favorite))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

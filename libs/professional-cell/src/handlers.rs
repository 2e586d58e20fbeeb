use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{
    AddFavoriteRequest, AvailabilityQuery, CreateAvailabilityRequest, ProfessionalError,
    ProfessionalSearchQuery, UpdateAvailabilityRequest, UpsertProfessionalRequest, WeeklyScheduleRequest,
};
use crate::router::ProfessionalState;

pub fn map_professional_error(e: ProfessionalError) -> AppError {
    match e {
        ProfessionalError::NotFound => AppError::NotFound("Professional not found".to_string()),
        ProfessionalError::AvailabilityNotFound => AppError::NotFound("Availability block not found".to_string()),
        ProfessionalError::FavoriteNotFound => AppError::NotFound("Favorite not found".to_string()),
        ProfessionalError::NotOwner => AppError::Forbidden(e.to_string()),
        ProfessionalError::FavoriteExists => AppError::Conflict(e.to_string()),
        ProfessionalError::InvalidTimeRange { .. } | ProfessionalError::ValidationError(_) => {
            AppError::ValidationError(e.to_string())
        }
        ProfessionalError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// PUBLIC DIRECTORY
// ==============================================================================

pub async fn search_professionals(
    State(state): State<ProfessionalState>,
    Query(query): Query<ProfessionalSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let professionals = state.professionals.search(query).await.map_err(map_professional_error)?;

    Ok(Json(json!({
        "total": professionals.len(),
        "professionals": professionals
    })))
}

pub async fn list_specialties(State(state): State<ProfessionalState>) -> Result<Json<Value>, AppError> {
    let specialties = state.professionals.list_specialties().await.map_err(map_professional_error)?;
    Ok(Json(json!({ "specialties": specialties })))
}

pub async fn list_cities(State(state): State<ProfessionalState>) -> Result<Json<Value>, AppError> {
    let cities = state.professionals.list_cities().await.map_err(map_professional_error)?;
    Ok(Json(json!({ "cities": cities })))
}

pub async fn get_professional(
    State(state): State<ProfessionalState>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let professional = state
        .professionals
        .get_professional(professional_id)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!(professional)))
}

pub async fn get_professional_availability(
    State(state): State<ProfessionalState>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let blocks = state
        .availability
        .list_blocks(professional_id, query.day_of_week)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "availability": blocks
    })))
}

// ==============================================================================
// PROFESSIONAL SELF-SERVICE
// ==============================================================================

#[axum::debug_handler]
pub async fn upsert_my_profile(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertProfessionalRequest>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;

    let professional = state
        .professionals
        .upsert_profile(professional_id, request)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!({
        "success": true,
        "professional": professional
    })))
}

pub async fn list_my_availability(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;

    let blocks = state
        .availability
        .list_blocks(professional_id, query.day_of_week)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!({ "availability": blocks })))
}

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;

    let block = state
        .availability
        .create_block(professional_id, request)
        .await
        .map_err(map_professional_error)?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "availability": block
    }))))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Path(block_id): Path<Uuid>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;

    let block = state
        .availability
        .update_block(professional_id, block_id, request)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": block
    })))
}

pub async fn delete_availability(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Path(block_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;

    state
        .availability
        .delete_block(professional_id, block_id)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability block deleted"
    })))
}

#[axum::debug_handler]
pub async fn replace_weekly_schedule(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Json(request): Json<WeeklyScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;

    let blocks = state
        .availability
        .replace_weekly_schedule(professional_id, request)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!({
        "success": true,
        "availability": blocks
    })))
}

// ==============================================================================
// FAVORITES
// ==============================================================================

pub async fn list_favorites(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let client_id = user.require_role(UserRole::Client)?;

    let favorites = state.favorites.list_favorites(client_id).await.map_err(map_professional_error)?;

    Ok(Json(json!({
        "total": favorites.len(),
        "favorites": favorites
    })))
}

#[axum::debug_handler]
pub async fn add_favorite(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Json(request): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let client_id = user.require_role(UserRole::Client)?;

    let favorite = state
        .favorites
        .add_favorite(client_id, request.professional_id)
        .await
        .map_err(map_professional_error)?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "favorite": favorite
    }))))
}

pub async fn remove_favorite(
    State(state): State<ProfessionalState>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let client_id = user.require_role(UserRole::Client)?;

    state
        .favorites
        .remove_favorite(client_id, professional_id)
        .await
        .map_err(map_professional_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Removed from favorites"
    })))
}

// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use notification_cell::models::CancelledBy;
use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::models::{
    AgendaQuery, Appointment, AppointmentError, AppointmentFilter, BookAppointmentRequest,
    ConflictCheckQuery, FreeSlotsQuery, FreeSlotsResponse, Participant, RescheduleAppointmentRequest,
    UpcomingQuery, UpdateStatusRequest,
};
use crate::router::AppointmentState;
use crate::services::booking::DEFAULT_DURATION_MINUTES;

pub fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound | AppointmentError::ProfessionalNotFound => AppError::NotFound(e.to_string()),
        AppointmentError::ConflictDetected => AppError::Conflict(e.to_string()),
        AppointmentError::PastDate
        | AppointmentError::InvalidStatusTransition { .. }
        | AppointmentError::NotReschedulable(_) => AppError::BadRequest(e.to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn participant_of(user: &User) -> Result<Participant, AppError> {
    match user.user_role() {
        Some(UserRole::Professional) => Ok(Participant::Professional(user.user_id()?)),
        Some(UserRole::Client) => Ok(Participant::Client(user.user_id()?)),
        _ => Err(AppError::Forbidden("Only clients and professionals have appointments".to_string())),
    }
}

async fn load_appointment(state: &AppointmentState, id: Uuid) -> Result<Appointment, AppError> {
    state.booking.get_appointment(id).await.map_err(map_appointment_error)
}

async fn load_as_client(state: &AppointmentState, user: &User, id: Uuid) -> Result<Appointment, AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let appointment = load_appointment(state, id).await?;
    if appointment.client_id != client_id {
        return Err(AppError::Forbidden("Not your appointment".to_string()));
    }
    Ok(appointment)
}

async fn load_as_professional(state: &AppointmentState, user: &User, id: Uuid) -> Result<Appointment, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;
    let appointment = load_appointment(state, id).await?;
    if appointment.professional_id != professional_id {
        return Err(AppError::Forbidden("Not your appointment".to_string()));
    }
    Ok(appointment)
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let client_id = user.require_role(UserRole::Client)?;

    let appointment = state
        .booking
        .create_appointment(client_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked"
        })),
    ))
}

pub async fn check_conflicts(
    State(state): State<AppointmentState>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let result = state
        .booking
        .check_conflicts(
            query.professional_id,
            query.start_time,
            query.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
            query.exclude_appointment_id,
        )
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(result)))
}

pub async fn get_free_slots(
    State(state): State<AppointmentState>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let duration_minutes = query.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    let slots = state
        .booking
        .free_slots(professional_id, query.date, duration_minutes)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(FreeSlotsResponse {
        professional_id,
        date: query.date,
        duration_minutes,
        slots,
    })))
}

// ==============================================================================
// LISTINGS
// ==============================================================================

pub async fn list_my_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<Value>, AppError> {
    let participant = participant_of(&user)?;
    let appointments = state.queries.list(participant, filter).await.map_err(map_appointment_error)?;

    Ok(Json(json!({
        "total": appointments.len(),
        "appointments": appointments
    })))
}

pub async fn upcoming_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Value>, AppError> {
    let participant = participant_of(&user)?;
    let appointments = state
        .queries
        .upcoming(participant, query.limit)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

pub async fn appointment_stats(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let participant = participant_of(&user)?;
    let stats = state.queries.stats(participant).await.map_err(map_appointment_error)?;
    Ok(Json(json!(stats)))
}

pub async fn my_patients(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;
    let patients = state.queries.patients(professional_id).await.map_err(map_appointment_error)?;

    Ok(Json(json!({
        "total": patients.len(),
        "patients": patients
    })))
}

pub async fn all_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("Only administrators can list every appointment".to_string()));
    }

    let appointments = state.queries.all(filter).await.map_err(map_appointment_error)?;
    Ok(Json(json!({
        "total": appointments.len(),
        "appointments": appointments
    })))
}

pub async fn professional_agenda(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(professional_id): Path<Uuid>,
    Query(query): Query<AgendaQuery>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() && user.require_role(UserRole::Professional)? != professional_id {
        return Err(AppError::Forbidden("Cannot view another professional's agenda".to_string()));
    }

    let appointments = state
        .queries
        .day_agenda(professional_id, query.date)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "professional_id": professional_id,
        "date": query.date,
        "appointments": appointments
    })))
}

pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = load_appointment(&state, appointment_id).await?;

    if !user.is_admin() && !appointment.is_participant(user.user_id()?) {
        return Err(AppError::Forbidden("Not your appointment".to_string()));
    }

    Ok(Json(json!(appointment)))
}

// ==============================================================================
// LIFECYCLE
// ==============================================================================

pub async fn reschedule_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    load_as_client(&state, &user, appointment_id).await?;

    let appointment = state
        .booking
        .reschedule_appointment(appointment_id, request.new_start_time)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    load_as_client(&state, &user, appointment_id).await?;

    let appointment = state
        .booking
        .cancel_appointment(appointment_id, CancelledBy::Client)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

pub async fn confirm_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    load_as_professional(&state, &user, appointment_id).await?;

    let appointment = state
        .booking
        .confirm_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

pub async fn complete_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    load_as_professional(&state, &user, appointment_id).await?;

    let appointment = state
        .booking
        .complete_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    load_as_professional(&state, &user, appointment_id).await?;

    let appointment = state
        .booking
        .update_status(appointment_id, request.status)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

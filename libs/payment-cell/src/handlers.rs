use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::{User, UserRole};
use shared_models::error::AppError;

use crate::error::PaymentError;
use crate::models::{
    CreateCheckoutRequest, ExecuteCheckoutQuery, PaymentFilter, PaymentHistoryQuery, ProcessPaymentRequest,
};
use crate::router::PaymentState;

pub fn map_payment_error(e: PaymentError) -> AppError {
    match e {
        PaymentError::PaymentNotFound | PaymentError::AlreadyProcessed | PaymentError::AppointmentNotFound => {
            AppError::NotFound(e.to_string())
        }
        PaymentError::NotOwner => AppError::Forbidden(e.to_string()),
        PaymentError::AlreadyPaid => AppError::Conflict(e.to_string()),
        PaymentError::ValidationError(msg) => AppError::ValidationError(msg),
        PaymentError::GatewayError(msg) => AppError::BadRequest(format!("Payment gateway error: {}", msg)),
        PaymentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

pub async fn list_my_payments(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
    Query(query): Query<PaymentHistoryQuery>,
) -> Result<Json<Value>, AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let payments = state.payments.history(client_id, query.status).await.map_err(map_payment_error)?;

    Ok(Json(json!({
        "total": payments.len(),
        "payments": payments
    })))
}

pub async fn payment_stats(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let stats = state.payments.stats(client_id).await.map_err(map_payment_error)?;
    Ok(Json(json!(stats)))
}

pub async fn received_payments(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;
    let payments = state.payments.received(professional_id, filter).await.map_err(map_payment_error)?;

    Ok(Json(json!({
        "total": payments.len(),
        "payments": payments
    })))
}

pub async fn received_payment_stats(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let professional_id = user.require_role(UserRole::Professional)?;
    let stats = state.payments.professional_stats(professional_id).await.map_err(map_payment_error)?;
    Ok(Json(json!(stats)))
}

pub async fn get_payment(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let payment = state.payments.get_payment(client_id, payment_id).await.map_err(map_payment_error)?;
    Ok(Json(json!(payment)))
}

#[axum::debug_handler]
pub async fn process_payment(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
    Json(request): Json<ProcessPaymentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let payment = state.payments.process_payment(client_id, request).await.map_err(map_payment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "payment": payment
        })),
    ))
}

pub async fn create_checkout(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let session = state
        .payments
        .create_checkout(client_id, request.appointment_id)
        .await
        .map_err(map_payment_error)?;

    Ok((StatusCode::CREATED, Json(json!(session))))
}

pub async fn execute_checkout(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
    Query(query): Query<ExecuteCheckoutQuery>,
) -> Result<Json<Value>, AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let receipt = state
        .payments
        .execute_checkout(client_id, &query.payment_id, &query.payer_id)
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({
        "success": true,
        "payment": receipt.payment,
        "gateway_state": receipt.gateway_state,
        "simulated": receipt.simulated
    })))
}

pub async fn checkout_status(
    State(state): State<PaymentState>,
    Extension(user): Extension<User>,
    Path(gateway_payment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let client_id = user.require_role(UserRole::Client)?;
    let status = state
        .payments
        .checkout_status(client_id, &gateway_payment_id)
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!(status)))
}

// libs/payment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_METHOD: &str = "paypal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    /// COP
    pub amount: i64,
    pub method: String,
    pub status: PaymentStatus,
    /// `REF-…` for direct payments, the gateway payment id for checkouts.
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[serde(alias = "PENDING", alias = "pendiente", alias = "PENDIENTE")]
    Pending,
    #[serde(alias = "COMPLETED", alias = "completado", alias = "COMPLETADO")]
    Completed,
    #[serde(alias = "FAILED", alias = "fallido", alias = "FALLIDO")]
    Failed,
    #[serde(alias = "REFUNDED", alias = "reembolsado", alias = "REEMBOLSADO")]
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// State name PayPal would report for a payment in this local status.
    pub fn gateway_state(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "approved",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Pending | PaymentStatus::Refunded => "created",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessPaymentRequest {
    #[serde(alias = "cita_id")]
    pub appointment_id: Uuid,
    #[serde(alias = "monto")]
    pub amount: i64,
    #[serde(alias = "metodo_pago", default = "default_method")]
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    #[serde(alias = "cita_id")]
    pub appointment_id: Uuid,
}

/// Query string PayPal appends to the approval redirect.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteCheckoutQuery {
    #[serde(alias = "paymentId")]
    pub payment_id: String,
    #[serde(alias = "PayerID")]
    pub payer_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub payment_id: Uuid,
    pub gateway_payment_id: String,
    pub approval_url: String,
    pub amount_usd: f64,
    pub amount_cop: i64,
    pub simulated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub payment: Payment,
    pub gateway_state: String,
    pub simulated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStatus {
    pub payment_id: Uuid,
    pub gateway_payment_id: String,
    pub local_status: PaymentStatus,
    pub gateway_state: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub simulated: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentHistoryQuery {
    #[serde(alias = "estado")]
    pub status: Option<PaymentStatus>,
}

/// Filters on a professional's received payments. Dates are inclusive UTC days
/// matched against the payment's creation time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    #[serde(alias = "estado")]
    pub status: Option<PaymentStatus>,
    #[serde(alias = "fecha_inicio")]
    pub from: Option<NaiveDate>,
    #[serde(alias = "fecha_fin")]
    pub to: Option<NaiveDate>,
}

impl PaymentFilter {
    /// Half-open `[from, to)` instants; an end past the last representable day is open.
    pub fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let start_of = |date: NaiveDate| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let from = self.from.map(start_of);
        let to = self
            .to
            .and_then(|date| start_of(date).checked_add_signed(Duration::days(1)));
        (from, to)
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        let (from, to) = self.bounds();
        self.status.map_or(true, |s| payment.status == s)
            && from.map_or(true, |from| payment.created_at >= from)
            && to.map_or(true, |to| payment.created_at < to)
    }
}

/// A payment on one of the professional's appointments.
#[derive(Debug, Clone, Serialize)]
pub struct ReceivedPayment {
    #[serde(flatten)]
    pub payment: Payment,
    pub appointment_start: DateTime<Utc>,
    pub concept: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfessionalPaymentStats {
    /// Sum of completed payments, COP.
    pub total_income: i64,
    /// Sum of pending payments, COP.
    pub pending_amount: i64,
    pub completed: usize,
    pub failed: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentStats {
    /// Sum of completed payments, COP.
    pub total_spent: i64,
    pub total_payments: usize,
    pub pending: usize,
    pub completed: usize,
}

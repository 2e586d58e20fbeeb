//! Checkout provider seam. Only the simulated PayPal flow ships; a live
//! client would implement the same trait.

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::PaymentError;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayPayment {
    pub id: String,
    pub approval_url: String,
    pub amount_usd: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment(&self, appointment_id: Uuid, amount_cop: i64) -> Result<GatewayPayment, PaymentError>;

    /// Captures an approved payment and returns the provider's state name.
    async fn execute_payment(&self, gateway_payment_id: &str, payer_id: &str) -> Result<String, PaymentError>;

    fn is_simulated(&self) -> bool;
}

/// COP to USD, rounded to cents.
pub fn cop_to_usd(amount_cop: i64, cop_per_usd: f64) -> f64 {
    if cop_per_usd <= 0.0 {
        return 0.0;
    }
    (amount_cop as f64 / cop_per_usd * 100.0).round() / 100.0
}

pub struct SimulatedPayPalGateway {
    frontend_url: String,
    cop_per_usd: f64,
    mode: String,
}

impl SimulatedPayPalGateway {
    pub const PAYER_ID: &'static str = "SIMULATED-PAYER-ID";

    pub fn new(frontend_url: impl Into<String>, cop_per_usd: f64) -> Self {
        Self {
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
            cop_per_usd,
            mode: "sandbox".to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut gateway = Self::new(config.frontend_url.clone(), config.cop_per_usd);
        gateway.mode = config.paypal_mode.clone();
        gateway
    }

    fn payment_id() -> String {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("PAYID-SIMULATED-{}", &hex[..20])
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPayPalGateway {
    async fn create_payment(&self, appointment_id: Uuid, amount_cop: i64) -> Result<GatewayPayment, PaymentError> {
        let id = Self::payment_id();
        let approval_url = format!(
            "{}/pago-completado?paymentId={}&PayerID={}&cita_id={}",
            self.frontend_url,
            id,
            Self::PAYER_ID,
            appointment_id
        );

        info!("Simulated {} PayPal payment {} for appointment {}", self.mode, id, appointment_id);
        Ok(GatewayPayment {
            id,
            approval_url,
            amount_usd: cop_to_usd(amount_cop, self.cop_per_usd),
        })
    }

    async fn execute_payment(&self, gateway_payment_id: &str, payer_id: &str) -> Result<String, PaymentError> {
        if payer_id.trim().is_empty() {
            return Err(PaymentError::GatewayError("Missing payer id".to_string()));
        }
        debug!("Simulated capture of {} by payer {}", gateway_payment_id, payer_id);
        Ok("approved".to_string())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

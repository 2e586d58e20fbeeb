use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::PaymentError;
use crate::models::{Payment, PaymentFilter, PaymentStatus};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert or update by id.
    async fn save_payment(&self, payment: Payment) -> Result<Payment, PaymentError>;

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, PaymentError>;

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, PaymentError>;

    /// Newest first.
    async fn list_for_client(
        &self,
        client_id: Uuid,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>, PaymentError>;

    async fn completed_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Payment>, PaymentError>;

    /// Payments on any of `appointment_ids`, newest first.
    async fn list_for_appointments(
        &self,
        appointment_ids: Vec<Uuid>,
        filter: PaymentFilter,
    ) -> Result<Vec<Payment>, PaymentError>;
}

#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<HashMap<Uuid, Payment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn save_payment(&self, payment: Payment) -> Result<Payment, PaymentError> {
        self.payments.write().await.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, PaymentError> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, PaymentError> {
        Ok(self.payments.read().await.values().find(|p| p.reference == reference).cloned())
    }

    async fn list_for_client(
        &self,
        client_id: Uuid,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>, PaymentError> {
        let payments = self.payments.read().await;
        let mut result: Vec<Payment> = payments
            .values()
            .filter(|p| p.client_id == client_id)
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn completed_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Payment>, PaymentError> {
        Ok(self
            .payments
            .read()
            .await
            .values()
            .find(|p| p.appointment_id == appointment_id && p.status == PaymentStatus::Completed)
            .cloned())
    }

    async fn list_for_appointments(
        &self,
        appointment_ids: Vec<Uuid>,
        filter: PaymentFilter,
    ) -> Result<Vec<Payment>, PaymentError> {
        let payments = self.payments.read().await;
        let mut result: Vec<Payment> = payments
            .values()
            .filter(|p| appointment_ids.contains(&p.appointment_id) && filter.matches(p))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

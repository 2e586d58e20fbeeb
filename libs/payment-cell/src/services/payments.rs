// libs/payment-cell/src/services/payments.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentFilter};
use appointment_cell::services::KeyedLocks;
use appointment_cell::store::AppointmentStore;
use notification_cell::models::PaymentEvent;
use notification_cell::NotificationService;

use crate::error::PaymentError;
use crate::gateway::PaymentGateway;
use crate::models::{
    CheckoutReceipt, CheckoutSession, CheckoutStatus, Payment, PaymentFilter, PaymentStats, PaymentStatus,
    ProcessPaymentRequest, ProfessionalPaymentStats, ReceivedPayment, DEFAULT_METHOD,
};
use crate::store::PaymentStore;

pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    appointments: Arc<dyn AppointmentStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: Arc<NotificationService>,
    /// Per appointment; guards the already-paid check and the write that follows.
    locks: KeyedLocks,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        appointments: Arc<dyn AppointmentStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self { store, appointments, gateway, notifications, locks: KeyedLocks::new() }
    }

    /// The client's own appointment; someone else's reads as missing.
    async fn owned_appointment(&self, client_id: Uuid, appointment_id: Uuid) -> Result<Appointment, PaymentError> {
        match self.appointments.get_appointment(appointment_id).await? {
            Some(appointment) if appointment.client_id == client_id => Ok(appointment),
            _ => Err(PaymentError::AppointmentNotFound),
        }
    }

    async fn ensure_unpaid(&self, appointment_id: Uuid) -> Result<(), PaymentError> {
        if self.store.completed_for_appointment(appointment_id).await?.is_some() {
            warn!("Appointment {} already has a completed payment", appointment_id);
            return Err(PaymentError::AlreadyPaid);
        }
        Ok(())
    }

    async fn announce_success(&self, payment: &Payment, professional_id: Option<Uuid>) {
        self.notifications
            .payment_succeeded(&PaymentEvent {
                appointment_id: payment.appointment_id,
                client_id: payment.client_id,
                professional_id,
                amount: payment.amount,
                reference: payment.reference.clone(),
            })
            .await;
    }

    /// Records a payment settled outside the checkout flow.
    #[instrument(skip(self, request), fields(appointment_id = %request.appointment_id))]
    pub async fn process_payment(
        &self,
        client_id: Uuid,
        request: ProcessPaymentRequest,
    ) -> Result<Payment, PaymentError> {
        if request.amount <= 0 {
            return Err(PaymentError::ValidationError("Amount must be positive".to_string()));
        }

        let appointment = self.owned_appointment(client_id, request.appointment_id).await?;
        let guard = self.locks.acquire(appointment.id).await;
        self.ensure_unpaid(appointment.id).await?;

        let now = Utc::now();
        let payment = self
            .store
            .save_payment(Payment {
                id: Uuid::new_v4(),
                appointment_id: appointment.id,
                client_id,
                amount: request.amount,
                method: request.method,
                status: PaymentStatus::Completed,
                reference: format!("REF-{}-{}", appointment.id, client_id),
                created_at: now,
                updated_at: now,
            })
            .await?;

        drop(guard);

        info!("Payment {} recorded for appointment {}", payment.id, appointment.id);
        self.announce_success(&payment, Some(appointment.professional_id)).await;
        Ok(payment)
    }

    /// Opens a gateway checkout for the appointment's price.
    #[instrument(skip(self))]
    pub async fn create_checkout(&self, client_id: Uuid, appointment_id: Uuid) -> Result<CheckoutSession, PaymentError> {
        let appointment = self.owned_appointment(client_id, appointment_id).await?;
        let _guard = self.locks.acquire(appointment.id).await;
        self.ensure_unpaid(appointment.id).await?;

        if appointment.price <= 0 {
            return Err(PaymentError::ValidationError("Appointment has no price to pay".to_string()));
        }

        let gateway_payment = self.gateway.create_payment(appointment.id, appointment.price).await?;

        let now = Utc::now();
        let payment = self
            .store
            .save_payment(Payment {
                id: Uuid::new_v4(),
                appointment_id: appointment.id,
                client_id,
                amount: appointment.price,
                method: DEFAULT_METHOD.to_string(),
                status: PaymentStatus::Pending,
                reference: gateway_payment.id.clone(),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Checkout {} opened for appointment {}", gateway_payment.id, appointment.id);
        Ok(CheckoutSession {
            payment_id: payment.id,
            gateway_payment_id: gateway_payment.id,
            approval_url: gateway_payment.approval_url,
            amount_usd: gateway_payment.amount_usd,
            amount_cop: payment.amount,
            simulated: self.gateway.is_simulated(),
        })
    }

    /// Completes a pending checkout after the payer approved it.
    #[instrument(skip(self))]
    pub async fn execute_checkout(
        &self,
        client_id: Uuid,
        gateway_payment_id: &str,
        payer_id: &str,
    ) -> Result<CheckoutReceipt, PaymentError> {
        let appointment_id = self
            .store
            .find_by_reference(gateway_payment_id)
            .await?
            .ok_or(PaymentError::AlreadyProcessed)?
            .appointment_id;

        let guard = self.locks.acquire(appointment_id).await;
        let mut payment = match self.store.find_by_reference(gateway_payment_id).await? {
            Some(p) if p.status == PaymentStatus::Pending => p,
            _ => return Err(PaymentError::AlreadyProcessed),
        };

        let appointment = match self.appointments.get_appointment(payment.appointment_id).await? {
            Some(a) if a.client_id == client_id => a,
            _ => return Err(PaymentError::NotOwner),
        };
        // A second checkout opened for the same appointment may have been captured first.
        self.ensure_unpaid(appointment.id).await?;

        let gateway_state = match self.gateway.execute_payment(gateway_payment_id, payer_id).await {
            Ok(state) => state,
            Err(e) => {
                warn!("Capture of {} failed: {}", gateway_payment_id, e);
                payment.status = PaymentStatus::Failed;
                payment.updated_at = Utc::now();
                let payment = self.store.save_payment(payment).await?;
                drop(guard);
                self.notifications
                    .payment_failed(
                        &PaymentEvent {
                            appointment_id: payment.appointment_id,
                            client_id,
                            professional_id: Some(appointment.professional_id),
                            amount: payment.amount,
                            reference: payment.reference.clone(),
                        },
                        &e.to_string(),
                    )
                    .await;
                return Err(e);
            }
        };

        payment.status = PaymentStatus::Completed;
        payment.updated_at = Utc::now();
        let payment = self.store.save_payment(payment).await?;
        drop(guard);

        info!("Checkout {} completed", gateway_payment_id);
        self.announce_success(&payment, Some(appointment.professional_id)).await;

        Ok(CheckoutReceipt {
            payment,
            gateway_state,
            simulated: self.gateway.is_simulated(),
        })
    }

    pub async fn checkout_status(&self, client_id: Uuid, gateway_payment_id: &str) -> Result<CheckoutStatus, PaymentError> {
        let payment = self
            .store
            .find_by_reference(gateway_payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;

        if payment.client_id != client_id {
            return Err(PaymentError::NotOwner);
        }

        Ok(CheckoutStatus {
            payment_id: payment.id,
            gateway_payment_id: payment.reference.clone(),
            local_status: payment.status,
            gateway_state: payment.status.gateway_state().to_string(),
            amount: payment.amount,
            created_at: payment.created_at,
            simulated: self.gateway.is_simulated(),
        })
    }

    pub async fn get_payment(&self, client_id: Uuid, payment_id: Uuid) -> Result<Payment, PaymentError> {
        match self.store.get_payment(payment_id).await? {
            Some(payment) if payment.client_id == client_id => Ok(payment),
            _ => Err(PaymentError::PaymentNotFound),
        }
    }

    pub async fn history(&self, client_id: Uuid, status: Option<PaymentStatus>) -> Result<Vec<Payment>, PaymentError> {
        self.store.list_for_client(client_id, status).await
    }

    /// Payments on the professional's appointments, newest first.
    pub async fn received(
        &self,
        professional_id: Uuid,
        filter: PaymentFilter,
    ) -> Result<Vec<ReceivedPayment>, PaymentError> {
        let appointments: HashMap<Uuid, Appointment> = self
            .appointments
            .list_for_professional(professional_id, AppointmentFilter::default())
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        if appointments.is_empty() {
            return Ok(Vec::new());
        }

        let payments = self
            .store
            .list_for_appointments(appointments.keys().copied().collect(), filter)
            .await?;

        Ok(payments
            .into_iter()
            .filter_map(|payment| {
                let appointment = appointments.get(&payment.appointment_id)?;
                Some(ReceivedPayment {
                    appointment_start: appointment.start_time,
                    concept: appointment.reason.clone(),
                    payment,
                })
            })
            .collect())
    }

    pub async fn professional_stats(&self, professional_id: Uuid) -> Result<ProfessionalPaymentStats, PaymentError> {
        let received = self.received(professional_id, PaymentFilter::default()).await?;

        let mut stats = ProfessionalPaymentStats { total_count: received.len(), ..Default::default() };
        for ReceivedPayment { payment, .. } in &received {
            match payment.status {
                PaymentStatus::Completed => {
                    stats.completed += 1;
                    stats.total_income += payment.amount;
                }
                PaymentStatus::Pending => stats.pending_amount += payment.amount,
                PaymentStatus::Failed => stats.failed += 1,
                PaymentStatus::Refunded => {}
            }
        }
        Ok(stats)
    }

    pub async fn stats(&self, client_id: Uuid) -> Result<PaymentStats, PaymentError> {
        let payments = self.store.list_for_client(client_id, None).await?;

        let mut stats = PaymentStats { total_payments: payments.len(), ..Default::default() };
        for payment in &payments {
            match payment.status {
                PaymentStatus::Completed => {
                    stats.completed += 1;
                    stats.total_spent += payment.amount;
                }
                PaymentStatus::Pending => stats.pending += 1,
                PaymentStatus::Failed | PaymentStatus::Refunded => {}
            }
        }
        Ok(stats)
    }
}

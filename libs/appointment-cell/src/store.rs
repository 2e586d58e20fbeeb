use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentFilter};

/// Persistence the scheduling kernel reads and writes through.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Pending and confirmed appointments of a professional, ordered by start.
    async fn list_active_appointments(
        &self,
        professional_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Insert or update by id.
    async fn save_appointment(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    /// Newest first.
    async fn list_for_client(
        &self,
        client_id: Uuid,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Oldest first.
    async fn list_for_professional(
        &self,
        professional_id: Uuid,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    /// Every appointment in the system, newest first.
    async fn list_all(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError>;
}

#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn list_active_appointments(
        &self,
        professional_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.professional_id == professional_id && a.status.is_active())
            .filter(|a| Some(a.id) != exclude_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.start_time);
        Ok(result)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn save_appointment(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        self.appointments.write().await.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn list_for_client(
        &self,
        client_id: Uuid,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.client_id == client_id && filter.matches(a))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(result)
    }

    async fn list_for_professional(
        &self,
        professional_id: Uuid,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.professional_id == professional_id && filter.matches(a))
            .cloned()
            .collect();
        result.sort_by_key(|a| a.start_time);
        Ok(result)
    }

    async fn list_all(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> = appointments.values().filter(|a| filter.matches(a)).cloned().collect();
        result.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(result)
    }
}

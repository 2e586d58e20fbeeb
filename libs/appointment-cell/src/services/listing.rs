// libs/appointment-cell/src/services/listing.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentStats, AppointmentStatus, Participant, PatientSummary,
};
use crate::services::clock::Clock;
use crate::store::AppointmentStore;

pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

/// Read-side views over a participant's appointments.
pub struct AppointmentQueryService {
    store: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
}

impl AppointmentQueryService {
    pub fn new(store: Arc<dyn AppointmentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn list(
        &self,
        participant: Participant,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        match participant {
            Participant::Client(id) => self.store.list_for_client(id, filter).await,
            Participant::Professional(id) => self.store.list_for_professional(id, filter).await,
        }
    }

    /// Everything starting on `date` (UTC), in start order.
    pub async fn day_agenda(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let from = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let filter = AppointmentFilter {
            status: None,
            from: Some(from),
            to: from.checked_add_signed(Duration::days(1)),
        };
        self.store.list_for_professional(professional_id, filter).await
    }

    /// Active appointments that have not started yet, soonest first.
    pub async fn upcoming(
        &self,
        participant: Participant,
        limit: Option<usize>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let now = self.clock.now();
        let filter = AppointmentFilter { status: None, from: Some(now), to: None };

        let mut appointments: Vec<Appointment> = self
            .list(participant, filter)
            .await?
            .into_iter()
            .filter(|a| a.status.is_active() && a.start_time > now)
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        appointments.truncate(limit.unwrap_or(DEFAULT_UPCOMING_LIMIT));

        debug!("{} upcoming appointments for {:?}", appointments.len(), participant);
        Ok(appointments)
    }

    /// Admin view over every appointment, newest first.
    pub async fn all(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        self.store.list_all(filter).await
    }

    /// Distinct clients who ever booked with the professional, most recent first.
    pub async fn patients(&self, professional_id: Uuid) -> Result<Vec<PatientSummary>, AppointmentError> {
        let appointments = self
            .store
            .list_for_professional(professional_id, AppointmentFilter::default())
            .await?;

        let mut by_client: HashMap<Uuid, PatientSummary> = HashMap::new();
        for appointment in &appointments {
            by_client
                .entry(appointment.client_id)
                .and_modify(|p| {
                    p.total_appointments += 1;
                    p.last_appointment = p.last_appointment.max(appointment.start_time);
                })
                .or_insert(PatientSummary {
                    client_id: appointment.client_id,
                    total_appointments: 1,
                    last_appointment: appointment.start_time,
                });
        }

        let mut patients: Vec<PatientSummary> = by_client.into_values().collect();
        patients.sort_by(|a, b| b.last_appointment.cmp(&a.last_appointment));
        Ok(patients)
    }

    pub async fn stats(&self, participant: Participant) -> Result<AppointmentStats, AppointmentError> {
        let now = self.clock.now();
        let appointments = self.list(participant, AppointmentFilter::default()).await?;

        let mut stats = AppointmentStats { total: appointments.len(), ..Default::default() };
        for appointment in &appointments {
            match appointment.status {
                AppointmentStatus::Pending => stats.pending += 1,
                AppointmentStatus::Confirmed => stats.confirmed += 1,
                AppointmentStatus::Cancelled => stats.cancelled += 1,
                AppointmentStatus::Completed => stats.completed += 1,
            }
            if appointment.status.is_active() && appointment.start_time > now {
                stats.upcoming += 1;
            }
        }
        Ok(stats)
    }
}

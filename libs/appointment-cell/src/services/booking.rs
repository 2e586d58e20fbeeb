// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::models::{AppointmentEvent, CancelledBy};
use notification_cell::NotificationService;
use professional_cell::store::{AvailabilityStore, ProfessionalDirectory};
use shared_config::AppConfig;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, ConflictCheckResponse,
};
use crate::services::clock::{Clock, SystemClock};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::locks::KeyedLocks;
use crate::services::slots::{enumerate_slots, format_slot, windows_for_date, SlotGrid};
use crate::store::AppointmentStore;

pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// The scheduling kernel: conflict-checked booking, rescheduling, status
/// transitions and free-slot lookup.
pub struct AppointmentBookingService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn ProfessionalDirectory>,
    availability: Arc<dyn AvailabilityStore>,
    notifications: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    locks: KeyedLocks,
    grid: SlotGrid,
}

impl AppointmentBookingService {
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn ProfessionalDirectory>,
        availability: Arc<dyn AvailabilityStore>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            conflict_service: ConflictDetectionService::new(Arc::clone(&store)),
            lifecycle_service: AppointmentLifecycleService::new(config.max_appointment_minutes),
            locks: KeyedLocks::new(),
            grid: SlotGrid::from_config(config),
            clock: Arc::new(SystemClock),
            store,
            directory,
            availability,
            notifications,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_slot_grid(mut self, grid: SlotGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn store(&self) -> Arc<dyn AppointmentStore> {
        Arc::clone(&self.store)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    // ==============================================================================
    // QUERIES
    // ==============================================================================

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store.get_appointment(id).await?.ok_or(AppointmentError::NotFound)
    }

    pub async fn can_book(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        self.lifecycle_service.validate_duration(duration_minutes)?;
        self.conflict_service
            .can_book(professional_id, start_time, duration_minutes, exclude_id)
            .await
    }

    pub async fn check_conflicts(
        &self,
        professional_id: Uuid,
        start_time: DateTime<Utc>,
        duration_minutes: i32,
        exclude_id: Option<Uuid>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        self.lifecycle_service.validate_duration(duration_minutes)?;
        self.conflict_service
            .check_conflicts(professional_id, start_time, duration_minutes, exclude_id)
            .await
    }

    /// Free `HH:MM` start times (UTC) on `date` for an appointment of `duration_minutes`.
    pub async fn free_slots(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        duration_minutes: i32,
    ) -> Result<Vec<String>, AppointmentError> {
        self.lifecycle_service.validate_duration(duration_minutes)?;
        self.ensure_professional(professional_id).await?;

        let blocks = self.availability.list_availability(professional_id, None).await?;
        let windows = windows_for_date(&blocks, date, &self.grid);
        let existing = self.store.list_active_appointments(professional_id, None).await?;

        let slots = enumerate_slots(date, &windows, duration_minutes, &existing, &self.grid);
        debug!("{} free slots for professional {} on {}", slots.len(), professional_id, date);

        Ok(slots.into_iter().map(format_slot).collect())
    }

    // ==============================================================================
    // WRITES
    // ==============================================================================

    #[instrument(skip(self, request), fields(professional_id = %request.professional_id))]
    pub async fn create_appointment(
        &self,
        client_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for client {} at {}", client_id, request.start_time);

        let professional = self
            .directory
            .get_professional(request.professional_id)
            .await?
            .ok_or(AppointmentError::ProfessionalNotFound)?;

        let now = self.clock.now();
        self.lifecycle_service.validate_start_time(request.start_time, now)?;
        self.lifecycle_service.validate_duration(request.duration_minutes)?;

        let price = request.price.or(professional.consultation_price).unwrap_or(0);
        if price < 0 {
            return Err(AppointmentError::ValidationError("Price cannot be negative".to_string()));
        }

        let guard = self.locks.acquire(request.professional_id).await;

        if !self
            .conflict_service
            .can_book(request.professional_id, request.start_time, request.duration_minutes, None)
            .await?
        {
            warn!("Rejected booking for professional {} at {}: slot taken",
                  request.professional_id, request.start_time);
            return Err(AppointmentError::ConflictDetected);
        }

        let appointment = self
            .store
            .save_appointment(Appointment {
                id: Uuid::new_v4(),
                client_id,
                professional_id: request.professional_id,
                start_time: request.start_time,
                duration_minutes: request.duration_minutes,
                status: AppointmentStatus::Pending,
                reason: request.reason,
                notes: request.notes,
                price,
                created_at: now,
                updated_at: now,
            })
            .await?;
        drop(guard);

        info!("Appointment {} booked with professional {}", appointment.id, appointment.professional_id);
        self.notifications.appointment_booked(&event(&appointment, None)).await;

        Ok(appointment)
    }

    /// Moves an active appointment. Status is left as it was.
    #[instrument(skip(self))]
    pub async fn reschedule_appointment(
        &self,
        id: Uuid,
        new_start_time: DateTime<Utc>,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(id).await?;
        let now = self.clock.now();
        self.lifecycle_service.validate_start_time(new_start_time, now)?;

        let guard = self.locks.acquire(current.professional_id).await;

        // Re-read under the lock so a concurrent cancel is seen.
        let mut appointment = self.get_appointment(id).await?;
        if appointment.status.is_terminal() {
            return Err(AppointmentError::NotReschedulable(appointment.status));
        }

        if !self
            .conflict_service
            .can_book(appointment.professional_id, new_start_time, appointment.duration_minutes, Some(id))
            .await?
        {
            warn!("Rejected reschedule of {} to {}: slot taken", id, new_start_time);
            return Err(AppointmentError::ConflictDetected);
        }

        let previous_start = appointment.start_time;
        appointment.start_time = new_start_time;
        appointment.updated_at = now;
        let appointment = self.store.save_appointment(appointment).await?;
        drop(guard);

        info!("Appointment {} rescheduled from {} to {}", id, previous_start, new_start_time);
        self.notifications
            .appointment_rescheduled(&event(&appointment, Some(previous_start)))
            .await;

        Ok(appointment)
    }

    pub async fn cancel_appointment(&self, id: Uuid, by: CancelledBy) -> Result<Appointment, AppointmentError> {
        let appointment = self.transition(id, AppointmentStatus::Cancelled).await?;
        self.notifications.appointment_cancelled(&event(&appointment, None), by).await;
        Ok(appointment)
    }

    pub async fn confirm_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self.transition(id, AppointmentStatus::Confirmed).await?;
        self.notifications.appointment_confirmed(&event(&appointment, None)).await;
        Ok(appointment)
    }

    pub async fn complete_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(id, AppointmentStatus::Completed).await
    }

    /// Status change requested from the professional's dashboard.
    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Result<Appointment, AppointmentError> {
        match status {
            AppointmentStatus::Confirmed => self.confirm_appointment(id).await,
            AppointmentStatus::Completed => self.complete_appointment(id).await,
            AppointmentStatus::Cancelled => self.cancel_appointment(id, CancelledBy::Professional).await,
            AppointmentStatus::Pending => {
                let current = self.get_appointment(id).await?;
                Err(AppointmentError::InvalidStatusTransition { from: current.status, to: status })
            }
        }
    }

    #[instrument(skip(self))]
    async fn transition(&self, id: Uuid, to: AppointmentStatus) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(id).await?;
        let _guard = self.locks.acquire(current.professional_id).await;

        let mut appointment = self.get_appointment(id).await?;
        self.lifecycle_service.validate_status_transition(appointment.status, to)?;

        let from = appointment.status;
        appointment.status = to;
        appointment.updated_at = self.clock.now();
        let appointment = self.store.save_appointment(appointment).await?;

        info!("Appointment {} moved from {} to {}", id, from, to);
        Ok(appointment)
    }

    async fn ensure_professional(&self, professional_id: Uuid) -> Result<(), AppointmentError> {
        match self.directory.get_professional(professional_id).await? {
            Some(_) => Ok(()),
            None => Err(AppointmentError::ProfessionalNotFound),
        }
    }
}

fn event(appointment: &Appointment, previous_start_time: Option<DateTime<Utc>>) -> AppointmentEvent {
    AppointmentEvent {
        appointment_id: appointment.id,
        client_id: appointment.client_id,
        professional_id: appointment.professional_id,
        start_time: appointment.start_time,
        previous_start_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockAppointmentStore;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};
    use notification_cell::store::InMemoryNotificationStore;
    use professional_cell::models::Professional;
    use professional_cell::store::{InMemoryAvailabilityStore, InMemoryProfessionalDirectory};
    use crate::services::clock::FixedClock;

    async fn directory_with(professional_id: Uuid) -> Arc<InMemoryProfessionalDirectory> {
        let directory = Arc::new(InMemoryProfessionalDirectory::new());
        directory
            .save_professional(Professional {
                id: professional_id,
                full_name: "Ana Ruiz".into(),
                specialty: "Psicología".into(),
                description: None,
                experience_years: None,
                consultation_price: Some(100_000),
                address: None,
                city: None,
                photo_url: None,
                rating: 0.0,
                review_count: 0,
                license: None,
                languages: vec![],
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        directory
    }

    #[tokio::test]
    async fn store_failure_during_conflict_check_is_database_error() {
        let pro = Uuid::new_v4();
        let mut store = MockAppointmentStore::new();
        store
            .expect_list_active_appointments()
            .returning(|_, _| Err(AppointmentError::DatabaseError("timeout".into())));
        store.expect_save_appointment().never();

        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let service = AppointmentBookingService::new(
            &AppConfig::default(),
            Arc::new(store),
            directory_with(pro).await,
            Arc::new(InMemoryAvailabilityStore::new()),
            Arc::new(NotificationService::new(Arc::new(InMemoryNotificationStore::new()))),
        )
        .with_clock(Arc::new(FixedClock::new(now)));

        let request = BookAppointmentRequest {
            professional_id: pro,
            start_time: now + Duration::days(1),
            duration_minutes: 60,
            reason: None,
            notes: None,
            price: None,
        };

        assert_matches!(
            service.create_appointment(Uuid::new_v4(), request).await,
            Err(AppointmentError::DatabaseError(_))
        );
    }
}

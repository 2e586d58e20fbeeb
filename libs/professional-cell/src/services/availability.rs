use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::{
    AvailabilityBlock, CreateAvailabilityRequest, DayOfWeek, ProfessionalError,
    UpdateAvailabilityRequest, WeeklyScheduleRequest,
};
use crate::store::AvailabilityStore;

pub fn validate_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ProfessionalError> {
    if start >= end {
        return Err(ProfessionalError::InvalidTimeRange { start, end });
    }
    Ok(())
}

pub struct AvailabilityService {
    store: Arc<dyn AvailabilityStore>,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn AvailabilityStore> {
        Arc::clone(&self.store)
    }

    pub async fn list_blocks(
        &self,
        professional_id: Uuid,
        day_of_week: Option<DayOfWeek>,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError> {
        debug!("Listing availability for professional {} (day: {:?})", professional_id, day_of_week);
        self.store.list_availability(professional_id, day_of_week).await
    }

    #[instrument(skip(self))]
    pub async fn create_block(
        &self,
        professional_id: Uuid,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilityBlock, ProfessionalError> {
        validate_time_range(request.start_time, request.end_time)?;

        let block = AvailabilityBlock::new(
            professional_id,
            request.day_of_week,
            request.start_time,
            request.end_time,
        );
        let block = self.store.save_availability(block).await?;

        info!("Availability block {} created for professional {}", block.id, professional_id);
        Ok(block)
    }

    #[instrument(skip(self))]
    pub async fn update_block(
        &self,
        professional_id: Uuid,
        block_id: Uuid,
        request: UpdateAvailabilityRequest,
    ) -> Result<AvailabilityBlock, ProfessionalError> {
        let mut block = self.owned_block(professional_id, block_id).await?;

        if let Some(day) = request.day_of_week {
            block.day_of_week = day;
        }
        if let Some(start) = request.start_time {
            block.start_time = start;
        }
        if let Some(end) = request.end_time {
            block.end_time = end;
        }
        validate_time_range(block.start_time, block.end_time)?;

        let block = self.store.save_availability(block).await?;
        info!("Availability block {} updated", block.id);
        Ok(block)
    }

    #[instrument(skip(self))]
    pub async fn delete_block(&self, professional_id: Uuid, block_id: Uuid) -> Result<(), ProfessionalError> {
        self.owned_block(professional_id, block_id).await?;

        if !self.store.delete_availability(block_id).await? {
            return Err(ProfessionalError::AvailabilityNotFound);
        }
        info!("Availability block {} deleted", block_id);
        Ok(())
    }

    /// Replaces the whole weekly schedule. Days marked inactive end up with no blocks.
    #[instrument(skip(self, request))]
    pub async fn replace_weekly_schedule(
        &self,
        professional_id: Uuid,
        request: WeeklyScheduleRequest,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError> {
        let mut blocks = Vec::new();

        for entry in request.days.into_iter().filter(|e| e.active) {
            let (start, end) = match (entry.start_time, entry.end_time) {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    return Err(ProfessionalError::ValidationError(format!(
                        "Active day {} needs a start and end time",
                        entry.day_of_week
                    )))
                }
            };
            validate_time_range(start, end)?;
            blocks.push(AvailabilityBlock::new(professional_id, entry.day_of_week, start, end));
        }

        let stored = self.store.replace_weekly_schedule(professional_id, blocks).await?;
        info!("Weekly schedule replaced for professional {} ({} blocks)", professional_id, stored.len());
        Ok(stored)
    }

    async fn owned_block(&self, professional_id: Uuid, block_id: Uuid) -> Result<AvailabilityBlock, ProfessionalError> {
        let block = self
            .store
            .get_availability(block_id)
            .await?
            .ok_or(ProfessionalError::AvailabilityNotFound)?;

        if block.professional_id != professional_id {
            warn!("Professional {} tried to modify block {} owned by {}",
                  professional_id, block_id, block.professional_id);
            return Err(ProfessionalError::NotOwner);
        }
        Ok(block)
    }
}

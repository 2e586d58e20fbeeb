use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::models::{Professional, ProfessionalError, ProfessionalSearchQuery, UpsertProfessionalRequest};
use crate::store::ProfessionalDirectory;

pub struct ProfessionalService {
    directory: Arc<dyn ProfessionalDirectory>,
}

impl ProfessionalService {
    pub fn new(directory: Arc<dyn ProfessionalDirectory>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> Arc<dyn ProfessionalDirectory> {
        Arc::clone(&self.directory)
    }

    pub async fn get_professional(&self, id: Uuid) -> Result<Professional, ProfessionalError> {
        debug!("Fetching professional {}", id);
        self.directory
            .get_professional(id)
            .await?
            .ok_or(ProfessionalError::NotFound)
    }

    pub async fn search(&self, query: ProfessionalSearchQuery) -> Result<Vec<Professional>, ProfessionalError> {
        debug!("Searching professionals: {:?}", query);
        self.directory.search_professionals(query).await
    }

    pub async fn list_specialties(&self) -> Result<Vec<String>, ProfessionalError> {
        let all = self.directory.search_professionals(ProfessionalSearchQuery::default()).await?;
        let specialties: BTreeSet<String> = all
            .into_iter()
            .map(|p| p.specialty.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(specialties.into_iter().collect())
    }

    pub async fn list_cities(&self) -> Result<Vec<String>, ProfessionalError> {
        let all = self.directory.search_professionals(ProfessionalSearchQuery::default()).await?;
        let cities: BTreeSet<String> = all
            .into_iter()
            .filter_map(|p| p.city)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Ok(cities.into_iter().collect())
    }

    /// Creates or updates the caller's public profile. Rating data is kept as stored.
    #[instrument(skip(self, request))]
    pub async fn upsert_profile(
        &self,
        professional_id: Uuid,
        request: UpsertProfessionalRequest,
    ) -> Result<Professional, ProfessionalError> {
        if request.full_name.trim().is_empty() || request.specialty.trim().is_empty() {
            return Err(ProfessionalError::ValidationError(
                "full_name and specialty are required".to_string(),
            ));
        }
        if matches!(request.consultation_price, Some(price) if price < 0) {
            return Err(ProfessionalError::ValidationError(
                "consultation_price cannot be negative".to_string(),
            ));
        }

        let existing = self.directory.get_professional(professional_id).await?;
        let (rating, review_count, created_at) = existing
            .as_ref()
            .map(|p| (p.rating, p.review_count, p.created_at))
            .unwrap_or((0.0, 0, Utc::now()));

        let professional = Professional {
            id: professional_id,
            full_name: request.full_name.trim().to_string(),
            specialty: request.specialty.trim().to_string(),
            description: request.description,
            experience_years: request.experience_years,
            consultation_price: request.consultation_price,
            address: request.address,
            city: request.city,
            photo_url: request.photo_url,
            rating,
            review_count,
            license: request.license,
            languages: request.languages,
            created_at,
        };

        let saved = self.directory.save_professional(professional).await?;
        info!("Profile saved for professional {} (new: {})", professional_id, existing.is_none());
        Ok(saved)
    }
}

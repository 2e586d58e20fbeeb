use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    AvailabilityBlock, DayOfWeek, Favorite, Professional, ProfessionalError, ProfessionalSearchQuery,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Blocks for a professional, optionally restricted to one day, ordered by day then start.
    async fn list_availability(
        &self,
        professional_id: Uuid,
        day_of_week: Option<DayOfWeek>,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError>;

    async fn get_availability(&self, id: Uuid) -> Result<Option<AvailabilityBlock>, ProfessionalError>;

    async fn save_availability(&self, block: AvailabilityBlock) -> Result<AvailabilityBlock, ProfessionalError>;

    async fn delete_availability(&self, id: Uuid) -> Result<bool, ProfessionalError>;

    /// Drops every block of the professional and stores `blocks` in their place.
    async fn replace_weekly_schedule(
        &self,
        professional_id: Uuid,
        blocks: Vec<AvailabilityBlock>,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfessionalDirectory: Send + Sync {
    async fn get_professional(&self, id: Uuid) -> Result<Option<Professional>, ProfessionalError>;

    async fn search_professionals(
        &self,
        query: ProfessionalSearchQuery,
    ) -> Result<Vec<Professional>, ProfessionalError>;

    async fn save_professional(&self, professional: Professional) -> Result<Professional, ProfessionalError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn list_favorites(&self, client_id: Uuid) -> Result<Vec<Favorite>, ProfessionalError>;

    async fn find_favorite(
        &self,
        client_id: Uuid,
        professional_id: Uuid,
    ) -> Result<Option<Favorite>, ProfessionalError>;

    async fn save_favorite(&self, favorite: Favorite) -> Result<Favorite, ProfessionalError>;

    async fn delete_favorite(&self, id: Uuid) -> Result<bool, ProfessionalError>;
}

pub(crate) fn sort_blocks(blocks: &mut [AvailabilityBlock]) {
    blocks.sort_by_key(|b| (b.day_of_week, b.start_time, b.end_time));
}

// ==============================================================================
// IN-MEMORY STORES
// ==============================================================================

#[derive(Default)]
pub struct InMemoryAvailabilityStore {
    blocks: RwLock<HashMap<Uuid, AvailabilityBlock>>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn list_availability(
        &self,
        professional_id: Uuid,
        day_of_week: Option<DayOfWeek>,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError> {
        let blocks = self.blocks.read().await;
        let mut result: Vec<AvailabilityBlock> = blocks
            .values()
            .filter(|b| b.professional_id == professional_id)
            .filter(|b| day_of_week.map_or(true, |day| b.day_of_week == day))
            .cloned()
            .collect();
        sort_blocks(&mut result);
        Ok(result)
    }

    async fn get_availability(&self, id: Uuid) -> Result<Option<AvailabilityBlock>, ProfessionalError> {
        Ok(self.blocks.read().await.get(&id).cloned())
    }

    async fn save_availability(&self, block: AvailabilityBlock) -> Result<AvailabilityBlock, ProfessionalError> {
        self.blocks.write().await.insert(block.id, block.clone());
        Ok(block)
    }

    async fn delete_availability(&self, id: Uuid) -> Result<bool, ProfessionalError> {
        Ok(self.blocks.write().await.remove(&id).is_some())
    }

    async fn replace_weekly_schedule(
        &self,
        professional_id: Uuid,
        mut new_blocks: Vec<AvailabilityBlock>,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError> {
        let mut blocks = self.blocks.write().await;
        blocks.retain(|_, b| b.professional_id != professional_id);
        for block in &new_blocks {
            blocks.insert(block.id, block.clone());
        }
        sort_blocks(&mut new_blocks);
        Ok(new_blocks)
    }
}

#[derive(Default)]
pub struct InMemoryProfessionalDirectory {
    professionals: RwLock<HashMap<Uuid, Professional>>,
}

impl InMemoryProfessionalDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.map_or(false, |h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// Case-insensitive substring filter shared with the Supabase directory's `ilike`.
pub fn matches_search(professional: &Professional, query: &ProfessionalSearchQuery) -> bool {
    query.specialty.as_deref().map_or(true, |s| contains_ci(Some(&professional.specialty), s))
        && query.city.as_deref().map_or(true, |c| contains_ci(professional.city.as_deref(), c))
        && query.name.as_deref().map_or(true, |n| contains_ci(Some(&professional.full_name), n))
}

#[async_trait]
impl ProfessionalDirectory for InMemoryProfessionalDirectory {
    async fn get_professional(&self, id: Uuid) -> Result<Option<Professional>, ProfessionalError> {
        Ok(self.professionals.read().await.get(&id).cloned())
    }

    async fn search_professionals(
        &self,
        query: ProfessionalSearchQuery,
    ) -> Result<Vec<Professional>, ProfessionalError> {
        let professionals = self.professionals.read().await;
        let mut result: Vec<Professional> = professionals
            .values()
            .filter(|p| matches_search(p, &query))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.full_name.cmp(&b.full_name))
        });
        if let Some(limit) = query.limit {
            result.truncate(limit);
        }
        Ok(result)
    }

    async fn save_professional(&self, professional: Professional) -> Result<Professional, ProfessionalError> {
        self.professionals.write().await.insert(professional.id, professional.clone());
        Ok(professional)
    }
}

#[derive(Default)]
pub struct InMemoryFavoriteStore {
    favorites: RwLock<HashMap<Uuid, Favorite>>,
}

impl InMemoryFavoriteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoriteStore for InMemoryFavoriteStore {
    async fn list_favorites(&self, client_id: Uuid) -> Result<Vec<Favorite>, ProfessionalError> {
        let favorites = self.favorites.read().await;
        let mut result: Vec<Favorite> = favorites
            .values()
            .filter(|f| f.client_id == client_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn find_favorite(
        &self,
        client_id: Uuid,
        professional_id: Uuid,
    ) -> Result<Option<Favorite>, ProfessionalError> {
        let favorites = self.favorites.read().await;
        Ok(favorites
            .values()
            .find(|f| f.client_id == client_id && f.professional_id == professional_id)
            .cloned())
    }

    async fn save_favorite(&self, favorite: Favorite) -> Result<Favorite, ProfessionalError> {
        self.favorites.write().await.insert(favorite.id, favorite.clone());
        Ok(favorite)
    }

    async fn delete_favorite(&self, id: Uuid) -> Result<bool, ProfessionalError> {
        Ok(self.favorites.write().await.remove(&id).is_some())
    }
}

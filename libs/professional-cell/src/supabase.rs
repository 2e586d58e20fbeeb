//! PostgREST-backed stores over the `professionals`, `availability_blocks` and `favorites` tables.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::{representation_headers, upsert_headers, SupabaseClient};

use crate::models::{
    AvailabilityBlock, DayOfWeek, Favorite, Professional, ProfessionalError, ProfessionalSearchQuery,
};
use crate::store::{sort_blocks, AvailabilityStore, FavoriteStore, ProfessionalDirectory};

async fn select<T: DeserializeOwned>(supabase: &SupabaseClient, path: &str) -> Result<Vec<T>, ProfessionalError> {
    let rows: Vec<T> = supabase
        .request(Method::GET, path, Some(supabase.api_key()), None)
        .await?;
    Ok(rows)
}

async fn write<T: DeserializeOwned>(
    supabase: &SupabaseClient,
    method: Method,
    path: &str,
    body: Option<Value>,
    upsert: bool,
) -> Result<Vec<T>, ProfessionalError> {
    let headers = if upsert { upsert_headers() } else { representation_headers() };
    let rows: Vec<T> = supabase
        .request_with_headers(method, path, Some(supabase.api_key()), body, Some(headers))
        .await?;
    Ok(rows)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ProfessionalError> {
    serde_json::to_value(value).map_err(|e| ProfessionalError::DatabaseError(e.to_string()))
}

fn first_row<T>(rows: Vec<T>) -> Result<T, ProfessionalError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| ProfessionalError::DatabaseError("Write returned no rows".to_string()))
}

pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAvailabilityStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn list_availability(
        &self,
        professional_id: Uuid,
        day_of_week: Option<DayOfWeek>,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError> {
        let mut path = format!("/rest/v1/availability_blocks?professional_id=eq.{}", professional_id);
        if let Some(day) = day_of_week {
            path.push_str(&format!("&day_of_week=eq.{}", day));
        }
        path.push_str("&order=start_time.asc");

        let mut blocks: Vec<AvailabilityBlock> = select(&self.supabase, &path).await?;
        sort_blocks(&mut blocks);
        debug!("Loaded {} availability blocks for professional {}", blocks.len(), professional_id);
        Ok(blocks)
    }

    async fn get_availability(&self, id: Uuid) -> Result<Option<AvailabilityBlock>, ProfessionalError> {
        let path = format!("/rest/v1/availability_blocks?id=eq.{}", id);
        let rows: Vec<AvailabilityBlock> = select(&self.supabase, &path).await?;
        Ok(rows.into_iter().next())
    }

    async fn save_availability(&self, block: AvailabilityBlock) -> Result<AvailabilityBlock, ProfessionalError> {
        let rows = write(
            &self.supabase,
            Method::POST,
            "/rest/v1/availability_blocks",
            Some(to_json(&block)?),
            true,
        ).await?;
        first_row(rows)
    }

    async fn delete_availability(&self, id: Uuid) -> Result<bool, ProfessionalError> {
        let path = format!("/rest/v1/availability_blocks?id=eq.{}", id);
        let rows: Vec<Value> = write(&self.supabase, Method::DELETE, &path, None, false).await?;
        Ok(!rows.is_empty())
    }

    async fn replace_weekly_schedule(
        &self,
        professional_id: Uuid,
        blocks: Vec<AvailabilityBlock>,
    ) -> Result<Vec<AvailabilityBlock>, ProfessionalError> {
        let path = format!("/rest/v1/availability_blocks?professional_id=eq.{}", professional_id);
        let _: Vec<Value> = write(&self.supabase, Method::DELETE, &path, None, false).await?;

        if blocks.is_empty() {
            return Ok(blocks);
        }

        let mut stored: Vec<AvailabilityBlock> = write(
            &self.supabase,
            Method::POST,
            "/rest/v1/availability_blocks",
            Some(to_json(&blocks)?),
            false,
        ).await?;
        sort_blocks(&mut stored);
        Ok(stored)
    }
}

pub struct SupabaseProfessionalDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseProfessionalDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

fn ilike(column: &str, value: &str) -> String {
    format!("&{}=ilike.{}", column, urlencoding::encode(&format!("*{}*", value.trim())))
}

#[async_trait]
impl ProfessionalDirectory for SupabaseProfessionalDirectory {
    async fn get_professional(&self, id: Uuid) -> Result<Option<Professional>, ProfessionalError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", id);
        let rows: Vec<Professional> = select(&self.supabase, &path).await?;
        Ok(rows.into_iter().next())
    }

    async fn search_professionals(
        &self,
        query: ProfessionalSearchQuery,
    ) -> Result<Vec<Professional>, ProfessionalError> {
        let mut path = "/rest/v1/professionals?select=*".to_string();
        if let Some(specialty) = &query.specialty {
            path.push_str(&ilike("specialty", specialty));
        }
        if let Some(city) = &query.city {
            path.push_str(&ilike("city", city));
        }
        if let Some(name) = &query.name {
            path.push_str(&ilike("full_name", name));
        }
        path.push_str("&order=rating.desc,full_name.asc");
        if let Some(limit) = query.limit {
            path.push_str(&format!("&limit={}", limit));
        }

        select(&self.supabase, &path).await
    }

    async fn save_professional(&self, professional: Professional) -> Result<Professional, ProfessionalError> {
        let rows = write(
            &self.supabase,
            Method::POST,
            "/rest/v1/professionals",
            Some(to_json(&professional)?),
            true,
        ).await?;
        first_row(rows)
    }
}

pub struct SupabaseFavoriteStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseFavoriteStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl FavoriteStore for SupabaseFavoriteStore {
    async fn list_favorites(&self, client_id: Uuid) -> Result<Vec<Favorite>, ProfessionalError> {
        let path = format!("/rest/v1/favorites?client_id=eq.{}&order=created_at.desc", client_id);
        select(&self.supabase, &path).await
    }

    async fn find_favorite(
        &self,
        client_id: Uuid,
        professional_id: Uuid,
    ) -> Result<Option<Favorite>, ProfessionalError> {
        let path = format!(
            "/rest/v1/favorites?client_id=eq.{}&professional_id=eq.{}",
            client_id, professional_id
        );
        let rows: Vec<Favorite> = select(&self.supabase, &path).await?;
        Ok(rows.into_iter().next())
    }

    async fn save_favorite(&self, favorite: Favorite) -> Result<Favorite, ProfessionalError> {
        let body = json!({
            "id": favorite.id,
            "client_id": favorite.client_id,
            "professional_id": favorite.professional_id,
            "created_at": favorite.created_at.to_rfc3339(),
        });
        let rows = write(&self.supabase, Method::POST, "/rest/v1/favorites", Some(body), false).await?;
        first_row(rows)
    }

    async fn delete_favorite(&self, id: Uuid) -> Result<bool, ProfessionalError> {
        let path = format!("/rest/v1/favorites?id=eq.{}", id);
        let rows: Vec<Value> = write(&self.supabase, Method::DELETE, &path, None, false).await?;
        Ok(!rows.is_empty())
    }
}

//! `appointments` table over PostgREST.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::{upsert_headers, SupabaseClient};

use crate::models::{Appointment, AppointmentError, AppointmentFilter};
use crate::store::AppointmentStore;

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let rows: Vec<Appointment> = self.supabase
            .request(Method::GET, path, Some(self.supabase.api_key()), None)
            .await?;
        Ok(rows)
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    urlencoding::encode(&t.to_rfc3339_opts(SecondsFormat::Secs, true)).into_owned()
}

fn filter_params(filter: &AppointmentFilter) -> String {
    let mut params = String::new();
    if let Some(status) = filter.status {
        params.push_str(&format!("&status=eq.{}", status));
    }
    if let Some(from) = filter.from {
        params.push_str(&format!("&start_time=gte.{}", timestamp(from)));
    }
    if let Some(to) = filter.to {
        params.push_str(&format!("&start_time=lt.{}", timestamp(to)));
    }
    params
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn list_active_appointments(
        &self,
        professional_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&status=in.(pending,confirmed)",
            professional_id
        );
        if let Some(exclude) = exclude_id {
            path.push_str(&format!("&id=neq.{}", exclude));
        }
        path.push_str("&order=start_time.asc");

        let appointments = self.fetch(&path).await?;
        debug!("Professional {} has {} active appointments", professional_id, appointments.len());
        Ok(appointments)
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let rows = self.fetch(&format!("/rest/v1/appointments?id=eq.{}", id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn save_appointment(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let body = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let rows: Vec<Appointment> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(self.supabase.api_key()),
            Some(body),
            Some(upsert_headers()),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to save appointment".to_string()))
    }

    async fn list_for_client(
        &self,
        client_id: Uuid,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?client_id=eq.{}{}&order=start_time.desc",
            client_id,
            filter_params(&filter)
        );
        self.fetch(&path).await
    }

    async fn list_for_professional(
        &self,
        professional_id: Uuid,
        filter: AppointmentFilter,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}{}&order=start_time.asc",
            professional_id,
            filter_params(&filter)
        );
        self.fetch(&path).await
    }

    async fn list_all(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?select=*{}&order=start_time.desc", filter_params(&filter));
        self.fetch(&path).await
    }
}

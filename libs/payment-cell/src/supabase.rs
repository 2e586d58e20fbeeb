//! `payments` table over PostgREST.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use uuid::Uuid;

use shared_database::supabase::{upsert_headers, SupabaseClient};

use crate::error::PaymentError;
use crate::models::{Payment, PaymentFilter, PaymentStatus};
use crate::store::PaymentStore;

pub struct SupabasePaymentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePaymentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Payment>, PaymentError> {
        let rows: Vec<Payment> = self.supabase
            .request(Method::GET, path, Some(self.supabase.api_key()), None)
            .await?;
        Ok(rows)
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    urlencoding::encode(&t.to_rfc3339_opts(SecondsFormat::Secs, true)).into_owned()
}

#[async_trait]
impl PaymentStore for SupabasePaymentStore {
    async fn save_payment(&self, payment: Payment) -> Result<Payment, PaymentError> {
        let body = serde_json::to_value(&payment).map_err(|e| PaymentError::DatabaseError(e.to_string()))?;

        let rows: Vec<Payment> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/payments",
            Some(self.supabase.api_key()),
            Some(body),
            Some(upsert_headers()),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PaymentError::DatabaseError("Failed to save payment".to_string()))
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, PaymentError> {
        Ok(self.fetch(&format!("/rest/v1/payments?id=eq.{}", id)).await?.into_iter().next())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, PaymentError> {
        let path = format!("/rest/v1/payments?reference=eq.{}&limit=1", urlencoding::encode(reference));
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn list_for_client(
        &self,
        client_id: Uuid,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>, PaymentError> {
        let mut path = format!("/rest/v1/payments?client_id=eq.{}", client_id);
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        path.push_str("&order=created_at.desc");
        self.fetch(&path).await
    }

    async fn completed_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Payment>, PaymentError> {
        let path = format!(
            "/rest/v1/payments?appointment_id=eq.{}&status=eq.completed&limit=1",
            appointment_id
        );
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn list_for_appointments(
        &self,
        appointment_ids: Vec<Uuid>,
        filter: PaymentFilter,
    ) -> Result<Vec<Payment>, PaymentError> {
        if appointment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = appointment_ids.iter().map(Uuid::to_string).collect();
        let mut path = format!("/rest/v1/payments?appointment_id=in.({})", ids.join(","));
        if let Some(status) = filter.status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        let (from, to) = filter.bounds();
        if let Some(from) = from {
            path.push_str(&format!("&created_at=gte.{}", timestamp(from)));
        }
        if let Some(to) = to {
            path.push_str(&format!("&created_at=lt.{}", timestamp(to)));
        }
        path.push_str("&order=created_at.desc");
        self.fetch(&path).await
    }
}

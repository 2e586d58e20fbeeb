use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::error::NotificationError;
use crate::models::Notification;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification, NotificationError>;

    /// Newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, NotificationError>;

    async fn count_unread(&self, user_id: Uuid) -> Result<usize, NotificationError>;

    /// Returns false when the user has no such notification.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, NotificationError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize, NotificationError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, NotificationError>;
}

#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, notification: Notification) -> Result<Notification, NotificationError> {
        self.notifications.write().await.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, NotificationError> {
        let notifications = self.notifications.read().await;
        let mut result: Vec<Notification> = notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            result.truncate(limit);
        }
        Ok(result)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<usize, NotificationError> {
        let notifications = self.notifications.read().await;
        Ok(notifications.values().filter(|n| n.user_id == user_id && !n.read).count())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, NotificationError> {
        let mut notifications = self.notifications.write().await;
        match notifications.get_mut(&id) {
            Some(n) if n.user_id == user_id => {
                n.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize, NotificationError> {
        let mut notifications = self.notifications.write().await;
        let mut updated = 0;
        for n in notifications.values_mut().filter(|n| n.user_id == user_id && !n.read) {
            n.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, NotificationError> {
        let mut notifications = self.notifications.write().await;
        if notifications.get(&id).map_or(false, |n| n.user_id == user_id) {
            notifications.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

// ==============================================================================
// SUPABASE STORE
// ==============================================================================

pub struct SupabaseNotificationStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseNotificationStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn patch_read(&self, filter: String) -> Result<Vec<Value>, NotificationError> {
        let path = format!("/rest/v1/notifications?{}", filter);
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(self.supabase.api_key()),
            Some(json!({ "read": true })),
            Some(representation_headers()),
        ).await?;
        Ok(rows)
    }
}

#[async_trait]
impl NotificationStore for SupabaseNotificationStore {
    async fn insert(&self, notification: Notification) -> Result<Notification, NotificationError> {
        let body = serde_json::to_value(&notification)
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let rows: Vec<Notification> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/notifications",
            Some(self.supabase.api_key()),
            Some(body),
            Some(representation_headers()),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| NotificationError::DatabaseError("Insert returned no rows".to_string()))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, NotificationError> {
        let mut path = format!("/rest/v1/notifications?user_id=eq.{}", user_id);
        if unread_only {
            path.push_str("&read=eq.false");
        }
        path.push_str("&order=created_at.desc");
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={}", limit));
        }

        let rows: Vec<Notification> = self.supabase
            .request(Method::GET, &path, Some(self.supabase.api_key()), None)
            .await?;
        Ok(rows)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<usize, NotificationError> {
        let path = format!("/rest/v1/notifications?select=id&user_id=eq.{}&read=eq.false", user_id);
        let rows: Vec<Value> = self.supabase
            .request(Method::GET, &path, Some(self.supabase.api_key()), None)
            .await?;
        Ok(rows.len())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, NotificationError> {
        let rows = self.patch_read(format!("id=eq.{}&user_id=eq.{}", id, user_id)).await?;
        Ok(!rows.is_empty())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<usize, NotificationError> {
        let rows = self.patch_read(format!("user_id=eq.{}&read=eq.false", user_id)).await?;
        Ok(rows.len())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, NotificationError> {
        let path = format!("/rest/v1/notifications?id=eq.{}&user_id=eq.{}", id, user_id);
        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(self.supabase.api_key()),
            None,
            Some(representation_headers()),
        ).await?;
        Ok(!rows.is_empty())
    }
}

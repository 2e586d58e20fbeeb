use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::NotificationError;
use crate::models::{
    AppointmentEvent, CancelledBy, NewNotification, Notification, NotificationQuery, PaymentEvent,
};
use crate::services::events;
use crate::store::NotificationStore;

const DEFAULT_LIST_LIMIT: usize = 50;

pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    pub async fn notify(&self, notification: NewNotification) -> Result<Notification, NotificationError> {
        let stored = self.store.insert(notification.into_notification(Utc::now())).await?;
        debug!("Notification {} ({:?}) stored for user {}", stored.id, stored.kind, stored.user_id);
        Ok(stored)
    }

    /// Stores every notification concurrently. Failures are logged, never returned;
    /// the result is how many were stored.
    pub async fn dispatch(&self, notifications: Vec<NewNotification>) -> usize {
        let results = join_all(notifications.into_iter().map(|n| {
            let user_id = n.user_id;
            async move { (user_id, self.notify(n).await) }
        }))
        .await;

        results
            .into_iter()
            .filter(|(user_id, result)| match result {
                Ok(_) => true,
                Err(e) => {
                    warn!("Failed to notify user {}: {}", user_id, e);
                    false
                }
            })
            .count()
    }

    pub async fn appointment_booked(&self, event: &AppointmentEvent) -> usize {
        self.dispatch(events::appointment_booked(event)).await
    }

    pub async fn appointment_confirmed(&self, event: &AppointmentEvent) -> usize {
        self.dispatch(events::appointment_confirmed(event)).await
    }

    pub async fn appointment_cancelled(&self, event: &AppointmentEvent, by: CancelledBy) -> usize {
        self.dispatch(events::appointment_cancelled(event, by)).await
    }

    pub async fn appointment_rescheduled(&self, event: &AppointmentEvent) -> usize {
        self.dispatch(events::appointment_rescheduled(event)).await
    }

    pub async fn payment_succeeded(&self, event: &PaymentEvent) -> usize {
        self.dispatch(events::payment_succeeded(event)).await
    }

    pub async fn payment_failed(&self, event: &PaymentEvent, reason: &str) -> usize {
        self.dispatch(events::payment_failed(event, reason)).await
    }

    pub async fn list(&self, user_id: Uuid, query: NotificationQuery) -> Result<Vec<Notification>, NotificationError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        self.store
            .list_for_user(user_id, query.unread_only.unwrap_or(false), Some(limit))
            .await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<usize, NotificationError> {
        self.store.count_unread(user_id).await
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<(), NotificationError> {
        if !self.store.mark_read(user_id, id).await? {
            return Err(NotificationError::NotFound(id));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<usize, NotificationError> {
        let updated = self.store.mark_all_read(user_id).await?;
        info!("Marked {} notifications as read for user {}", updated, user_id);
        Ok(updated)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), NotificationError> {
        if !self.store.delete(user_id, id).await? {
            return Err(NotificationError::NotFound(id));
        }
        Ok(())
    }
}

// service/notification_service.rs
use std::sync::Arc;

use crate::{
    db::Storage,
    models::{
        notificationmodel::*,
        ticketmodel::{TicketStatus, TicketWithUsers},
        usermodel::UserRole,
    },
    service::error::ServiceError,
};

const UNKNOWN_NAME: &str = "Unknown";

/// Turns lifecycle events into stored, per-recipient notifications.
///
/// Dispatch is best effort: every `notify_*` call returns whether a record was
/// written and logs the reason when it was not. A failed dispatch never undoes
/// the change that triggered it.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn Storage>,
    enabled: bool,
}

impl NotificationService {
    pub fn new(store: Arc<dyn Storage>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub async fn notify_ticket_created(&self, ticket_id: i64) -> bool {
        self.dispatch(
            NotificationType::NewTicket,
            ticket_id,
            self.try_notify_ticket_created(ticket_id),
        )
        .await
    }

    pub async fn notify_master_assigned(&self, ticket_id: i64, master_id: i64) -> bool {
        self.dispatch(
            NotificationType::Assignment,
            ticket_id,
            self.try_notify_master_assigned(ticket_id, master_id),
        )
        .await
    }

    pub async fn notify_client_about_master(&self, ticket_id: i64) -> bool {
        self.dispatch(
            NotificationType::MasterAssigned,
            ticket_id,
            self.try_notify_client_about_master(ticket_id),
        )
        .await
    }

    pub async fn notify_ticket_status_change(
        &self,
        ticket_id: i64,
        old_status: TicketStatus,
        new_status: TicketStatus,
    ) -> bool {
        self.dispatch(
            NotificationType::StatusChange,
            ticket_id,
            self.try_notify_ticket_status_change(ticket_id, old_status, new_status),
        )
        .await
    }

    async fn dispatch<F>(&self, kind: NotificationType, ticket_id: i64, send: F) -> bool
    where
        F: std::future::Future<Output = Result<bool, ServiceError>>,
    {
        let event = kind.to_str();
        if !self.enabled {
            tracing::debug!("notifications disabled, skipping {} for ticket {}", event, ticket_id);
            return false;
        }

        match send.await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("no {} notification written for ticket {}", event, ticket_id);
                false
            }
            Err(e) => {
                tracing::warn!("{} notification for ticket {} failed: {}", event, ticket_id, e);
                false
            }
        }
    }

    async fn load_ticket(&self, ticket_id: i64) -> Result<TicketWithUsers, ServiceError> {
        self.store
            .get_ticket_by_id(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))
    }

    async fn try_notify_ticket_created(&self, ticket_id: i64) -> Result<bool, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;
        let admins = self.store.get_users_by_role(UserRole::Admin).await?;

        let message = format!(
            "New ticket #{} '{}' from client {}",
            ticket.ticket.ticket_number,
            ticket.ticket.title,
            ticket.client_name.as_deref().unwrap_or(UNKNOWN_NAME)
        );

        let mut written = 0;
        for admin in admins {
            let result = self
                .store
                .create_notification(NewNotification {
                    user_id: admin.id,
                    title: "New ticket".to_string(),
                    message: message.clone(),
                    notification_type: NotificationType::NewTicket,
                    related_ticket_id: Some(ticket_id),
                })
                .await;

            match result {
                Ok(_) => written += 1,
                Err(e) => tracing::warn!("failed to notify admin {}: {}", admin.id, e),
            }
        }

        Ok(written > 0)
    }

    async fn try_notify_master_assigned(
        &self,
        ticket_id: i64,
        master_id: i64,
    ) -> Result<bool, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;

        self.store
            .create_notification(NewNotification {
                user_id: master_id,
                title: "New ticket assigned".to_string(),
                message: format!(
                    "You have been assigned ticket #{} '{}' from client {}",
                    ticket.ticket.ticket_number,
                    ticket.ticket.title,
                    ticket.client_name.as_deref().unwrap_or(UNKNOWN_NAME)
                ),
                notification_type: NotificationType::Assignment,
                related_ticket_id: Some(ticket_id),
            })
            .await?;

        Ok(true)
    }

    async fn try_notify_client_about_master(&self, ticket_id: i64) -> Result<bool, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;

        self.store
            .create_notification(NewNotification {
                user_id: ticket.ticket.client_id,
                title: "Master assigned".to_string(),
                message: format!(
                    "Master {} has been assigned to your ticket #{} '{}'",
                    ticket.master_name.as_deref().unwrap_or(UNKNOWN_NAME),
                    ticket.ticket.ticket_number,
                    ticket.ticket.title
                ),
                notification_type: NotificationType::MasterAssigned,
                related_ticket_id: Some(ticket_id),
            })
            .await?;

        Ok(true)
    }

    async fn try_notify_ticket_status_change(
        &self,
        ticket_id: i64,
        old_status: TicketStatus,
        new_status: TicketStatus,
    ) -> Result<bool, ServiceError> {
        let ticket = self.load_ticket(ticket_id).await?;

        self.store
            .create_notification(NewNotification {
                user_id: ticket.ticket.client_id,
                title: "Ticket status changed".to_string(),
                message: format!(
                    "The status of your ticket #{} '{}' changed from '{}' to '{}'",
                    ticket.ticket.ticket_number,
                    ticket.ticket.title,
                    old_status.display_name(),
                    new_status.display_name()
                ),
                notification_type: NotificationType::StatusChange,
                related_ticket_id: Some(ticket_id),
            })
            .await?;

        Ok(true)
    }

    pub async fn user_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<NotificationWithTicket>, ServiceError> {
        Ok(self.store.get_user_notifications(user_id, unread_only).await?)
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, ServiceError> {
        Ok(self.store.get_unread_count(user_id).await?)
    }

    /// Only the recipient can mark a notification read.
    pub async fn mark_read(&self, notification_id: i64, user_id: i64) -> Result<bool, ServiceError> {
        Ok(self.store.mark_read(notification_id, user_id).await? > 0)
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, ServiceError> {
        Ok(self.store.mark_all_read(user_id).await?)
    }
}

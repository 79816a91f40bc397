// src/models/notificationmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    StatusChange,
    Assignment,
    MasterAssigned,
    NewTicket,
}

impl NotificationType {
    pub fn to_str(&self) -> &str {
        match self {
            NotificationType::StatusChange => "status_change",
            NotificationType::Assignment => "assignment",
            NotificationType::MasterAssigned => "master_assigned",
            NotificationType::NewTicket => "new_ticket",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub related_ticket_id: Option<i64>,
}

/// A notification together with the number of the ticket it refers to.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationWithTicket {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub notification: Notification,
    pub ticket_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub related_ticket_id: Option<i64>,
}

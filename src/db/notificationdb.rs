// src/db/notificationdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::notificationmodel::*;

#[async_trait]
pub trait NotificationExt {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, Error>;

    /// Newest first.
    async fn get_user_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<NotificationWithTicket>, Error>;

    async fn get_ticket_notifications(
        &self,
        ticket_id: i64,
    ) -> Result<Vec<Notification>, Error>;

    async fn mark_read(&self, notification_id: i64, user_id: i64) -> Result<u64, Error>;

    async fn mark_all_read(&self, user_id: i64) -> Result<u64, Error>;

    async fn get_unread_count(&self, user_id: i64) -> Result<i64, Error>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, Error> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications
            (user_id, title, message, notification_type, related_ticket_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.notification_type)
        .bind(notification.related_ticket_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn get_user_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<NotificationWithTicket>, Error> {
        let notifications = sqlx::query_as::<_, NotificationWithTicket>(
            r#"
            SELECT n.*, t.ticket_number
            FROM notifications n
            LEFT JOIN tickets t ON n.related_ticket_id = t.id
            WHERE n.user_id = $1 AND ($2 = FALSE OR n.is_read = FALSE)
            ORDER BY n.created_at DESC, n.id DESC
            "#
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn get_ticket_notifications(
        &self,
        ticket_id: i64,
    ) -> Result<Vec<Notification>, Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE related_ticket_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, notification_id: i64, user_id: i64) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            "#
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE user_id = $1 AND is_read = FALSE
            "#
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_unread_count(&self, user_id: i64) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1 AND is_read = FALSE
            "#
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

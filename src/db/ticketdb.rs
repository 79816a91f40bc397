// src/db/ticketdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::ticketmodel::*;

const TICKET_WITH_USERS: &str = r#"
    SELECT
        t.*,
        c.full_name AS client_name,
        m.full_name AS master_name
    FROM tickets t
    LEFT JOIN users c ON t.client_id = c.id
    LEFT JOIN users m ON t.assigned_master_id = m.id
"#;

#[async_trait]
pub trait TicketExt {
    async fn get_ticket_by_id(
        &self,
        ticket_id: i64,
    ) -> Result<Option<TicketWithUsers>, Error>;

    async fn get_tickets_by_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<TicketWithUsers>, Error>;

    async fn get_tickets_by_master(
        &self,
        master_id: i64,
    ) -> Result<Vec<TicketWithUsers>, Error>;

    async fn get_pending_unassigned_tickets(&self) -> Result<Vec<TicketWithUsers>, Error>;

    async fn get_all_tickets(&self) -> Result<Vec<TicketWithUsers>, Error>;

    async fn ticket_number_exists(&self, ticket_number: &str) -> Result<bool, Error>;

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, Error>;

    /// Sets the master and moves the ticket to `in_progress`, only while it
    /// is still `pending`. Returns the number of rows changed.
    async fn conditional_assign(
        &self,
        ticket_id: i64,
        master_id: i64,
    ) -> Result<u64, Error>;

    /// Compare-and-set on the ticket status.
    async fn conditional_update_status(
        &self,
        ticket_id: i64,
        expected: TicketStatus,
        status: TicketStatus,
    ) -> Result<u64, Error>;

    async fn update_ticket_content(
        &self,
        ticket_id: i64,
        title: &str,
        description: &str,
        scope: EditScope,
    ) -> Result<u64, Error>;

    /// Removes the ticket's notifications, then its comments, then the ticket.
    async fn cascade_delete_ticket(&self, ticket_id: i64) -> Result<u64, Error>;
}

#[async_trait]
pub trait CommentExt {
    async fn add_comment(&self, comment: NewComment) -> Result<Comment, Error>;

    async fn get_comments_by_ticket(&self, ticket_id: i64) -> Result<Vec<Comment>, Error>;
}

#[async_trait]
impl TicketExt for DBClient {
    async fn get_ticket_by_id(
        &self,
        ticket_id: i64,
    ) -> Result<Option<TicketWithUsers>, Error> {
        let query = format!("{} WHERE t.id = $1", TICKET_WITH_USERS);

        let ticket = sqlx::query_as::<_, TicketWithUsers>(&query)
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ticket)
    }

    async fn get_tickets_by_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<TicketWithUsers>, Error> {
        let query = format!(
            "{} WHERE t.client_id = $1 ORDER BY t.created_at DESC, t.id DESC",
            TICKET_WITH_USERS
        );

        let tickets = sqlx::query_as::<_, TicketWithUsers>(&query)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn get_tickets_by_master(
        &self,
        master_id: i64,
    ) -> Result<Vec<TicketWithUsers>, Error> {
        let query = format!(
            "{} WHERE t.assigned_master_id = $1 ORDER BY t.created_at DESC, t.id DESC",
            TICKET_WITH_USERS
        );

        let tickets = sqlx::query_as::<_, TicketWithUsers>(&query)
            .bind(master_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn get_pending_unassigned_tickets(&self) -> Result<Vec<TicketWithUsers>, Error> {
        let query = format!(
            "{} WHERE t.status = $1 AND t.assigned_master_id IS NULL ORDER BY t.created_at DESC, t.id DESC",
            TICKET_WITH_USERS
        );

        let tickets = sqlx::query_as::<_, TicketWithUsers>(&query)
            .bind(TicketStatus::Pending)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn get_all_tickets(&self) -> Result<Vec<TicketWithUsers>, Error> {
        let query = format!(
            "{} ORDER BY t.created_at DESC, t.id DESC",
            TICKET_WITH_USERS
        );

        let tickets = sqlx::query_as::<_, TicketWithUsers>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(tickets)
    }

    async fn ticket_number_exists(&self, ticket_number: &str) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM tickets WHERE ticket_number = $1)
            "#
        )
        .bind(ticket_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, Error> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (ticket_number, title, description, status, client_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(ticket.ticket_number)
        .bind(ticket.title)
        .bind(ticket.description)
        .bind(TicketStatus::Pending)
        .bind(ticket.client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn conditional_assign(
        &self,
        ticket_id: i64,
        master_id: i64,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET assigned_master_id = $1, status = $2
            WHERE id = $3 AND status = $4
            "#
        )
        .bind(master_id)
        .bind(TicketStatus::InProgress)
        .bind(ticket_id)
        .bind(TicketStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn conditional_update_status(
        &self,
        ticket_id: i64,
        expected: TicketStatus,
        status: TicketStatus,
    ) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET status = $1
            WHERE id = $2 AND status = $3
            "#
        )
        .bind(status)
        .bind(ticket_id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_ticket_content(
        &self,
        ticket_id: i64,
        title: &str,
        description: &str,
        scope: EditScope,
    ) -> Result<u64, Error> {
        let result = match scope {
            EditScope::Any => {
                sqlx::query(
                    r#"
                    UPDATE tickets
                    SET title = $1, description = $2
                    WHERE id = $3
                    "#
                )
                .bind(title)
                .bind(description)
                .bind(ticket_id)
                .execute(&self.pool)
                .await?
            }
            EditScope::OwnedPending { client_id } => {
                sqlx::query(
                    r#"
                    UPDATE tickets
                    SET title = $1, description = $2
                    WHERE id = $3 AND client_id = $4 AND status = $5
                    "#
                )
                .bind(title)
                .bind(description)
                .bind(ticket_id)
                .bind(client_id)
                .bind(TicketStatus::Pending)
                .execute(&self.pool)
                .await?
            }
            EditScope::AssignedTo { master_id } => {
                sqlx::query(
                    r#"
                    UPDATE tickets
                    SET title = $1, description = $2
                    WHERE id = $3 AND assigned_master_id = $4
                    "#
                )
                .bind(title)
                .bind(description)
                .bind(ticket_id)
                .bind(master_id)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected())
    }

    async fn cascade_delete_ticket(&self, ticket_id: i64) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM notifications WHERE related_ticket_id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM comments WHERE ticket_id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CommentExt for DBClient {
    async fn add_comment(&self, comment: NewComment) -> Result<Comment, Error> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (ticket_id, user_id, user_name, user_role, comment_text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(comment.ticket_id)
        .bind(comment.user_id)
        .bind(comment.user_name)
        .bind(comment.user_role)
        .bind(comment.comment_text)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn get_comments_by_ticket(&self, ticket_id: i64) -> Result<Vec<Comment>, Error> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
            WHERE ticket_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}

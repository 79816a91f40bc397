//! In-memory storage backend.
//!
//! Every table lives behind one `RwLock`, so each trait call is atomic with
//! respect to the others; conditional updates run their check and write under
//! the same write guard. Data is lost when the store is dropped.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Error;
use tokio::sync::RwLock;

use super::{notificationdb::NotificationExt, ticketdb::{CommentExt, TicketExt}, userdb::UserExt};
use crate::models::{
    notificationmodel::*,
    ticketmodel::*,
    usermodel::{NewUser, User, UserRole},
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    tickets: BTreeMap<i64, Ticket>,
    comments: BTreeMap<i64, Comment>,
    notifications: BTreeMap<i64, Notification>,
    user_seq: i64,
    ticket_seq: i64,
    comment_seq: i64,
    notification_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

fn constraint_violation(message: impl Into<String>) -> Error {
    Error::Protocol(message.into())
}

impl Tables {
    fn full_name(&self, user_id: Option<i64>) -> Option<String> {
        user_id
            .and_then(|id| self.users.get(&id))
            .map(|user| user.full_name.clone())
    }

    fn with_users(&self, ticket: &Ticket) -> TicketWithUsers {
        TicketWithUsers {
            ticket: ticket.clone(),
            client_name: self.full_name(Some(ticket.client_id)),
            master_name: self.full_name(ticket.assigned_master_id),
        }
    }

    /// Newest first, ties broken by id like the SQL backend.
    fn select_tickets<F>(&self, filter: F) -> Vec<TicketWithUsers>
    where
        F: Fn(&Ticket) -> bool,
    {
        let mut tickets: Vec<&Ticket> = self.tickets.values().filter(|t| filter(t)).collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        tickets.into_iter().map(|t| self.with_users(t)).collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, Error> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, Error> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn save_user(&self, user: NewUser) -> Result<User, Error> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(constraint_violation(format!(
                "duplicate username: {}",
                user.username
            )));
        }

        let id = next_id(&mut tables.user_seq);
        let user = User {
            id,
            username: user.username,
            password: user.password,
            full_name: user.full_name,
            role: user.role,
            email: user.email,
            phone: user.phone,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());

        Ok(user)
    }
}

#[async_trait]
impl TicketExt for MemoryStore {
    async fn get_ticket_by_id(
        &self,
        ticket_id: i64,
    ) -> Result<Option<TicketWithUsers>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.tickets.get(&ticket_id).map(|t| tables.with_users(t)))
    }

    async fn get_tickets_by_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<TicketWithUsers>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.select_tickets(|t| t.client_id == client_id))
    }

    async fn get_tickets_by_master(
        &self,
        master_id: i64,
    ) -> Result<Vec<TicketWithUsers>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.select_tickets(|t| t.assigned_master_id == Some(master_id)))
    }

    async fn get_pending_unassigned_tickets(&self) -> Result<Vec<TicketWithUsers>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.select_tickets(|t| {
            t.status == TicketStatus::Pending && t.assigned_master_id.is_none()
        }))
    }

    async fn get_all_tickets(&self) -> Result<Vec<TicketWithUsers>, Error> {
        let tables = self.tables.read().await;
        Ok(tables.select_tickets(|_| true))
    }

    async fn ticket_number_exists(&self, ticket_number: &str) -> Result<bool, Error> {
        let tables = self.tables.read().await;
        Ok(tables.tickets.values().any(|t| t.ticket_number == ticket_number))
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, Error> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&ticket.client_id) {
            return Err(constraint_violation(format!(
                "unknown client: {}",
                ticket.client_id
            )));
        }
        if tables.tickets.values().any(|t| t.ticket_number == ticket.ticket_number) {
            return Err(constraint_violation(format!(
                "duplicate ticket number: {}",
                ticket.ticket_number
            )));
        }

        let id = next_id(&mut tables.ticket_seq);
        let ticket = Ticket {
            id,
            ticket_number: ticket.ticket_number,
            title: ticket.title,
            description: ticket.description,
            status: TicketStatus::Pending,
            created_at: Utc::now(),
            client_id: ticket.client_id,
            assigned_master_id: None,
        };
        tables.tickets.insert(id, ticket.clone());

        Ok(ticket)
    }

    async fn conditional_assign(
        &self,
        ticket_id: i64,
        master_id: i64,
    ) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;
        let master_exists = tables.users.contains_key(&master_id);

        match tables.tickets.get_mut(&ticket_id) {
            Some(ticket) if ticket.status == TicketStatus::Pending => {
                if !master_exists {
                    return Err(constraint_violation(format!("unknown master: {}", master_id)));
                }
                ticket.assigned_master_id = Some(master_id);
                ticket.status = TicketStatus::InProgress;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn conditional_update_status(
        &self,
        ticket_id: i64,
        expected: TicketStatus,
        status: TicketStatus,
    ) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;

        match tables.tickets.get_mut(&ticket_id) {
            Some(ticket) if ticket.status == expected => {
                if status.requires_master() && ticket.assigned_master_id.is_none() {
                    return Err(constraint_violation("tickets_master_required"));
                }
                ticket.status = status;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn update_ticket_content(
        &self,
        ticket_id: i64,
        title: &str,
        description: &str,
        scope: EditScope,
    ) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;

        match tables.tickets.get_mut(&ticket_id) {
            Some(ticket) if scope.permits(ticket) => {
                ticket.title = title.to_string();
                ticket.description = description.to_string();
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn cascade_delete_ticket(&self, ticket_id: i64) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;

        tables
            .notifications
            .retain(|_, n| n.related_ticket_id != Some(ticket_id));
        tables.comments.retain(|_, c| c.ticket_id != ticket_id);

        Ok(tables.tickets.remove(&ticket_id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl CommentExt for MemoryStore {
    async fn add_comment(&self, comment: NewComment) -> Result<Comment, Error> {
        let mut tables = self.tables.write().await;

        if !tables.tickets.contains_key(&comment.ticket_id) {
            return Err(constraint_violation(format!(
                "unknown ticket: {}",
                comment.ticket_id
            )));
        }

        let id = next_id(&mut tables.comment_seq);
        let comment = Comment {
            id,
            ticket_id: comment.ticket_id,
            user_id: comment.user_id,
            user_name: comment.user_name,
            user_role: comment.user_role,
            comment_text: comment.comment_text,
            created_at: Utc::now(),
        };
        tables.comments.insert(id, comment.clone());

        Ok(comment)
    }

    async fn get_comments_by_ticket(&self, ticket_id: i64) -> Result<Vec<Comment>, Error> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.ticket_id == ticket_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
}

#[async_trait]
impl NotificationExt for MemoryStore {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, Error> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&notification.user_id) {
            return Err(constraint_violation(format!(
                "unknown recipient: {}",
                notification.user_id
            )));
        }

        let id = next_id(&mut tables.notification_seq);
        let notification = Notification {
            id,
            user_id: notification.user_id,
            title: notification.title,
            message: notification.message,
            notification_type: notification.notification_type,
            is_read: false,
            created_at: Utc::now(),
            related_ticket_id: notification.related_ticket_id,
        };
        tables.notifications.insert(id, notification.clone());

        Ok(notification)
    }

    async fn get_user_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<NotificationWithTicket>, Error> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<&Notification> = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(notifications
            .into_iter()
            .map(|n| NotificationWithTicket {
                notification: n.clone(),
                ticket_number: n
                    .related_ticket_id
                    .and_then(|id| tables.tickets.get(&id))
                    .map(|t| t.ticket_number.clone()),
            })
            .collect())
    }

    async fn get_ticket_notifications(
        &self,
        ticket_id: i64,
    ) -> Result<Vec<Notification>, Error> {
        let tables = self.tables.read().await;
        let mut notifications: Vec<Notification> = tables
            .notifications
            .values()
            .filter(|n| n.related_ticket_id == Some(ticket_id))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(notifications)
    }

    async fn mark_read(&self, notification_id: i64, user_id: i64) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;

        match tables.notifications.get_mut(&notification_id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64, Error> {
        let mut tables = self.tables.write().await;
        let mut changed = 0;

        for n in tables.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn get_unread_count(&self, user_id: i64) -> Result<i64, Error> {
        let tables = self.tables.read().await;
        let count = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &MemoryStore, username: &str, role: UserRole) -> User {
        store
            .save_user(NewUser {
                username: username.to_string(),
                password: "hash".to_string(),
                full_name: format!("{} full", username),
                role,
                email: None,
                phone: None,
            })
            .await
            .unwrap()
    }

    async fn ticket(store: &MemoryStore, number: &str, client_id: i64) -> Ticket {
        store
            .create_ticket(NewTicket {
                ticket_number: number.to_string(),
                title: "Broken printer".to_string(),
                description: "Does not print black".to_string(),
                client_id,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        user(&store, "client1", UserRole::Client).await;

        let duplicate = store
            .save_user(NewUser {
                username: "client1".to_string(),
                password: "hash".to_string(),
                full_name: "Other".to_string(),
                role: UserRole::Client,
                email: None,
                phone: None,
            })
            .await;

        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn ticket_reads_join_user_names() {
        let store = MemoryStore::new();
        let client = user(&store, "client1", UserRole::Client).await;
        let master = user(&store, "master1", UserRole::Master).await;
        let created = ticket(&store, "T1", client.id).await;

        assert_eq!(store.conditional_assign(created.id, master.id).await.unwrap(), 1);

        let loaded = store.get_ticket_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.client_name.as_deref(), Some("client1 full"));
        assert_eq!(loaded.master_name.as_deref(), Some("master1 full"));
        assert_eq!(loaded.ticket.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn conditional_assign_only_applies_to_pending() {
        let store = MemoryStore::new();
        let client = user(&store, "client1", UserRole::Client).await;
        let first = user(&store, "master1", UserRole::Master).await;
        let second = user(&store, "master2", UserRole::Master).await;
        let created = ticket(&store, "T1", client.id).await;

        assert_eq!(store.conditional_assign(created.id, first.id).await.unwrap(), 1);
        assert_eq!(store.conditional_assign(created.id, second.id).await.unwrap(), 0);
        assert_eq!(store.conditional_assign(999, second.id).await.unwrap(), 0);

        let loaded = store.get_ticket_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.ticket.assigned_master_id, Some(first.id));
    }

    #[tokio::test]
    async fn conditional_assign_rejects_unknown_master() {
        let store = MemoryStore::new();
        let client = user(&store, "client1", UserRole::Client).await;
        let created = ticket(&store, "T1", client.id).await;

        assert!(store.conditional_assign(created.id, 999).await.is_err());

        let loaded = store.get_ticket_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.ticket.status, TicketStatus::Pending);
        assert_eq!(loaded.ticket.assigned_master_id, None);
    }

    #[tokio::test]
    async fn listings_are_newest_first() {
        let store = MemoryStore::new();
        let client = user(&store, "client1", UserRole::Client).await;
        let first = ticket(&store, "T1", client.id).await;
        let second = ticket(&store, "T2", client.id).await;

        let listed = store.get_tickets_by_client(client.id).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|t| t.ticket.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn cascade_delete_removes_dependents() {
        let store = MemoryStore::new();
        let client = user(&store, "client1", UserRole::Client).await;
        let created = ticket(&store, "T1", client.id).await;

        store
            .add_comment(NewComment {
                ticket_id: created.id,
                user_id: client.id,
                user_name: client.full_name.clone(),
                user_role: client.role,
                comment_text: "Any news?".to_string(),
            })
            .await
            .unwrap();
        store
            .create_notification(NewNotification {
                user_id: client.id,
                title: "t".to_string(),
                message: "m".to_string(),
                notification_type: NotificationType::StatusChange,
                related_ticket_id: Some(created.id),
            })
            .await
            .unwrap();

        assert_eq!(store.cascade_delete_ticket(created.id).await.unwrap(), 1);
        assert!(store.get_comments_by_ticket(created.id).await.unwrap().is_empty());
        assert!(store.get_ticket_notifications(created.id).await.unwrap().is_empty());
        assert_eq!(store.cascade_delete_ticket(created.id).await.unwrap(), 0);
    }
}

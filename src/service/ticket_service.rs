// service/ticket_service.rs
use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::Storage,
    models::{
        ticketmodel::*,
        usermodel::UserRole,
    },
    service::{
        access_policy::Session,
        error::ServiceError,
        notification_service::NotificationService,
    },
    utils::ticket_number,
};

/// The ticket lifecycle: creation, assignment, status changes, edits,
/// deletion and comments.
///
/// Each mutation comes as `try_*`, returning a typed [`ServiceError`], and as
/// a plain form that logs the failure and reports `false`/`None`.
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn Storage>,
    notifications: Arc<NotificationService>,
}

fn collapse<T>(operation: &str, result: Result<T, ServiceError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("{} failed ({:?}): {}", operation, e.kind(), e);
            None
        }
    }
}

impl TicketService {
    pub fn new(store: Arc<dyn Storage>, notifications: Arc<NotificationService>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    async fn require_ticket(&self, ticket_id: i64) -> Result<TicketWithUsers, ServiceError> {
        self.store
            .get_ticket_by_id(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))
    }

    async fn next_ticket_number(&self) -> Result<String, ServiceError> {
        let number = ticket_number::generate(Utc::now(), 4);
        if !self.store.ticket_number_exists(&number).await? {
            return Ok(number);
        }

        // A second clash is left to the unique constraint.
        let retry = ticket_number::generate(Utc::now(), 6);
        tracing::debug!("ticket number {} taken, using {}", number, retry);
        Ok(retry)
    }

    pub async fn try_create_ticket(
        &self,
        title: String,
        description: String,
        client_id: i64,
    ) -> Result<Ticket, ServiceError> {
        let ticket_number = self.next_ticket_number().await?;

        let ticket = self
            .store
            .create_ticket(NewTicket {
                ticket_number,
                title,
                description,
                client_id,
            })
            .await?;

        tracing::info!(
            "ticket {} ({}) created by client {}",
            ticket.ticket_number,
            ticket.id,
            client_id
        );

        self.notifications.notify_ticket_created(ticket.id).await;

        Ok(ticket)
    }

    pub async fn create_ticket(
        &self,
        title: String,
        description: String,
        client_id: i64,
    ) -> Option<Ticket> {
        collapse(
            "create_ticket",
            self.try_create_ticket(title, description, client_id).await,
        )
    }

    /// Admins and managers may assign any master. A master may only take a
    /// ticket for themselves.
    pub async fn try_assign_master(
        &self,
        session: &Session,
        ticket_id: i64,
        master_id: i64,
    ) -> Result<(), ServiceError> {
        let staff = matches!(session.role(), Some(UserRole::Admin | UserRole::Manager));
        let self_claim = session.is_master() && session.user_id() == Some(master_id);
        if !staff && !self_claim {
            return Err(ServiceError::Forbidden(
                "only admins and managers can assign masters".to_string(),
            ));
        }

        let ticket = self.require_ticket(ticket_id).await?;
        if ticket.ticket.status != TicketStatus::Pending {
            return Err(ServiceError::InvalidStatus(ticket_id, TicketStatus::Pending));
        }

        match self.store.get_user_by_id(master_id).await? {
            Some(user) if user.role == UserRole::Master => {}
            _ => return Err(ServiceError::UserNotFound(master_id)),
        }

        if self.store.conditional_assign(ticket_id, master_id).await? == 0 {
            return Err(ServiceError::Conflict(ticket_id));
        }

        tracing::info!("ticket {} assigned to master {}", ticket_id, master_id);

        self.notifications
            .notify_master_assigned(ticket_id, master_id)
            .await;
        self.notifications.notify_client_about_master(ticket_id).await;

        Ok(())
    }

    pub async fn assign_master(&self, session: &Session, ticket_id: i64, master_id: i64) -> bool {
        collapse(
            "assign_master",
            self.try_assign_master(session, ticket_id, master_id).await,
        )
        .is_some()
    }

    /// Returns whether the status actually changed. Callers decide who may
    /// request which transition; see `access_policy::can_set_status`.
    pub async fn try_update_status(
        &self,
        ticket_id: i64,
        new_status: TicketStatus,
    ) -> Result<bool, ServiceError> {
        let ticket = self.require_ticket(ticket_id).await?.ticket;
        let old_status = ticket.status;

        if new_status.requires_master() && ticket.assigned_master_id.is_none() {
            return Err(ServiceError::MasterRequired(ticket_id, new_status));
        }

        let changed = self
            .store
            .conditional_update_status(ticket_id, old_status, new_status)
            .await?;
        if changed == 0 {
            return Err(ServiceError::Conflict(ticket_id));
        }

        if old_status == new_status {
            return Ok(false);
        }

        tracing::info!(
            "ticket {} moved from {} to {}",
            ticket_id,
            old_status.to_str(),
            new_status.to_str()
        );

        self.notifications
            .notify_ticket_status_change(ticket_id, old_status, new_status)
            .await;

        Ok(true)
    }

    pub async fn update_status(&self, ticket_id: i64, new_status: TicketStatus) -> bool {
        collapse(
            "update_status",
            self.try_update_status(ticket_id, new_status).await,
        )
        .is_some()
    }

    pub async fn try_update_ticket(
        &self,
        session: &Session,
        ticket_id: i64,
        title: &str,
        description: &str,
    ) -> Result<(), ServiceError> {
        let scope = match (session.role(), session.user_id()) {
            (Some(UserRole::Admin), _) => EditScope::Any,
            (Some(UserRole::Client), Some(client_id)) => EditScope::OwnedPending { client_id },
            (Some(UserRole::Master), Some(master_id)) => EditScope::AssignedTo { master_id },
            _ => {
                return Err(ServiceError::Forbidden(
                    "this role cannot edit tickets".to_string(),
                ))
            }
        };

        let changed = self
            .store
            .update_ticket_content(ticket_id, title, description, scope)
            .await?;
        if changed == 0 {
            return Err(ServiceError::Forbidden(format!(
                "ticket {} cannot be edited",
                ticket_id
            )));
        }

        Ok(())
    }

    pub async fn update_ticket(
        &self,
        session: &Session,
        ticket_id: i64,
        title: &str,
        description: &str,
    ) -> bool {
        collapse(
            "update_ticket",
            self.try_update_ticket(session, ticket_id, title, description)
                .await,
        )
        .is_some()
    }

    pub async fn try_delete_ticket(
        &self,
        session: &Session,
        ticket_id: i64,
    ) -> Result<(), ServiceError> {
        match (session.role(), session.user_id()) {
            (Some(UserRole::Admin), _) => {}
            (Some(UserRole::Client), Some(client_id)) => {
                let ticket = self.require_ticket(ticket_id).await?;
                if ticket.ticket.client_id != client_id {
                    return Err(ServiceError::Forbidden(
                        "clients can only delete their own tickets".to_string(),
                    ));
                }
                // Ownership is checked by the read above, not by the delete
                // below; a change in between goes unnoticed.
            }
            _ => {
                return Err(ServiceError::Forbidden(
                    "this role cannot delete tickets".to_string(),
                ))
            }
        }

        if self.store.cascade_delete_ticket(ticket_id).await? == 0 {
            return Err(ServiceError::TicketNotFound(ticket_id));
        }

        tracing::info!("ticket {} deleted", ticket_id);

        Ok(())
    }

    pub async fn delete_ticket(&self, session: &Session, ticket_id: i64) -> bool {
        collapse(
            "delete_ticket",
            self.try_delete_ticket(session, ticket_id).await,
        )
        .is_some()
    }

    pub async fn try_add_comment(
        &self,
        session: &Session,
        ticket_id: i64,
        text: &str,
    ) -> Result<Comment, ServiceError> {
        let (user_id, user_name, user_role) =
            match (session.user_id(), session.full_name(), session.role()) {
                (Some(id), Some(name), Some(role)) => (id, name.to_string(), role),
                _ => {
                    return Err(ServiceError::Forbidden(
                        "sign in to comment".to_string(),
                    ))
                }
            };

        self.require_ticket(ticket_id).await?;

        let comment = self
            .store
            .add_comment(NewComment {
                ticket_id,
                user_id,
                user_name,
                user_role,
                comment_text: text.to_string(),
            })
            .await?;

        Ok(comment)
    }

    pub async fn add_comment(&self, session: &Session, ticket_id: i64, text: &str) -> bool {
        collapse(
            "add_comment",
            self.try_add_comment(session, ticket_id, text).await,
        )
        .is_some()
    }

    pub async fn get_ticket(&self, ticket_id: i64) -> Result<Option<TicketWithUsers>, ServiceError> {
        Ok(self.store.get_ticket_by_id(ticket_id).await?)
    }

    pub async fn tickets_for_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<TicketWithUsers>, ServiceError> {
        Ok(self.store.get_tickets_by_client(client_id).await?)
    }

    pub async fn tickets_for_master(
        &self,
        master_id: i64,
    ) -> Result<Vec<TicketWithUsers>, ServiceError> {
        Ok(self.store.get_tickets_by_master(master_id).await?)
    }

    pub async fn available_tickets(&self) -> Result<Vec<TicketWithUsers>, ServiceError> {
        Ok(self.store.get_pending_unassigned_tickets().await?)
    }

    pub async fn all_tickets(&self) -> Result<Vec<TicketWithUsers>, ServiceError> {
        Ok(self.store.get_all_tickets().await?)
    }

    pub async fn comments_for_ticket(&self, ticket_id: i64) -> Result<Vec<Comment>, ServiceError> {
        Ok(self.store.get_comments_by_ticket(ticket_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sqlx::Error;

    use crate::{
        db::{memory::MemoryStore, CommentExt, NotificationExt, TicketExt, UserExt},
        models::{
            notificationmodel::{
                NewNotification, Notification, NotificationType, NotificationWithTicket,
            },
            usermodel::{NewUser, User},
        },
        service::error::ErrorKind,
    };

    /// Answers `get_ticket_by_id` from a pinned copy, as if the read had
    /// happened before another request changed the ticket.
    struct StaleReads {
        inner: Arc<MemoryStore>,
        pinned: std::sync::Mutex<Option<TicketWithUsers>>,
    }

    impl StaleReads {
        async fn pinned_at(inner: Arc<MemoryStore>, ticket_id: i64) -> Self {
            let snapshot = inner.get_ticket_by_id(ticket_id).await.unwrap();
            assert!(snapshot.is_some());
            Self {
                inner,
                pinned: std::sync::Mutex::new(snapshot),
            }
        }
    }

    #[async_trait]
    impl UserExt for StaleReads {
        async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, Error> {
            self.inner.get_user_by_id(user_id).await
        }

        async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
            self.inner.get_user_by_username(username).await
        }

        async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, Error> {
            self.inner.get_users_by_role(role).await
        }

        async fn save_user(&self, user: NewUser) -> Result<User, Error> {
            self.inner.save_user(user).await
        }
    }

    #[async_trait]
    impl TicketExt for StaleReads {
        async fn get_ticket_by_id(
            &self,
            ticket_id: i64,
        ) -> Result<Option<TicketWithUsers>, Error> {
            let pinned = self
                .pinned
                .lock()
                .unwrap()
                .clone()
                .filter(|t| t.ticket.id == ticket_id);
            match pinned {
                Some(ticket) => Ok(Some(ticket)),
                None => self.inner.get_ticket_by_id(ticket_id).await,
            }
        }

        async fn get_tickets_by_client(
            &self,
            client_id: i64,
        ) -> Result<Vec<TicketWithUsers>, Error> {
            self.inner.get_tickets_by_client(client_id).await
        }

        async fn get_tickets_by_master(
            &self,
            master_id: i64,
        ) -> Result<Vec<TicketWithUsers>, Error> {
            self.inner.get_tickets_by_master(master_id).await
        }

        async fn get_pending_unassigned_tickets(&self) -> Result<Vec<TicketWithUsers>, Error> {
            self.inner.get_pending_unassigned_tickets().await
        }

        async fn get_all_tickets(&self) -> Result<Vec<TicketWithUsers>, Error> {
            self.inner.get_all_tickets().await
        }

        async fn ticket_number_exists(&self, ticket_number: &str) -> Result<bool, Error> {
            self.inner.ticket_number_exists(ticket_number).await
        }

        async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, Error> {
            self.inner.create_ticket(ticket).await
        }

        async fn conditional_assign(
            &self,
            ticket_id: i64,
            master_id: i64,
        ) -> Result<u64, Error> {
            self.inner.conditional_assign(ticket_id, master_id).await
        }

        async fn conditional_update_status(
            &self,
            ticket_id: i64,
            expected: TicketStatus,
            status: TicketStatus,
        ) -> Result<u64, Error> {
            self.inner
                .conditional_update_status(ticket_id, expected, status)
                .await
        }

        async fn update_ticket_content(
            &self,
            ticket_id: i64,
            title: &str,
            description: &str,
            scope: EditScope,
        ) -> Result<u64, Error> {
            self.inner
                .update_ticket_content(ticket_id, title, description, scope)
                .await
        }

        async fn cascade_delete_ticket(&self, ticket_id: i64) -> Result<u64, Error> {
            self.inner.cascade_delete_ticket(ticket_id).await
        }
    }

    #[async_trait]
    impl CommentExt for StaleReads {
        async fn add_comment(&self, comment: NewComment) -> Result<Comment, Error> {
            self.inner.add_comment(comment).await
        }

        async fn get_comments_by_ticket(&self, ticket_id: i64) -> Result<Vec<Comment>, Error> {
            self.inner.get_comments_by_ticket(ticket_id).await
        }
    }

    #[async_trait]
    impl NotificationExt for StaleReads {
        async fn create_notification(
            &self,
            notification: NewNotification,
        ) -> Result<Notification, Error> {
            self.inner.create_notification(notification).await
        }

        async fn get_user_notifications(
            &self,
            user_id: i64,
            unread_only: bool,
        ) -> Result<Vec<NotificationWithTicket>, Error> {
            self.inner.get_user_notifications(user_id, unread_only).await
        }

        async fn get_ticket_notifications(
            &self,
            ticket_id: i64,
        ) -> Result<Vec<Notification>, Error> {
            self.inner.get_ticket_notifications(ticket_id).await
        }

        async fn mark_read(&self, notification_id: i64, user_id: i64) -> Result<u64, Error> {
            self.inner.mark_read(notification_id, user_id).await
        }

        async fn mark_all_read(&self, user_id: i64) -> Result<u64, Error> {
            self.inner.mark_all_read(user_id).await
        }

        async fn get_unread_count(&self, user_id: i64) -> Result<i64, Error> {
            self.inner.get_unread_count(user_id).await
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        service: TicketService,
        admin: User,
        manager: User,
        master1: User,
        master2: User,
        client1: User,
        client2: User,
    }

    async fn user(store: &MemoryStore, username: &str, full_name: &str, role: UserRole) -> User {
        store
            .save_user(NewUser {
                username: username.to_string(),
                password: "hash".to_string(),
                full_name: full_name.to_string(),
                role,
                email: None,
                phone: None,
            })
            .await
            .unwrap()
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let admin = user(&store, "admin", "Ada Admin", UserRole::Admin).await;
        let manager = user(&store, "manager", "Max Manager", UserRole::Manager).await;
        let master1 = user(&store, "master1", "Mia Master", UserRole::Master).await;
        let master2 = user(&store, "master2", "Milo Master", UserRole::Master).await;
        let client1 = user(&store, "client1", "Carl Client", UserRole::Client).await;
        let client2 = user(&store, "client2", "Cleo Client", UserRole::Client).await;

        let notifications = Arc::new(NotificationService::new(store.clone(), true));
        let service = TicketService::new(store.clone(), notifications);

        Fixture {
            store,
            service,
            admin,
            manager,
            master1,
            master2,
            client1,
            client2,
        }
    }

    impl Fixture {
        async fn new_ticket(&self) -> Ticket {
            self.service
                .try_create_ticket(
                    "Printer jams".to_string(),
                    "Paper jams on every page".to_string(),
                    self.client1.id,
                )
                .await
                .unwrap()
        }

        async fn load(&self, ticket_id: i64) -> Ticket {
            self.service
                .get_ticket(ticket_id)
                .await
                .unwrap()
                .unwrap()
                .ticket
        }

        /// A second service whose ticket reads are frozen at the current
        /// state of `ticket_id`.
        async fn stale_service(&self, ticket_id: i64) -> TicketService {
            let stale = Arc::new(StaleReads::pinned_at(self.store.clone(), ticket_id).await);
            let notifications = Arc::new(NotificationService::new(stale.clone(), true));
            TicketService::new(stale, notifications)
        }

        async fn assert_master_invariant(&self) {
            for t in self.service.all_tickets().await.unwrap() {
                if t.ticket.status.requires_master() {
                    assert!(t.ticket.assigned_master_id.is_some(), "{:?}", t.ticket);
                }
            }
        }
    }

    #[tokio::test]
    async fn created_ticket_is_pending_and_unassigned() {
        let f = fixture().await;
        let first = f.new_ticket().await;
        let second = f.new_ticket().await;

        let loaded = f.load(first.id).await;
        assert_eq!(loaded.status, TicketStatus::Pending);
        assert_eq!(loaded.assigned_master_id, None);
        assert!(loaded.ticket_number.starts_with('T'));
        assert_ne!(first.ticket_number, second.ticket_number);

        let admin_inbox = f.store.get_user_notifications(f.admin.id, false).await.unwrap();
        assert_eq!(admin_inbox.len(), 2);
        assert!(admin_inbox
            .iter()
            .all(|n| n.notification.notification_type == NotificationType::NewTicket));
    }

    #[tokio::test]
    async fn create_for_unknown_client_returns_none() {
        let f = fixture().await;
        let created = f
            .service
            .create_ticket("Broken screen".to_string(), "Cracked in the corner".to_string(), 999)
            .await;
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn status_and_assignment_scenario() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;

        // No master yet.
        let early = f
            .service
            .try_update_status(ticket.id, TicketStatus::InProgress)
            .await;
        assert_eq!(early.unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(f.load(ticket.id).await.status, TicketStatus::Pending);

        let admin = Session::for_user(&f.admin);
        assert!(f.service.assign_master(&admin, ticket.id, f.master1.id).await);

        let assigned = f.load(ticket.id).await;
        assert_eq!(assigned.status, TicketStatus::InProgress);
        assert_eq!(assigned.assigned_master_id, Some(f.master1.id));

        let master_inbox = f.store.get_user_notifications(f.master1.id, false).await.unwrap();
        assert_eq!(master_inbox.len(), 1);
        assert_eq!(
            master_inbox[0].notification.notification_type,
            NotificationType::Assignment
        );
        assert_eq!(
            master_inbox[0].notification.message,
            format!(
                "You have been assigned ticket #{} 'Printer jams' from client Carl Client",
                ticket.ticket_number
            )
        );

        let client_inbox = f.store.get_user_notifications(f.client1.id, false).await.unwrap();
        assert_eq!(client_inbox.len(), 1);
        assert_eq!(
            client_inbox[0].notification.notification_type,
            NotificationType::MasterAssigned
        );
        assert!(client_inbox[0].notification.message.starts_with("Master Mia Master"));

        assert!(f.service.update_status(ticket.id, TicketStatus::Completed).await);
        assert_eq!(f.load(ticket.id).await.status, TicketStatus::Completed);

        let client_inbox = f.store.get_user_notifications(f.client1.id, true).await.unwrap();
        let change = client_inbox
            .iter()
            .find(|n| n.notification.notification_type == NotificationType::StatusChange)
            .unwrap();
        assert!(change
            .notification
            .message
            .ends_with("changed from 'In progress' to 'Completed'"));

        f.assert_master_invariant().await;
    }

    #[tokio::test]
    async fn unchanged_status_sends_nothing() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;

        let changed = f
            .service
            .try_update_status(ticket.id, TicketStatus::Pending)
            .await
            .unwrap();
        assert!(!changed);
        assert_eq!(f.store.get_unread_count(f.client1.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cancel_and_waiting_parts_need_no_master() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;

        assert!(f.service.update_status(ticket.id, TicketStatus::WaitingParts).await);
        assert!(f.service.update_status(ticket.id, TicketStatus::Cancelled).await);
        assert!(!f.service.update_status(ticket.id, TicketStatus::Completed).await);
        assert!(!f.service.update_status(404, TicketStatus::Cancelled).await);

        f.assert_master_invariant().await;
    }

    #[tokio::test]
    async fn concurrent_assignment_has_one_winner() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;
        let admin = Session::for_user(&f.admin);
        let manager = Session::for_user(&f.manager);

        let (a, b) = tokio::join!(
            f.service.try_assign_master(&admin, ticket.id, f.master1.id),
            f.service.try_assign_master(&manager, ticket.id, f.master2.id),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(
            loser.kind(),
            ErrorKind::Conflict | ErrorKind::InvalidState
        ));

        let assigned = f.load(ticket.id).await;
        assert!(assigned.assigned_master_id == Some(f.master1.id)
            || assigned.assigned_master_id == Some(f.master2.id));
        assert_eq!(assigned.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn assignment_after_stale_read_is_a_conflict() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;
        let late = f.stale_service(ticket.id).await;

        f.service
            .try_assign_master(&Session::for_user(&f.admin), ticket.id, f.master1.id)
            .await
            .unwrap();

        let err = late
            .try_assign_master(&Session::for_user(&f.manager), ticket.id, f.master2.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!late.assign_master(&Session::for_user(&f.admin), ticket.id, f.master2.id).await);

        let stored = f.load(ticket.id).await;
        assert_eq!(stored.assigned_master_id, Some(f.master1.id));
        assert_eq!(stored.status, TicketStatus::InProgress);
        assert!(f
            .store
            .get_user_notifications(f.master2.id, false)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            f.store.get_user_notifications(f.client1.id, false).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn status_change_after_stale_read_is_a_conflict() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;
        assert!(
            f.service
                .assign_master(&Session::for_user(&f.admin), ticket.id, f.master1.id)
                .await
        );
        let late = f.stale_service(ticket.id).await;

        assert!(f.service.try_update_status(ticket.id, TicketStatus::Completed).await.unwrap());

        // Expects in_progress, finds completed.
        let err = late
            .try_update_status(ticket.id, TicketStatus::WaitingParts)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!late.update_status(ticket.id, TicketStatus::Cancelled).await);

        assert_eq!(f.load(ticket.id).await.status, TicketStatus::Completed);
        let changes = f
            .store
            .get_user_notifications(f.client1.id, false)
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.notification.notification_type == NotificationType::StatusChange)
            .count();
        assert_eq!(changes, 1);
        f.assert_master_invariant().await;
    }

    #[tokio::test]
    async fn assignment_permissions() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;

        let client = Session::for_user(&f.client1);
        let err = f
            .service
            .try_assign_master(&client, ticket.id, f.master1.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        // A master cannot hand a ticket to someone else.
        let master1 = Session::for_user(&f.master1);
        let err = f
            .service
            .try_assign_master(&master1, ticket.id, f.master2.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = f
            .service
            .try_assign_master(&Session::for_user(&f.admin), ticket.id, f.client2.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        f.service
            .try_assign_master(&master1, ticket.id, f.master1.id)
            .await
            .unwrap();
        assert_eq!(f.load(ticket.id).await.assigned_master_id, Some(f.master1.id));

        let err = f
            .service
            .try_assign_master(&Session::for_user(&f.manager), ticket.id, f.master2.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn client_edit_only_while_pending() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;
        let client = Session::for_user(&f.client1);

        assert!(
            f.service
                .update_ticket(&client, ticket.id, "Printer jams badly", "Jams on page two")
                .await
        );
        let edited = f.load(ticket.id).await;
        assert_eq!(edited.title, "Printer jams badly");
        assert_eq!(edited.description, "Jams on page two");

        assert!(
            f.service
                .assign_master(&Session::for_user(&f.admin), ticket.id, f.master1.id)
                .await
        );

        let late = f
            .service
            .try_update_ticket(&client, ticket.id, "Changed", "Changed again")
            .await;
        assert_eq!(late.unwrap_err().kind(), ErrorKind::Forbidden);
        let unchanged = f.load(ticket.id).await;
        assert_eq!(unchanged.title, "Printer jams badly");
        assert_eq!(unchanged.description, "Jams on page two");

        let master = Session::for_user(&f.master1);
        assert!(f.service.update_ticket(&master, ticket.id, "Fuser", "Replace fuser").await);
        let other_master = Session::for_user(&f.master2);
        assert!(!f.service.update_ticket(&other_master, ticket.id, "No", "Nope").await);
    }

    #[tokio::test]
    async fn manager_can_assign_but_not_edit_or_delete() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;
        let manager = Session::for_user(&f.manager);

        let edit = f
            .service
            .try_update_ticket(&manager, ticket.id, "Managed", "Managed text")
            .await;
        assert_eq!(edit.unwrap_err().kind(), ErrorKind::Forbidden);

        let delete = f.service.try_delete_ticket(&manager, ticket.id).await;
        assert_eq!(delete.unwrap_err().kind(), ErrorKind::Forbidden);

        assert!(f.service.assign_master(&manager, ticket.id, f.master2.id).await);
    }

    #[tokio::test]
    async fn admin_delete_cascades() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;
        let admin = Session::for_user(&f.admin);

        assert!(f.service.assign_master(&admin, ticket.id, f.master1.id).await);
        assert!(
            f.service
                .add_comment(&Session::for_user(&f.client1), ticket.id, "Any news?")
                .await
        );
        assert!(!f.store.get_ticket_notifications(ticket.id).await.unwrap().is_empty());

        assert!(f.service.delete_ticket(&admin, ticket.id).await);

        assert!(f.service.get_ticket(ticket.id).await.unwrap().is_none());
        assert!(f.service.comments_for_ticket(ticket.id).await.unwrap().is_empty());
        assert!(f.store.get_ticket_notifications(ticket.id).await.unwrap().is_empty());
        assert!(f
            .store
            .get_user_notifications(f.master1.id, false)
            .await
            .unwrap()
            .is_empty());

        let again = f.service.try_delete_ticket(&admin, ticket.id).await;
        assert_eq!(again.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn client_deletes_only_own_tickets() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;

        let other = f
            .service
            .try_delete_ticket(&Session::for_user(&f.client2), ticket.id)
            .await;
        assert_eq!(other.unwrap_err().kind(), ErrorKind::Forbidden);

        let master = f
            .service
            .try_delete_ticket(&Session::for_user(&f.master1), ticket.id)
            .await;
        assert_eq!(master.unwrap_err().kind(), ErrorKind::Forbidden);

        assert!(
            f.service
                .delete_ticket(&Session::for_user(&f.client1), ticket.id)
                .await
        );
        assert!(f.service.tickets_for_client(f.client1.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_carry_author_and_keep_order() {
        let f = fixture().await;
        let ticket = f.new_ticket().await;

        let client = Session::for_user(&f.client1);
        let master = Session::for_user(&f.master1);
        f.service
            .try_add_comment(&client, ticket.id, "It started yesterday")
            .await
            .unwrap();
        f.service
            .try_add_comment(&master, ticket.id, "Bring it in tomorrow")
            .await
            .unwrap();

        let comments = f.service.comments_for_ticket(ticket.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].user_name, "Carl Client");
        assert_eq!(comments[0].user_role, UserRole::Client);
        assert_eq!(comments[1].comment_text, "Bring it in tomorrow");

        let missing = f.service.try_add_comment(&client, 404, "Hello").await;
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(!f.service.add_comment(&Session::anonymous(), ticket.id, "Hi").await);
    }

    #[tokio::test]
    async fn listings_by_role() {
        let f = fixture().await;
        let first = f.new_ticket().await;
        let second = f.new_ticket().await;
        let admin = Session::for_user(&f.admin);

        assert_eq!(f.service.available_tickets().await.unwrap().len(), 2);
        assert!(f.service.assign_master(&admin, first.id, f.master1.id).await);

        let available = f.service.available_tickets().await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].ticket.id, second.id);

        let mine = f.service.tickets_for_master(f.master1.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].master_name.as_deref(), Some("Mia Master"));

        assert_eq!(f.service.tickets_for_client(f.client1.id).await.unwrap().len(), 2);
        assert!(f.service.tickets_for_client(f.client2.id).await.unwrap().is_empty());
        assert_eq!(f.service.all_tickets().await.unwrap().len(), 2);
    }
}

//! Who may do what to a ticket.
//!
//! Every check takes an explicit [`Session`]; nothing here reads global state.

use crate::{
    config::CommentVisibility,
    models::{
        ticketmodel::{Ticket, TicketStatus},
        usermodel::{User, UserRole},
    },
};

/// The requester of a lifecycle operation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<SessionUser>,
}

#[derive(Debug, Clone)]
struct SessionUser {
    id: i64,
    full_name: String,
    role: UserRole,
}

impl Session {
    pub fn anonymous() -> Self {
        Session { user: None }
    }

    pub fn for_user(user: &User) -> Self {
        Session {
            user: Some(SessionUser {
                id: user.id,
                full_name: user.full_name.clone(),
                role: user.role,
            }),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn full_name(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.full_name.as_str())
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_client(&self) -> bool {
        self.role() == Some(UserRole::Client)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }

    pub fn is_master(&self) -> bool {
        self.role() == Some(UserRole::Master)
    }

    fn is(&self, user_id: Option<i64>) -> bool {
        matches!((self.user_id(), user_id), (Some(a), Some(b)) if a == b)
    }
}

/// Admin, owning client, assigned master, or any master while the ticket is
/// still up for grabs.
pub fn can_view_ticket(session: &Session, ticket: &Ticket) -> bool {
    if session.is_admin() {
        return true;
    }
    if session.is(Some(ticket.client_id)) {
        return true;
    }
    if session.is_master() {
        return session.is(ticket.assigned_master_id)
            || (ticket.status == TicketStatus::Pending && ticket.assigned_master_id.is_none());
    }
    false
}

/// Status moves an assigned master may make from the ticket's current status.
pub fn master_transitions(from: TicketStatus) -> &'static [TicketStatus] {
    match from {
        TicketStatus::InProgress => &[TicketStatus::WaitingParts, TicketStatus::Completed],
        TicketStatus::WaitingParts => &[TicketStatus::InProgress, TicketStatus::Completed],
        _ => &[],
    }
}

pub fn can_set_status(session: &Session, ticket: &Ticket, new_status: TicketStatus) -> bool {
    if session.is_admin() {
        return true;
    }
    session.is_master()
        && session.is(ticket.assigned_master_id)
        && master_transitions(ticket.status).contains(&new_status)
}

pub fn can_access_comments(
    session: &Session,
    ticket: &Ticket,
    visibility: CommentVisibility,
) -> bool {
    match visibility {
        CommentVisibility::Participants => can_view_ticket(session, ticket),
        CommentVisibility::StaffOnly => {
            session.is_admin() || (session.is_master() && session.is(ticket.assigned_master_id))
        }
    }
}

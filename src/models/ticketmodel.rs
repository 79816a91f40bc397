// src/models/ticketmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;

use super::usermodel::UserRole;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    InProgress,
    WaitingParts,
    Completed,
    Cancelled,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::Pending,
        TicketStatus::InProgress,
        TicketStatus::WaitingParts,
        TicketStatus::Completed,
        TicketStatus::Cancelled,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::WaitingParts => "waiting_parts",
            TicketStatus::Completed => "completed",
            TicketStatus::Cancelled => "cancelled",
        }
    }

    /// Human-facing name used when composing notification text.
    pub fn display_name(&self) -> &str {
        match self {
            TicketStatus::Pending => "Pending",
            TicketStatus::InProgress => "In progress",
            TicketStatus::WaitingParts => "Waiting for parts",
            TicketStatus::Completed => "Completed",
            TicketStatus::Cancelled => "Cancelled",
        }
    }

    /// A ticket may only hold these statuses while a master is assigned.
    pub fn requires_master(&self) -> bool {
        matches!(self, TicketStatus::InProgress | TicketStatus::Completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub client_id: i64,
    pub assigned_master_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketWithUsers {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: Ticket,
    pub client_name: Option<String>,
    pub master_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub client_id: i64,
}

/// Row predicate for content edits, derived from who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    Any,
    OwnedPending { client_id: i64 },
    AssignedTo { master_id: i64 },
}

impl EditScope {
    pub fn permits(&self, ticket: &Ticket) -> bool {
        match *self {
            EditScope::Any => true,
            EditScope::OwnedPending { client_id } => {
                ticket.client_id == client_id && ticket.status == TicketStatus::Pending
            }
            EditScope::AssignedTo { master_id } => ticket.assigned_master_id == Some(master_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_role: UserRole,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub ticket_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_role: UserRole,
    pub comment_text: String,
}

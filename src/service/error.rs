use axum::http::StatusCode;
use thiserror::Error;

use crate::{
    error::{ErrorMessage, HttpError},
    models::ticketmodel::TicketStatus,
};

/// Coarse classification of a lifecycle failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidState,
    Conflict,
    Persistence,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Ticket {0} not found")]
    TicketNotFound(i64),

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Ticket {0} has no assigned master; status {1:?} requires one")]
    MasterRequired(i64, TicketStatus),

    #[error("Ticket {0} is not in status {1:?}")]
    InvalidStatus(i64, TicketStatus),

    #[error("Ticket {0} was changed concurrently")]
    Conflict(i64),

    #[error("Username {0} is already taken")]
    UsernameTaken(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::TicketNotFound(_) | ServiceError::UserNotFound(_) => ErrorKind::NotFound,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::MasterRequired(_, _)
            | ServiceError::InvalidStatus(_, _)
            | ServiceError::Validation(_) => ErrorKind::InvalidState,
            ServiceError::Conflict(_) | ServiceError::UsernameTaken(_) => ErrorKind::Conflict,
            ServiceError::Database(_) => ErrorKind::Persistence,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::UsernameTaken(_) => {
                HttpError::unique_constraint_violation(ErrorMessage::UsernameExist.to_string())
            }
            ServiceError::Database(e) => {
                tracing::error!("database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
            other => HttpError::new(other.to_string(), other.status_code()),
        }
    }
}

// dtos/ticketdtos.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{models::ticketmodel::TicketStatus, service::stats_service::StatsPeriod};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTicketDto {
    #[validate(length(min = 5, max = 200, message = "Title must be 5 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 2000, message = "Description must be 10 to 2000 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTicketDto {
    #[validate(length(min = 5, max = 200, message = "Title must be 5 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 2000, message = "Description must be 10 to 2000 characters"))]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignMasterDto {
    pub master_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTicketStatusDto {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1 to 2000 characters"))]
    pub comment_text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketQueryParams {
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQueryParams {
    pub unread_only: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQueryParams {
    pub period: Option<StatsPeriod>,
}

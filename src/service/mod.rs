pub mod access_policy;
pub mod auth_service;
pub mod error;
pub mod notification_service;
pub mod stats_service;
pub mod ticket_service;

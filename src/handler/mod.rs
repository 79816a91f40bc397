pub mod auth;
pub mod notifications;
pub mod stats;
pub mod tickets;
pub mod users;

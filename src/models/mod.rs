pub mod usermodel;
pub mod ticketmodel;
pub mod notificationmodel;

pub mod password;
pub mod ticket_number;
pub mod token;

pub mod db;
pub mod memory;
pub mod notificationdb;
pub mod ticketdb;
pub mod userdb;

pub use notificationdb::NotificationExt;
pub use ticketdb::{CommentExt, TicketExt};
pub use userdb::UserExt;

/// Everything the lifecycle engine needs from persistence. Implemented by
/// [`db::DBClient`] (Postgres) and [`memory::MemoryStore`].
pub trait Storage: UserExt + TicketExt + CommentExt + NotificationExt + Send + Sync {}

impl<T> Storage for T where T: UserExt + TicketExt + CommentExt + NotificationExt + Send + Sync {}

pub mod conversations;
pub mod messages;
pub mod sessions;
pub mod streams;
pub mod users;

pub mod contacts;
pub mod conversations;
pub mod delivery;
pub mod messages;
pub mod sessions;
pub mod streams;
pub mod users;

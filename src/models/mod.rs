pub mod admission;
pub mod api;
pub mod contacts;
pub mod conversations;
pub mod delivery;
pub mod messages;
pub mod users;

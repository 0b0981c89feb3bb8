pub mod cleanup_streams;
pub mod tasks;

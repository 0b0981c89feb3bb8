pub mod payments_consumer;

pub mod payment_completed;

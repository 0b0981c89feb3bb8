use crate::common::context::Context;
use crate::common::delivery_hub::DeliveryHub;
use crate::common::error_log::ErrorLog;
use crate::models::admission::AdmissionPolicy;
use crate::models::delivery::DeliveryConfig;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub hub: DeliveryHub,
    pub policy: Arc<AdmissionPolicy>,
    pub delivery: Arc<DeliveryConfig>,
    pub error_log: ErrorLog,
    /// Bearer token for operator endpoints. Those endpoints are closed when unset.
    pub admin_token: Option<Arc<str>>,
}

impl Context for AppState {
    fn db(&self) -> &Pool<Sqlite> {
        &self.db
    }

    fn hub(&self) -> &DeliveryHub {
        &self.hub
    }

    fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    fn delivery(&self) -> &DeliveryConfig {
        &self.delivery
    }
}

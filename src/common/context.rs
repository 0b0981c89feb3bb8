use crate::common::delivery_hub::DeliveryHub;
use crate::models::admission::AdmissionPolicy;
use crate::models::delivery::DeliveryConfig;
use sqlx::{Pool, Sqlite};

pub trait Context: Sync + Send {
    fn db(&self) -> &Pool<Sqlite>;
    fn hub(&self) -> &DeliveryHub;
    fn policy(&self) -> &AdmissionPolicy;
    fn delivery(&self) -> &DeliveryConfig;
}

use crate::common::delivery_hub::DeliveryHub;
use crate::common::error_log::ErrorLog;
use crate::common::state::AppState;
use crate::settings::AppSettings;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const SCHEMA: &str = include_str!("../../migrations/0001_messaging.sql");

pub fn initialize_logging(settings: &AppSettings, error_log: &ErrorLog) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        // .json()
        .with_timer(tracing_subscriber::fmt::time())
        .with_level(true)
        .compact()
        .with_filter(LevelFilter::from_level(settings.level));
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(error_log.layer())
        .init();
}

pub async fn initialize_state(
    settings: &AppSettings,
    error_log: ErrorLog,
) -> anyhow::Result<AppState> {
    let db = initialize_db(settings).await?;
    apply_schema(&db).await?;
    Ok(AppState {
        db,
        hub: DeliveryHub::new(settings.hub_buffer_size),
        policy: Arc::new(settings.admission_policy()),
        delivery: Arc::new(settings.delivery_config()),
        error_log,
        admin_token: settings.admin_token.as_deref().map(Arc::from),
    })
}

pub async fn initialize_db(settings: &AppSettings) -> anyhow::Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(&settings.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .acquire_timeout(settings.db_wait_timeout)
        .max_connections(settings.db_max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn apply_schema(db: &Pool<Sqlite>) -> sqlx::Result<()> {
    sqlx::raw_sql(SCHEMA).execute(db).await?;
    Ok(())
}

use crate::common::env::FromEnv;
use crate::models::admission::{AdmissionPolicy, DEFAULT_MAX_LENGTH, DEFAULT_PRESET_MESSAGES};
use crate::models::delivery::DeliveryConfig;
use std::env;
use std::net::IpAddr;
use std::ops::Deref;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::Level;

const PRESET_SEPARATOR: char = '|';

pub struct AppSettings {
    pub app_component: String,
    pub level: Level,
    pub app_host: IpAddr,
    pub app_port: u16,

    pub database_url: String,
    pub db_max_connections: u32,
    pub db_wait_timeout: Duration,

    pub redis_url: String,
    pub payments_channel: String,

    pub message_max_length: usize,
    pub preset_messages: Vec<String>,

    pub message_poll_interval: Duration,
    pub conversation_poll_interval: Duration,
    pub push_resubscribe_attempts: u32,
    pub long_poll_max_wait: Duration,
    pub hub_buffer_size: usize,
    pub stream_cleanup_interval: Duration,

    pub error_log_capacity: usize,
    pub admin_token: Option<String>,
}

impl AppSettings {
    pub fn load_from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();

        let app_component = env::var("APP_COMPONENT")?;
        let level = Level::from_env("LOG_LEVEL")?;
        let app_host = IpAddr::from_env("APP_HOST")?;
        let app_port = u16::from_env("APP_PORT")?;

        let database_url = env::var("DATABASE_URL")?;
        let db_max_connections = u32::from_env("DB_MAX_CONNECTIONS")?;
        let db_wait_timeout_secs = u64::from_env("DB_WAIT_TIMEOUT_SECS")?;
        let db_wait_timeout = Duration::from_secs(db_wait_timeout_secs);

        let redis_url = env::var("REDIS_URL")?;
        let payments_channel =
            String::from_env_or("PAYMENTS_CHANNEL", "payments:completed".to_owned())?;

        let message_max_length = usize::from_env_or("MESSAGE_MAX_LENGTH", DEFAULT_MAX_LENGTH)?;
        let preset_messages = match env::var("PRESET_MESSAGES") {
            Ok(presets) => parse_presets(&presets),
            Err(_) => DEFAULT_PRESET_MESSAGES
                .iter()
                .map(|preset| preset.to_string())
                .collect(),
        };

        let message_poll_interval_ms = u64::from_env_or("MESSAGE_POLL_INTERVAL_MS", 5_000)?;
        let message_poll_interval = Duration::from_millis(message_poll_interval_ms);
        let conversation_poll_interval_ms =
            u64::from_env_or("CONVERSATION_POLL_INTERVAL_MS", 10_000)?;
        let conversation_poll_interval = Duration::from_millis(conversation_poll_interval_ms);
        let push_resubscribe_attempts = u32::from_env_or("PUSH_RESUBSCRIBE_ATTEMPTS", 3)?;
        let long_poll_max_wait_ms = u64::from_env_or("LONG_POLL_MAX_WAIT_MS", 25_000)?;
        let long_poll_max_wait = Duration::from_millis(long_poll_max_wait_ms);
        let hub_buffer_size = usize::from_env_or("HUB_BUFFER_SIZE", 256)?;
        let stream_cleanup_interval_secs = u64::from_env_or("STREAM_CLEANUP_INTERVAL_SECS", 60)?;
        let stream_cleanup_interval = Duration::from_secs(stream_cleanup_interval_secs);

        let error_log_capacity = usize::from_env_or("ERROR_LOG_CAPACITY", 50)?;
        let admin_token = env::var("ADMIN_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(AppSettings {
            app_component,
            level,
            app_port,
            app_host,

            database_url,
            db_max_connections,
            db_wait_timeout,

            redis_url,
            payments_channel,

            message_max_length,
            preset_messages,

            message_poll_interval,
            conversation_poll_interval,
            push_resubscribe_attempts,
            long_poll_max_wait,
            hub_buffer_size,
            stream_cleanup_interval,

            error_log_capacity,
            admin_token,
        })
    }

    pub fn get() -> &'static AppSettings {
        settings()
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::new(self.message_max_length, self.preset_messages.clone())
    }

    pub fn delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            message_poll_interval: self.message_poll_interval,
            conversation_poll_interval: self.conversation_poll_interval,
            resubscribe_attempts: self.push_resubscribe_attempts,
            long_poll_max_wait: self.long_poll_max_wait,
        }
    }
}

pub fn settings() -> &'static AppSettings {
    static SETTINGS: LazyLock<AppSettings> =
        LazyLock::new(|| AppSettings::load_from_env().expect("Failed to load settings"));
    SETTINGS.deref()
}

fn parse_presets(raw: &str) -> Vec<String> {
    raw.split(PRESET_SEPARATOR)
        .map(str::trim)
        .filter(|preset| !preset.is_empty())
        .map(str::to_owned)
        .collect()
}

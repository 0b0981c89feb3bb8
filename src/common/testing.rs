use crate::common::context::Context;
use crate::common::delivery_hub::DeliveryHub;
use crate::common::error_log::ErrorLog;
use crate::common::init::apply_schema;
use crate::common::state::AppState;
use crate::common::to_datetime;
use crate::models::admission::AdmissionPolicy;
use crate::models::delivery::DeliveryConfig;
use crate::models::messages::Message;
use crate::models::users::{Identity, Role};
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const STUDENT_ID: i64 = 1;
pub const MENTOR_ID: i64 = 2;
pub const OTHER_STUDENT_ID: i64 = 3;
pub const OTHER_MENTOR_ID: i64 = 4;

pub const STUDENT_TOKEN: &str = "student-token";
pub const MENTOR_TOKEN: &str = "mentor-token";
pub const ADMIN_TOKEN: &str = "admin-token";

const USERS: [(i64, &str, Role); 4] = [
    (STUDENT_ID, "Sam Student", Role::Student),
    (MENTOR_ID, "Morgan Mentor", Role::Mentor),
    (OTHER_STUDENT_ID, "Alex Student", Role::Student),
    (OTHER_MENTOR_ID, "Riley Mentor", Role::Mentor),
];

pub fn delivery_config() -> DeliveryConfig {
    DeliveryConfig {
        message_poll_interval: Duration::from_millis(40),
        conversation_poll_interval: Duration::from_millis(60),
        resubscribe_attempts: 2,
        long_poll_max_wait: Duration::from_secs(5),
    }
}

/// Fresh in-memory store seeded with two students, two mentors and a session each
/// for the first pair.
pub async fn state() -> AppState {
    // a single connection that never expires keeps the in-memory database alive
    let db = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    apply_schema(&db).await.expect("schema");

    let state = AppState {
        db,
        hub: DeliveryHub::new(64),
        policy: Arc::new(AdmissionPolicy::default()),
        delivery: Arc::new(delivery_config()),
        error_log: ErrorLog::new(16),
        admin_token: Some(Arc::from(ADMIN_TOKEN)),
    };

    for (user_id, display_name, role) in USERS {
        sqlx::query("INSERT INTO users (id, display_name, avatar_url, role) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(display_name)
            .bind(format!("https://avatars.example/{user_id}.png"))
            .bind(role.as_str())
            .execute(state.db())
            .await
            .expect("seed user");
    }
    seed_session(&state, STUDENT_TOKEN, STUDENT_ID, 3_600_000).await;
    seed_session(&state, MENTOR_TOKEN, MENTOR_ID, 3_600_000).await;
    state
}

pub async fn seed_session<C: Context>(ctx: &C, token: &str, user_id: i64, expires_in_ms: i64) {
    let expires_at = Utc::now().timestamp_millis() + expires_in_ms;
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(ctx.db())
        .await
        .expect("seed session");
}

pub fn identity(user_id: i64) -> Identity {
    let role = USERS
        .iter()
        .find(|(id, _, _)| *id == user_id)
        .map_or(Role::Student, |(_, _, role)| *role);
    Identity { user_id, role }
}

pub fn student() -> Identity {
    identity(STUDENT_ID)
}

pub fn mentor() -> Identity {
    identity(MENTOR_ID)
}

pub fn sample_message(message_id: i64, created_at_millis: i64) -> Message {
    Message {
        message_id,
        conversation_id: Uuid::nil(),
        sender_id: MENTOR_ID,
        content: format!("message {message_id}"),
        is_preset: false,
        attachment_url: None,
        created_at: to_datetime(created_at_millis),
        read_at: None,
    }
}

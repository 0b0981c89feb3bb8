use crate::common::context::Context;
use crate::common::delivery_hub::DeliveryHub;
use crate::common::error::AppError;
use crate::common::error_log::ErrorLog;
use crate::common::init;
use crate::common::state::AppState;
use crate::models::admission::AdmissionPolicy;
use crate::models::delivery::DeliveryConfig;
use crate::settings::AppSettings;
use crate::workers::crons::cleanup_streams;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::get;
use sqlx::{Pool, Sqlite};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

pub mod v1;

/// Per-request handle on the shared state.
#[derive(Clone)]
pub struct RequestContext {
    pub db: Pool<Sqlite>,
    pub hub: DeliveryHub,
    pub policy: Arc<AdmissionPolicy>,
    pub delivery: Arc<DeliveryConfig>,
    pub error_log: ErrorLog,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .nest("/api/v1", v1::router())
}

async fn index() -> &'static str {
    concat!("Running mentor-chat-service v", env!("CARGO_PKG_VERSION"))
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self {
            db: state.db.clone(),
            hub: state.hub.clone(),
            policy: state.policy.clone(),
            delivery: state.delivery.clone(),
            error_log: state.error_log.clone(),
        })
    }
}

impl Context for RequestContext {
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

pub async fn serve(settings: &AppSettings, error_log: ErrorLog) -> anyhow::Result<()> {
    let state = init::initialize_state(settings, error_log).await?;
    let cleanup = tokio::spawn(cleanup_streams::serve(
        state.clone(),
        settings.stream_cleanup_interval,
    ));

    let address = SocketAddr::new(settings.app_host, settings.app_port);
    let listener = TcpListener::bind(address).await?;
    info!("Serving mentor-chat-service on {address}");

    let app = router().with_state(state.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    cleanup.abort();
    state.hub.shutdown();
    state.db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received terminate signal"),
    }
}

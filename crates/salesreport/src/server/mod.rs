mod query;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use salesreport_core::ReportSettings;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::AppConfig;

pub use query::{parse_request, query_string};
pub use state::{Session, SessionStore};

#[derive(Debug)]
pub struct AppState {
    sessions: Mutex<SessionStore>,
    settings: ReportSettings,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(SessionStore::new(config.max_sessions)),
            settings: config.settings,
        })
    }
}

pub fn router(config: &AppConfig) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/upload", post(routes::upload))
        .route("/report/{id}", get(routes::report))
        .route("/report/{id}/download", get(routes::download))
        .route("/report/{id}/bundle.json", get(routes::bundle_json))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(AppState::new(config))
}

pub async fn serve(config: AppConfig) -> Result<()> {
    let app = router(&config);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(
        address = %listener.local_addr()?,
        max_upload_bytes = config.max_upload_bytes,
        max_sessions = config.max_sessions,
        "listening"
    );
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

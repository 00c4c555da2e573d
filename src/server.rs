use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Local;
use log::{error, info};
use serde_json::json;

use crate::config::Config;
use crate::digest::{DigestProcessor, RunResult};
use crate::error::DigestError;
use crate::slack_notifier::SlackNotifier;

pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    pub slack: Option<Arc<SlackNotifier>>,
}

pub type SharedState = Arc<AppState>;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/api/cron", get(run_digest))
        .with_state(state)
}

pub async fn serve(state: SharedState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("🌐 Listening on {}", bind_addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn home() -> &'static str {
    "AI Email Summarizer running. Try /health or /api/cron"
}

async fn health() -> &'static str {
    "ok"
}

async fn run_digest(State(state): State<SharedState>) -> Result<Json<RunResult>, DigestError> {
    info!("⏰ /api/cron triggered");

    let processor = match DigestProcessor::from_config(&state.config, state.http.clone()) {
        Ok(processor) => processor.with_slack(state.slack.clone()),
        Err(e) => {
            error!("❌ Unable to start digest run: {}", e);
            return Err(e);
        }
    };

    let result = processor.run_and_report(Local::now().date_naive()).await?;

    Ok(Json(result))
}

impl IntoResponse for DigestError {
    fn into_response(self) -> Response {
        let status = if self.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = Json(json!({
            "ok": false,
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod config;
mod error;
mod extract;
mod models;
mod vision;

use config::Config;
use error::CheckError;
use models::{CheckRequest, CheckResult};
use vision::VisionClient;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    vision: VisionClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    if config.api_key().is_none() {
        tracing::warn!("OPENAI_API_KEY missing or malformed; /check will answer no_api_key");
    }

    let vision = VisionClient::new(&config).context("failed to build upstream client")?;
    tracing::info!("using model {}", vision.model());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let state = AppState {
        config: Arc::new(config),
        vision,
    };

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/docs", get(docs))
        .route("/check", post(check_endpoint))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn root() -> impl IntoResponse {
    Json(json!({"ok": true, "see": "/docs"}))
}

async fn health() -> impl IntoResponse {
    Json(json!({"ok": true}))
}

async fn docs() -> impl IntoResponse {
    Json(json!({
        "title": "AirMath API",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": [
            {"method": "GET", "path": "/", "returns": {"ok": true, "see": "/docs"}},
            {"method": "GET", "path": "/health", "returns": {"ok": true}},
            {
                "method": "POST",
                "path": "/check",
                "body": {"image": "base64 or data URL string", "expected": "integer"},
                "returns": {
                    "ok": "bool",
                    "raw": "cleaned model text (optional)",
                    "number": "extracted integer (optional)",
                    "correct": "bool (optional)",
                    "error": "no_api_key | openai_error: <category> | no_number_found (optional)"
                }
            }
        ]
    }))
}

async fn check_endpoint(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Json<CheckResult> {
    Json(run_check(&state, req).await)
}

async fn run_check(state: &AppState, req: CheckRequest) -> CheckResult {
    let Some(api_key) = state.config.api_key() else {
        return CheckResult::failure(&CheckError::NoApiKey);
    };

    let image = extract::strip_data_url_prefix(&req.image);

    let raw = match state.vision.read_answer(api_key, image).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(category = e.category(), "vision call failed: {}", e);
            return CheckResult::failure(&CheckError::from(e));
        }
    };
    tracing::debug!(raw = %raw, "model response");

    let result = extract::check_answer(&raw, req.expected);
    match &result.number {
        Some(number) => tracing::info!(
            number = %number,
            expected = req.expected,
            correct = result.correct.unwrap_or(false),
            "answer checked"
        ),
        None => tracing::info!(raw = ?result.raw, "no number found in model response"),
    }
    result
}

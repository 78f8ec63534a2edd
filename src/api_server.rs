//! Embedded HTTP server exposing the trainer engine.
//!
//! Serves the review, dashboard, mistakes, settings, import, and reset
//! operations as a small JSON API for the web client. Runs on localhost or
//! all interfaces depending on how the binary is configured; auth and
//! static assets are the outer layer's concern.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::trainer::algorithm::quality_from_correct;
use crate::trainer::{CardFilter, ReviewSettings, TrainerError, TrainerStore};

/// Server handle for managing the API lifecycle.
pub struct ApiServer {
    /// Port the server is listening on.
    pub port: u16,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Stop the server gracefully.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRequest {
    card_id: Uuid,
    /// Quality rating 0-5
    quality: Option<i32>,
    /// Legacy boolean submission, mapped to quality 4 / 1
    correct: Option<bool>,
}

#[derive(Deserialize)]
struct WordsQuery {
    mode: Option<String>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest {
    csv_text: String,
}

/// Map engine errors onto HTTP statuses with an `{error}` body
fn error_response(err: TrainerError) -> Response {
    let status = match err {
        TrainerError::InvalidQuality(_) | TrainerError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        TrainerError::CardNotFound(_) | TrainerError::ProfileNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        TrainerError::LockTimeout => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn clamp_limit(requested: Option<usize>, default: usize, max: usize) -> usize {
    requested.unwrap_or(default).clamp(1, max)
}

fn parse_filter(mode: Option<&str>) -> Option<CardFilter> {
    match mode.unwrap_or("all") {
        "all" => Some(CardFilter::All),
        "due" => Some(CardFilter::Due),
        "hard" => Some(CardFilter::Hard),
        _ => None,
    }
}

async fn health() -> Response {
    Json(json!({ "ok": true })).into_response()
}

async fn list_words(
    State(store): State<Arc<TrainerStore>>,
    Query(query): Query<WordsQuery>,
) -> Response {
    let Some(filter) = parse_filter(query.mode.as_deref()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "mode must be all, due, or hard" })),
        )
            .into_response();
    };
    let limit = clamp_limit(query.limit, 50, 200);

    match store.list_cards(filter, limit).await {
        Ok(words) => Json(json!({ "words": words })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn submit_review(
    State(store): State<Arc<TrainerStore>>,
    Json(request): Json<ReviewRequest>,
) -> Response {
    let quality = match (request.quality, request.correct) {
        (Some(quality), _) => quality,
        (None, Some(correct)) => quality_from_correct(correct),
        (None, None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "either quality or correct is required" })),
            )
                .into_response();
        }
    };

    match store
        .submit_review(store.default_profile_id(), request.card_id, quality)
        .await
    {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => error_response(err),
    }
}

async fn dashboard(State(store): State<Arc<TrainerStore>>) -> Response {
    match store.dashboard(store.default_profile_id()).await {
        Ok(dashboard) => Json(dashboard).into_response(),
        Err(err) => error_response(err),
    }
}

async fn mistakes(
    State(store): State<Arc<TrainerStore>>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let limit = clamp_limit(query.limit, 20, 50);
    match store.mistakes(limit).await {
        Ok(mistakes) => Json(json!({ "mistakes": mistakes })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_settings(State(store): State<Arc<TrainerStore>>) -> Response {
    Json(store.settings().await).into_response()
}

async fn update_settings(
    State(store): State<Arc<TrainerStore>>,
    Json(settings): Json<ReviewSettings>,
) -> Response {
    match store.update_settings(settings).await {
        Ok(updated) => Json(updated).into_response(),
        Err(err) => error_response(err),
    }
}

async fn import_csv(
    State(store): State<Arc<TrainerStore>>,
    Json(request): Json<ImportRequest>,
) -> Response {
    match store.import_text(&request.csv_text).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => error_response(err),
    }
}

async fn reset_progress(State(store): State<Arc<TrainerStore>>) -> Response {
    match store.reset().await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(err) => error_response(err),
    }
}

/// Build the API router over a shared store
pub fn router(store: Arc<TrainerStore>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/words", get(list_words))
        .route("/api/review", post(submit_review))
        .route("/api/dashboard", get(dashboard))
        .route("/api/mistakes", get(mistakes))
        .route("/api/settings", get(get_settings).post(update_settings))
        .route("/api/import-csv", post(import_csv))
        .route("/api/reset-progress", post(reset_progress))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// Start the API server.
///
/// Returns an ApiServer handle that can be used to get the port and stop
/// the server.
pub async fn start_server(
    store: Arc<TrainerStore>,
    addr: SocketAddr,
) -> Result<ApiServer, Box<dyn std::error::Error + Send + Sync>> {
    let app = router(store);

    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();

    log::info!("trainer API listening on http://{}", listener.local_addr()?);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                log::info!("trainer API shutting down");
            })
            .await
            .ok();
    });

    Ok(ApiServer {
        port,
        shutdown_tx: Some(shutdown_tx),
    })
}

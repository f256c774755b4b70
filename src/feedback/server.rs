//! HTTP API for feedback collection.

use crate::feedback::error::ApiError;
use crate::feedback::models::{FeedbackEntry, FeedbackStats, NewFeedback, RequestMeta};
use crate::feedback::store::FeedbackStore;
use anyhow::{Context, Result};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

/// Upper bound on an accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
struct AppState {
    store: FeedbackStore,
}

#[derive(Serialize)]
struct FeedbackList {
    success: bool,
    count: usize,
    feedback: Vec<FeedbackEntry>,
}

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    #[serde(flatten)]
    stats: FeedbackStats,
}

/// Build the router over an already-initialized store.
pub fn build_router(store: FeedbackStore) -> Router {
    Router::new()
        .route("/api/feedback", get(list_feedback).post(submit_feedback))
        .route("/api/feedback/stats", get(feedback_stats))
        .route("/api/health", get(health))
        .with_state(AppState { store })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Initialize the database and serve until Ctrl-C.
pub async fn serve(host: &str, port: u16, store: FeedbackStore) -> Result<()> {
    store
        .run(|s| s.init_schema())
        .await
        .with_context(|| format!("Failed to initialize database at {}", store.path().display()))?;
    info!("Database initialized at {}", store.path().display());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("🚀 Feedback API listening on http://{}", addr);
    println!("   POST /api/feedback        - Submit feedback");
    println!("   GET  /api/feedback        - View all feedback");
    println!("   GET  /api/feedback/stats  - View statistics");
    println!("   GET  /api/health          - Health check");

    axum::serve(
        listener,
        build_router(store).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Feedback server failed")?;

    info!("Feedback server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn submit_feedback(
    State(state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, ApiError> {
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ip_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::InvalidBody)?;
    let body: Value = serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidBody)?;

    let feedback = NewFeedback::from_json(
        &body,
        RequestMeta {
            user_agent,
            ip_address,
        },
    )?;

    let id = state.store.run(move |s| s.insert(&feedback)).await?;
    debug!("Stored feedback #{}", id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Feedback submitted successfully",
            "id": id,
        })),
    ))
}

async fn list_feedback(State(state): State<AppState>) -> Result<Json<FeedbackList>, ApiError> {
    let feedback = state.store.run(|s| s.list()).await?;
    Ok(Json(FeedbackList {
        success: true,
        count: feedback.len(),
        feedback,
    }))
}

async fn feedback_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.run(|s| s.stats()).await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
    }))
}

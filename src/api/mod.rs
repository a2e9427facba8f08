mod db_stats_source;
mod in_memory_stats;
mod source;

pub use db_stats_source::PersistentStatsSource;
pub use in_memory_stats::InMemoryStatsSource;
pub use source::ApiDataSource;

use crate::analysis::{ClassifyError, UrlAnalyzer};
use crate::export;
use crate::guard::{self, ProtectionStore};
use crate::store::{normalize_domain, BlocklistStore, NewBlockedDomain};
use crate::verdict::RiskLevel;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

pub struct ApiState {
    analyzer: Arc<UrlAnalyzer>,
    store: Arc<dyn BlocklistStore>,
    protection: Arc<dyn ProtectionStore>,
    data_source: Arc<dyn ApiDataSource>,
}

impl ApiState {
    pub fn new(
        analyzer: Arc<UrlAnalyzer>,
        store: Arc<dyn BlocklistStore>,
        protection: Arc<dyn ProtectionStore>,
        data_source: Arc<dyn ApiDataSource>,
    ) -> Self {
        Self {
            analyzer,
            store,
            protection,
            data_source,
        }
    }
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/analyze-url", post(analyze_url))
        .route("/content-blocker", get(content_blocker))
        .route("/add-blocked-domain", post(add_blocked_domain))
        .route("/api/stats", get(get_stats))
        .route("/api/logs", get(get_logs))
        .route("/api/status", get(get_status))
        .route("/api/protection", post(set_protection))
        // Extension and web UI call cross-origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_api_server(state: Arc<ApiState>, addr: SocketAddr) -> Result<()> {
    let app = build_router(state);

    tracing::info!("API Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind API server address")?;
    axum::serve(listener, app)
        .await
        .context("API server failed")?;
    Ok(())
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    url: Option<String>,
}

async fn analyze_url(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Response {
    let Some(url) = payload.url.filter(|u| !u.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "URL is required" })),
        )
            .into_response();
    };

    match state.analyzer.analyze(&url).await {
        Ok(verdict) => Json(verdict).into_response(),
        Err(ClassifyError::RateLimited) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Rate limit exceeded. Please try again later." })),
        )
            .into_response(),
        Err(ClassifyError::QuotaExhausted) => (
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({ "error": "Payment required. Please add credits." })),
        )
            .into_response(),
        Err(e) => {
            error!("Error in analyze-url handler: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

async fn content_blocker(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let records = match state.store.list_all().await {
        Ok(records) => records,
        Err(e) => {
            error!("Error fetching blocked domains: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let updated_at = chrono::Utc::now().to_rfc3339();

    match query.format.as_deref() {
        Some("safari") => (
            [
                (header::CONTENT_TYPE, "application/json"),
                // Cache for 1 hour
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            Json(export::safari_rules(&records)),
        )
            .into_response(),
        Some("domains") => Json(export::domain_list(&records, &updated_at)).into_response(),
        Some("hosts") => (
            [(header::CONTENT_TYPE, "text/plain")],
            export::hosts_file(&records),
        )
            .into_response(),
        _ => Json(export::full_dump(&records, &updated_at)).into_response(),
    }
}

#[derive(Deserialize)]
struct AddDomainRequest {
    domain: Option<String>,
    reason: Option<String>,
    category: Option<String>,
    risk_level: Option<String>,
}

async fn add_blocked_domain(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<AddDomainRequest>,
) -> Response {
    let Some(domain) = payload.domain.filter(|d| !d.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Domain is required" })),
        )
            .into_response();
    };

    let entry = NewBlockedDomain {
        domain: normalize_domain(&domain),
        reason: payload
            .reason
            .unwrap_or_else(|| "Marked as unsafe".to_string()),
        category: payload.category.unwrap_or_else(|| "unknown".to_string()),
        risk_level: payload
            .risk_level
            .and_then(|s| RiskLevel::from_str(&s).ok())
            .unwrap_or(RiskLevel::High),
    };

    match state.store.upsert(entry).await {
        Ok(record) => Json(json!({ "success": true, "domain": record })).into_response(),
        Err(e) => {
            error!("Error adding blocked domain: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn get_stats(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.data_source.get_stats().await)
}

#[derive(Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

async fn get_logs(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<LogsQuery>,
) -> impl IntoResponse {
    let logs = state.data_source.get_logs(query.limit.unwrap_or(100)).await;
    Json(logs)
}

async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let today = guard::today();
    Json(json!({
        "enabled": state.protection.protection_enabled().await,
        "blocked_count": state.protection.blocked_count().await,
        "last_blocked": state.protection.last_blocked().await,
        "scans_today": state.protection.scans_today(&today).await,
    }))
}

#[derive(Deserialize)]
struct ProtectionRequest {
    enabled: bool,
}

async fn set_protection(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<ProtectionRequest>,
) -> impl IntoResponse {
    state.protection.set_protection_enabled(payload.enabled).await;
    Json(json!({ "success": true, "enabled": payload.enabled }))
}

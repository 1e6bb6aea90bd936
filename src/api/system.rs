//! System API endpoints: the welcome page and health probe.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub version: &'static str,
    pub checks: HealthChecks,
}

/// `GET /`
pub async fn welcome() -> impl IntoResponse {
    Json(ApiResponse::success(WelcomeResponse {
        name: "ForgeFit API",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /health`
///
/// Readiness probe that checks database connectivity. Always returns a
/// body so load balancers can tell "degraded" from "gone".
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let db_ready = state.store().ping().await.is_ok();

    let status = if db_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::success(HealthResponse {
            status: if db_ready { "ok" } else { "degraded" },
            uptime_seconds: state.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
            checks: HealthChecks { database: db_ready },
        })),
    )
        .into_response()
}

//! Liveness and discovery endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::ApiState;
use crate::language::LanguageCode;
use crate::relay::PendingCounts;
use crate::voice::resolve_voice;

/// Plain-text liveness message served at `/`
pub const LIVENESS_MESSAGE: &str = "Parley interpretation relay is running";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Utterances waiting per slot
    pub pending: PendingCounts,
}

/// A supported language and the voice it is spoken with
#[derive(Serialize)]
pub struct LanguageInfo {
    pub code: LanguageCode,
    pub name: &'static str,
    pub voice: &'static str,
}

/// Build the health router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/languages", get(languages))
        .with_state(state)
}

/// Liveness probe - is the service running?
async fn liveness() -> &'static str {
    LIVENESS_MESSAGE
}

/// Liveness plus queue depth
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pending: state.relay.pending_counts(),
    })
}

/// List supported languages
async fn languages() -> Json<Vec<LanguageInfo>> {
    Json(
        LanguageCode::ALL
            .into_iter()
            .map(|code| LanguageInfo {
                code,
                name: code.display_name(),
                voice: resolve_voice(code.as_str()),
            })
            .collect(),
    )
}

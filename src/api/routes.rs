use crate::api::api_error::APIError;
use crate::api::model::{RefreshResult, ResolveRequest, ResolveResult};
use crate::api::server::AppState;
use crate::refresh::Refresh;
use crate::resolver::{Question, Resolver};
use crate::zone::ZoneTable;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState, timeout: Duration) -> Router {
    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/zone", get(zone))
        .route("/resolve", get(resolve))
        .route("/refresh", post(refresh))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let version = state.resolver.zone().current().version;
    Json(json!({"ok": "healthy", "version": version}))
}

#[allow(clippy::unused_async)]
async fn zone(State(state): State<AppState>) -> Json<Arc<ZoneTable>> {
    Json(state.resolver.zone().current())
}

#[allow(clippy::unused_async)]
async fn resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveRequest>,
) -> Json<ResolveResult> {
    let snapshot = state.resolver.zone().current();
    let answers = Resolver::resolve_in(&snapshot, &[Question::new(params.name, params.kind)]);
    Json(ResolveResult {
        version: snapshot.version,
        answers,
    })
}

async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResult>, APIError> {
    let result = match state.refresher.refresh_once().await {
        Ok(Refresh::Published { version, entries }) => {
            tracing::info!("manual refresh published zone version {version}");
            RefreshResult::Published { version, entries }
        }
        Ok(Refresh::Retained) => RefreshResult::Retained {
            version: state.refresher.zone().current().version,
        },
        Err(err) => {
            tracing::warn!("manual refresh failed: {err}");
            return Err(err.into());
        }
    };
    Ok(Json(result))
}

//! Health endpoint: database reachability plus the registered modules.

use axum::{Json, extract::State};
use kernel::error::app_error::AppResult;
use platform::transaction::{PgStorage, UnitOfWorkRegistry};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    registry: UnitOfWorkRegistry<PgStorage>,
}

impl AppState {
    pub fn new(pool: PgPool, registry: UnitOfWorkRegistry<PgStorage>) -> Self {
        Self { pool, registry }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    modules: Vec<&'static str>,
}

impl HealthResponse {
    fn ok(registry: &UnitOfWorkRegistry<PgStorage>) -> Self {
        Self {
            status: "ok",
            modules: registry
                .modules()
                .into_iter()
                .map(|module| module.as_str())
                .collect(),
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;
    Ok(Json(HealthResponse::ok(&state.registry)))
}

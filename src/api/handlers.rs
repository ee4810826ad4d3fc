// src/api/handlers.rs

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::api::{auth, types::*, ApiState};
use crate::tasks;

/// GET / — Liveness banner.
pub async fn index() -> &'static str {
    "Tree of Thoughts search server is running"
}

/// POST /solve — Run one search and return the solution with its trace.
pub async fn solve(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, (StatusCode, Json<ErrorResponse>)> {
    auth::check_auth(&state, &headers)?;

    match state.solver.solve(&body).await {
        Ok(response) => Ok(Json(response)),
        Err(e) if e.is_config() => {
            tracing::info!("rejected solve request: {}", e);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
        Err(e) => {
            tracing::error!("solve failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// GET /health — Health check.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        tasks: tasks::known_ids().into_iter().map(String::from).collect(),
    })
}

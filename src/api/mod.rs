// src/api/mod.rs — HTTP surface: one search per POST /solve

pub mod auth;
pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::core::solver::Solver;
use crate::infra::config::ApiConfig;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub solver: Arc<Solver>,
    pub token: Option<String>,
}

impl ApiState {
    pub fn new(solver: Solver) -> Self {
        let token = solver.config().api.token.clone();
        Self {
            solver: Arc::new(solver),
            token,
        }
    }
}

/// Local frontends allowed to call the API from a browser.
const ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(ALLOWED_ORIGINS.map(HeaderValue::from_static))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/solve", post(handlers::solve))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given port (blocking).
pub async fn start_server(config: &ApiConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("127.0.0.1:{}", config.port);
    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::ScriptedProvider;
    use crate::infra::config::Config;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state(token: Option<&str>) -> ApiState {
        let mut config = Config::default();
        config.api.token = token.map(String::from);
        let solver = Solver::new(config).with_provider(Arc::new(ScriptedProvider::constant(
            "Answer: (13 - 9) * (10 - 4) = 24",
        )));
        ApiState::new(solver)
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn solve_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/solve")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_banner() {
        let app = build_router(test_state(None));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state(None));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_solve_naive() {
        let app = build_router(test_state(None));
        let resp = app
            .oneshot(solve_request(serde_json::json!({ "naive_run": true })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["solved"], true);
        assert_eq!(json["solution"], "Answer: (13 - 9) * (10 - 4) = 24");
        assert_eq!(json["usage"]["calls"], 1);
    }

    #[tokio::test]
    async fn test_solve_config_error_is_400() {
        let app = build_router(test_state(None));
        let resp = app
            .oneshot(solve_request(serde_json::json!({ "n_select_sample": 0 })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("n_select_sample"));
    }

    #[tokio::test]
    async fn test_solve_requires_token_when_configured() {
        let app = build_router(test_state(Some("s3cret")));
        let resp = app
            .clone()
            .oneshot(solve_request(serde_json::json!({ "naive_run": true })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let mut req = solve_request(serde_json::json!({ "naive_run": true }));
        req.headers_mut()
            .insert("authorization", "Bearer s3cret".parse().unwrap());
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

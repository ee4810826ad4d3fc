// src/cli/serve.rs — `arbor serve`: run the HTTP API

use crate::api::{self, ApiState};
use crate::core::solver::Solver;
use crate::infra::config::Config;

pub async fn run_serve(port: Option<u16>, mut config: Config) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.api.port = port;
    }
    if config.api.token.is_none() {
        tracing::warn!("no [api].token configured; /solve is open to any local caller");
    }
    let api_config = config.api.clone();
    let state = ApiState::new(Solver::new(config).with_shared_limiter());
    api::start_server(&api_config, state).await
}

//! Serve command - loads the model and serves predictions over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServiceConfig;
use tracing::{info, warn};

use super::{InferenceBackend, init_device};
use crate::api::api_routes;
use crate::state::ModelState;

/// Runs the serve command until the process is terminated.
///
/// A model that fails to load does not stop the server; every prediction
/// request then answers with the model-not-loaded error.
///
/// # Errors
///
/// Returns an error if the listen address cannot be bound.
pub async fn run(config: &ServiceConfig) -> Result<()> {
    let state = Arc::new(ModelState::load::<InferenceBackend>(config, init_device()));

    if !state.is_ready() {
        warn!("Serving without a model; predictions will fail until restart");
    }

    let routes = api_routes(state);

    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown((config.bind, config.port), async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .with_context(|| format!("failed to bind {}:{}", config.bind, config.port))?;

    info!("Heart prediction service listening on http://{addr}");
    server.await;

    Ok(())
}

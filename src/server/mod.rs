//! Web server exposing the search pipeline
//!
//! Three endpoints:
//! - `GET /search?query=..&site=..` — run the pipeline and return the envelope
//! - `GET /image?url=..` — streamed proxy for allow-listed cover images
//! - `GET /health` — liveness
//!
//! Failures never surface as error status codes on `/search`: every outcome
//! is an HTTP 200 envelope with `success` and a human-readable message.

mod envelope;
mod handlers;
mod routes;

pub use envelope::Envelope;
pub use routes::create_router;

use std::sync::Arc;

use crate::config::Config;

/// Shared state for the web server
///
/// Holds only the immutable process configuration; every request constructs
/// its own crawler instances.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Starts the API server and serves until shutdown
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let state = AppState {
        config: Arc::new(config),
    };
    let app = create_router(state);

    tracing::info!("Starting server at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

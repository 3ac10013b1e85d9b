//! Shapeboard registry server binary.
//!
//! Configured through `SHAPEBOARD_ADDR` (default `0.0.0.0:3030`) and
//! `SHAPEBOARD_DATA` (snapshot file; in-memory when unset). Log filtering
//! follows `RUST_LOG`.

use shapeboard_server::{ServerConfig, ServerError, serve};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shapeboard_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    serve(config).await
}

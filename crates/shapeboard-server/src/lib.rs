//! Shapeboard registry server.
//!
//! Exposes a shape registry over WebSocket. Each text frame carries one
//! [`RpcRequest`]; the server answers with one [`RpcResponse`] carrying the
//! same `requestId`.
//!
//! ## Routes
//!
//! - `GET /`: banner
//! - `GET /health`: `ok`
//! - `GET /ws`: WebSocket upgrade for the RPC protocol

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use shapeboard_core::registry::{FileRegistry, MemoryRegistry, Registry, RegistryError};
use shapeboard_core::rpc::{RpcRequest, RpcResponse};
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

const DEFAULT_ADDR: &str = "0.0.0.0:3030";

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address {value:?}: {source}")]
    InvalidAddr {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: SocketAddr,
    /// Snapshot file for a persistent registry. `None` keeps shapes in memory.
    pub data_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3030)),
            data_path: None,
        }
    }
}

impl ServerConfig {
    /// Read `SHAPEBOARD_ADDR` and `SHAPEBOARD_DATA` from the environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let value = lookup("SHAPEBOARD_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = value
            .parse()
            .map_err(|source| ServerError::InvalidAddr { value, source })?;
        let data_path = lookup("SHAPEBOARD_DATA")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Ok(Self { addr, data_path })
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Open the registry this config describes.
    pub fn open_registry(&self) -> Result<Arc<dyn Registry>, ServerError> {
        let registry: Arc<dyn Registry> = match &self.data_path {
            Some(path) => {
                info!("Using file registry at {}", path.display());
                Arc::new(FileRegistry::open(path)?)
            }
            None => {
                info!("Using in-memory registry");
                Arc::new(MemoryRegistry::new())
            }
        };
        Ok(registry)
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<dyn Registry>,
    connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            connections: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }
}

/// Build the router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until the process is stopped.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    let addr = listener.local_addr()?;
    info!("Shapeboard registry server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Open the configured registry, bind and serve.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let state = AppState::new(config.open_registry()?);
    let listener = TcpListener::bind(config.addr).await?;
    serve_on(listener, state).await
}

/// Index page
async fn index() -> &'static str {
    "Shapeboard Registry Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Answer RPC frames until the client goes away. Requests on one connection
/// are handled in order.
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let conn = state.connections.fetch_add(1, Ordering::Relaxed);
    info!("New connection: {}", conn);

    while let Some(msg) = socket.recv().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(_)) => {
                warn!("Binary frame from {} ignored", conn);
                continue;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("WebSocket error for {}: {}", conn, e);
                break;
            }
        };

        let response = match serde_json::from_str::<RpcRequest>(&text) {
            Ok(RpcRequest { request_id, call }) => {
                let method = call.method_name();
                let result = call.dispatch(state.registry.as_ref()).await;
                match &result {
                    Ok(_) => debug!("{} request {} ({}) ok", conn, request_id, method),
                    Err(e) => warn!("{} request {} ({}) failed: {}", conn, request_id, method, e),
                }
                RpcResponse { request_id, result }
            }
            Err(e) => {
                warn!("Invalid message from {}: {}", conn, e);
                RpcResponse::malformed(e)
            }
        };

        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode response for {}: {}", conn, e);
                break;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }

    info!("Connection closed: {}", conn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 3030);
    }

    #[test]
    fn test_config_from_vars() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SHAPEBOARD_ADDR", "127.0.0.1:8080"),
            ("SHAPEBOARD_DATA", "/tmp/shapes.json"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/shapes.json")));
    }

    #[test]
    fn test_empty_data_path_means_memory() {
        let config = ServerConfig::from_lookup(lookup(&[("SHAPEBOARD_DATA", "")])).unwrap();
        assert_eq!(config.data_path, None);
    }

    #[test]
    fn test_bad_addr_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("SHAPEBOARD_ADDR", "not-an-addr")])).unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddr { .. }));
    }
}

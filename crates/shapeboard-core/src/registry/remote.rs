//! WebSocket client for a remote registry.

use super::{BoxFuture, Registry, RegistryError, RegistryResult};
use crate::rpc::{AddShapeParams, RpcCall, RpcReply, RpcRequest, RpcResponse, UpdateShapeParams};
use crate::shapes::{GeometryUpdate, NewShape, Shape, ShapeId, ShapeRecord};
use std::net::TcpStream;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};
use url::Url;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Registry living behind a `shapeboard-server` WebSocket endpoint.
///
/// Calls block the calling thread until the matching response frame
/// arrives. Any channel or decoding failure is a `TransportFailure`.
pub struct RemoteRegistry {
    socket: Mutex<Socket>,
    next_request: AtomicU64,
}

fn transport(err: impl std::fmt::Display) -> RegistryError {
    RegistryError::TransportFailure(err.to_string())
}

impl RemoteRegistry {
    /// Connect to a registry endpoint such as `ws://localhost:3030/ws`.
    pub fn connect(url: &str) -> RegistryResult<Self> {
        let parsed = Url::parse(url).map_err(|e| transport(format!("Invalid URL: {}", e)))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(transport(format!("Invalid WebSocket URL scheme: {}", parsed.scheme())));
        }

        let (socket, response) = connect(url).map_err(transport)?;
        log::info!("Registry connected to {}, status: {}", url, response.status());
        Ok(Self {
            socket: Mutex::new(socket),
            next_request: AtomicU64::new(1),
        })
    }

    /// Send one call and wait for its response.
    fn call(&self, call: RpcCall) -> RegistryResult<RpcReply> {
        let request_id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let method = call.method_name();
        let frame = serde_json::to_string(&RpcRequest { request_id, call }).map_err(transport)?;

        let mut socket = self.socket.lock().map_err(|e| transport(format!("Lock error: {}", e)))?;
        log::debug!("Registry request {} ({})", request_id, method);
        socket.send(Message::Text(frame)).map_err(transport)?;

        loop {
            match socket.read().map_err(transport)? {
                Message::Text(text) => {
                    let response: RpcResponse = serde_json::from_str(&text).map_err(transport)?;
                    if response.request_id == request_id {
                        return response.result;
                    }
                    log::warn!("Dropping response for stale request {}", response.request_id);
                }
                Message::Ping(data) => {
                    socket.send(Message::Pong(data)).map_err(transport)?;
                }
                Message::Close(_) => return Err(transport("connection closed by server")),
                _ => {}
            }
        }
    }

    fn call_unit(&self, call: RpcCall) -> RegistryResult<()> {
        match self.call(call)? {
            RpcReply::Unit => Ok(()),
            other => Err(transport(format!("Unexpected reply: {:?}", other))),
        }
    }
}

impl Registry for RemoteRegistry {
    fn add_shape(&self, shape: NewShape) -> BoxFuture<'_, RegistryResult<ShapeId>> {
        Box::pin(async move {
            match self.call(RpcCall::AddShape(AddShapeParams::from(&shape)))? {
                RpcReply::Id(id) => Ok(id),
                other => Err(transport(format!("Unexpected reply: {:?}", other))),
            }
        })
    }

    fn update_shape(&self, id: ShapeId, update: GeometryUpdate) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.call_unit(RpcCall::UpdateShape(UpdateShapeParams::new(id, &update))) })
    }

    fn delete_shape(&self, id: ShapeId) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.call_unit(RpcCall::DeleteShape { id }) })
    }

    fn clear_canvas(&self) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.call_unit(RpcCall::ClearCanvas) })
    }

    fn get_canvas(&self) -> BoxFuture<'_, RegistryResult<Vec<Shape>>> {
        Box::pin(async move {
            match self.call(RpcCall::GetCanvas)? {
                RpcReply::Canvas(records) => records
                    .into_iter()
                    .map(|r| Shape::try_from(r).map_err(transport))
                    .collect(),
                other => Err(transport(format!("Unexpected reply: {:?}", other))),
            }
        })
    }

    fn update_canvas(&self, shapes: Vec<Shape>) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move {
            let shapes = shapes.into_iter().map(ShapeRecord::from).collect();
            self.call_unit(RpcCall::UpdateCanvas { shapes })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_websocket_url() {
        let err = RemoteRegistry::connect("http://localhost:3030/ws").err();
        assert!(matches!(err, Some(RegistryError::TransportFailure(_))));
    }

    #[test]
    fn test_rejects_garbage_url() {
        assert!(RemoteRegistry::connect("not a url").is_err());
    }
}

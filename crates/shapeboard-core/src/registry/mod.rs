//! The authoritative shape registry.

mod call;
mod memory;
mod state;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(not(target_arch = "wasm32"))]
mod remote;

pub use call::{CallReply, RegistryCall};
pub use memory::MemoryRegistry;
pub use state::RegistryState;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileRegistry;

#[cfg(not(target_arch = "wasm32"))]
pub use remote::RemoteRegistry;

use crate::shapes::{GeometryUpdate, NewShape, Shape, ShapeError, ShapeId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RegistryError {
    /// Malformed creation or update request.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    /// No shape with this id.
    #[error("Shape not found: {0}")]
    NotFound(ShapeId),
    /// The RPC channel failed.
    #[error("Transport failure: {0}")]
    TransportFailure(String),
    /// The backing store failed (lock poisoning, file IO).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ShapeError> for RegistryError {
    fn from(err: ShapeError) -> Self {
        RegistryError::InvalidShape(err.to_string())
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Boxed future for registry calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// CRUD over a flat collection of shapes.
///
/// Every mutating call is atomic: it either fully applies or leaves the
/// collection untouched. Mutations are serialized against each other and
/// `get_canvas` always returns a state that existed at some instant.
pub trait Registry: Send + Sync {
    /// Store a new shape and return its freshly allocated id.
    fn add_shape(&self, shape: NewShape) -> BoxFuture<'_, RegistryResult<ShapeId>>;

    /// Replace the geometry of an existing shape. Type, id and color never change.
    fn update_shape(&self, id: ShapeId, update: GeometryUpdate) -> BoxFuture<'_, RegistryResult<()>>;

    /// Remove a shape.
    fn delete_shape(&self, id: ShapeId) -> BoxFuture<'_, RegistryResult<()>>;

    /// Remove every shape. Ids are not reused afterwards.
    fn clear_canvas(&self) -> BoxFuture<'_, RegistryResult<()>>;

    /// Snapshot of all shapes in insertion order.
    fn get_canvas(&self) -> BoxFuture<'_, RegistryResult<Vec<Shape>>>;

    /// Replace the whole collection.
    fn update_canvas(&self, shapes: Vec<Shape>) -> BoxFuture<'_, RegistryResult<()>>;
}

impl<R: Registry + ?Sized> Registry for std::sync::Arc<R> {
    fn add_shape(&self, shape: NewShape) -> BoxFuture<'_, RegistryResult<ShapeId>> {
        (**self).add_shape(shape)
    }

    fn update_shape(&self, id: ShapeId, update: GeometryUpdate) -> BoxFuture<'_, RegistryResult<()>> {
        (**self).update_shape(id, update)
    }

    fn delete_shape(&self, id: ShapeId) -> BoxFuture<'_, RegistryResult<()>> {
        (**self).delete_shape(id)
    }

    fn clear_canvas(&self) -> BoxFuture<'_, RegistryResult<()>> {
        (**self).clear_canvas()
    }

    fn get_canvas(&self) -> BoxFuture<'_, RegistryResult<Vec<Shape>>> {
        (**self).get_canvas()
    }

    fn update_canvas(&self, shapes: Vec<Shape>) -> BoxFuture<'_, RegistryResult<()>> {
        (**self).update_canvas(shapes)
    }
}

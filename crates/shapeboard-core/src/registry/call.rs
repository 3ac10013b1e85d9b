//! Mutating calls issued by the interaction controller.

use super::{Registry, RegistryResult};
use crate::shapes::{GeometryUpdate, NewShape, ShapeId};

/// One registry mutation, described as a value so the host decides when
/// and where to run it.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryCall {
    Add(NewShape),
    Update { id: ShapeId, update: GeometryUpdate },
    Delete(ShapeId),
    Clear,
}

/// Successful outcome of a [`RegistryCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallReply {
    /// A shape was created with this id.
    Created(ShapeId),
    Done,
}

impl RegistryCall {
    /// Short description used in log lines and error messages.
    pub fn describe(&self) -> String {
        match self {
            RegistryCall::Add(shape) => format!("add {}", shape.geometry.shape_type()),
            RegistryCall::Update { id, .. } => format!("update shape {}", id),
            RegistryCall::Delete(id) => format!("delete shape {}", id),
            RegistryCall::Clear => "clear canvas".to_string(),
        }
    }

    /// Run the call.
    pub async fn execute(self, registry: &dyn Registry) -> RegistryResult<CallReply> {
        match self {
            RegistryCall::Add(shape) => registry.add_shape(shape).await.map(CallReply::Created),
            RegistryCall::Update { id, update } => {
                registry.update_shape(id, update).await.map(|_| CallReply::Done)
            }
            RegistryCall::Delete(id) => registry.delete_shape(id).await.map(|_| CallReply::Done),
            RegistryCall::Clear => registry.clear_canvas().await.map(|_| CallReply::Done),
        }
    }
}

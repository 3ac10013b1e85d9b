//! Registry state shared by the local registry implementations.

use super::{RegistryError, RegistryResult};
use crate::shapes::{GeometryUpdate, NewShape, Shape, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The shape collection plus the id counter.
///
/// Each mutation validates before it touches anything, so a failed call
/// leaves the state exactly as it was.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryState {
    next_id: ShapeId,
    shapes: Vec<Shape>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shapes in insertion order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// The id the next `add` will hand out.
    pub fn next_id(&self) -> ShapeId {
        self.next_id
    }

    pub fn add(&mut self, shape: NewShape) -> RegistryResult<ShapeId> {
        shape.geometry.validate()?;
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| RegistryError::Storage("shape id space exhausted".to_string()))?;
        self.shapes.push(shape.with_id(id));
        Ok(id)
    }

    pub fn update(&mut self, id: ShapeId, update: &GeometryUpdate) -> RegistryResult<()> {
        let shape = self
            .shapes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RegistryError::NotFound(id))?;
        shape.geometry.apply(update)?;
        Ok(())
    }

    pub fn delete(&mut self, id: ShapeId) -> RegistryResult<()> {
        let index = self
            .shapes
            .iter()
            .position(|s| s.id == id)
            .ok_or(RegistryError::NotFound(id))?;
        self.shapes.remove(index);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Replace the whole collection, keeping ids monotonic.
    pub fn replace(&mut self, shapes: Vec<Shape>) -> RegistryResult<()> {
        let mut seen = HashSet::with_capacity(shapes.len());
        for shape in &shapes {
            shape.geometry.validate()?;
            if !seen.insert(shape.id) {
                return Err(RegistryError::InvalidShape(format!("duplicate shape id {}", shape.id)));
            }
        }
        let floor = match shapes.iter().map(|s| s.id).max() {
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| RegistryError::Storage("shape id space exhausted".to_string()))?,
            None => 0,
        };
        self.next_id = self.next_id.max(floor);
        self.shapes = shapes;
        Ok(())
    }

    /// Repair a counter that lags behind the stored ids (hand-edited files).
    pub(crate) fn normalize(&mut self) {
        if let Some(max) = self.shapes.iter().map(|s| s.id).max() {
            self.next_id = self.next_id.max(max.saturating_add(1));
        }
    }
}

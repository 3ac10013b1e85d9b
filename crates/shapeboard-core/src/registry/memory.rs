//! In-memory registry implementation.

use super::{BoxFuture, Registry, RegistryError, RegistryResult, RegistryState};
use crate::shapes::{GeometryUpdate, NewShape, Shape, ShapeId};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory registry for servers without persistence and for tests.
#[derive(Default)]
pub struct MemoryRegistry {
    state: RwLock<RegistryState>,
}

impl MemoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state.
    pub fn with_state(state: RegistryState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|e| RegistryError::Storage(format!("Lock error: {}", e)))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|e| RegistryError::Storage(format!("Lock error: {}", e)))
    }
}

impl Registry for MemoryRegistry {
    fn add_shape(&self, shape: NewShape) -> BoxFuture<'_, RegistryResult<ShapeId>> {
        Box::pin(async move {
            let id = self.write()?.add(shape)?;
            log::debug!("Added shape {}", id);
            Ok(id)
        })
    }

    fn update_shape(&self, id: ShapeId, update: GeometryUpdate) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.write()?.update(id, &update) })
    }

    fn delete_shape(&self, id: ShapeId) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move {
            self.write()?.delete(id)?;
            log::debug!("Deleted shape {}", id);
            Ok(())
        })
    }

    fn clear_canvas(&self) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move {
            self.write()?.clear();
            Ok(())
        })
    }

    fn get_canvas(&self) -> BoxFuture<'_, RegistryResult<Vec<Shape>>> {
        Box::pin(async move { Ok(self.read()?.shapes().to_vec()) })
    }

    fn update_canvas(&self, shapes: Vec<Shape>) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.write()?.replace(shapes) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Geometry, ShapeType};
    use crate::testing::block_on;
    use kurbo::Point;
    use std::sync::Arc;

    fn circle(x: f64, y: f64) -> NewShape {
        NewShape::new("#336699", Geometry::Circle { center: Point::new(x, y), size: 50.0 })
    }

    fn line(x: f64, y: f64) -> NewShape {
        let geometry =
            Geometry::from_parts(ShapeType::Line, Point::new(x, y), 50.0, Some(Point::new(x + 100.0, y))).unwrap();
        NewShape::new("#000000", geometry)
    }

    #[test]
    fn test_add_then_get() {
        let registry = MemoryRegistry::new();
        let id = block_on(registry.add_shape(circle(10.0, 20.0))).unwrap();
        let canvas = block_on(registry.get_canvas()).unwrap();
        assert_eq!(canvas, vec![circle(10.0, 20.0).with_id(id)]);
    }

    #[test]
    fn test_ids_never_reissued() {
        let registry = MemoryRegistry::new();
        let mut issued = Vec::new();
        for i in 0..5 {
            let id = block_on(registry.add_shape(circle(i as f64, 0.0))).unwrap();
            assert!(!issued.contains(&id));
            if i % 2 == 0 {
                block_on(registry.delete_shape(id)).unwrap();
            }
            issued.push(id);
        }
        block_on(registry.clear_canvas()).unwrap();
        let id = block_on(registry.add_shape(circle(0.0, 0.0))).unwrap();
        assert!(!issued.contains(&id));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let registry = MemoryRegistry::new();
        block_on(registry.add_shape(circle(0.0, 0.0))).unwrap();
        let before = block_on(registry.get_canvas()).unwrap();

        let update = GeometryUpdate { origin: Point::new(5.0, 5.0), size: 20.0, end: None };
        let result = block_on(registry.update_shape(42, update));

        assert_eq!(result, Err(RegistryError::NotFound(42)));
        assert_eq!(block_on(registry.get_canvas()).unwrap(), before);
    }

    #[test]
    fn test_update_replaces_geometry_only() {
        let registry = MemoryRegistry::new();
        let id = block_on(registry.add_shape(line(0.0, 0.0))).unwrap();
        let update = GeometryUpdate {
            origin: Point::new(5.0, 5.0),
            size: 30.0,
            end: Some(Point::new(50.0, 60.0)),
        };
        block_on(registry.update_shape(id, update)).unwrap();

        let canvas = block_on(registry.get_canvas()).unwrap();
        assert_eq!(canvas[0].id, id);
        assert_eq!(canvas[0].color, "#000000");
        assert_eq!(canvas[0].shape_type(), ShapeType::Line);
        assert_eq!(canvas[0].geometry.end(), Some(Point::new(50.0, 60.0)));
    }

    #[test]
    fn test_update_rejects_endpoint_for_circle() {
        let registry = MemoryRegistry::new();
        let id = block_on(registry.add_shape(circle(0.0, 0.0))).unwrap();
        let update = GeometryUpdate { origin: Point::ZERO, size: 10.0, end: Some(Point::ZERO) };
        assert!(matches!(
            block_on(registry.update_shape(id, update)),
            Err(RegistryError::InvalidShape(_))
        ));
        assert_eq!(block_on(registry.get_canvas()).unwrap()[0].geometry.size(), 50.0);
    }

    #[test]
    fn test_delete_twice() {
        let registry = MemoryRegistry::new();
        let id = block_on(registry.add_shape(circle(0.0, 0.0))).unwrap();
        block_on(registry.delete_shape(id)).unwrap();
        assert!(block_on(registry.get_canvas()).unwrap().iter().all(|s| s.id != id));
        assert_eq!(block_on(registry.delete_shape(id)), Err(RegistryError::NotFound(id)));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let registry = MemoryRegistry::new();
        block_on(registry.add_shape(circle(0.0, 0.0))).unwrap();
        block_on(registry.add_shape(line(0.0, 0.0))).unwrap();
        for _ in 0..3 {
            block_on(registry.clear_canvas()).unwrap();
            assert!(block_on(registry.get_canvas()).unwrap().is_empty());
        }
    }

    #[test]
    fn test_endpoint_invariant_holds_for_all_shapes() {
        let registry = MemoryRegistry::new();
        block_on(registry.add_shape(circle(0.0, 0.0))).unwrap();
        block_on(registry.add_shape(line(0.0, 0.0))).unwrap();
        for shape in block_on(registry.get_canvas()).unwrap() {
            assert_eq!(shape.shape_type().is_line(), shape.geometry.end().is_some());
        }
    }

    #[test]
    fn test_concurrent_adds_get_distinct_ids() {
        let registry = Arc::new(MemoryRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|j| block_on(registry.add_shape(circle(i as f64, j as f64))).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut ids: Vec<ShapeId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
        assert_eq!(block_on(registry.get_canvas()).unwrap().len(), 200);
    }
}

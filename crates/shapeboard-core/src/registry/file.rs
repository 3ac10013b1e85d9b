//! File-backed registry for native platforms.

use super::{BoxFuture, Registry, RegistryError, RegistryResult, RegistryState};
use crate::shapes::{GeometryUpdate, NewShape, Shape, ShapeId};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};

/// Registry that mirrors its state to a JSON file after every mutation.
///
/// A mutation is applied to a copy of the state, the copy is written next to
/// the target and renamed over it, and only then does it become visible. A
/// failed write therefore leaves both the file and memory unchanged.
pub struct FileRegistry {
    path: PathBuf,
    state: RwLock<RegistryState>,
}

impl FileRegistry {
    /// Open the registry at `path`, loading it when the file exists.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn open(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RegistryError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let state = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|e| {
                RegistryError::Storage(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let mut state: RegistryState = serde_json::from_str(&json).map_err(|e| {
                RegistryError::Storage(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            state.normalize();
            log::info!("Loaded {} shapes from {}", state.shapes().len(), path.display());
            state
        } else {
            RegistryState::new()
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &RegistryState) -> RegistryResult<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| RegistryError::Storage(format!("Failed to serialize registry: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            RegistryError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            RegistryError::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }

    fn lock(&self) -> RegistryResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|e| RegistryError::Storage(format!("Lock error: {}", e)))
    }

    /// Run `mutate` against a copy, persist it, then publish it.
    fn transact<T>(&self, mutate: impl FnOnce(&mut RegistryState) -> RegistryResult<T>) -> RegistryResult<T> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let value = mutate(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }
}

impl Registry for FileRegistry {
    fn add_shape(&self, shape: NewShape) -> BoxFuture<'_, RegistryResult<ShapeId>> {
        Box::pin(async move { self.transact(|state| state.add(shape)) })
    }

    fn update_shape(&self, id: ShapeId, update: GeometryUpdate) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.transact(|state| state.update(id, &update)) })
    }

    fn delete_shape(&self, id: ShapeId) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.transact(|state| state.delete(id)) })
    }

    fn clear_canvas(&self) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move {
            self.transact(|state| {
                state.clear();
                Ok(())
            })
        })
    }

    fn get_canvas(&self) -> BoxFuture<'_, RegistryResult<Vec<Shape>>> {
        Box::pin(async move {
            let state = self
                .state
                .read()
                .map_err(|e| RegistryError::Storage(format!("Lock error: {}", e)))?;
            Ok(state.shapes().to_vec())
        })
    }

    fn update_canvas(&self, shapes: Vec<Shape>) -> BoxFuture<'_, RegistryResult<()>> {
        Box::pin(async move { self.transact(|state| state.replace(shapes)) })
    }
}

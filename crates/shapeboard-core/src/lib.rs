//! Shapeboard Core Library
//!
//! Shape model, hit-testing, the pointer interaction controller and the
//! shape registry shared by the canvas client and `shapeboard-server`.

pub mod config;
pub mod controller;
pub mod gesture;
pub mod hit;
pub mod presenter;
pub mod registry;
pub mod rpc;
pub mod shapes;

pub use config::InteractionConfig;
pub use controller::{CallResolution, CallTicket, InteractionController, PendingCall};
pub use gesture::{Gesture, GestureState};
pub use hit::Grab;
pub use presenter::{LogPresenter, Presenter};
pub use registry::{CallReply, MemoryRegistry, Registry, RegistryCall, RegistryError, RegistryResult};
#[cfg(not(target_arch = "wasm32"))]
pub use registry::{FileRegistry, RemoteRegistry};
pub use shapes::{
    ColorSource, Endpoint, Geometry, GeometryUpdate, NewShape, Shape, ShapeError, ShapeId, ShapeRecord, ShapeType,
};

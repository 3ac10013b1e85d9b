//! Interaction controller.
//!
//! Turns a stream of pointer events into registry mutations. Every mutation
//! is applied locally first; the controller keeps a copy of what it replaced
//! until the matching registry call resolves, and puts that copy back if the
//! call fails.
//!
//! Calls are handed to the host as [`PendingCall`] values. The host runs them
//! whenever it likes (pointer handling never waits on them) and feeds each
//! outcome back through [`InteractionController::resolve`].

use crate::config::InteractionConfig;
use crate::gesture::{ActiveEdit, Gesture, GestureState};
use crate::hit::{self, Grab};
use crate::presenter::{LogPresenter, Presenter};
use crate::registry::{CallReply, Registry, RegistryCall, RegistryError, RegistryResult};
use crate::shapes::{ColorSource, Endpoint, Geometry, GeometryUpdate, NewShape, Shape, ShapeId, ShapeType};
use kurbo::{Point, Vec2};
use std::collections::BTreeMap;
use std::fmt;

/// Pairs an issued registry call with the state needed to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallTicket(u64);

impl fmt::Display for CallTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registry call the host must run and resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub ticket: CallTicket,
    pub call: RegistryCall,
}

impl PendingCall {
    /// Run the call against `registry`.
    pub async fn run(self, registry: &dyn Registry) -> CallResolution {
        let outcome = self.call.execute(registry).await;
        CallResolution {
            ticket: self.ticket,
            outcome,
        }
    }
}

/// The registry's answer to a [`PendingCall`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallResolution {
    pub ticket: CallTicket,
    pub outcome: RegistryResult<CallReply>,
}

/// What an in-flight call replaced locally.
#[derive(Debug, Clone)]
enum Rollback {
    Create(NewShape),
    Update(Shape),
    Delete { index: usize, shape: Shape },
    Clear(Vec<Shape>),
}

fn shape_mut(shapes: &mut [Shape], id: ShapeId) -> Option<&mut Shape> {
    shapes.iter_mut().find(|s| s.id == id)
}

/// Client-side owner of the shape collection and the pointer state machine.
pub struct InteractionController<P: Presenter = LogPresenter> {
    config: InteractionConfig,
    tool: ShapeType,
    colors: ColorSource,
    /// Confirmed shapes, with optimistic edits applied.
    shapes: Vec<Shape>,
    gesture: Gesture,
    in_flight: BTreeMap<CallTicket, Rollback>,
    next_ticket: u64,
    presenter: P,
}

impl Default for InteractionController<LogPresenter> {
    fn default() -> Self {
        Self::new(LogPresenter)
    }
}

impl<P: Presenter> InteractionController<P> {
    pub fn new(presenter: P) -> Self {
        Self::with_config(InteractionConfig::default(), presenter)
    }

    pub fn with_config(config: InteractionConfig, presenter: P) -> Self {
        Self {
            config,
            tool: ShapeType::default(),
            colors: ColorSource::default(),
            shapes: Vec::new(),
            gesture: Gesture::Idle,
            in_flight: BTreeMap::new(),
            next_ticket: 0,
            presenter,
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Select the type of shape drawn on empty canvas.
    pub fn set_tool(&mut self, tool: ShapeType) {
        self.tool = tool;
    }

    pub fn tool(&self) -> ShapeType {
        self.tool
    }

    pub fn set_color_source(&mut self, colors: ColorSource) {
        self.colors = colors;
    }

    /// Confirmed shapes, including edits still awaiting the registry.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Shapes without an id yet: the one being drawn, then unanswered creates.
    pub fn pending_shapes(&self) -> impl Iterator<Item = &NewShape> {
        let drawing = match &self.gesture {
            Gesture::Drawing { pending } => Some(pending),
            _ => None,
        };
        let creating = self.in_flight.values().filter_map(|rollback| match rollback {
            Rollback::Create(pending) => Some(pending),
            _ => None,
        });
        drawing.into_iter().chain(creating)
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn state(&self) -> GestureState {
        self.gesture.state()
    }

    /// Line endpoint currently under the pointer, for hover feedback.
    pub fn hovered_endpoint(&self) -> Option<(ShapeId, Endpoint)> {
        match self.gesture {
            Gesture::HoverOnly { shape_id, endpoint } => Some((shape_id, endpoint)),
            _ => None,
        }
    }

    /// Number of registry calls awaiting resolution.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Replace the local collection with a registry snapshot.
    ///
    /// Any edit gesture in progress is dropped; the snapshot is authoritative.
    pub fn load(&mut self, shapes: Vec<Shape>) {
        if self.gesture.edit().is_some() {
            log::debug!("Dropping active gesture on canvas reload");
            self.gesture = Gesture::Idle;
        }
        log::info!("Loaded {} shapes", shapes.len());
        self.shapes = shapes;
    }

    pub fn pointer_down(&mut self, point: Point) {
        if !point.is_finite() {
            log::debug!("Ignoring non-finite pointer position");
            return;
        }
        if self.gesture.is_active() {
            log::debug!("Ignoring pointer down during {:?}", self.gesture.state());
            return;
        }

        let Some((id, grab)) = hit::pick(&self.shapes, point, &self.config) else {
            let pending = self.new_pending(point);
            log::debug!("Drawing new {}", pending.geometry.shape_type());
            self.gesture = Gesture::Drawing { pending };
            return;
        };
        let Some(snapshot) = self.shape(id).cloned() else {
            return;
        };

        self.gesture = match grab {
            Grab::Body => Gesture::Moving {
                edit: ActiveEdit::new(snapshot),
                last: point,
            },
            Grab::Edge => Gesture::Resizing {
                edit: ActiveEdit::new(snapshot),
            },
            Grab::Endpoint(endpoint) => {
                let Some(pivot) = snapshot.geometry.endpoint(endpoint.other()) else {
                    return;
                };
                Gesture::MovingEndpoint {
                    edit: ActiveEdit::new(snapshot),
                    endpoint,
                    pivot,
                }
            }
        };
        log::debug!("Shape {} grabbed: {:?}", id, self.gesture.state());
    }

    pub fn pointer_move(&mut self, point: Point) {
        if !point.is_finite() {
            return;
        }
        if !self.gesture.is_active() {
            self.gesture = match hit::hover_endpoint(&self.shapes, point, &self.config) {
                Some((shape_id, endpoint)) => Gesture::HoverOnly { shape_id, endpoint },
                None => Gesture::Idle,
            };
            return;
        }

        match &mut self.gesture {
            Gesture::Drawing { pending } => pending.geometry.set_origin(point),
            Gesture::Moving { edit, last } => {
                let delta: Vec2 = point - *last;
                *last = point;
                if let Some(shape) = shape_mut(&mut self.shapes, edit.shape_id) {
                    shape.geometry.translate(delta);
                }
            }
            Gesture::Resizing { edit } => {
                if let Some(shape) = shape_mut(&mut self.shapes, edit.shape_id) {
                    let size = self.config.clamp_size(2.0 * shape.geometry.origin().distance(point));
                    shape.geometry.set_size(size);
                }
            }
            Gesture::MovingEndpoint { edit, endpoint, pivot } => {
                let Some(shape) = shape_mut(&mut self.shapes, edit.shape_id) else {
                    return;
                };
                if let Geometry::Line { start, end, .. } = &mut shape.geometry {
                    let (active, frozen) = match endpoint {
                        Endpoint::Start => (start, end),
                        Endpoint::End => (end, start),
                    };
                    *active = point;
                    *frozen = *pivot;
                }
            }
            Gesture::Idle | Gesture::HoverOnly { .. } => {}
        }
    }

    /// Finish the gesture with a last sample at `point`.
    ///
    /// A drawn shape always yields an `Add` call. An edit yields an `Update`
    /// call only if the geometry differs from the pre-gesture snapshot; a
    /// press and release that changed nothing sends nothing.
    pub fn pointer_up(&mut self, point: Point) -> Option<PendingCall> {
        self.pointer_move(point);
        match std::mem::take(&mut self.gesture) {
            Gesture::Drawing { pending } => self.issue_create(pending),
            Gesture::Moving { edit, .. }
            | Gesture::Resizing { edit }
            | Gesture::MovingEndpoint { edit, .. } => self.commit_edit(edit),
            idle => {
                self.gesture = idle;
                None
            }
        }
    }

    /// The pointer left the canvas. A shape being drawn is still created;
    /// an edit is abandoned and the shape restored without a registry call.
    pub fn pointer_leave(&mut self) -> Option<PendingCall> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Drawing { pending } => self.issue_create(pending),
            Gesture::Moving { edit, .. }
            | Gesture::Resizing { edit }
            | Gesture::MovingEndpoint { edit, .. } => {
                log::debug!("Gesture on shape {} aborted", edit.shape_id);
                self.restore(edit.snapshot);
                None
            }
            Gesture::Idle | Gesture::HoverOnly { .. } => None,
        }
    }

    /// Remove a shape locally and ask the registry to delete it.
    pub fn delete_shape(&mut self, id: ShapeId) -> Option<PendingCall> {
        if self.gesture.edit().is_some_and(|e| e.shape_id == id) {
            self.pointer_leave();
        }
        let Some(index) = self.shapes.iter().position(|s| s.id == id) else {
            self.presenter
                .report_error(&format!("Cannot delete shape {}: it is not on the canvas", id));
            return None;
        };
        let shape = self.shapes.remove(index);
        Some(self.issue(RegistryCall::Delete(id), Rollback::Delete { index, shape }))
    }

    /// Empty the local collection and ask the registry to do the same.
    pub fn clear_canvas(&mut self) -> PendingCall {
        if self.gesture.edit().is_some() {
            self.gesture = Gesture::Idle;
        }
        let snapshot = std::mem::take(&mut self.shapes);
        self.issue(RegistryCall::Clear, Rollback::Clear(snapshot))
    }

    /// Apply the registry's answer to an earlier call.
    pub fn resolve(&mut self, resolution: CallResolution) {
        let CallResolution { ticket, outcome } = resolution;
        let Some(rollback) = self.in_flight.remove(&ticket) else {
            log::warn!("Ignoring resolution for unknown call {}", ticket);
            return;
        };

        match (rollback, outcome) {
            (Rollback::Create(pending), Ok(CallReply::Created(id))) => {
                log::debug!("Call {} created shape {}", ticket, id);
                self.confirm(pending.with_id(id));
            }
            (Rollback::Create(pending), Ok(CallReply::Done)) => {
                let err = RegistryError::TransportFailure("registry returned no id".to_string());
                self.fail(&format!("add {}", pending.geometry.shape_type()), &err);
            }
            (Rollback::Create(pending), Err(err)) => {
                self.fail(&format!("add {}", pending.geometry.shape_type()), &err);
            }
            (_, Ok(_)) => log::debug!("Call {} confirmed", ticket),
            (Rollback::Update(snapshot), Err(err)) => {
                let id = snapshot.id;
                self.roll_back_update(snapshot);
                self.fail(&format!("update shape {}", id), &err);
            }
            (Rollback::Delete { index, shape }, Err(err)) => {
                let id = shape.id;
                if self.shape(id).is_none() {
                    let index = index.min(self.shapes.len());
                    self.shapes.insert(index, shape);
                }
                self.fail(&format!("delete shape {}", id), &err);
            }
            (Rollback::Clear(snapshot), Err(err)) => {
                let mut restored: Vec<Shape> = snapshot
                    .into_iter()
                    .filter(|s| self.shapes.iter().all(|current| current.id != s.id))
                    .collect();
                restored.append(&mut self.shapes);
                self.shapes = restored;
                self.fail("clear canvas", &err);
            }
        }

        if self.in_flight.is_empty() {
            self.presenter.set_busy(false);
        }
    }

    fn new_pending(&mut self, point: Point) -> NewShape {
        let size = self.config.default_size;
        let geometry = match self.tool {
            ShapeType::Circle => Geometry::Circle { center: point, size },
            ShapeType::Square => Geometry::Square { center: point, size },
            ShapeType::Triangle => Geometry::Triangle { center: point, size },
            ShapeType::Line => Geometry::Line {
                start: point,
                end: point + Vec2::new(self.config.line_length, 0.0),
                size,
            },
        };
        NewShape::new(self.colors.next_color(), geometry)
    }

    fn issue_create(&mut self, pending: NewShape) -> Option<PendingCall> {
        if let Err(err) = pending.geometry.validate() {
            self.fail(&format!("add {}", pending.geometry.shape_type()), &RegistryError::from(err));
            return None;
        }
        Some(self.issue(RegistryCall::Add(pending.clone()), Rollback::Create(pending)))
    }

    fn commit_edit(&mut self, edit: ActiveEdit) -> Option<PendingCall> {
        let id = edit.shape_id;
        let Some(current) = self.shape(id) else {
            self.presenter
                .report_error(&format!("Cannot update shape {}: it is not on the canvas", id));
            return None;
        };
        if current.geometry == edit.snapshot.geometry {
            log::debug!("Shape {} unchanged, nothing to send", id);
            return None;
        }
        let geometry = current.geometry;
        if let Err(err) = geometry.validate() {
            self.restore(edit.snapshot);
            self.fail(&format!("update shape {}", id), &RegistryError::from(err));
            return None;
        }
        let update = GeometryUpdate::from(&geometry);
        Some(self.issue(RegistryCall::Update { id, update }, Rollback::Update(edit.snapshot)))
    }

    fn issue(&mut self, call: RegistryCall, rollback: Rollback) -> PendingCall {
        let ticket = CallTicket(self.next_ticket);
        self.next_ticket += 1;
        log::debug!("Issuing {} as call {}", call.describe(), ticket);
        self.in_flight.insert(ticket, rollback);
        if self.in_flight.len() == 1 {
            self.presenter.set_busy(true);
        }
        PendingCall { ticket, call }
    }

    fn confirm(&mut self, shape: Shape) {
        match shape_mut(&mut self.shapes, shape.id) {
            Some(existing) => *existing = shape,
            None => self.shapes.push(shape),
        }
    }

    fn restore(&mut self, snapshot: Shape) {
        if let Some(shape) = shape_mut(&mut self.shapes, snapshot.id) {
            *shape = snapshot;
        }
    }

    /// Put a rejected update back. If the shape is being dragged again, the
    /// drag continues and the snapshot becomes the new abort target.
    fn roll_back_update(&mut self, snapshot: Shape) {
        match self.gesture.edit_mut() {
            Some(edit) if edit.shape_id == snapshot.id => edit.snapshot = snapshot,
            _ => self.restore(snapshot),
        }
    }

    fn fail(&mut self, action: &str, err: &RegistryError) {
        self.presenter.report_error(&format!("Failed to {}: {}", action, err));
    }
}

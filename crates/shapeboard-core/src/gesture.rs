//! Pointer gesture state.

use crate::shapes::{Endpoint, NewShape, Shape, ShapeId};
use kurbo::Point;

/// Which phase of the interaction state machine is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureState {
    Idle,
    Drawing,
    Moving,
    Resizing,
    MovingEndpoint,
    HoverOnly,
}

/// The shape under edit and its pre-gesture copy.
#[derive(Debug, Clone)]
pub struct ActiveEdit {
    pub shape_id: ShapeId,
    /// Original shape state for rollback.
    pub snapshot: Shape,
}

impl ActiveEdit {
    pub fn new(snapshot: Shape) -> Self {
        Self {
            shape_id: snapshot.id,
            snapshot,
        }
    }
}

/// State of the current pointer interaction.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    /// No button held, nothing hovered.
    #[default]
    Idle,
    /// No button held, pointer over a line endpoint.
    HoverOnly { shape_id: ShapeId, endpoint: Endpoint },
    /// Creating a brand-new shape.
    Drawing { pending: NewShape },
    /// Translating an existing shape by successive pointer deltas.
    Moving { edit: ActiveEdit, last: Point },
    /// Changing the size of a circle, square or triangle.
    Resizing { edit: ActiveEdit },
    /// Dragging one endpoint of a line around the fixed other one.
    MovingEndpoint {
        edit: ActiveEdit,
        endpoint: Endpoint,
        pivot: Point,
    },
}

impl Gesture {
    pub fn state(&self) -> GestureState {
        match self {
            Gesture::Idle => GestureState::Idle,
            Gesture::HoverOnly { .. } => GestureState::HoverOnly,
            Gesture::Drawing { .. } => GestureState::Drawing,
            Gesture::Moving { .. } => GestureState::Moving,
            Gesture::Resizing { .. } => GestureState::Resizing,
            Gesture::MovingEndpoint { .. } => GestureState::MovingEndpoint,
        }
    }

    /// A button is held and the gesture will end in a registry call or abort.
    pub fn is_active(&self) -> bool {
        !matches!(self, Gesture::Idle | Gesture::HoverOnly { .. })
    }

    /// The edit in progress, if this gesture modifies an existing shape.
    pub fn edit(&self) -> Option<&ActiveEdit> {
        match self {
            Gesture::Moving { edit, .. }
            | Gesture::Resizing { edit }
            | Gesture::MovingEndpoint { edit, .. } => Some(edit),
            _ => None,
        }
    }

    pub fn edit_mut(&mut self) -> Option<&mut ActiveEdit> {
        match self {
            Gesture::Moving { edit, .. }
            | Gesture::Resizing { edit }
            | Gesture::MovingEndpoint { edit, .. } => Some(edit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Geometry;

    #[test]
    fn test_gesture_activity() {
        assert!(!Gesture::Idle.is_active());
        assert!(!Gesture::HoverOnly { shape_id: 1, endpoint: Endpoint::End }.is_active());

        let shape = Shape {
            id: 4,
            color: "#abcdef".to_string(),
            geometry: Geometry::Circle { center: Point::new(0.0, 0.0), size: 50.0 },
        };
        let gesture = Gesture::Resizing { edit: ActiveEdit::new(shape) };
        assert!(gesture.is_active());
        assert_eq!(gesture.state(), GestureState::Resizing);
        assert_eq!(gesture.edit().map(|e| e.shape_id), Some(4));
    }
}

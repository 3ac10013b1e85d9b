//! Shape definitions for the canvas.

mod color;
pub(crate) mod record;

pub use color::{ColorSource, random_color};
pub use record::ShapeRecord;

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Registry-assigned shape identifier. Never reused.
pub type ShapeId = u64;

/// Errors raised when a shape or geometry update is malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("unknown shape type: {0:?}")]
    UnknownType(String),
    #[error("{0} shapes must carry an end point")]
    MissingEndpoint(ShapeType),
    #[error("{0} shapes cannot carry an end point")]
    UnexpectedEndpoint(ShapeType),
    #[error("end point requires both endX and endY")]
    PartialEndpoint,
    #[error("coordinates must be finite")]
    NonFinite,
    #[error("size must be non-negative, got {0}")]
    NegativeSize(f64),
}

/// The four kinds of figure a canvas can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Circle,
    Square,
    Triangle,
    Line,
}

impl ShapeType {
    pub const ALL: [ShapeType; 4] = [
        ShapeType::Circle,
        ShapeType::Square,
        ShapeType::Triangle,
        ShapeType::Line,
    ];

    /// Wire name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeType::Circle => "circle",
            ShapeType::Square => "square",
            ShapeType::Triangle => "triangle",
            ShapeType::Line => "line",
        }
    }

    pub fn is_line(self) -> bool {
        self == ShapeType::Line
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeType {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ShapeError::UnknownType(s.to_string()))
    }
}

/// One of the two terminal points of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

impl Endpoint {
    /// The endpoint held fixed while this one is dragged.
    pub fn other(self) -> Self {
        match self {
            Endpoint::Start => Endpoint::End,
            Endpoint::End => Endpoint::Start,
        }
    }
}

/// Geometry of a shape. Only lines carry a second point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Circle { center: Point, size: f64 },
    Square { center: Point, size: f64 },
    Triangle { center: Point, size: f64 },
    Line { start: Point, end: Point, size: f64 },
}

impl Geometry {
    /// Build a geometry from flat fields, enforcing the end point pairing.
    pub fn from_parts(
        shape_type: ShapeType,
        origin: Point,
        size: f64,
        end: Option<Point>,
    ) -> Result<Self, ShapeError> {
        let geometry = match (shape_type, end) {
            (ShapeType::Line, Some(end)) => Geometry::Line { start: origin, end, size },
            (ShapeType::Line, None) => return Err(ShapeError::MissingEndpoint(shape_type)),
            (_, Some(_)) => return Err(ShapeError::UnexpectedEndpoint(shape_type)),
            (ShapeType::Circle, None) => Geometry::Circle { center: origin, size },
            (ShapeType::Square, None) => Geometry::Square { center: origin, size },
            (ShapeType::Triangle, None) => Geometry::Triangle { center: origin, size },
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Geometry::Circle { .. } => ShapeType::Circle,
            Geometry::Square { .. } => ShapeType::Square,
            Geometry::Triangle { .. } => ShapeType::Triangle,
            Geometry::Line { .. } => ShapeType::Line,
        }
    }

    /// Anchor point: the center for solids, the start point for lines.
    pub fn origin(&self) -> Point {
        match *self {
            Geometry::Circle { center, .. }
            | Geometry::Square { center, .. }
            | Geometry::Triangle { center, .. } => center,
            Geometry::Line { start, .. } => start,
        }
    }

    pub fn set_origin(&mut self, origin: Point) {
        match self {
            Geometry::Circle { center, .. }
            | Geometry::Square { center, .. }
            | Geometry::Triangle { center, .. } => *center = origin,
            Geometry::Line { start, .. } => *start = origin,
        }
    }

    pub fn size(&self) -> f64 {
        match *self {
            Geometry::Circle { size, .. }
            | Geometry::Square { size, .. }
            | Geometry::Triangle { size, .. }
            | Geometry::Line { size, .. } => size,
        }
    }

    pub fn set_size(&mut self, new_size: f64) {
        match self {
            Geometry::Circle { size, .. }
            | Geometry::Square { size, .. }
            | Geometry::Triangle { size, .. }
            | Geometry::Line { size, .. } => *size = new_size,
        }
    }

    /// Second point of a line, `None` for every other shape.
    pub fn end(&self) -> Option<Point> {
        match *self {
            Geometry::Line { end, .. } => Some(end),
            _ => None,
        }
    }

    /// Position of one endpoint of a line.
    pub fn endpoint(&self, which: Endpoint) -> Option<Point> {
        match *self {
            Geometry::Line { start, end, .. } => Some(match which {
                Endpoint::Start => start,
                Endpoint::End => end,
            }),
            _ => None,
        }
    }

    /// Radius used for edge grabbing and circle containment.
    pub fn radius(&self) -> f64 {
        self.size() / 2.0
    }

    /// Translate the whole shape, both endpoints for lines.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Geometry::Circle { center, .. }
            | Geometry::Square { center, .. }
            | Geometry::Triangle { center, .. } => *center += delta,
            Geometry::Line { start, end, .. } => {
                *start += delta;
                *end += delta;
            }
        }
    }

    /// Replace the mutable fields. Lines keep their end point when the
    /// update omits one; other shapes reject an end point.
    pub fn apply(&mut self, update: &GeometryUpdate) -> Result<(), ShapeError> {
        let mut next = *self;
        match (&mut next, update.end) {
            (Geometry::Line { end, .. }, Some(new_end)) => *end = new_end,
            (Geometry::Line { .. }, None) => {}
            (_, Some(_)) => return Err(ShapeError::UnexpectedEndpoint(self.shape_type())),
            (_, None) => {}
        }
        next.set_origin(update.origin);
        next.set_size(update.size);
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Check that all coordinates are finite and the size is non-negative.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let origin = self.origin();
        let end_finite = self.end().is_none_or(|p| p.is_finite());
        if !origin.is_finite() || !end_finite || !self.size().is_finite() {
            return Err(ShapeError::NonFinite);
        }
        if self.size() < 0.0 {
            return Err(ShapeError::NegativeSize(self.size()));
        }
        Ok(())
    }
}

/// Replacement geometry sent with an update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryUpdate {
    pub origin: Point,
    pub size: f64,
    pub end: Option<Point>,
}

impl From<&Geometry> for GeometryUpdate {
    fn from(geometry: &Geometry) -> Self {
        Self {
            origin: geometry.origin(),
            size: geometry.size(),
            end: geometry.end(),
        }
    }
}

/// A shape that has not been assigned an id by the registry yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShape {
    pub color: String,
    pub geometry: Geometry,
}

impl NewShape {
    pub fn new(color: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            color: color.into(),
            geometry,
        }
    }

    /// Attach the registry-assigned id.
    pub fn with_id(self, id: ShapeId) -> Shape {
        Shape {
            id,
            color: self.color,
            geometry: self.geometry,
        }
    }
}

/// A persisted shape.
///
/// Serializes as the flat wire record (`shapeType`, `x`, `y`, `endX`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ShapeRecord", try_from = "ShapeRecord")]
pub struct Shape {
    pub id: ShapeId,
    pub color: String,
    pub geometry: Geometry,
}

impl Shape {
    pub fn shape_type(&self) -> ShapeType {
        self.geometry.shape_type()
    }
}

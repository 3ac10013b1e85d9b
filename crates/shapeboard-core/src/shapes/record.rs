//! Flat wire representation of a shape.

use super::{Geometry, Shape, ShapeError, ShapeId, ShapeType};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A shape as it crosses the registry boundary.
///
/// `endX`/`endY` are only present for lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub id: ShapeId,
    pub shape_type: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f64>,
}

/// Combine optional wire coordinates into an end point.
pub(crate) fn end_point(end_x: Option<f64>, end_y: Option<f64>) -> Result<Option<Point>, ShapeError> {
    match (end_x, end_y) {
        (Some(x), Some(y)) => Ok(Some(Point::new(x, y))),
        (None, None) => Ok(None),
        _ => Err(ShapeError::PartialEndpoint),
    }
}

impl From<Shape> for ShapeRecord {
    fn from(shape: Shape) -> Self {
        let origin = shape.geometry.origin();
        let end = shape.geometry.end();
        Self {
            id: shape.id,
            shape_type: shape.shape_type().as_str().to_string(),
            x: origin.x,
            y: origin.y,
            color: shape.color,
            size: shape.geometry.size(),
            end_x: end.map(|p| p.x),
            end_y: end.map(|p| p.y),
        }
    }
}

impl TryFrom<ShapeRecord> for Shape {
    type Error = ShapeError;

    fn try_from(record: ShapeRecord) -> Result<Self, Self::Error> {
        let shape_type: ShapeType = record.shape_type.parse()?;
        let end = end_point(record.end_x, record.end_y)?;
        let geometry = Geometry::from_parts(shape_type, Point::new(record.x, record.y), record.size, end)?;
        Ok(Shape {
            id: record.id,
            color: record.color,
            geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_record() -> ShapeRecord {
        ShapeRecord {
            id: 3,
            shape_type: "line".to_string(),
            x: 10.0,
            y: 20.0,
            color: "#ff0000".to_string(),
            size: 50.0,
            end_x: Some(110.0),
            end_y: Some(20.0),
        }
    }

    #[test]
    fn test_line_record_to_shape() {
        let shape = Shape::try_from(line_record()).unwrap();
        assert_eq!(shape.shape_type(), ShapeType::Line);
        assert_eq!(shape.geometry.end(), Some(Point::new(110.0, 20.0)));
        assert_eq!(ShapeRecord::from(shape), line_record());
    }

    #[test]
    fn test_partial_endpoint_rejected() {
        let mut record = line_record();
        record.end_y = None;
        assert_eq!(Shape::try_from(record), Err(ShapeError::PartialEndpoint));
    }

    #[test]
    fn test_square_record_with_endpoint_rejected() {
        let mut record = line_record();
        record.shape_type = "square".to_string();
        assert!(matches!(
            Shape::try_from(record),
            Err(ShapeError::UnexpectedEndpoint(ShapeType::Square))
        ));
    }

    #[test]
    fn test_shape_serializes_as_flat_record() {
        let shape = Shape::try_from(line_record()).unwrap();
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["shapeType"], "line");
        assert_eq!(json["endX"], 110.0);

        let circle = Shape {
            id: 1,
            color: "#00ff00".to_string(),
            geometry: Geometry::Circle { center: Point::new(1.0, 2.0), size: 50.0 },
        };
        let json = serde_json::to_value(&circle).unwrap();
        assert!(json.get("endX").is_none());
        let back: Shape = serde_json::from_value(json).unwrap();
        assert_eq!(back, circle);
    }
}

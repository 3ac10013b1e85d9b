//! Hit-testing geometry.
//!
//! Everything here is a pure function of a shape's geometry and a pointer
//! position in canvas-local coordinates.

use crate::config::InteractionConfig;
use crate::shapes::{Endpoint, Geometry, Shape, ShapeId};
use kurbo::Point;

/// How a pointer-down grabbed a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grab {
    /// Inside the shape, away from any edge or endpoint.
    Body,
    /// On the radial edge band of a circle, square or triangle.
    Edge,
    /// Near one endpoint of a line.
    Endpoint(Endpoint),
}

/// Point inside a circle of diameter `size`.
pub fn circle_contains(center: Point, size: f64, point: Point) -> bool {
    let radius = size / 2.0;
    (point - center).hypot2() <= radius * radius
}

/// Point inside an axis-aligned square of side `size` centered on `center`.
pub fn square_contains(center: Point, size: f64, point: Point) -> bool {
    let half = size / 2.0;
    (point.x - center.x).abs() <= half && (point.y - center.y).abs() <= half
}

/// Vertices of an upward equilateral triangle of side `size` whose bounding
/// box is centered on `center`: apex, bottom-left, bottom-right.
pub fn triangle_vertices(center: Point, size: f64) -> [Point; 3] {
    let half_height = size * 3f64.sqrt() / 4.0;
    [
        Point::new(center.x, center.y - half_height),
        Point::new(center.x - size / 2.0, center.y + half_height),
        Point::new(center.x + size / 2.0, center.y + half_height),
    ]
}

fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    ((a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)) / 2.0).abs()
}

/// Area-sum test: the three sub-triangles formed with `point` add up to the
/// full triangle's area only when `point` is inside.
pub fn triangle_contains(center: Point, size: f64, point: Point, tolerance: f64) -> bool {
    let [a, b, c] = triangle_vertices(center, size);
    let full = triangle_area(a, b, c);
    let parts = triangle_area(point, b, c) + triangle_area(a, point, c) + triangle_area(a, b, point);
    (parts - full).abs() <= tolerance
}

/// Point on the segment if going through it barely lengthens the path
/// between the endpoints.
pub fn line_contains(start: Point, end: Point, point: Point, tolerance: f64) -> bool {
    let detour = point.distance(start) + point.distance(end);
    detour - start.distance(end) <= tolerance
}

/// Pointer within `band` of the radius of a circle, square or triangle.
/// This is the band test alone; [`grab`] also requires containment.
pub fn near_edge(geometry: &Geometry, point: Point, band: f64) -> bool {
    match geometry {
        Geometry::Line { .. } => false,
        _ => (geometry.origin().distance(point) - geometry.radius()).abs() <= band,
    }
}

/// Which endpoint of a line, if any, lies within `radius` of the pointer.
/// The start point wins when both are in range.
pub fn endpoint_near(geometry: &Geometry, point: Point, radius: f64) -> Option<Endpoint> {
    let Geometry::Line { start, end, .. } = *geometry else {
        return None;
    };
    if start.distance(point) <= radius {
        Some(Endpoint::Start)
    } else if end.distance(point) <= radius {
        Some(Endpoint::End)
    } else {
        None
    }
}

/// Containment test for any shape.
pub fn contains(geometry: &Geometry, point: Point, config: &InteractionConfig) -> bool {
    match *geometry {
        Geometry::Circle { center, size } => circle_contains(center, size, point),
        Geometry::Square { center, size } => square_contains(center, size, point),
        Geometry::Triangle { center, size } => {
            triangle_contains(center, size, point, config.triangle_tolerance)
        }
        Geometry::Line { start, end, .. } => line_contains(start, end, point, config.line_tolerance),
    }
}

/// Classify a pointer-down against a single shape.
///
/// Only a point inside the shape grabs it. Among those, endpoints win over
/// the edge band, which wins over the body.
pub fn grab(geometry: &Geometry, point: Point, config: &InteractionConfig) -> Option<Grab> {
    if !contains(geometry, point, config) {
        return None;
    }
    if let Some(endpoint) = endpoint_near(geometry, point, config.endpoint_radius) {
        return Some(Grab::Endpoint(endpoint));
    }
    if near_edge(geometry, point, config.edge_band) {
        return Some(Grab::Edge);
    }
    Some(Grab::Body)
}

/// Find the first shape under the pointer, most recently added first.
pub fn pick(shapes: &[Shape], point: Point, config: &InteractionConfig) -> Option<(ShapeId, Grab)> {
    shapes
        .iter()
        .rev()
        .find_map(|shape| grab(&shape.geometry, point, config).map(|g| (shape.id, g)))
}

/// Endpoint hover feedback across every line on the canvas.
pub fn hover_endpoint(shapes: &[Shape], point: Point, config: &InteractionConfig) -> Option<(ShapeId, Endpoint)> {
    shapes.iter().rev().find_map(|shape| {
        endpoint_near(&shape.geometry, point, config.endpoint_radius).map(|e| (shape.id, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: ShapeId, start: Point, end: Point) -> Shape {
        Shape {
            id,
            color: "#000000".to_string(),
            geometry: Geometry::Line { start, end, size: 50.0 },
        }
    }

    #[test]
    fn test_circle_contains() {
        let center = Point::new(100.0, 100.0);
        assert!(circle_contains(center, 50.0, Point::new(100.0, 100.0)));
        assert!(circle_contains(center, 50.0, Point::new(100.0, 125.0)));
        assert!(!circle_contains(center, 50.0, Point::new(100.0, 126.0)));
    }

    #[test]
    fn test_square_contains() {
        let center = Point::new(0.0, 0.0);
        assert!(square_contains(center, 50.0, Point::new(25.0, -25.0)));
        assert!(square_contains(center, 50.0, Point::new(24.0, 24.0)));
        assert!(!square_contains(center, 50.0, Point::new(26.0, 0.0)));
    }

    #[test]
    fn test_triangle_contains() {
        let center = Point::new(100.0, 100.0);
        assert!(triangle_contains(center, 60.0, center, 0.1));
        // Just below the apex.
        let [apex, left, right] = triangle_vertices(center, 60.0);
        assert!(triangle_contains(center, 60.0, Point::new(apex.x, apex.y + 1.0), 0.1));
        // Upper corners of the bounding box are outside.
        assert!(!triangle_contains(center, 60.0, Point::new(left.x + 1.0, apex.y + 1.0), 0.1));
        assert!(!triangle_contains(center, 60.0, Point::new(right.x - 1.0, apex.y + 1.0), 0.1));
    }

    #[test]
    fn test_line_contains() {
        let (a, b) = (Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line_contains(a, b, Point::new(50.0, 0.0), 1.0));
        assert!(line_contains(a, b, Point::new(50.0, 10.0), 5.0));
        assert!(!line_contains(a, b, Point::new(50.0, 20.0), 5.0));
        assert!(!line_contains(a, b, Point::new(110.0, 0.0), 5.0));
    }

    #[test]
    fn test_near_edge() {
        let circle = Geometry::Circle { center: Point::new(0.0, 0.0), size: 50.0 };
        assert!(near_edge(&circle, Point::new(25.0, 0.0), 10.0));
        assert!(near_edge(&circle, Point::new(16.0, 0.0), 10.0));
        assert!(!near_edge(&circle, Point::new(10.0, 0.0), 10.0));
        let segment = Geometry::Line { start: Point::ZERO, end: Point::new(50.0, 0.0), size: 50.0 };
        assert!(!near_edge(&segment, Point::new(25.0, 0.0), 10.0));
    }

    #[test]
    fn test_endpoint_near() {
        let segment = Geometry::Line { start: Point::ZERO, end: Point::new(100.0, 0.0), size: 50.0 };
        assert_eq!(endpoint_near(&segment, Point::new(3.0, 4.0), 10.0), Some(Endpoint::Start));
        assert_eq!(endpoint_near(&segment, Point::new(95.0, 0.0), 10.0), Some(Endpoint::End));
        assert_eq!(endpoint_near(&segment, Point::new(50.0, 0.0), 10.0), None);
    }

    #[test]
    fn test_grab_classification() {
        let config = InteractionConfig::default();
        let square = Geometry::Square { center: Point::new(100.0, 100.0), size: 100.0 };
        assert_eq!(grab(&square, Point::new(100.0, 100.0), &config), Some(Grab::Body));
        assert_eq!(grab(&square, Point::new(148.0, 100.0), &config), Some(Grab::Edge));
        assert_eq!(grab(&square, Point::new(300.0, 100.0), &config), None);
    }

    #[test]
    fn test_grab_requires_containment() {
        let config = InteractionConfig::default();
        let circle = Geometry::Circle { center: Point::new(100.0, 100.0), size: 50.0 };
        // Inside the edge band but outside the circle.
        assert!(near_edge(&circle, Point::new(132.0, 100.0), config.edge_band));
        assert_eq!(grab(&circle, Point::new(132.0, 100.0), &config), None);
        assert_eq!(grab(&circle, Point::new(120.0, 100.0), &config), Some(Grab::Edge));

        let segment = Geometry::Line { start: Point::ZERO, end: Point::new(100.0, 0.0), size: 50.0 };
        // Within the endpoint radius but past the end of the segment.
        assert_eq!(endpoint_near(&segment, Point::new(108.0, 0.0), config.endpoint_radius), Some(Endpoint::End));
        assert_eq!(grab(&segment, Point::new(108.0, 0.0), &config), None);
        assert_eq!(grab(&segment, Point::new(98.0, 1.0), &config), Some(Grab::Endpoint(Endpoint::End)));

        let shapes = vec![Shape { id: 1, color: "#000000".to_string(), geometry: circle }];
        assert_eq!(pick(&shapes, Point::new(132.0, 100.0), &config), None);
    }

    #[test]
    fn test_pick_prefers_latest() {
        let config = InteractionConfig::default();
        let shapes = vec![
            line(1, Point::new(0.0, 0.0), Point::new(100.0, 0.0)),
            line(2, Point::new(0.0, 0.0), Point::new(0.0, 100.0)),
        ];
        assert_eq!(
            pick(&shapes, Point::new(1.0, 1.0), &config),
            Some((2, Grab::Endpoint(Endpoint::Start)))
        );
        assert_eq!(pick(&shapes, Point::new(50.0, 0.0), &config), Some((1, Grab::Body)));
        assert_eq!(hover_endpoint(&shapes, Point::new(100.0, 2.0), &config), Some((1, Endpoint::End)));
    }
}

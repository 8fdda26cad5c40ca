//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use nalgebra::{Point2, Vector2};

use crate::model::MapPoint;

const PARALLEL_EPSILON: f64 = 1e-12;

pub fn to_point(p: &MapPoint) -> Point2<f64> {
    Point2::new(p.x, p.y)
}

pub fn to_points(path: &[MapPoint]) -> Vec<Point2<f64>> {
    path.iter().map(to_point).collect()
}

pub fn midpoint(a: Point2<f64>, b: Point2<f64>) -> Point2<f64> {
    Point2::from((a.coords + b.coords) * 0.5)
}

pub fn path_length(points: &[Point2<f64>]) -> f64 {
    points
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).norm())
        .sum()
}

/// Strict counter-clockwise orientation of the triplet (a, b, c).
pub fn ccw(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// Proper intersection test: the segments (a, b) and (c, d) cross iff the
/// orientations differ pairwise. Collinear overlap and shared endpoints do
/// not count as crossings.
pub fn segments_intersect(
    a: Point2<f64>,
    b: Point2<f64>,
    c: Point2<f64>,
    d: Point2<f64>,
) -> bool {
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

/// Parametric intersection of the lines through (a, b) and (c, d). Falls
/// back to the midpoint of (a, b) when the segments are near-parallel; the
/// result is only meaningful after [`segments_intersect`] has passed.
pub fn segment_intersection_point(
    a: Point2<f64>,
    b: Point2<f64>,
    c: Point2<f64>,
    d: Point2<f64>,
) -> Point2<f64> {
    let r: Vector2<f64> = b - a;
    let s: Vector2<f64> = d - c;
    let denominator = r.perp(&s);
    if denominator.abs() < PARALLEL_EPSILON {
        return midpoint(a, b);
    }
    let t = (c - a).perp(&s) / denominator;
    a + r * t
}

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Aabb {
    pub fn from_points(points: &[Point2<f64>]) -> Option<Aabb> {
        let first = points.first()?;
        let mut bounds = Aabb {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_detected() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(100.0, 0.0);
        let c = Point2::new(50.0, -20.0);
        let d = Point2::new(50.0, 20.0);
        assert!(segments_intersect(a, b, c, d));

        let p = segment_intersection_point(a, b, c, d);
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn disjoint_segments_do_not_cross() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        let c = Point2::new(20.0, 1.0);
        let d = Point2::new(30.0, 1.0);
        assert!(!segments_intersect(a, b, c, d));
    }

    #[test]
    fn collinear_overlap_is_not_a_crossing() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        let c = Point2::new(5.0, 0.0);
        let d = Point2::new(15.0, 0.0);
        assert!(!segments_intersect(a, b, c, d));
    }

    #[test]
    fn shared_endpoint_is_not_a_crossing() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(10.0, 0.0);
        let c = Point2::new(10.0, 0.0);
        let d = Point2::new(10.0, 10.0);
        assert!(!segments_intersect(a, b, c, d));
    }

    #[test]
    fn path_length_sums_segments() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 4.0),
            Point2::new(3.0, 10.0),
        ];
        assert!((path_length(&points) - 11.0).abs() < 1e-12);
    }

    #[test]
    fn bounds_contain_interior_and_edge_points() {
        let bounds = Aabb::from_points(&[
            Point2::new(40.0, -10.0),
            Point2::new(80.0, 10.0),
            Point2::new(60.0, 0.0),
        ])
        .unwrap();
        assert!(bounds.contains(Point2::new(50.0, 0.0)));
        assert!(bounds.contains(Point2::new(40.0, -10.0)));
        assert!(!bounds.contains(Point2::new(39.9, 0.0)));
    }

    #[test]
    fn empty_polygon_has_no_bounds() {
        assert!(Aabb::from_points(&[]).is_none());
    }
}

//! 2D geometry kernel: intersection primitives, containment and collision
//! tests, contour tracing and simplification, convex splitting, and polyline
//! utilities.
//!
//! All algorithms operate on [`geo_types`] primitives and are generic over
//! [`CoordFloat`] where the algorithm permits.

pub mod collide;
pub mod contains;
pub mod contour;
pub mod convex_split;
pub mod intersect;
pub mod polyline;
pub mod sweep;

use geo_types::{Coord, CoordFloat};

/// Angle of the direction from `pt1` to `pt2` against the x axis.
pub fn line_angle<T: CoordFloat>(pt1: Coord<T>, pt2: Coord<T>) -> T {
    let dir = pt2 - pt1;
    dir.y.atan2(dir.x)
}

/// Angle between two directed lines.
pub fn lines_angle<T: CoordFloat>(
    line1a: Coord<T>,
    line1b: Coord<T>,
    line2a: Coord<T>,
    line2b: Coord<T>,
) -> T {
    line_angle(line2a, line2b) - line_angle(line1a, line1b)
}

/// Signed area test: positive if `pt` lies to the left of the directed line
/// `a -> b`, negative to the right, zero on the line.
pub fn side_of_line<T: CoordFloat>(a: Coord<T>, b: Coord<T>, pt: Coord<T>) -> T {
    (b.x - a.x) * (pt.y - a.y) - (b.y - a.y) * (pt.x - a.x)
}

/// Reduce an angle to the range `[0, 2π)`.
pub fn mod_pos_angle<T: CoordFloat>(mut angle: T) -> T {
    let two_pi = T::from(std::f64::consts::TAU).unwrap();
    while angle < T::zero() {
        angle = angle + two_pi;
    }
    while angle >= two_pi {
        angle = angle - two_pi;
    }
    angle
}

/// Project `pt` onto the segment `a -> b`.
///
/// Returns the segment parameter (0 at `a`, 1 at `b`, possibly outside that
/// range), the distance from `pt` to the unclamped projection, and the
/// projected point itself.
pub fn project_onto_segment<T: CoordFloat>(
    pt: Coord<T>,
    a: Coord<T>,
    b: Coord<T>,
) -> (T, T, Coord<T>) {
    let dir = b - a;
    let len_sq = dir.x * dir.x + dir.y * dir.y;
    if len_sq == T::zero() {
        let diff = pt - a;
        return (T::zero(), (diff.x * diff.x + diff.y * diff.y).sqrt(), a);
    }

    let rel = pt - a;
    let param = (rel.x * dir.x + rel.y * dir.y) / len_sq;
    let proj = a + dir * param;
    let diff = pt - proj;
    (param, (diff.x * diff.x + diff.y * diff.y).sqrt(), proj)
}

/// Euclidean norm of a coordinate interpreted as a vector.
pub fn norm<T: CoordFloat>(vec: Coord<T>) -> T {
    (vec.x * vec.x + vec.y * vec.y).sqrt()
}

/// Squared Euclidean norm.
pub fn norm_sq<T: CoordFloat>(vec: Coord<T>) -> T {
    vec.x * vec.x + vec.y * vec.y
}

//! Line/line, circle/circle and circle/polyline intersection primitives.

use geo_types::{Coord, CoordFloat, Line};

use super::side_of_line;

/// Intersect two lines.
///
/// With `only_segments` the lines are treated as segments and an intersection
/// is only reported when it falls into the parameter range `[0, 1]` of both,
/// widened by `eps`.
pub fn intersect_lines<T: CoordFloat>(
    line1: &Line<T>,
    line2: &Line<T>,
    only_segments: bool,
    eps: T,
) -> Option<Coord<T>> {
    let dir1 = line1.end - line1.start;
    let dir2 = line2.end - line2.start;

    let det = dir1.x * (-dir2.y) - dir1.y * (-dir2.x);
    if det.abs() < eps {
        // parallel or degenerate
        return None;
    }

    let rhs = line2.start - line1.start;
    let param1 = (rhs.x * (-dir2.y) - rhs.y * (-dir2.x)) / det;
    let param2 = (dir1.x * rhs.y - dir1.y * rhs.x) / det;

    if only_segments {
        let lo = -eps;
        let hi = T::one() + eps;
        if param1 < lo || param1 > hi || param2 < lo || param2 > hi {
            return None;
        }
    }

    Some(line1.start + dir1 * param1)
}

/// Quick segment intersection test via orientation signs.
pub fn intersect_lines_check<T: CoordFloat>(line1: &Line<T>, line2: &Line<T>) -> bool {
    let d1 = side_of_line(line1.start, line1.end, line2.start);
    let d2 = side_of_line(line1.start, line1.end, line2.end);
    let d3 = side_of_line(line2.start, line2.end, line1.start);
    let d4 = side_of_line(line2.start, line2.end, line1.end);

    d1 * d2 <= T::zero() && d3 * d4 <= T::zero()
}

/// Intersection points of two circles.
pub fn intersect_circle_circle<T: CoordFloat>(
    org1: Coord<T>,
    r1: T,
    org2: Coord<T>,
    r2: T,
) -> Vec<Coord<T>> {
    let diff = org2 - org1;
    let dist_sq = diff.x * diff.x + diff.y * diff.y;
    let dist = dist_sq.sqrt();

    if dist == T::zero() {
        // concentric circles never intersect in isolated points
        return vec![];
    }

    // circles too far apart or one contained in the other
    if dist > r1 + r2 || dist < (r1 - r2).abs() {
        return vec![];
    }

    let two = T::from(2.0).unwrap();
    let a = (dist_sq + r1 * r1 - r2 * r2) / (two * dist);
    let h_sq = r1 * r1 - a * a;
    let mid = org1 + diff * (a / dist);

    if h_sq <= T::zero() {
        return vec![mid];
    }

    let h = h_sq.sqrt();
    let perp = Coord {
        x: -diff.y / dist,
        y: diff.x / dist,
    };

    vec![mid + perp * h, mid - perp * h]
}

/// Intersection points of a circle and a single segment.
pub fn intersect_circle_segment<T: CoordFloat>(
    org: Coord<T>,
    rad: T,
    seg: &Line<T>,
) -> Vec<Coord<T>> {
    let dir = seg.end - seg.start;
    let rel = seg.start - org;

    let a = dir.x * dir.x + dir.y * dir.y;
    let two = T::from(2.0).unwrap();
    let b = two * (rel.x * dir.x + rel.y * dir.y);
    let c = rel.x * rel.x + rel.y * rel.y - rad * rad;

    if a == T::zero() {
        return vec![];
    }

    let disc = b * b - T::from(4.0).unwrap() * a * c;
    if disc < T::zero() {
        return vec![];
    }

    let sqrt_disc = disc.sqrt();
    let mut pts = Vec::with_capacity(2);
    for sign in [T::one(), -T::one()] {
        let param = (-b + sign * sqrt_disc) / (two * a);
        if param >= T::zero() && param <= T::one() {
            pts.push(seg.start + dir * param);
        }
    }
    pts.dedup_by(|p1, p2| p1.x == p2.x && p1.y == p2.y);
    pts
}

/// Intersection points of a circle and a polyline (optionally closed).
pub fn intersect_circle_polyline<T: CoordFloat>(
    org: Coord<T>,
    rad: T,
    poly: &[Coord<T>],
    closed: bool,
) -> Vec<Coord<T>> {
    let mut pts = vec![];
    if poly.len() < 2 {
        return pts;
    }

    let count = if closed { poly.len() } else { poly.len() - 1 };
    for idx1 in 0..count {
        let idx2 = (idx1 + 1) % poly.len();
        let seg = Line::new(poly[idx1], poly[idx2]);
        pts.extend(intersect_circle_segment(org, rad, &seg));
    }

    pts
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::coord;
    use rand::Rng;

    #[test]
    fn crossing_segments() {
        let line1 = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 2.0, y: 2.0 });
        let line2 = Line::new(coord! { x: 0.0, y: 2.0 }, coord! { x: 2.0, y: 0.0 });

        let pt = intersect_lines(&line1, &line2, true, 1e-6).unwrap();
        assert_relative_eq!(pt.x, 1.0);
        assert_relative_eq!(pt.y, 1.0);
        assert!(intersect_lines_check(&line1, &line2));
    }

    #[test]
    fn disjoint_segments() {
        let line1 = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 });
        let line2 = Line::new(coord! { x: 0.0, y: 1.0 }, coord! { x: 1.0, y: 1.0 });

        assert!(intersect_lines(&line1, &line2, true, 1e-6).is_none());
        assert!(!intersect_lines_check(&line1, &line2));
    }

    #[test]
    fn infinite_lines_meet_outside_segments() {
        let line1 = Line::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 });
        let line2 = Line::new(coord! { x: 5.0, y: -1.0 }, coord! { x: 5.0, y: 1.0 });

        assert!(intersect_lines(&line1, &line2, true, 1e-6).is_none());
        let pt = intersect_lines(&line1, &line2, false, 1e-6).unwrap();
        assert_relative_eq!(pt.x, 5.0);
        assert_relative_eq!(pt.y, 0.0);
    }

    // the parametric and the orientation-based tests have to agree
    #[test]
    fn segment_tests_agree() {
        let mut rng = rand::thread_rng();
        let eps = 1e-4;

        for _ in 0..2000 {
            let mut pt = || coord! { x: rng.gen_range(-1000.0..1000.0), y: rng.gen_range(-1000.0..1000.0) };
            let line1 = Line::new(pt(), pt());
            let line2 = Line::new(pt(), pt());

            let inters = intersect_lines(&line1, &line2, true, eps).is_some();
            let check = intersect_lines_check(&line1, &line2);
            assert_eq!(inters, check, "{:?} vs {:?}", line1, line2);
        }
    }

    #[test]
    fn circle_circle() {
        // overlapping circles
        let pts = intersect_circle_circle(
            coord! { x: 0.0f64, y: 0.0 },
            1.0,
            coord! { x: 1.0, y: 0.0 },
            1.0,
        );
        assert_eq!(pts.len(), 2);
        for pt in &pts {
            assert_relative_eq!(pt.x, 0.5);
            assert_relative_eq!(pt.y.abs(), (0.75f64).sqrt(), epsilon = 1e-12);
        }

        // separate circles
        assert!(intersect_circle_circle(
            coord! { x: 0.0, y: 0.0 },
            1.0,
            coord! { x: 5.0, y: 0.0 },
            1.0,
        )
        .is_empty());

        // contained circle
        assert!(intersect_circle_circle(
            coord! { x: 0.0, y: 0.0 },
            2.0,
            coord! { x: 0.1, y: 0.0 },
            0.5,
        )
        .is_empty());
    }

    #[test]
    fn circle_segment() {
        let seg = Line::new(coord! { x: -2.0, y: 0.0 }, coord! { x: 2.0, y: 0.0 });
        let pts = intersect_circle_segment(coord! { x: 0.0, y: 0.0 }, 1.0, &seg);
        assert_eq!(pts.len(), 2);

        // segment entirely inside the circle
        let seg = Line::new(coord! { x: -0.5, y: 0.0 }, coord! { x: 0.5, y: 0.0 });
        assert!(intersect_circle_segment(coord! { x: 0.0, y: 0.0 }, 1.0, &seg).is_empty());
    }
}

//! Point-in-polygon and polygon containment tests.

use geo_types::{Coord, CoordFloat, Line};

use super::intersect::intersect_lines;

/// Choose a ray target that is guaranteed to lie outside the polygon.
fn fallback_outside_point<T: CoordFloat>(verts: impl Iterator<Item = Coord<T>>) -> Coord<T> {
    let mut pt = Coord {
        x: T::zero(),
        y: T::zero(),
    };
    for vert in verts {
        pt.x = vert.x.max(pt.x).abs();
        pt.y = vert.y.max(pt.y).abs();
    }
    pt.x = pt.x * T::from(4.0).unwrap() + T::one();
    pt.y = pt.y * T::from(2.0).unwrap() + T::one();
    pt
}

/// Ray-casting point-in-polygon test on a vertex loop.
pub fn pt_inside_poly<T: CoordFloat>(poly: &[Coord<T>], pt: Coord<T>, eps: T) -> bool {
    // a point coinciding with a polygon vertex does not count as inside
    for vert in poly {
        if (vert.x - pt.x).abs() <= eps && (vert.y - pt.y).abs() <= eps {
            return false;
        }
    }

    let outside = fallback_outside_point(poly.iter().copied());
    let ray = Line::new(pt, outside);

    let mut num_inters = 0_usize;
    for idx1 in 0..poly.len() {
        let idx2 = (idx1 + 1) % poly.len();
        let edge = Line::new(poly[idx1], poly[idx2]);
        if intersect_lines(&ray, &edge, true, eps).is_some() {
            num_inters += 1;
        }
    }

    num_inters % 2 == 1
}

/// Ray-casting test on a slice `[begin, end)` of a flat segment vector, as
/// produced by the contour line-segment stage. An explicit outside point can
/// be supplied for degenerate loops.
pub fn pt_inside_poly_lines<T: CoordFloat>(
    lines: &[Line<T>],
    pt: Coord<T>,
    begin: usize,
    end: usize,
    pt_outside: Option<Coord<T>>,
    eps: T,
) -> bool {
    let (begin, end) = if end <= begin {
        (0, lines.len())
    } else {
        (begin, end)
    };

    let outside = pt_outside.unwrap_or_else(|| {
        fallback_outside_point(
            lines[begin..end]
                .iter()
                .flat_map(|line| [line.start, line.end]),
        )
    });
    let ray = Line::new(pt, outside);

    let mut num_inters = 0_usize;
    for line in &lines[begin..end] {
        if intersect_lines(&ray, line, true, eps).is_some() {
            num_inters += 1;
        }
    }

    num_inters % 2 == 1
}

/// True if every vertex of `inner` lies inside `outer`.
pub fn poly_inside_poly<T: CoordFloat>(outer: &[Coord<T>], inner: &[Coord<T>], eps: T) -> bool {
    if outer.is_empty() || inner.is_empty() {
        return false;
    }

    inner.iter().all(|&pt| pt_inside_poly(outer, pt, eps))
}

#[cfg(test)]
mod test {
    use super::*;
    use geo_types::coord;

    fn square<T: CoordFloat>() -> Vec<Coord<T>> {
        [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]
            .iter()
            .map(|&(x, y)| Coord {
                x: T::from(x).unwrap(),
                y: T::from(y).unwrap(),
            })
            .collect()
    }

    #[test]
    fn point_in_square() {
        let sq = square::<f64>();
        assert!(pt_inside_poly(&sq, coord! { x: 2.0, y: 2.0 }, 1e-6));
        assert!(!pt_inside_poly(&sq, coord! { x: 5.0, y: 2.0 }, 1e-6));
        assert!(!pt_inside_poly(&sq, coord! { x: -1.0, y: -1.0 }, 1e-6));
    }

    #[test]
    fn point_in_segment_group() {
        let sq = square::<f64>();
        let mut lines = vec![];
        for idx1 in 0..sq.len() {
            let idx2 = (idx1 + 1) % sq.len();
            lines.push(Line::new(sq[idx1], sq[idx2]));
        }

        let outside = coord! { x: -10.0, y: -7.0 };
        assert!(pt_inside_poly_lines(
            &lines,
            coord! { x: 1.0, y: 3.0 },
            0,
            lines.len(),
            Some(outside),
            1e-6
        ));
        assert!(!pt_inside_poly_lines(
            &lines,
            coord! { x: 7.0, y: 3.0 },
            0,
            lines.len(),
            Some(outside),
            1e-6
        ));
    }

    #[test]
    fn nested_polygons() {
        let outer = square::<f64>();
        let inner: Vec<_> = [(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]
            .iter()
            .map(|&(x, y)| coord! { x: x, y: y })
            .collect();

        assert!(poly_inside_poly(&outer, &inner, 1e-6));
        assert!(!poly_inside_poly(&inner, &outer, 1e-6));
    }
}

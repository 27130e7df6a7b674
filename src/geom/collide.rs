//! Collision predicates between the projected 2D shapes of instrument
//! components: circles (from cylinders and spheres) and convex polygons
//! (from boxes).

use geo_types::{Coord, CoordFloat, Line, Rect};

use super::contains::{poly_inside_poly, pt_inside_poly};
use super::intersect::intersect_circle_polyline;
use super::sweep::sweep_segment_intersections;

/// Axis-aligned bounding rectangle over a set of polygons.
pub fn polys_bounding_rect<T: CoordFloat>(polys: &[Vec<Coord<T>>]) -> Option<Rect<T>> {
    let mut iter = polys.iter().flatten();
    let first = *iter.next()?;

    let mut min = first;
    let mut max = first;
    for vert in iter {
        min.x = min.x.min(vert.x);
        min.y = min.y.min(vert.y);
        max.x = max.x.max(vert.x);
        max.y = max.y.max(vert.y);
    }

    Some(Rect::new(min, max))
}

/// Axis-aligned bounding rectangle over a set of circles.
pub fn circles_bounding_rect<T: CoordFloat>(circles: &[(Coord<T>, T)]) -> Option<Rect<T>> {
    let (first_org, first_rad) = *circles.first()?;

    let mut min = Coord {
        x: first_org.x - first_rad,
        y: first_org.y - first_rad,
    };
    let mut max = Coord {
        x: first_org.x + first_rad,
        y: first_org.y + first_rad,
    };
    for &(org, rad) in &circles[1..] {
        min.x = min.x.min(org.x - rad);
        min.y = min.y.min(org.y - rad);
        max.x = max.x.max(org.x + rad);
        max.y = max.y.max(org.y + rad);
    }

    Some(Rect::new(min, max))
}

/// Overlap test for two optional bounding rectangles; absent rectangles
/// (empty shape collections) never overlap.
pub fn rects_overlap<T: CoordFloat>(rect1: Option<Rect<T>>, rect2: Option<Rect<T>>) -> bool {
    let (Some(rect1), Some(rect2)) = (rect1, rect2) else {
        return false;
    };

    rect1.min().x <= rect2.max().x
        && rect1.max().x >= rect2.min().x
        && rect1.min().y <= rect2.max().y
        && rect1.max().y >= rect2.min().y
}

/// Two circles collide when their centre distance is below the radius sum.
pub fn collide_circle_circle<T: CoordFloat>(org1: Coord<T>, r1: T, org2: Coord<T>, r2: T) -> bool {
    let diff = org2 - org1;
    let dist_sq = diff.x * diff.x + diff.y * diff.y;
    dist_sq < (r1 + r2) * (r1 + r2)
}

/// Circle/polygon collision: boundary intersection, circle centre inside the
/// polygon, or polygon fully inside the circle.
pub fn collide_circle_poly<T: CoordFloat>(
    org: Coord<T>,
    rad: T,
    poly: &[Coord<T>],
    eps: T,
) -> bool {
    if !intersect_circle_polyline(org, rad, poly, true).is_empty() {
        return true;
    }

    if pt_inside_poly(poly, org, eps) {
        return true;
    }

    // polygon completely inside the circle
    let rad_sq = rad * rad;
    !poly.is_empty()
        && poly.iter().all(|&vert| {
            let diff = vert - org;
            diff.x * diff.x + diff.y * diff.y < rad_sq
        })
}

/// Polygon/polygon collision via a sweep over the union of the edges plus
/// containment checks in both directions.
pub fn collide_poly_poly<T: CoordFloat>(poly1: &[Coord<T>], poly2: &[Coord<T>], eps: T) -> bool {
    if poly1.is_empty() || poly2.is_empty() {
        return false;
    }

    let mut segments = Vec::with_capacity(poly1.len() + poly2.len());
    for (tag, poly) in [(0_usize, poly1), (1, poly2)] {
        for idx1 in 0..poly.len() {
            let idx2 = (idx1 + 1) % poly.len();
            segments.push((Line::new(poly[idx1], poly[idx2]), tag));
        }
    }

    if !sweep_segment_intersections(&segments, eps).is_empty() {
        return true;
    }

    poly_inside_poly(poly1, poly2, eps) || poly_inside_poly(poly2, poly1, eps)
}

#[cfg(test)]
mod test {
    use super::*;
    use geo_types::coord;

    fn rect_poly(cx: f64, cy: f64, hw: f64, hh: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: cx - hw, y: cy - hh },
            coord! { x: cx + hw, y: cy - hh },
            coord! { x: cx + hw, y: cy + hh },
            coord! { x: cx - hw, y: cy + hh },
        ]
    }

    #[test]
    fn circles() {
        let org1 = coord! { x: 0.0, y: 0.0 };
        let org2 = coord! { x: 3.0, y: 0.0 };
        assert!(collide_circle_circle(org1, 2.0, org2, 1.5));
        assert!(!collide_circle_circle(org1, 1.0, org2, 1.5));
        // touching circles do not count as colliding
        assert!(!collide_circle_circle(org1, 1.5, org2, 1.5));
    }

    #[test]
    fn circle_vs_box() {
        let poly = rect_poly(0.0, 0.0, 2.0, 1.0);

        assert!(collide_circle_poly(coord! { x: 2.5, y: 0.0 }, 1.0, &poly, 1e-6));
        assert!(!collide_circle_poly(coord! { x: 5.0, y: 0.0 }, 1.0, &poly, 1e-6));
        // circle fully inside the box
        assert!(collide_circle_poly(coord! { x: 0.0, y: 0.0 }, 0.2, &poly, 1e-6));
        // box fully inside the circle
        assert!(collide_circle_poly(coord! { x: 0.0, y: 0.0 }, 5.0, &poly, 1e-6));
    }

    #[test]
    fn box_vs_box() {
        let poly1 = rect_poly(0.0, 0.0, 2.0, 1.0);
        let poly2 = rect_poly(1.5, 0.5, 1.0, 1.0);
        let poly3 = rect_poly(10.0, 0.0, 1.0, 1.0);
        let inner = rect_poly(0.0, 0.0, 0.5, 0.5);

        assert!(collide_poly_poly(&poly1, &poly2, 1e-6));
        assert!(!collide_poly_poly(&poly1, &poly3, 1e-6));
        assert!(collide_poly_poly(&poly1, &inner, 1e-6));
        assert!(collide_poly_poly(&inner, &poly1, 1e-6));
    }

    #[test]
    fn bounding_rects() {
        let polys = vec![rect_poly(0.0, 0.0, 1.0, 1.0), rect_poly(4.0, 0.0, 1.0, 1.0)];
        let rect = polys_bounding_rect(&polys).unwrap();
        assert_eq!(rect.min(), coord! { x: -1.0, y: -1.0 });
        assert_eq!(rect.max(), coord! { x: 5.0, y: 1.0 });

        let circles = vec![(coord! { x: 0.0, y: 0.0 }, 1.0), (coord! { x: 3.0, y: 0.0 }, 0.5)];
        let crect = circles_bounding_rect(&circles).unwrap();
        assert_eq!(crect.min(), coord! { x: -1.0, y: -1.0 });
        assert_eq!(crect.max(), coord! { x: 3.5, y: 1.0 });

        assert!(rects_overlap(Some(rect), Some(crect)));
        assert!(!rects_overlap(Some(rect), None));
    }
}

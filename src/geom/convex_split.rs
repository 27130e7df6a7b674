//! Recursive splitting of a concave polygon into convex parts.

use geo_types::{Coord, CoordFloat, Line};

use super::intersect::intersect_lines;
use super::{line_angle, mod_pos_angle};

/// Split a concave polygon into convex sub-polygons.
///
/// The polygon is cut at its largest concave corner: the incoming edge of the
/// corner is extended into the interior and the polygon is split at the
/// nearest boundary intersection; the two parts are split recursively. An
/// already convex input (or a failed intersection search) yields an empty
/// vector, in which case the caller keeps the original polygon.
pub fn convex_split<T: CoordFloat>(poly: &[Coord<T>], eps: T) -> Vec<Vec<Coord<T>>> {
    let n = poly.len();
    if n <= 3 {
        return vec![];
    }

    let pi = T::from(std::f64::consts::PI).unwrap();

    // concave corners, sorted by interior angle, largest first
    let mut concave: Vec<(usize, T)> = vec![];
    for idx in 0..n {
        let vert1 = poly[idx];
        let vert2 = poly[(idx + 1) % n];
        let vert3 = poly[(idx + 2) % n];

        let angle = mod_pos_angle(pi - (line_angle(vert2, vert3) - line_angle(vert1, vert2)));
        if angle > pi + eps {
            concave.push((idx, angle));
        }
    }
    if concave.is_empty() {
        return vec![];
    }
    concave.sort_by(|c1, c2| c2.1.partial_cmp(&c1.1).unwrap_or(std::cmp::Ordering::Equal));

    // find the nearest boundary intersection of the extended concave edge
    let mut cut: Option<(usize, usize, Coord<T>)> = None;
    for &(idx_concave, _) in &concave {
        let vert1 = poly[idx_concave];
        let vert2 = poly[(idx_concave + 1) % n];
        let vert3 = poly[(idx_concave + 2) % n];
        let dir1 = vert2 - vert1;

        let mut best_dist = T::infinity();
        let mut best: Option<(usize, Coord<T>)> = None;

        // walk the boundary segments not adjacent to the concave corner
        for offset in 2..n {
            let seg_start_idx = (idx_concave + offset) % n;
            let seg_end_idx = (seg_start_idx + 1) % n;
            let seg = Line::new(poly[seg_start_idx], poly[seg_end_idx]);

            // intersect the infinite extension of the concave edge with the segment
            let extended = Line::new(vert1, vert1 + dir1);
            let Some(pt) = intersect_lines(&extended, &seg, false, eps) else {
                continue;
            };

            // the cut has to lie forward of the concave corner and on the segment
            let param1 = if dir1.x.abs() > dir1.y.abs() {
                (pt.x - vert1.x) / dir1.x
            } else if dir1.y != T::zero() {
                (pt.y - vert1.y) / dir1.y
            } else {
                continue;
            };
            if param1 < T::one() + eps {
                continue;
            }

            let seg_dir = seg.end - seg.start;
            let seg_len_sq = seg_dir.x * seg_dir.x + seg_dir.y * seg_dir.y;
            if seg_len_sq == T::zero() {
                continue;
            }
            let rel = pt - seg.start;
            let param2 = (rel.x * seg_dir.x + rel.y * seg_dir.y) / seg_len_sq;
            if param2 < -eps || param2 > T::one() + eps {
                continue;
            }

            // skip cuts through the corner vertices themselves
            let coincides = |vert: Coord<T>| {
                (pt.x - vert.x).abs() <= eps && (pt.y - vert.y).abs() <= eps
            };
            if coincides(vert1) || coincides(vert2) || coincides(vert3) {
                continue;
            }

            let diff = pt - vert2;
            let dist = diff.x * diff.x + diff.y * diff.y;
            if dist < best_dist {
                best_dist = dist;
                best = Some((seg_end_idx, pt));
            }
        }

        if let Some((seg_end_idx, pt)) = best {
            cut = Some((idx_concave, seg_end_idx, pt));
            break;
        }
    }

    let Some((idx_concave, idx_inters, inters)) = cut else {
        return vec![];
    };

    let coincides = |a: Coord<T>, b: Coord<T>| {
        (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
    };

    // split along [corner+1, intersection]; the cut point may coincide with
    // the boundary vertex it was found on, which must not produce a
    // zero-length edge
    let corner_idx = (idx_concave + 1) % n;
    let mut poly1 = vec![];
    if !coincides(inters, poly[idx_inters]) {
        poly1.push(inters);
    }
    let mut idx = idx_inters;
    loop {
        poly1.push(poly[idx]);
        if idx == corner_idx {
            break;
        }
        idx = (idx + 1) % n;
    }

    let mut poly2 = vec![];
    let mut idx = corner_idx;
    loop {
        poly2.push(poly[idx]);
        idx = (idx + 1) % n;
        if idx == idx_inters {
            break;
        }
    }
    if !coincides(inters, *poly2.last().unwrap()) {
        poly2.push(inters);
    }

    if poly1.len() < 3 || poly2.len() < 3 {
        // degenerate split, keep the original contour
        return vec![];
    }

    let mut split = vec![];
    for part in [poly1, poly2] {
        let sub = convex_split(&part, eps);
        if sub.is_empty() {
            split.push(part);
        } else {
            split.extend(sub);
        }
    }

    split
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::coord;

    fn shoelace_area(poly: &[Coord<f64>]) -> f64 {
        let mut area = 0.0;
        for idx1 in 0..poly.len() {
            let idx2 = (idx1 + 1) % poly.len();
            area += poly[idx1].x * poly[idx2].y - poly[idx2].x * poly[idx1].y;
        }
        area.abs() / 2.0
    }

    fn is_convex(poly: &[Coord<f64>]) -> bool {
        let n = poly.len();
        let mut sign = 0.0_f64;
        for idx in 0..n {
            let a = poly[idx];
            let b = poly[(idx + 1) % n];
            let c = poly[(idx + 2) % n];
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            if cross.abs() < 1e-9 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    #[test]
    fn convex_input_is_left_alone() {
        let square = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 4.0, y: 0.0 },
            coord! { x: 4.0, y: 4.0 },
            coord! { x: 0.0, y: 4.0 },
        ];
        assert!(convex_split(&square, 1e-6).is_empty());
    }

    #[test]
    fn cut_through_existing_vertex_adds_no_duplicate() {
        // the concave edge at (2, 2) extends exactly onto the boundary
        // vertex (0, 2)
        let poly = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 4.0, y: 0.0 },
            coord! { x: 4.0, y: 2.0 },
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 2.0, y: 4.0 },
            coord! { x: 0.0, y: 4.0 },
            coord! { x: 0.0, y: 2.0 },
        ];

        let parts = convex_split(&poly, 1e-6);
        assert!(parts.len() >= 2);

        let mut total = 0.0;
        for part in &parts {
            assert!(part.len() >= 3);
            assert!(is_convex(part), "non-convex part {:?}", part);
            total += shoelace_area(part);

            // no zero-length edges from a cut point coinciding with a vertex
            for idx in 0..part.len() {
                let a = part[idx];
                let b = part[(idx + 1) % part.len()];
                assert!(
                    (a.x - b.x).abs() > 1e-9 || (a.y - b.y).abs() > 1e-9,
                    "duplicate consecutive vertex {:?} in {:?}",
                    a,
                    part
                );
            }
        }
        assert_relative_eq!(total, shoelace_area(&poly), epsilon = 1e-9);
    }

    #[test]
    fn l_shape_splits_into_convex_parts() {
        // counter-clockwise L-shape with one concave corner at (2, 2)
        let l_shape = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 4.0, y: 0.0 },
            coord! { x: 4.0, y: 2.0 },
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 2.0, y: 4.0 },
            coord! { x: 0.0, y: 4.0 },
        ];

        let parts = convex_split(&l_shape, 1e-6);
        assert!(parts.len() >= 2);

        // every part is convex and the areas sum to the input area
        let mut total = 0.0;
        for part in &parts {
            assert!(part.len() >= 3);
            assert!(is_convex(part), "non-convex part {:?}", part);
            total += shoelace_area(part);
        }
        assert_relative_eq!(total, shoelace_area(&l_shape), epsilon = 1e-9);
    }
}

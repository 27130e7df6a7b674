//! Boundary tracing on the configuration-space image and contour
//! simplification.

use geo_types::{Coord, CoordFloat};

use super::{line_angle, mod_pos_angle};

// Moore neighbourhood in clockwise order (y grows downwards):
// E, SE, S, SW, W, NW, N, NE
const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Trace the boundary of every maximal 8-connected region of occupied
/// pixels, in row-major discovery order. Each region yields one ordered
/// pixel loop (Moore neighbour tracing).
pub fn trace_boundaries<F>(width: usize, height: usize, occupied: F) -> Vec<Vec<Coord<i32>>>
where
    F: Fn(i32, i32) -> bool,
{
    let w = width as i32;
    let h = height as i32;
    let in_bounds = |x: i32, y: i32| x >= 0 && x < w && y >= 0 && y < h;
    let occ = |x: i32, y: i32| in_bounds(x, y) && occupied(x, y);

    let mut labels = vec![0_u32; width * height];
    let mut contours = vec![];
    let mut next_label = 1_u32;

    for start_y in 0..h {
        for start_x in 0..w {
            if !occ(start_x, start_y) || labels[(start_y * w + start_x) as usize] != 0 {
                continue;
            }

            // flood-fill the region so it is only traced once
            let label = next_label;
            next_label += 1;
            let mut stack = vec![(start_x, start_y)];
            let mut region_size = 0_usize;
            while let Some((x, y)) = stack.pop() {
                let idx = (y * w + x) as usize;
                if labels[idx] != 0 {
                    continue;
                }
                labels[idx] = label;
                region_size += 1;
                for (dx, dy) in NEIGHBOURS {
                    let (nx, ny) = (x + dx, y + dy);
                    if occ(nx, ny) && labels[(ny * w + nx) as usize] == 0 {
                        stack.push((nx, ny));
                    }
                }
            }

            contours.push(trace_single(
                Coord {
                    x: start_x,
                    y: start_y,
                },
                region_size,
                &occ,
            ));
        }
    }

    contours
}

fn trace_single<F>(start: Coord<i32>, region_size: usize, occ: &F) -> Vec<Coord<i32>>
where
    F: Fn(i32, i32) -> bool,
{
    let mut contour = vec![start];

    // the scan discovered `start` coming from the west
    let mut search_start = 4_usize;
    let mut cur = start;
    let mut first_move: Option<Coord<i32>> = None;

    let max_steps = region_size * 8 + 8;
    for _ in 0..max_steps {
        let mut found = None;
        for step in 0..8 {
            let dir = (search_start + step) % 8;
            let (dx, dy) = NEIGHBOURS[dir];
            if occ(cur.x + dx, cur.y + dy) {
                found = Some((
                    Coord {
                        x: cur.x + dx,
                        y: cur.y + dy,
                    },
                    dir,
                ));
                break;
            }
        }

        let Some((next, dir)) = found else {
            // isolated pixel
            break;
        };

        match first_move {
            None => first_move = Some(next),
            Some(first) => {
                // back at the start about to repeat the first move
                if cur == start && next == first {
                    break;
                }
            }
        }

        contour.push(next);
        cur = next;
        search_start = (dir + 6) % 8;
    }

    // the closing vertex equals the start; drop it
    if contour.len() > 1 && *contour.last().unwrap() == start {
        contour.pop();
    }

    contour
}

/// Simplify a closed contour: drop interior vertices closer than `min_dist`
/// to the previously kept vertex (staircase artefacts), then vertices whose
/// bend angle is below `eps_angular`.
pub fn simplify_contour<T: CoordFloat>(
    contour: &mut Vec<Coord<i32>>,
    min_dist: T,
    eps_angular: T,
) {
    if contour.len() <= 4 {
        return;
    }

    let to_float = |vert: Coord<i32>| Coord {
        x: T::from(vert.x).unwrap(),
        y: T::from(vert.y).unwrap(),
    };

    // distance filter
    let min_dist_sq = min_dist * min_dist;
    let mut kept: Vec<Coord<i32>> = Vec::with_capacity(contour.len());
    kept.push(contour[0]);
    for &vert in &contour[1..] {
        let last = to_float(*kept.last().unwrap());
        let diff = to_float(vert) - last;
        if diff.x * diff.x + diff.y * diff.y >= min_dist_sq {
            kept.push(vert);
        }
    }

    // bend-angle filter over the circular vertex sequence
    let pi = T::from(std::f64::consts::PI).unwrap();
    let two_pi = T::from(std::f64::consts::TAU).unwrap();
    let mut idx = 0;
    let mut passes_since_removal = 0_usize;
    while kept.len() > 4 && passes_since_removal < kept.len() {
        let len = kept.len();
        let prev = to_float(kept[(idx + len - 1) % len]);
        let cur = to_float(kept[idx % len]);
        let next = to_float(kept[(idx + 1) % len]);

        let mut angle = line_angle(cur, next) - line_angle(prev, cur);
        angle = mod_pos_angle(angle);
        if angle > pi {
            angle = angle - two_pi;
        }

        if angle.abs() < eps_angular {
            kept.remove(idx % len);
            passes_since_removal = 0;
        } else {
            idx = (idx + 1) % kept.len();
            passes_since_removal += 1;
        }
    }

    *contour = kept;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_rectangle() {
        // 3x2 block of occupied pixels inside a 8x6 image
        let occupied = |x: i32, y: i32| (2..5).contains(&x) && (2..4).contains(&y);
        let contours = trace_boundaries(8, 6, occupied);

        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        for corner in [(2, 2), (4, 2), (4, 3), (2, 3)] {
            assert!(
                contour.contains(&Coord {
                    x: corner.0,
                    y: corner.1
                }),
                "missing corner {:?} in {:?}",
                corner,
                contour
            );
        }
        // only boundary pixels appear
        for vert in contour {
            assert!(occupied(vert.x, vert.y));
        }
    }

    #[test]
    fn two_regions() {
        let occupied = |x: i32, y: i32| {
            ((1..3).contains(&x) && (1..3).contains(&y))
                || ((6..8).contains(&x) && (4..6).contains(&y))
        };
        let contours = trace_boundaries(10, 8, occupied);
        assert_eq!(contours.len(), 2);
        // discovery order is row-major
        assert_eq!(contours[0][0], Coord { x: 1, y: 1 });
        assert_eq!(contours[1][0], Coord { x: 6, y: 4 });
    }

    #[test]
    fn isolated_pixel() {
        let occupied = |x: i32, y: i32| x == 3 && y == 3;
        let contours = trace_boundaries(6, 6, occupied);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0], vec![Coord { x: 3, y: 3 }]);
    }

    #[test]
    fn simplification_keeps_corners() {
        // a large axis-aligned rectangle boundary walked pixel by pixel
        let occupied = |x: i32, y: i32| (2..22).contains(&x) && (2..12).contains(&y);
        let mut contours = trace_boundaries(30, 20, occupied);
        let contour = &mut contours[0];
        let orig_len = contour.len();

        simplify_contour::<f64>(contour, 3.0, 1e-3);
        assert!(contour.len() < orig_len);
        assert!(contour.len() >= 4);

        // the extreme corners survive the filters
        let min_x = contour.iter().map(|v| v.x).min().unwrap();
        let max_x = contour.iter().map(|v| v.x).max().unwrap();
        assert_eq!(min_x, 2);
        assert_eq!(max_x, 21);
    }
}

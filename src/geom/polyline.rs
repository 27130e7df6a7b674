//! Utilities on polyline paths: length, subdivision, pruning and endpoint
//! trimming.

use geo_types::{Coord, CoordFloat};

use super::{norm, norm_sq};

/// Arc length of a polyline.
pub fn path_length<T: CoordFloat>(verts: &[Coord<T>]) -> T {
    let mut len = T::zero();
    for pair in verts.windows(2) {
        len = len + norm(pair[1] - pair[0]);
    }
    len
}

/// Subdivide the segments of a path so that no step is longer than `dist`.
pub fn subdivide_path<T: CoordFloat>(verts: &[Coord<T>], dist: T) -> Vec<Coord<T>> {
    let mut out = Vec::with_capacity(verts.len() * 2);

    for idx0 in 0..verts.len() {
        let vert0 = verts[idx0];
        out.push(vert0);
        if idx0 == verts.len() - 1 {
            break;
        }

        let vert1 = verts[idx0 + 1];
        let len = norm(vert1 - vert0);
        if len > dist {
            let div = (len / dist).ceil();
            let step = T::one() / div;
            let mut param = step;
            while param < T::one() {
                out.push(vert0 + (vert1 - vert0) * param);
                param = param + step;
            }
        }
    }

    out
}

/// Remove interior vertices closer than `dist` to the previously kept one.
/// The first and last vertices always survive.
pub fn remove_close_vertices<T: CoordFloat>(verts: &[Coord<T>], dist: T) -> Vec<Coord<T>> {
    if verts.len() <= 2 {
        return verts.to_vec();
    }

    let mut out = Vec::with_capacity(verts.len());
    out.push(verts[0]);
    let mut cur = verts[0];

    for &next in &verts[1..verts.len() - 1] {
        if norm(next - cur) >= dist {
            out.push(next);
            cur = next;
        }
    }

    out.push(*verts.last().unwrap());
    out
}

/// Trim detours near the path's endpoints: all vertices between an endpoint
/// and the path vertex closest to it are dropped.
pub fn simplify_path<T: CoordFloat>(verts: &[Coord<T>]) -> Vec<Coord<T>> {
    if verts.len() <= 2 {
        return verts.to_vec();
    }

    let mut out = verts.to_vec();

    // closest vertex to the start
    let start = out[0];
    let mut idx_start = 1;
    let mut dist_start = T::infinity();
    for (idx, &vert) in out.iter().enumerate().skip(1) {
        let dist = norm_sq(vert - start);
        if dist < dist_start {
            dist_start = dist;
            idx_start = idx;
        }
    }
    if idx_start > 1 {
        out.drain(1..idx_start);
    }

    // closest vertex to the end
    let end = *out.last().unwrap();
    let mut idx_end = out.len() - 1;
    let mut dist_end = T::infinity();
    for (idx, &vert) in out.iter().enumerate().take(out.len() - 1).skip(1) {
        let dist = norm_sq(vert - end);
        if dist < dist_end {
            dist_end = dist;
            idx_end = idx;
        }
    }
    if idx_end + 1 < out.len() - 1 {
        out.drain(idx_end + 1..out.len() - 1);
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::coord;

    #[test]
    fn length() {
        let verts = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 3.0, y: 0.0 },
            coord! { x: 3.0, y: 4.0 },
        ];
        assert_relative_eq!(path_length(&verts), 7.0);
    }

    #[test]
    fn subdivision_bound() {
        let verts = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 1.0, y: 2.5 },
        ];
        let subdiv = subdivide_path(&verts, 0.3);

        assert_eq!(subdiv[0], verts[0]);
        assert_eq!(*subdiv.last().unwrap(), *verts.last().unwrap());
        for pair in subdiv.windows(2) {
            assert!(path_length(pair) <= 0.3 + 1e-9);
        }
    }

    #[test]
    fn close_vertex_removal() {
        let verts = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.01, y: 0.0 },
            coord! { x: 1.0, y: 0.0 },
            coord! { x: 1.01, y: 0.0 },
            coord! { x: 2.0, y: 0.0 },
        ];
        let pruned = remove_close_vertices(&verts, 0.1);
        assert_eq!(
            pruned,
            vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 1.0, y: 0.0 },
                coord! { x: 2.0, y: 0.0 },
            ]
        );
    }

    #[test]
    fn endpoint_trimming() {
        // the second and third vertices detour away although the fourth is
        // right next to the start
        let verts = vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 5.0, y: 5.0 },
            coord! { x: 6.0, y: 5.0 },
            coord! { x: 0.1, y: 0.0 },
            coord! { x: 10.0, y: 0.0 },
        ];
        let trimmed = simplify_path(&verts);
        assert_eq!(
            trimmed,
            vec![
                coord! { x: 0.0, y: 0.0 },
                coord! { x: 0.1, y: 0.0 },
                coord! { x: 10.0, y: 0.0 },
            ]
        );
    }
}

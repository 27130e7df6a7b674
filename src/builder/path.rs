//! Path search on the finished roadmap: retraction onto the Voronoi mesh,
//! shortest path with a pluggable weight policy, closest-bisector
//! refinement of the entry and exit points, and conversion of the result
//! back to angular coordinates.

use std::f64::consts::PI;

use geo_types::{coord, Coord};
use log::debug;
use petgraph::graph::NodeIndex;

use super::{PathStrategy, PathsBuilder};
use crate::geom::polyline::{remove_close_vertices, simplify_path, subdivide_path};
use crate::geom::{norm, norm_sq, project_onto_segment};
use crate::graph::{reconstruct_path, remove_path_loops, shortest_path_predecessors};
use crate::image::PIXEL_FREE;
use crate::instrument::{AxisAngle, AXIS_ANA, AXIS_MONO, AXIS_SAMPLE};

/// A path over the roadmap, in pixel coordinates.
#[derive(Clone, Debug)]
pub struct InstrumentPath {
    /// Could a path be found?
    pub ok: bool,
    /// Direct line from `vec_i` to `vec_f`, bypassing the roadmap?
    pub is_direct: bool,
    /// Start pixel.
    pub vec_i: Coord<f64>,
    /// Target pixel.
    pub vec_f: Coord<f64>,
    /// Is the first (resp. last) bisector of the path linear?
    pub is_linear_i: bool,
    pub is_linear_f: bool,
    /// Ordered roadmap vertex indices.
    pub voronoi_indices: Vec<usize>,
    /// Entry parameter on the first bisector.
    pub param_i: f64,
    /// The path leaves the last bisector at parameter `1 - param_f`.
    pub param_f: f64,
}

impl Default for InstrumentPath {
    fn default() -> Self {
        Self {
            ok: false,
            is_direct: false,
            vec_i: coord! { x: 0., y: 0. },
            vec_f: coord! { x: 0., y: 0. },
            is_linear_i: true,
            is_linear_f: true,
            voronoi_indices: vec![],
            param_i: 0.,
            param_f: 1.,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum BisectorKind {
    Linear,
    Parabolic,
}

impl PathsBuilder<'_> {
    /// Length of an angular difference vector; with motor speeds enabled
    /// each axis is rescaled by its speed so length approximates drive time.
    pub(crate) fn path_length_weighted(&self, vec: Coord<f64>) -> f64 {
        if !self.use_motor_speeds {
            return norm(vec);
        }

        let (_, kf_fixed) = self.tascalc.kfix();
        let instr = self.instrspace.instrument();

        let a2_speed = if kf_fixed {
            instr.monochromator().speed(AxisAngle::Outgoing)
        } else {
            instr.analyser().speed(AxisAngle::Outgoing)
        };
        let a4_speed = instr.sample().speed(AxisAngle::Outgoing);

        norm(coord! { x: vec.x / a4_speed, y: vec.y / a2_speed })
    }

    /// Angular distance from a pixel position to the nearest wall.
    pub(crate) fn dist_to_nearest_wall(&self, vertex: Coord<f64>) -> f64 {
        let Some(nearest) = self.walls_rtree.nearest_neighbor(&[vertex.x, vertex.y]) else {
            return f64::MAX;
        };

        let angle = self.pixel_to_angle(vertex, false, false);
        let wall_angle =
            self.pixel_to_angle(coord! { x: nearest[0], y: nearest[1] }, false, false);
        self.path_length_weighted(wall_angle - angle)
    }

    /// Wall distances for each vertex of a path in angular coordinates.
    pub fn distances_to_nearest_wall(&self, path: &[Coord<f64>], deg: bool) -> Vec<f64> {
        path.iter()
            .map(|&pos| self.dist_to_nearest_wall(self.angle_to_pixel(pos, deg, false)))
            .collect()
    }

    /// Does an angular position sit on a non-free pixel?
    pub(crate) fn position_collides(&self, pos: Coord<f64>, deg: bool) -> bool {
        let pix = self.angle_to_pixel(pos, deg, false);
        let (x, y) = (pix.x as i64, pix.y as i64);

        if !self.img.in_bounds(x, y) {
            return true;
        }
        self.img.pixel(x as usize, y as usize) != PIXEL_FREE
    }

    /// Does the straight pixel line between two positions cross a non-free
    /// pixel (or, with `use_min_dist`, get closer to a wall than allowed)?
    pub(crate) fn direct_path_collides_pixel(
        &self,
        vert1: Coord<f64>,
        vert2: Coord<f64>,
        use_min_dist: bool,
    ) -> bool {
        let mut last = (i64::MIN, i64::MIN);

        let mut t = 0.;
        while t <= 1. {
            let x = (vert1.x + (vert2.x - vert1.x) * t) as i64;
            let y = (vert1.y + (vert2.y - vert1.y) * t) as i64;
            t += self.eps_angular;

            if (x, y) == last {
                continue;
            }

            if !self.img.in_bounds(x, y) {
                return true;
            }
            if self.img.pixel(x as usize, y as usize) != PIXEL_FREE {
                return true;
            }

            if use_min_dist {
                let dist = self.dist_to_nearest_wall(coord! { x: x as f64, y: y as f64 });
                if dist < self.min_angular_dist_to_walls {
                    return true;
                }
            }

            last = (x, y);
        }

        false
    }

    /// Angular-coordinate wrapper of [`Self::direct_path_collides_pixel`].
    pub(crate) fn direct_path_collides(
        &self,
        vert1: Coord<f64>,
        vert2: Coord<f64>,
        deg: bool,
        use_min_dist: bool,
    ) -> bool {
        let pix1 = self.angle_to_pixel(vert1, deg, false);
        let pix2 = self.angle_to_pixel(vert2, deg, false);
        self.direct_path_collides_pixel(pix1, pix2, use_min_dist)
    }

    /// Closest point to `vec` on the bisector between two roadmap vertices.
    ///
    /// Returns the bisector parameter (0 at `idx1`), the distance, the
    /// bisector kind and the point itself. On linear bisectors the point
    /// walks away from positions that undercut the minimum wall distance.
    pub(crate) fn find_closest_point_on_bisector(
        &self,
        idx1: usize,
        idx2: usize,
        vec: Coord<f64>,
    ) -> (f64, f64, Option<BisectorKind>, Coord<f64>) {
        let verts = self.voro.vertices();
        let vert1 = verts[idx1];
        let vert2 = verts[idx2];

        let mut lin: Option<(f64, f64, Coord<f64>)> = None;

        if self.voro.linear_edge(idx1, idx2).is_some() {
            let dir = vert2 - vert1;
            let dir_len = norm(dir);

            // the query point sits on the voronoi vertex itself
            if dir_len < self.eps_angular {
                return (0., 0., Some(BisectorKind::Linear), vec);
            }

            let (mut param, mut dist, mut pt) = project_onto_segment(vec, vert1, vert2);

            // walk along the bisector if the projection is too close to a wall
            let delta = 0.025;
            let wall_dist = self.dist_to_nearest_wall(pt);
            if wall_dist < self.min_angular_dist_to_walls {
                let probe = vert1 + dir * (param + delta);
                let increase = self.dist_to_nearest_wall(probe) > wall_dist;

                let mut best_dist_to_wall = wall_dist;
                let mut best_param = None;
                let mut new_param = param;

                loop {
                    new_param += if increase { delta } else { -delta };
                    if !(-1.0..=1.0).contains(&new_param) {
                        break;
                    }

                    let probe = vert1 + dir * new_param;
                    let dist_to_wall = self.dist_to_nearest_wall(probe);
                    if dist_to_wall > best_dist_to_wall {
                        best_dist_to_wall = dist_to_wall;
                        best_param = Some(new_param);
                        if dist_to_wall >= self.min_angular_dist_to_walls {
                            break;
                        }
                    }
                }

                if let Some(new_param) = best_param {
                    param = new_param.clamp(-1., 1.);
                    pt = vert1 + dir * param;
                    dist = norm(pt - vec);
                }
            }

            lin = Some((param, dist, pt));
        }

        let mut quadr: Option<(f64, f64, Coord<f64>)> = None;

        if let Some(arc) = self.voro.parabolic_edge(idx1, idx2) {
            // the polyline is stored unordered with respect to the vertices
            let inverted = !arc.is_empty() && norm(arc[0] - vert2) <= self.eps;

            let mut min_dist_sq = f64::MAX;
            let mut min_idx = None;
            let mut min_pt = coord! { x: 0., y: 0. };

            for (sample_idx, &sample) in arc.iter().enumerate() {
                let dist_sq = norm_sq(sample - vec);
                if dist_sq < min_dist_sq {
                    // reject samples that undercut the minimum wall distance
                    if self.dist_to_nearest_wall(sample) < self.min_angular_dist_to_walls {
                        continue;
                    }
                    min_dist_sq = dist_sq;
                    min_idx = Some(sample_idx);
                    min_pt = sample;
                }
            }

            if let Some(min_idx) = min_idx {
                let mut param = min_idx as f64 / (arc.len() - 1).max(1) as f64;
                if inverted {
                    param = 1. - param;
                }
                quadr = Some((param, min_dist_sq.sqrt(), min_pt));
            }
        }

        match (lin, quadr) {
            (Some((param, dist, pt)), None) => (param, dist, Some(BisectorKind::Linear), pt),
            (None, Some((param, dist, pt))) => (param, dist, Some(BisectorKind::Parabolic), pt),
            (None, None) => (-1., f64::MAX, None, coord! { x: 0., y: 0. }),
            (Some((lparam, ldist, lpt)), Some((qparam, qdist, qpt))) => {
                let lin_in_range = (0.0..=1.0).contains(&lparam);
                let quadr_in_range = (0.0..=1.0).contains(&qparam);

                // prefer in-range parameters, then the closer point
                if !quadr_in_range && lin_in_range {
                    (lparam, ldist, Some(BisectorKind::Linear), lpt)
                } else if !lin_in_range && quadr_in_range {
                    (qparam, qdist, Some(BisectorKind::Parabolic), qpt)
                } else if ldist < qdist {
                    (lparam, ldist, Some(BisectorKind::Linear), lpt)
                } else {
                    (qparam, qdist, Some(BisectorKind::Parabolic), qpt)
                }
            }
        }
    }

    /// Starting from the bisector `(vert_idx_end, vert_idx_before_end)`,
    /// search the neighbouring bisectors for the one closest to `vert`.
    ///
    /// Returns the parameter, the winning bisector, its kind and whether the
    /// straight retraction line to it still collides.
    pub(crate) fn find_closest_bisector(
        &self,
        vert_idx_end: usize,
        vert_idx_before_end: usize,
        vert: Coord<f64>,
    ) -> (f64, (usize, usize), Option<BisectorKind>, bool) {
        use std::collections::HashSet;

        let num_verts = self.voro.vertices().len();
        if vert_idx_end >= num_verts || vert_idx_before_end >= num_verts {
            return (0., (0, 0), None, true);
        }

        let ordered = |a: usize, b: usize| if a <= b { (a, b) } else { (b, a) };

        let mut min_bisector = (vert_idx_before_end, vert_idx_end);
        let (mut min_param, mut min_dist, mut kind, pt_on_segment) =
            self.find_closest_point_on_bisector(vert_idx_end, vert_idx_before_end, vert);
        let mut collides = self.direct_path_collides_pixel(vert, pt_on_segment, false);

        // first-order neighbour bisectors of both endpoint vertices
        let mut next_bisectors: Vec<(usize, usize)> = vec![];
        for neighbour in self.voro.neighbours(vert_idx_end) {
            if neighbour != vert_idx_end {
                next_bisectors.push((neighbour, vert_idx_end));
            }
        }
        for neighbour in self.voro.neighbours(vert_idx_before_end) {
            if neighbour != vert_idx_before_end {
                next_bisectors.push((vert_idx_before_end, neighbour));
            }
        }
        let num_first_order = next_bisectors.len();

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        seen.insert(ordered(vert_idx_end, vert_idx_before_end));

        let mut bisector_idx = 0;
        while bisector_idx < next_bisectors.len() {
            let bisector = next_bisectors[bisector_idx];
            bisector_idx += 1;

            if !seen.insert(ordered(bisector.0, bisector.1)) {
                continue;
            }

            // only first-order neighbours are considered, unless the current
            // candidate still collides
            if bisector_idx - 1 < num_first_order || collides {
                for neighbour in self.voro.neighbours(bisector.0) {
                    if neighbour != bisector.0 {
                        next_bisectors.push((bisector.0, neighbour));
                    }
                }
                for neighbour in self.voro.neighbours(bisector.1) {
                    if neighbour != bisector.1 {
                        next_bisectors.push((neighbour, bisector.1));
                    }
                }
            }

            let (n_param, n_dist, n_kind, n_pt) =
                self.find_closest_point_on_bisector(bisector.0, bisector.1, vert);
            let n_collides = self.direct_path_collides_pixel(vert, n_pt, false);

            if n_kind.is_some() && !n_collides {
                let old_in_range = (0.0..=1.0).contains(&min_param);
                let new_in_range = (0.0..=1.0).contains(&n_param);
                let closer = n_dist < min_dist;

                // move to the neighbour if it is closer, or if it brings the
                // parameter into range, or if the current candidate collides
                if (!old_in_range && !new_in_range && closer)
                    || (new_in_range && closer)
                    || collides
                {
                    min_dist = n_dist;
                    min_param = n_param;
                    min_bisector = bisector;
                    collides = n_collides;
                    kind = n_kind;
                }
            }
        }

        (min_param.clamp(0., 1.), min_bisector, kind, collides)
    }

    /// Find a path from `(a2_i, a4_i)` to `(a2_f, a4_f)` (radians).
    pub fn find_path(
        &self,
        a2_i: f64,
        a4_i: f64,
        a2_f: f64,
        a4_f: f64,
        strategy: PathStrategy,
    ) -> InstrumentPath {
        let mut path = InstrumentPath::default();

        // check that the start and target configurations are valid
        {
            let senses = *self.tascalc.scattering_senses();
            let (_, kf_fixed) = self.tascalc.kfix();
            let mono_idx = self.mono_sense_idx();

            let mut space = self.instrspace.clone();
            for (a2, a4) in [(a2_i, a4_i), (a2_f, a4_f)] {
                let a2 = a2 * senses[mono_idx];
                let a4 = a4 * senses[1];

                let instr = space.instrument_mut();
                let active = if kf_fixed { AXIS_MONO } else { AXIS_ANA };
                instr.set_axis_angle(active, AxisAngle::Outgoing, a2);
                instr.set_axis_angle(active, AxisAngle::Internal, 0.5 * a2);
                instr.set_axis_angle(AXIS_SAMPLE, AxisAngle::Outgoing, a4);

                if !space.check_angular_limits() || space.check_collision_2d() {
                    debug!("start or target configuration is invalid");
                    return path;
                }
            }
        }

        path.vec_i = self.angle_to_pixel(coord! { x: a4_i, y: a2_i }, false, false);
        path.vec_f = self.angle_to_pixel(coord! { x: a4_f, y: a2_f }, false, false);

        // direct shortcut within the search radius
        if self.directpath {
            let dist = self.path_length_weighted(
                self.pixel_to_angle(path.vec_f, false, false)
                    - self.pixel_to_angle(path.vec_i, false, false),
            );

            if dist <= self.directpath_search_radius
                && !self.direct_path_collides_pixel(path.vec_i, path.vec_f, true)
            {
                path.ok = true;
                path.is_direct = true;
                return path;
            }
        }

        let verts = self.voro.vertices();
        if verts.is_empty() {
            return path;
        }

        // retraction: nearest roadmap vertex reachable by a safe straight
        // line; first insist on the wall-distance margin, then settle for
        // any collision-free line
        let retract = |pix: Coord<f64>| -> Option<usize> {
            let closest = self
                .voro
                .closest_vertices(pix, self.num_closest_voronoi_vertices);

            for use_min_dist in [true, false] {
                for &idx in &closest {
                    if !self.direct_path_collides_pixel(pix, verts[idx], use_min_dist) {
                        return Some(idx);
                    }
                }
            }
            None
        };

        let Some(idx_i) = retract(path.vec_i) else {
            debug!("no retraction vertex near the start position");
            return path;
        };
        let Some(idx_f) = retract(path.vec_f) else {
            debug!("no retraction vertex near the target position");
            return path;
        };

        let graph = self.voro.graph();
        if idx_i >= graph.node_count() || idx_f >= graph.node_count() {
            return path;
        }

        // the weight policy wraps the stored bisector lengths
        let weight_fn = |u: NodeIndex, v: NodeIndex| -> Option<f64> {
            let weight = self.voro.edge_weight(u.index(), v.index())?;
            match strategy {
                PathStrategy::Shortest => Some(weight),
                PathStrategy::PenaliseWalls => {
                    let dist1 = self.dist_to_nearest_wall(verts[u.index()]);
                    let dist2 = self.dist_to_nearest_wall(verts[v.index()]);
                    Some(weight / dist1.min(dist2))
                }
            }
        };

        let find_shortest = |from: usize, to: usize| -> Option<Vec<usize>> {
            let preds = shortest_path_predecessors(graph, NodeIndex::new(from), weight_fn);
            reconstruct_path(&preds, NodeIndex::new(from), NodeIndex::new(to))
        };

        match find_shortest(idx_i, idx_f) {
            Some(indices) => {
                path.voronoi_indices = indices;
                path.ok = true;
            }
            None => {
                debug!("target retraction vertex is unreachable");
                return path;
            }
        }

        // project the endpoints onto the closest bisector near each end
        if path.voronoi_indices.len() >= 2 {
            // start
            let vert_idx1 = path.voronoi_indices[0];
            let vert_idx2 = path.voronoi_indices[1];

            let (min_param, bisector, kind, collides) =
                self.find_closest_bisector(vert_idx1, vert_idx2, path.vec_i);
            if collides {
                path.ok = false;
                return path;
            }

            if bisector.1 == vert_idx1 && bisector.0 != vert_idx2 {
                // an adjacent bisector sharing the first vertex is closer
                path.voronoi_indices.insert(0, bisector.0);
            } else if bisector.1 != vert_idx1 && bisector.0 != vert_idx2 {
                // a different bisector won; stitch a new sub-path to it
                if let Some(seg) = find_shortest(vert_idx2, bisector.1) {
                    path.voronoi_indices.drain(0..2);
                    for &idx in &seg {
                        path.voronoi_indices.insert(0, idx);
                    }
                    path.voronoi_indices.insert(0, bisector.0);
                    remove_path_loops(&mut path.voronoi_indices);
                }
            }

            path.param_i = min_param;
            path.is_linear_i = kind == Some(BisectorKind::Linear);

            // target
            let len = path.voronoi_indices.len();
            if len < 2 {
                return path;
            }
            let vert_idx1 = path.voronoi_indices[len - 1];
            let vert_idx2 = path.voronoi_indices[len - 2];

            let (min_param, bisector, kind, collides) =
                self.find_closest_bisector(vert_idx1, vert_idx2, path.vec_f);
            if collides {
                path.ok = false;
                return path;
            }

            if bisector.1 == vert_idx1 && bisector.0 != vert_idx2 {
                path.voronoi_indices.push(bisector.0);
            } else if bisector.1 != vert_idx1 && bisector.0 != vert_idx2 {
                if let Some(seg) = find_shortest(vert_idx2, bisector.1) {
                    path.voronoi_indices.truncate(path.voronoi_indices.len() - 2);
                    path.voronoi_indices.extend(seg);
                    path.voronoi_indices.push(bisector.0);
                    remove_path_loops(&mut path.voronoi_indices);
                }
            }

            path.param_f = 1. - min_param;
            path.is_linear_f = kind == Some(BisectorKind::Linear);
        }

        path
    }

    /// Decode a path into angular coordinates (radians, or degrees with
    /// `deg`), optionally subdividing long linear segments.
    pub fn path_vertices(
        &self,
        path: &InstrumentPath,
        subdivide_lines: bool,
        deg: bool,
    ) -> Vec<Coord<f64>> {
        let mut path_vertices: Vec<Coord<f64>> = vec![];

        if !path.ok {
            return path_vertices;
        }

        if path.is_direct {
            path_vertices.push(self.pixel_to_angle(path.vec_i, deg, false));
            path_vertices.push(self.pixel_to_angle(path.vec_f, deg, false));

            if subdivide_lines {
                path_vertices = subdivide_path(&path_vertices, self.subdiv_len);
            }
            return path_vertices;
        }

        let verts = self.voro.vertices();
        let (_, kf_fixed) = self.tascalc.kfix();
        let mut space = self.instrspace.clone();

        // convert a pixel to angles and append it, dropping vertices that
        // fail the full instrument check
        let mut add_vertex = |vertex: Coord<f64>, out: &mut Vec<Coord<f64>>| {
            let angle = self.pixel_to_angle(vertex, deg, false);

            if self.verify_path {
                let machine = self.pixel_to_angle(vertex, false, true);
                let (a4, a2) = (machine.x, machine.y);

                let instr = space.instrument_mut();
                let active = if kf_fixed { AXIS_MONO } else { AXIS_ANA };
                instr.set_axis_angle(active, AxisAngle::Outgoing, a2);
                instr.set_axis_angle(active, AxisAngle::Internal, 0.5 * a2);
                instr.set_axis_angle(AXIS_SAMPLE, AxisAngle::Outgoing, a4);

                if !space.check_angular_limits() || space.check_collision_2d() {
                    return;
                }
            }

            out.push(angle);
        };

        add_vertex(path.vec_i, &mut path_vertices);

        for idx in 1..path.voronoi_indices.len() {
            let voro_idx = path.voronoi_indices[idx];
            let prev_voro_idx = path.voronoi_indices[idx - 1];
            let voro_vertex = verts[voro_idx];

            let has_lin = self.voro.linear_edge(prev_voro_idx, voro_idx).is_some();
            let arc = self.voro.parabolic_edge(prev_voro_idx, voro_idx);

            let is_linear_bisector = if idx == 1 && path.voronoi_indices.len() > 1 {
                path.is_linear_i
            } else if idx == path.voronoi_indices.len() - 1 && idx > 1 {
                path.is_linear_f
            } else {
                has_lin && arc.is_none()
            };

            if !is_linear_bisector && arc.is_some() {
                let arc = arc.unwrap();
                if arc.is_empty() {
                    continue;
                }

                // the stored polyline is unordered; reverse iteration when
                // its first sample sits at the later vertex
                let inverted_order = norm(arc[0] - voro_vertex) <= self.eps;

                let mut begin_idx = 0_usize;
                let mut end_idx = 0_usize;

                if idx == 1 {
                    // clip the entry at the stored parameter
                    begin_idx = ((path.param_i * (arc.len() - 1) as f64) as usize)
                        .min(arc.len() - 1);
                } else if idx == path.voronoi_indices.len() - 1 {
                    // clip the exit at the stored parameter
                    end_idx = (((1. - path.param_f) * (arc.len() - 1) as f64) as usize)
                        .min(arc.len() - 1);
                }

                if inverted_order {
                    for sample in arc.iter().rev().skip(begin_idx).take(
                        arc.len() - begin_idx - end_idx,
                    ) {
                        add_vertex(*sample, &mut path_vertices);
                    }
                } else {
                    for sample in arc.iter().skip(begin_idx).take(
                        arc.len() - begin_idx - end_idx,
                    ) {
                        add_vertex(*sample, &mut path_vertices);
                    }
                }
            } else if is_linear_bisector {
                if idx == 1 && path.voronoi_indices.len() > 1 {
                    let vert1 = verts[path.voronoi_indices[0]];
                    add_vertex(vert1 + (voro_vertex - vert1) * path.param_i, &mut path_vertices);
                } else if idx == path.voronoi_indices.len() - 1 && idx > 1 {
                    let vert1 = verts[prev_voro_idx];
                    add_vertex(vert1 + (voro_vertex - vert1) * path.param_f, &mut path_vertices);
                } else {
                    add_vertex(voro_vertex, &mut path_vertices);
                }
            }
        }

        add_vertex(path.vec_f, &mut path_vertices);
        path_vertices = simplify_path(&path_vertices);

        // shortcut loops near the retraction points
        if self.directpath {
            self.remove_angular_loops(&mut path_vertices, deg, false);
            self.remove_angular_loops(&mut path_vertices, deg, true);
        }

        if subdivide_lines {
            path_vertices = subdivide_path(&path_vertices, self.subdiv_len);
            path_vertices = remove_close_vertices(&path_vertices, self.subdiv_len);
        }

        // final verification of the discretized path
        if self.verify_path {
            for pos in &path_vertices {
                if self.position_collides(*pos, deg) {
                    return vec![];
                }
            }
        }

        path_vertices
    }

    /// Collapse a loop near one of the path's endpoints: a local minimum of
    /// the distance to the endpoint within the direct-path search radius is
    /// shortcut when the straight connection is collision-free.
    fn remove_angular_loops(&self, verts: &mut Vec<Coord<f64>>, deg: bool, reverse: bool) {
        let n = verts.len();
        if n <= 2 {
            return;
        }

        let to_rad = if deg { PI / 180. } else { 1. };
        let weighted = |diff: Coord<f64>| {
            self.path_length_weighted(coord! { x: diff.x * to_rad, y: diff.y * to_rad })
        };

        let first = if reverse { n - 1 } else { 0 };
        let order: Vec<usize> = if reverse {
            (0..n - 1).rev().collect()
        } else {
            (1..n).collect()
        };

        let dists: Vec<f64> = order
            .iter()
            .map(|&idx| weighted(verts[idx] - verts[first]))
            .collect();

        // smallest local minimum of the distance profile inside the radius
        let mut min_dist = dists[0];
        let mut min_pos: Option<usize> = None;
        for pos in 1..dists.len().saturating_sub(1) {
            if dists[pos] <= dists[pos - 1]
                && dists[pos] <= dists[pos + 1]
                && dists[pos] <= self.directpath_search_radius
                && dists[pos] < min_dist
            {
                min_dist = dists[pos];
                min_pos = Some(pos);
            }
        }

        let Some(min_pos) = min_pos else {
            return;
        };
        let min_idx = order[min_pos];

        if !self.direct_path_collides(verts[first], verts[min_idx], deg, true) {
            let (range_start, range_end) = if reverse {
                (min_idx, first)
            } else {
                (first, min_idx)
            };

            if range_start + 1 < range_end {
                verts.drain(range_start + 1..range_end);
            }
        }
    }

    /// Decoded path as `(a4, a2)` pairs, for scripting front ends.
    pub fn path_vertices_as_pairs(
        &self,
        path: &InstrumentPath,
        subdivide_lines: bool,
        deg: bool,
    ) -> Vec<(f64, f64)> {
        self.path_vertices(path, subdivide_lines, deg)
            .into_iter()
            .map(|vert| (vert.x, vert.y))
            .collect()
    }
}

//! Line-segment Voronoi roadmap.
//!
//! The diagram of the wall line segments is computed with the sweepline
//! builder from the `boostvoronoi` crate on integer coordinates. Bisectors
//! internal to a single obstacle group are physically meaningless and get
//! dropped, as are bisectors whose endpoints lie inside an obstacle region
//! or too close to a wall. What survives becomes an undirected weighted
//! graph plus an R*-tree over the Voronoi vertices.

use std::collections::{HashMap, HashSet};

use boostvoronoi::prelude::*;
use geo_types::{coord, Coord, Line};
use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::error::PathsError;
use crate::geom::polyline::path_length;
use crate::geom::{norm, norm_sq};

/// Unordered pair of Voronoi vertex indices; `None` encodes the open end of
/// an infinite edge.
pub type VertexPair = (Option<usize>, Option<usize>);

/// Normalise an index pair so lookups are order-independent.
pub fn vertex_pair(idx1: Option<usize>, idx2: Option<usize>) -> VertexPair {
    match (idx1, idx2) {
        (Some(a), Some(b)) if b < a => (Some(b), Some(a)),
        (None, b @ Some(_)) => (b, None),
        other => other,
    }
}

fn ordered(idx1: usize, idx2: usize) -> (usize, usize) {
    if idx1 <= idx2 {
        (idx1, idx2)
    } else {
        (idx2, idx1)
    }
}

/// Backend used for the Voronoi diagram calculation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VoronoiBackend {
    /// The built-in sweepline backend (Boost.Polygon port).
    BoostPolygon,
    /// Segment-Delaunay-graph backend; not built in.
    SegmentDelaunay,
}

/// Options describing the obstacle regions during roadmap construction.
#[derive(Default)]
pub struct VoronoiRegions<'a> {
    group_lines: bool,
    remove_vertices_in_regions: bool,
    line_groups: &'a [(usize, usize)],
    points_outside_regions: &'a [Coord<f64>],
    inverted_regions: &'a [bool],
    region_fn: Option<&'a (dyn Fn(Coord<f64>) -> bool + Sync)>,
    validate_fn: Option<&'a (dyn Fn(Coord<f64>) -> bool + Sync)>,
}

impl<'a> VoronoiRegions<'a> {
    pub fn new() -> Self {
        Self {
            group_lines: true,
            remove_vertices_in_regions: true,
            ..Default::default()
        }
    }

    pub fn set_group_lines(&mut self, group: bool) {
        self.group_lines = group;
    }

    pub fn set_remove_vertices_in_regions(&mut self, remove: bool) {
        self.remove_vertices_in_regions = remove;
    }

    pub fn set_line_groups(&mut self, groups: &'a [(usize, usize)]) {
        self.line_groups = groups;
    }

    pub fn set_points_outside_regions(&mut self, points: &'a [Coord<f64>]) {
        self.points_outside_regions = points;
    }

    pub fn set_inverted_regions(&mut self, inverted: &'a [bool]) {
        self.inverted_regions = inverted;
    }

    /// Callback deciding whether a vertex lies inside a forbidden region.
    pub fn set_region_fn(&mut self, f: Option<&'a (dyn Fn(Coord<f64>) -> bool + Sync)>) {
        self.region_fn = f;
    }

    /// Callback validating that a vertex keeps enough distance to the walls.
    pub fn set_validate_fn(&mut self, f: Option<&'a (dyn Fn(Coord<f64>) -> bool + Sync)>) {
        self.validate_fn = f;
    }

    pub fn line_groups(&self) -> &[(usize, usize)] {
        self.line_groups
    }

    pub fn group_lines(&self) -> bool {
        self.group_lines
    }

    fn group_of_segment(&self, seg_idx: usize) -> Option<usize> {
        self.line_groups
            .iter()
            .position(|&(begin, end)| seg_idx >= begin && seg_idx < end)
    }

    fn validate_vertex(&self, vert: Coord<f64>) -> bool {
        self.validate_fn.map_or(true, |f| f(vert))
    }

    /// Is either edge endpoint inside an obstacle region?
    fn vertex_in_region(
        &self,
        lines: &[Line<f64>],
        vertices: &[Coord<f64>],
        vert0: Option<usize>,
        vert1: Option<usize>,
        eps: f64,
    ) -> bool {
        use crate::geom::contains::pt_inside_poly_lines;

        if !self.remove_vertices_in_regions {
            return false;
        }

        if let Some(region_fn) = self.region_fn {
            return vert0.is_some_and(|idx| region_fn(vertices[idx]))
                || vert1.is_some_and(|idx| region_fn(vertices[idx]));
        }

        // polygon-based fallback honouring inverted regions
        let mut inside_normal = [false; 2];
        let mut outside_all_inverted = [true; 2];
        let mut has_inverted = false;

        for (grp_idx, &(begin, end)) in self.line_groups.iter().enumerate() {
            let pt_outside = self.points_outside_regions.get(grp_idx).copied();
            let inverted = self.inverted_regions.get(grp_idx).copied().unwrap_or(false);
            if inverted {
                has_inverted = true;
            }

            for (slot, vert) in [vert0, vert1].into_iter().enumerate() {
                let Some(idx) = vert else { continue };
                let inside =
                    pt_inside_poly_lines(lines, vertices[idx], begin, end, pt_outside, eps);
                if inverted {
                    if inside {
                        outside_all_inverted[slot] = false;
                    }
                } else if inside {
                    inside_normal[slot] = true;
                }
            }

            if inside_normal.iter().any(|&b| b) {
                return true;
            }
        }

        has_inverted && (outside_all_inverted[0] || outside_all_inverted[1])
    }
}

/// Result of the roadmap construction.
#[derive(Clone, Debug, Default)]
pub struct VoronoiResults {
    vertices: Vec<Coord<f64>>,
    linear_edges: HashMap<VertexPair, Line<f64>>,
    parabolic_edges: HashMap<(usize, usize), Vec<Coord<f64>>>,
    graph: UnGraph<(), f64>,
    rtree: RTree<GeomWithData<[f64; 2], usize>>,
}

impl VoronoiResults {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    pub fn linear_edges(&self) -> &HashMap<VertexPair, Line<f64>> {
        &self.linear_edges
    }

    pub fn parabolic_edges(&self) -> &HashMap<(usize, usize), Vec<Coord<f64>>> {
        &self.parabolic_edges
    }

    /// Linear bisector between two finite vertices, if one is stored.
    pub fn linear_edge(&self, idx1: usize, idx2: usize) -> Option<&Line<f64>> {
        self.linear_edges.get(&vertex_pair(Some(idx1), Some(idx2)))
    }

    /// Parabolic bisector polyline between two vertices, if one is stored.
    pub fn parabolic_edge(&self, idx1: usize, idx2: usize) -> Option<&Vec<Coord<f64>>> {
        self.parabolic_edges.get(&ordered(idx1, idx2))
    }

    pub fn graph(&self) -> &UnGraph<(), f64> {
        &self.graph
    }

    pub fn index_tree_size(&self) -> usize {
        self.rtree.size()
    }

    /// Indices of the `n` Voronoi vertices closest to `pt`, nearest first.
    pub fn closest_vertices(&self, pt: Coord<f64>, n: usize) -> Vec<usize> {
        self.rtree
            .nearest_neighbor_iter(&[pt.x, pt.y])
            .take(n)
            .map(|entry| entry.data)
            .collect()
    }

    /// Neighbours of a vertex in the roadmap graph.
    pub fn neighbours(&self, idx: usize) -> Vec<usize> {
        self.graph
            .neighbors(NodeIndex::new(idx))
            .map(|n| n.index())
            .collect()
    }

    /// Stored weight of the bisector between two adjacent vertices.
    pub fn edge_weight(&self, idx1: usize, idx2: usize) -> Option<f64> {
        let edge = self
            .graph
            .find_edge(NodeIndex::new(idx1), NodeIndex::new(idx2))?;
        self.graph.edge_weight(edge).copied()
    }
}

struct CandidateEdges {
    graph_pairs: Vec<(usize, usize, f64)>,
    linear: Vec<(Option<usize>, Option<usize>, Line<f64>)>,
    parabolic: Vec<(usize, usize, Vec<Coord<f64>>)>,
}

/// Compute the Voronoi roadmap of the given line segments.
///
/// `eps` is the region-test epsilon, `para_edge_eps` the maximum chord error
/// of the parabolic-arc discretization (both in pixel units).
pub fn calc_voronoi(
    lines: &[Line<f64>],
    eps: f64,
    para_edge_eps: f64,
    regions: Option<&VoronoiRegions>,
    backend: VoronoiBackend,
) -> Result<VoronoiResults, PathsError> {
    match backend {
        VoronoiBackend::BoostPolygon => calc_voronoi_boost(lines, eps, para_edge_eps, regions),
        VoronoiBackend::SegmentDelaunay => Err(PathsError::BackendUnavailable),
    }
}

fn calc_voronoi_boost(
    lines: &[Line<f64>],
    eps: f64,
    para_edge_eps: f64,
    regions: Option<&VoronoiRegions>,
) -> Result<VoronoiResults, PathsError> {
    // integer scale for the sweepline builder
    let scale = (i32::MAX as f64).sqrt().floor();

    // length of the finite stand-ins for infinite edges
    let mut infline_len = 1.0_f64;
    for line in lines {
        infline_len = infline_len.max(norm(line.end - line.start));
    }
    infline_len *= 10.;

    let segments: Vec<boostvoronoi::Line<i64>> = lines
        .iter()
        .map(|line| {
            boostvoronoi::Line::new(
                boostvoronoi::Point {
                    x: (line.start.x * scale) as i64,
                    y: (line.start.y * scale) as i64,
                },
                boostvoronoi::Point {
                    x: (line.end.x * scale) as i64,
                    y: (line.end.y * scale) as i64,
                },
            )
        })
        .collect();

    let diagram = Builder::<i64, f64>::default()
        .with_segments(segments.iter())
        .map_err(|err| PathsError::Failed(err.to_string()))?
        .build()
        .map_err(|err| PathsError::Failed(err.to_string()))?;

    // voronoi vertices, scaled back to pixel coordinates
    let vertices: Vec<Coord<f64>> = diagram
        .vertices()
        .iter()
        .map(|vert| {
            let vert = vert.get();
            coord! { x: vert.x() / scale, y: vert.y() / scale }
        })
        .collect();

    let get_edge = |edge_id: usize| diagram.edges()[edge_id].get();
    let get_cell_of_edge = |edge_id: usize| -> Option<usize> {
        get_edge(edge_id).cell().ok().map(|cell_id| cell_id.0)
    };
    let get_twin = |edge_id: usize| -> Option<usize> {
        get_edge(edge_id).twin().ok().map(|t| t.0)
    };

    // index of the line segment generating the cell of this (or the twin) edge
    let segment_idx = |edge_id: usize, twin: bool| -> Option<usize> {
        let edge_id = if twin { get_twin(edge_id)? } else { edge_id };
        let cell_id = get_cell_of_edge(edge_id)?;
        Some(diagram.cells()[cell_id].get().source_index())
    };

    // the source point of the cell of this (or the twin) edge; None if the
    // cell is generated by the segment's interior
    let segment_point = |edge_id: usize, twin: bool| -> Option<Coord<f64>> {
        let seg_idx = segment_idx(edge_id, twin)?;
        let edge_id = if twin { get_twin(edge_id)? } else { edge_id };
        let cell_id = get_cell_of_edge(edge_id)?;
        let cell = diagram.cells()[cell_id].get();
        let line = &lines[seg_idx];

        match cell.source_category() {
            boostvoronoi::SourceCategory::SegmentStart => Some(line.start),
            boostvoronoi::SourceCategory::SegmentEnd => Some(line.end),
            _ => None,
        }
    };

    let mut candidates = CandidateEdges {
        graph_pairs: vec![],
        linear: vec![],
        parabolic: vec![],
    };

    // bisectors already handled (each edge appears twice, once per twin)
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    for edge_id in 0..diagram.edges().len() {
        let edge = get_edge(edge_id);

        // only bisectors, no internal edges
        if edge.is_secondary() {
            continue;
        }

        let vert0_idx = edge.vertex0().map(|v| v.0);
        let vert1_idx = get_twin(edge_id)
            .and_then(|twin_id| get_edge(twin_id).vertex0())
            .map(|v| v.0);

        let valid_vertices = vert0_idx.is_some() && vert1_idx.is_some();

        if let (Some(idx0), Some(idx1)) = (vert0_idx, vert1_idx) {
            if idx0 == idx1 {
                continue;
            }
            if !seen.insert(ordered(idx0, idx1)) {
                continue;
            }
        }

        if let Some(regions) = regions {
            // drop the edge if both endpoints fail the validation function
            let vert0_invalid =
                vert0_idx.is_some_and(|idx| !regions.validate_vertex(vertices[idx]));
            let vert1_invalid =
                vert1_idx.is_some_and(|idx| !regions.validate_vertex(vertices[idx]));
            if vert0_invalid && vert1_invalid {
                continue;
            }

            if !regions.line_groups().is_empty() {
                // bisectors between segments of the same obstacle are
                // physically meaningless
                if regions.group_lines() {
                    let group1 = segment_idx(edge_id, false).and_then(|s| regions.group_of_segment(s));
                    let group2 = segment_idx(edge_id, true).and_then(|s| regions.group_of_segment(s));
                    if let (Some(g1), Some(g2)) = (group1, group2) {
                        if g1 == g2 {
                            continue;
                        }
                    }
                }

                if regions.vertex_in_region(lines, &vertices, vert0_idx, vert1_idx, eps) {
                    continue;
                }
            }
        }

        if edge.is_curved() && valid_vertices {
            // parabolic bisector between a point site and a line site
            let edge_cell_id = get_cell_of_edge(edge_id);
            let Some(edge_cell_id) = edge_cell_id else {
                continue;
            };
            let cell_has_point = diagram.cells()[edge_cell_id].get().contains_point();

            let seg_idx = segment_idx(edge_id, !cell_has_point);
            let point = segment_point(edge_id, cell_has_point);
            let (Some(seg_idx), Some(point)) = (seg_idx, point) else {
                continue;
            };

            let (idx0, idx1) = (vert0_idx.unwrap(), vert1_idx.unwrap());
            let arc = discretize_parabola(
                point,
                &lines[seg_idx],
                vertices[idx0],
                vertices[idx1],
                para_edge_eps,
            );

            if !arc.is_empty() {
                let len = path_length(&arc);
                candidates.graph_pairs.push((idx0, idx1, len));
                candidates.parabolic.push((idx0, idx1, arc));
            }
        } else if valid_vertices {
            // finite linear bisector
            let (idx0, idx1) = (vert0_idx.unwrap(), vert1_idx.unwrap());
            let len = norm(vertices[idx1] - vertices[idx0]);
            candidates.graph_pairs.push((idx0, idx1, len));
            candidates
                .linear
                .push((vert0_idx, vert1_idx, Line::new(vertices[idx0], vertices[idx1])));
        } else if vert0_idx.is_some() || vert1_idx.is_some() {
            // infinite edge: build a finite stand-in along the bisector
            let (org_idx, inverted) = match (vert0_idx, vert1_idx) {
                (Some(idx), _) => (idx, false),
                (_, Some(idx)) => (idx, true),
                _ => continue,
            };

            let (Some(pt), Some(twin_pt)) =
                (segment_point(edge_id, false), segment_point(edge_id, true))
            else {
                continue;
            };

            let mut perp = pt - twin_pt;
            if inverted {
                perp = coord! { x: -perp.x, y: -perp.y };
            }
            let mut dir = coord! { x: perp.y, y: -perp.x };
            let len = norm(dir);
            if len == 0. {
                continue;
            }
            dir = dir / len * infline_len;

            let org = vertices[org_idx];
            candidates
                .linear
                .push((vert0_idx, vert1_idx, Line::new(org, org + dir)));
        }
    }

    // drop vertices that ended up without any graph edge, shifting the
    // higher indices down
    let compact = regions.is_some_and(|r| !r.line_groups().is_empty());
    let remap: Vec<Option<usize>> = if compact {
        let mut connected = vec![false; vertices.len()];
        for &(idx0, idx1, _) in &candidates.graph_pairs {
            connected[idx0] = true;
            connected[idx1] = true;
        }
        let mut next = 0_usize;
        connected
            .iter()
            .map(|&keep| {
                if keep {
                    let idx = next;
                    next += 1;
                    Some(idx)
                } else {
                    None
                }
            })
            .collect()
    } else {
        (0..vertices.len()).map(Some).collect()
    };

    let mut results = VoronoiResults::default();

    for (old_idx, vert) in vertices.iter().enumerate() {
        if remap[old_idx].is_some() {
            results.vertices.push(*vert);
        }
    }

    let num_vertices = results.vertices.len();
    for _ in 0..num_vertices {
        results.graph.add_node(());
    }

    for (idx0, idx1, weight) in candidates.graph_pairs {
        let (Some(new0), Some(new1)) = (remap[idx0], remap[idx1]) else {
            continue;
        };
        results
            .graph
            .add_edge(NodeIndex::new(new0), NodeIndex::new(new1), weight);
    }

    for (idx0, idx1, line) in candidates.linear {
        let new0 = match idx0 {
            Some(old) => match remap[old] {
                Some(new) => Some(new),
                None => continue,
            },
            None => None,
        };
        let new1 = match idx1 {
            Some(old) => match remap[old] {
                Some(new) => Some(new),
                None => continue,
            },
            None => None,
        };
        results.linear_edges.insert(vertex_pair(new0, new1), line);
    }

    for (idx0, idx1, arc) in candidates.parabolic {
        let (Some(new0), Some(new1)) = (remap[idx0], remap[idx1]) else {
            continue;
        };
        results.parabolic_edges.insert(ordered(new0, new1), arc);
    }

    let tree_entries: Vec<GeomWithData<[f64; 2], usize>> = results
        .vertices
        .iter()
        .enumerate()
        .map(|(idx, vert)| GeomWithData::new([vert.x, vert.y], idx))
        .collect();
    results.rtree = RTree::bulk_load(tree_entries);

    debug!(
        "voronoi roadmap: {} vertices, {} linear and {} parabolic bisectors",
        results.vertices.len(),
        results.linear_edges.len(),
        results.parabolic_edges.len()
    );

    Ok(results)
}

/// Sample the parabola equidistant from `point` and the line carrying
/// `segment` between the two edge endpoints, with a maximum chord error of
/// `max_dist`.
fn discretize_parabola(
    point: Coord<f64>,
    segment: &Line<f64>,
    edge_start: Coord<f64>,
    edge_end: Coord<f64>,
    max_dist: f64,
) -> Vec<Coord<f64>> {
    let seg_dir = segment.end - segment.start;
    let seg_len = norm(seg_dir);
    if seg_len == 0. {
        return vec![edge_start, edge_end];
    }

    // orthonormal frame with the segment along the x axis
    let u = seg_dir / seg_len;
    let v = coord! { x: -u.y, y: u.x };
    let to_frame = |pt: Coord<f64>| {
        let rel = pt - segment.start;
        coord! { x: rel.x * u.x + rel.y * u.y, y: rel.x * v.x + rel.y * v.y }
    };
    let from_frame = |pt: Coord<f64>| segment.start + u * pt.x + v * pt.y;

    let focus = to_frame(point);
    if focus.y.abs() < 1e-12 {
        // the point site lies on the line; the bisector degenerates
        return vec![edge_start, edge_end];
    }

    let parabola_y = |x: f64| ((x - focus.x) * (x - focus.x) + focus.y * focus.y) / (2. * focus.y);

    let start = to_frame(edge_start);
    let end = to_frame(edge_end);

    let mut out = vec![edge_start];
    let mut stack = vec![(start.x, end.x)];
    // distance from the chord midpoint to the parabola decides subdivision
    while let Some((xa, xb)) = stack.pop() {
        let xm = 0.5 * (xa + xb);
        let pa = coord! { x: xa, y: parabola_y(xa) };
        let pb = coord! { x: xb, y: parabola_y(xb) };
        let pm = coord! { x: xm, y: parabola_y(xm) };
        let chord_mid = (pa + pb) / 2.;

        if norm_sq(pm - chord_mid) > max_dist * max_dist && (xb - xa).abs() > 1e-9 {
            stack.push((xm, xb));
            stack.push((xa, xm));
        } else {
            out.push(from_frame(pb));
        }
    }

    // exact endpoint instead of the last sampled value
    *out.last_mut().unwrap() = edge_end;
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn square_lines(cx: f64, cy: f64, half: f64) -> Vec<Line<f64>> {
        let verts = [
            coord! { x: cx - half, y: cy - half },
            coord! { x: cx + half, y: cy - half },
            coord! { x: cx + half, y: cy + half },
            coord! { x: cx - half, y: cy + half },
        ];
        (0..4)
            .map(|idx| Line::new(verts[idx], verts[(idx + 1) % 4]))
            .collect()
    }

    #[test]
    fn roadmap_between_two_squares() {
        // two obstacles; the surviving bisectors separate them
        let mut lines = square_lines(10., 10., 5.);
        lines.extend(square_lines(40., 10., 5.));
        let groups = vec![(0_usize, 4_usize), (4, 8)];

        let mut regions = VoronoiRegions::new();
        regions.set_line_groups(&groups);

        let results = calc_voronoi(
            &lines,
            1e-3,
            1e-2,
            Some(&regions),
            VoronoiBackend::BoostPolygon,
        )
        .unwrap();

        assert!(!results.vertices().is_empty());
        assert_eq!(results.graph().node_count(), results.vertices().len());
        assert_eq!(results.index_tree_size(), results.vertices().len());

        // the graph and the edge maps agree (every map key names valid,
        // adjacent vertices)
        for (&(idx0, idx1), _) in results.parabolic_edges() {
            assert!(idx0 < results.vertices().len());
            assert!(idx1 < results.vertices().len());
            assert!(results.edge_weight(idx0, idx1).is_some());
        }
        for (&(idx0, idx1), _) in results.linear_edges() {
            if let (Some(idx0), Some(idx1)) = (idx0, idx1) {
                assert!(idx0 < results.vertices().len());
                assert!(idx1 < results.vertices().len());
            }
        }

        // bisector vertices between the squares sit near the x midline
        let closest = results.closest_vertices(coord! { x: 25., y: 10. }, 1);
        assert_eq!(closest.len(), 1);
        assert_relative_eq!(results.vertices()[closest[0]].x, 25., epsilon = 1.0);
    }

    #[test]
    fn deterministic_roadmap() {
        let mut lines = square_lines(10., 10., 5.);
        lines.extend(square_lines(40., 10., 5.));
        let groups = vec![(0_usize, 4_usize), (4, 8)];

        let run = || {
            let mut regions = VoronoiRegions::new();
            regions.set_line_groups(&groups);
            calc_voronoi(
                &lines,
                1e-3,
                1e-2,
                Some(&regions),
                VoronoiBackend::BoostPolygon,
            )
            .unwrap()
        };

        let res1 = run();
        let res2 = run();

        assert_eq!(res1.vertices().len(), res2.vertices().len());
        for (v1, v2) in res1.vertices().iter().zip(res2.vertices()) {
            assert_relative_eq!(v1.x, v2.x, epsilon = 1e-3);
            assert_relative_eq!(v1.y, v2.y, epsilon = 1e-3);
        }
        assert_eq!(res1.graph().edge_count(), res2.graph().edge_count());
        for idx in 0..res1.vertices().len() {
            let mut n1 = res1.neighbours(idx);
            let mut n2 = res2.neighbours(idx);
            n1.sort_unstable();
            n2.sort_unstable();
            assert_eq!(n1, n2);
        }
    }

    #[test]
    fn parabolic_bisector_is_equidistant() {
        // a long line site below a segment whose endpoint acts as point site
        let lines = vec![
            Line::new(coord! { x: 0., y: 0. }, coord! { x: 40., y: 0. }),
            Line::new(coord! { x: 20., y: 10. }, coord! { x: 20., y: 25. }),
        ];
        let groups = vec![(0_usize, 1_usize), (1, 2)];

        let mut regions = VoronoiRegions::new();
        regions.set_line_groups(&groups);
        // open segments do not bound regions
        regions.set_remove_vertices_in_regions(false);

        let results = calc_voronoi(
            &lines,
            1e-3,
            1e-2,
            Some(&regions),
            VoronoiBackend::BoostPolygon,
        )
        .unwrap();

        assert!(
            !results.parabolic_edges().is_empty(),
            "expected a parabolic bisector between the point and the line site"
        );

        let focus = coord! { x: 20., y: 10. };
        for arc in results.parabolic_edges().values() {
            assert!(arc.len() >= 2);
            for pt in arc {
                let dist_point = norm(*pt - focus);
                let dist_line = pt.y.abs();
                assert_relative_eq!(dist_point, dist_line, epsilon = 5e-2);
            }
        }
    }

    #[test]
    fn unavailable_backend() {
        let lines = square_lines(10., 10., 5.);
        let err = calc_voronoi(&lines, 1e-3, 1e-2, None, VoronoiBackend::SegmentDelaunay);
        assert_eq!(err.unwrap_err(), PathsError::BackendUnavailable);
    }

    #[test]
    fn parabola_discretization_error_bound() {
        let seg = Line::new(coord! { x: 0., y: 0. }, coord! { x: 10., y: 0. });
        let focus = coord! { x: 5., y: 4. };
        // edge endpoints on the parabola
        let y_at = |x: f64| ((x - 5.0_f64).powi(2) + 16.) / 8.;
        let start = coord! { x: 1., y: y_at(1.) };
        let end = coord! { x: 9., y: y_at(9.) };

        let arc = discretize_parabola(focus, &seg, start, end, 1e-2);
        assert!(arc.len() > 2);
        for pt in &arc {
            // every sample is equidistant from focus and directrix line
            let dist_point = norm(*pt - focus);
            assert_relative_eq!(dist_point, pt.y, epsilon = 1e-9);
        }
        // samples run monotonically from start to end
        assert_relative_eq!(arc[0].x, 1.);
        assert_relative_eq!(arc.last().unwrap().x, 9.);
    }
}

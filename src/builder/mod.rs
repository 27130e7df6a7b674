//! The paths builder drives the two halves of the engine: the path-mesh
//! pipeline (configuration space → contours → line segments → Voronoi
//! roadmap, see [`mesh`]) and the path search on the finished roadmap
//! ([`path`]).

mod mesh;
mod path;

use geo_types::{coord, Coord};
use log::info;
use rstar::RTree;

use crate::image::ConfigSpaceImage;
use crate::instrument::space::InstrumentSpace;
use crate::tas::TasCalculator;
use crate::voronoi::VoronoiResults;

pub use path::InstrumentPath;

use std::f64::consts::PI;

/// Stage of the path-mesh calculation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CalculationState {
    Ready,
    CspaceBuilding,
    Contouring,
    Linearizing,
    Voronoi,
    Failed,
}

/// Strategy for weighting the roadmap edges during the path search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathStrategy {
    /// Plain shortest path over the stored bisector lengths.
    Shortest,
    /// Divide edge weights by the distance to the nearest wall, making
    /// wall-hugging paths more expensive.
    PenaliseWalls,
}

/// Progress callback: receives the stage, a fraction in `[0, 1]` and a
/// message; returning `false` cancels the stage.
pub type ProgressHandler = Box<dyn Fn(CalculationState, f64, &str) -> bool + Send + Sync>;

/// Builds the path mesh of an instrument space and calculates instrument
/// paths on it.
pub struct PathsBuilder<'a> {
    pub(crate) instrspace: &'a InstrumentSpace,
    pub(crate) tascalc: &'a TasCalculator,

    state: CalculationState,
    handlers: Vec<ProgressHandler>,

    // pipeline results
    pub(crate) img: ConfigSpaceImage,
    pub(crate) sample_range: [f64; 2],
    pub(crate) mono_range: [f64; 2],
    pub(crate) walls_rtree: RTree<[f64; 2]>,
    pub(crate) wall_contours: Vec<Vec<Coord<i32>>>,
    pub(crate) full_wall_contours: Vec<Vec<Coord<i32>>>,
    pub(crate) lines: Vec<geo_types::Line<f64>>,
    pub(crate) line_groups: Vec<(usize, usize)>,
    pub(crate) points_outside_regions: Vec<Coord<f64>>,
    pub(crate) inverted_regions: Vec<bool>,
    pub(crate) voro: VoronoiResults,

    // tunables
    pub(crate) eps: f64,
    pub(crate) eps_angular: f64,
    pub(crate) voroedge_eps: f64,
    pub(crate) subdiv_len: f64,
    pub(crate) min_angular_dist_to_walls: f64,
    pub(crate) remove_bisectors_below_min_wall_dist: bool,
    pub(crate) simplify_mindist: f64,
    pub(crate) use_motor_speeds: bool,
    pub(crate) directpath: bool,
    pub(crate) directpath_search_radius: f64,
    pub(crate) num_closest_voronoi_vertices: usize,
    pub(crate) verify_path: bool,
    pub(crate) maxnum_threads: usize,
}

impl<'a> PathsBuilder<'a> {
    pub fn new(instrspace: &'a InstrumentSpace, tascalc: &'a TasCalculator) -> Self {
        Self {
            instrspace,
            tascalc,
            state: CalculationState::Ready,
            handlers: vec![],
            img: ConfigSpaceImage::default(),
            sample_range: [0., PI],
            mono_range: [0., PI],
            walls_rtree: RTree::new(),
            wall_contours: vec![],
            full_wall_contours: vec![],
            lines: vec![],
            line_groups: vec![],
            points_outside_regions: vec![],
            inverted_regions: vec![],
            voro: VoronoiResults::default(),

            eps: 1e-3,
            eps_angular: 1e-3,
            voroedge_eps: 1e-2,
            subdiv_len: 0.1,
            min_angular_dist_to_walls: 5. / 180. * PI,
            remove_bisectors_below_min_wall_dist: true,
            simplify_mindist: 3.,
            use_motor_speeds: true,
            directpath: true,
            directpath_search_radius: 20. / 180. * PI,
            num_closest_voronoi_vertices: 64,
            verify_path: true,
            maxnum_threads: 4,
        }
    }

    // ------------------------------------------------------------------
    // inputs & results
    // ------------------------------------------------------------------

    pub fn instrument_space(&self) -> &InstrumentSpace {
        self.instrspace
    }

    pub fn tas_calculator(&self) -> &TasCalculator {
        self.tascalc
    }

    pub fn state(&self) -> CalculationState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: CalculationState) {
        self.state = state;
    }

    pub fn image(&self) -> &ConfigSpaceImage {
        &self.img
    }

    /// Simplified (default) or full traced wall contours.
    pub fn wall_contours(&self, full: bool) -> &[Vec<Coord<i32>>] {
        if full {
            &self.full_wall_contours
        } else {
            &self.wall_contours
        }
    }

    pub fn voronoi_results(&self) -> &VoronoiResults {
        &self.voro
    }

    /// Number of line-segment groups (one per obstacle contour).
    pub fn num_line_segment_regions(&self) -> usize {
        self.line_groups.len()
    }

    /// Whether the given region encircles allowed instead of forbidden
    /// coordinates.
    pub fn is_region_inverted(&self, group_idx: usize) -> bool {
        self.inverted_regions[group_idx]
    }

    /// A group's line segments converted to angular coordinates (degrees).
    pub fn line_segment_region(&self, group_idx: usize) -> Vec<[f64; 4]> {
        let Some(&(begin, end)) = self.line_groups.get(group_idx) else {
            return vec![];
        };

        self.lines[begin..end]
            .iter()
            .map(|line| {
                let pt1 = self.pixel_to_angle(line.start, true, false);
                let pt2 = self.pixel_to_angle(line.end, true, false);
                [pt1.x, pt1.y, pt2.x, pt2.y]
            })
            .collect()
    }

    /// Drop all pipeline results.
    pub fn clear(&mut self) {
        self.walls_rtree = RTree::new();
        self.wall_contours.clear();
        self.full_wall_contours.clear();
        self.lines.clear();
        self.line_groups.clear();
        self.points_outside_regions.clear();
        self.inverted_regions.clear();
        self.voro.clear();
        self.state = CalculationState::Ready;
    }

    // ------------------------------------------------------------------
    // options
    // ------------------------------------------------------------------

    pub fn epsilon(&self) -> f64 {
        self.eps
    }

    pub fn set_epsilon(&mut self, eps: f64) {
        self.eps = eps;
    }

    pub fn angular_epsilon(&self) -> f64 {
        self.eps_angular
    }

    pub fn set_angular_epsilon(&mut self, eps: f64) {
        self.eps_angular = eps;
    }

    pub fn voronoi_edge_epsilon(&self) -> f64 {
        self.voroedge_eps
    }

    pub fn set_voronoi_edge_epsilon(&mut self, eps: f64) {
        self.voroedge_eps = eps;
    }

    pub fn subdivision_length(&self) -> f64 {
        self.subdiv_len
    }

    pub fn set_subdivision_length(&mut self, len: f64) {
        self.subdiv_len = len;
    }

    pub fn min_dist_to_walls(&self) -> f64 {
        self.min_angular_dist_to_walls
    }

    pub fn set_min_dist_to_walls(&mut self, dist: f64) {
        self.min_angular_dist_to_walls = dist;
    }

    pub fn remove_bisectors_below_min_wall_dist(&self) -> bool {
        self.remove_bisectors_below_min_wall_dist
    }

    pub fn set_remove_bisectors_below_min_wall_dist(&mut self, remove: bool) {
        self.remove_bisectors_below_min_wall_dist = remove;
    }

    pub fn simplify_min_dist(&self) -> f64 {
        self.simplify_mindist
    }

    pub fn set_simplify_min_dist(&mut self, dist: f64) {
        self.simplify_mindist = dist;
    }

    pub fn use_motor_speeds(&self) -> bool {
        self.use_motor_speeds
    }

    pub fn set_use_motor_speeds(&mut self, use_speeds: bool) {
        self.use_motor_speeds = use_speeds;
    }

    pub fn try_direct_path(&self) -> bool {
        self.directpath
    }

    pub fn set_try_direct_path(&mut self, directpath: bool) {
        self.directpath = directpath;
    }

    pub fn max_direct_path_radius(&self) -> f64 {
        self.directpath_search_radius
    }

    pub fn set_max_direct_path_radius(&mut self, radius: f64) {
        self.directpath_search_radius = radius;
    }

    pub fn num_closest_voronoi_vertices(&self) -> usize {
        self.num_closest_voronoi_vertices
    }

    pub fn set_num_closest_voronoi_vertices(&mut self, num: usize) {
        self.num_closest_voronoi_vertices = num;
    }

    pub fn verify_path(&self) -> bool {
        self.verify_path
    }

    pub fn set_verify_path(&mut self, verify: bool) {
        self.verify_path = verify;
    }

    pub fn max_num_threads(&self) -> usize {
        self.maxnum_threads
    }

    pub fn set_max_num_threads(&mut self, num: usize) {
        self.maxnum_threads = num.max(1);
    }

    // ------------------------------------------------------------------
    // progress handlers
    // ------------------------------------------------------------------

    pub fn add_progress_handler(&mut self, handler: ProgressHandler) {
        self.handlers.push(handler);
    }

    /// Report progress through the log.
    pub fn add_console_progress_handler(&mut self) {
        self.add_progress_handler(Box::new(|state, progress, msg| {
            info!("[{:3}%] [{:?}] {}", (progress * 100.) as i32, state, msg);
            true
        }));
    }

    /// Invoke all handlers; the stage continues only while every handler
    /// agrees. Every handler runs, even after one has refused.
    pub(crate) fn emit_progress(&self, state: CalculationState, progress: f64, msg: &str) -> bool {
        let mut proceed = true;
        for handler in &self.handlers {
            proceed &= handler(state, progress, msg);
        }
        proceed
    }

    // ------------------------------------------------------------------
    // pixel <-> angle conversion
    // ------------------------------------------------------------------

    /// The independent monochromator (or analyser) angle index into the
    /// scattering senses: the analyser moves instead when ki is fixed.
    pub(crate) fn mono_sense_idx(&self) -> usize {
        let (_, kf_fixed) = self.tascalc.kfix();
        if kf_fixed {
            0
        } else {
            2
        }
    }

    /// Convert an image pixel to `(a4, a2)` angles. With `deg` the result is
    /// in degrees, with `inc_sense` the scattering senses are applied.
    pub fn pixel_to_angle(&self, pix: Coord<f64>, deg: bool, inc_sense: bool) -> Coord<f64> {
        let width = self.img.width().max(1) as f64;
        let height = self.img.height().max(1) as f64;

        let mut x = self.sample_range[0]
            + (self.sample_range[1] - self.sample_range[0]) * (pix.x / width);
        let mut y =
            self.mono_range[0] + (self.mono_range[1] - self.mono_range[0]) * (pix.y / height);

        if deg {
            x = x / PI * 180.;
            y = y / PI * 180.;
        }

        if inc_sense {
            let senses = self.tascalc.scattering_senses();
            x *= senses[1];
            y *= senses[self.mono_sense_idx()];
        }

        coord! { x: x, y: y }
    }

    /// Convert `(a4, a2)` angles to an image pixel.
    pub fn angle_to_pixel(&self, angle: Coord<f64>, deg: bool, inc_sense: bool) -> Coord<f64> {
        let mut x = angle.x;
        let mut y = angle.y;

        if deg {
            x = x / 180. * PI;
            y = y / 180. * PI;
        }

        if inc_sense {
            let senses = self.tascalc.scattering_senses();
            x *= senses[1];
            y *= senses[self.mono_sense_idx()];
        }

        let width = self.img.width() as f64;
        let height = self.img.height() as f64;

        coord! {
            x: width * (x - self.sample_range[0]) / (self.sample_range[1] - self.sample_range[0]),
            y: height * (y - self.mono_range[0]) / (self.mono_range[1] - self.mono_range[0]),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::image::ConfigSpaceImage;
    use approx::assert_relative_eq;

    fn builder_with_image<'a>(
        space: &'a InstrumentSpace,
        tascalc: &'a TasCalculator,
    ) -> PathsBuilder<'a> {
        let mut builder = PathsBuilder::new(space, tascalc);
        builder.img = ConfigSpaceImage::new(360, 180);
        builder.sample_range = [-PI, PI];
        builder.mono_range = [0., PI];
        builder
    }

    #[test]
    fn pixel_angle_bijection() {
        let space = InstrumentSpace::new();
        let tascalc = TasCalculator::new();
        let builder = builder_with_image(&space, &tascalc);

        for &(col, row) in &[(0., 0.), (100., 50.), (359., 179.), (42., 137.)] {
            let angle = builder.pixel_to_angle(coord! { x: col, y: row }, false, false);
            let pix = builder.angle_to_pixel(angle, false, false);
            assert_relative_eq!(pix.x, col, epsilon = 0.5);
            assert_relative_eq!(pix.y, row, epsilon = 0.5);
        }

        for &(a4, a2) in &[(0.5, 1.), (-2., 2.), (3., 0.1)] {
            let pix = builder.angle_to_pixel(coord! { x: a4, y: a2 }, false, false);
            let angle = builder.pixel_to_angle(pix, false, false);
            assert_relative_eq!(angle.x, a4, epsilon = 1e-9);
            assert_relative_eq!(angle.y, a2, epsilon = 1e-9);
        }
    }

    #[test]
    fn senses_flip_angles() {
        let space = InstrumentSpace::new();
        let mut tascalc = TasCalculator::new();
        tascalc.set_scattering_senses([1., -1., 1.]);
        let builder = builder_with_image(&space, &tascalc);

        let pix = coord! { x: 100., y: 50. };
        let plain = builder.pixel_to_angle(pix, false, false);
        let sensed = builder.pixel_to_angle(pix, false, true);
        assert_relative_eq!(sensed.x, -plain.x);
        assert_relative_eq!(sensed.y, plain.y);
    }

    #[test]
    fn degrees_conversion() {
        let space = InstrumentSpace::new();
        let tascalc = TasCalculator::new();
        let builder = builder_with_image(&space, &tascalc);

        let pix = coord! { x: 180., y: 90. };
        let rad = builder.pixel_to_angle(pix, false, false);
        let deg = builder.pixel_to_angle(pix, true, false);
        assert_relative_eq!(deg.x, rad.x / PI * 180.);
        assert_relative_eq!(deg.y, rad.y / PI * 180.);
    }

    #[test]
    fn combined_progress_handlers() {
        let space = InstrumentSpace::new();
        let tascalc = TasCalculator::new();
        let mut builder = PathsBuilder::new(&space, &tascalc);

        builder.add_progress_handler(Box::new(|_, _, _| true));
        assert!(builder.emit_progress(CalculationState::Ready, 0.5, "msg"));

        // one refusing handler cancels the stage
        builder.add_progress_handler(Box::new(|_, progress, _| progress < 0.9));
        assert!(builder.emit_progress(CalculationState::Ready, 0.5, "msg"));
        assert!(!builder.emit_progress(CalculationState::Ready, 1.0, "msg"));
    }
}

//! Collision-free motion path planning for triple-axis spectrometers.
//!
//! A triple-axis spectrometer (TAS) consists of three coupled rotation
//! stages; moving it between two measurement positions means steering the
//! monochromator (or analyser) scattering angle `a2` and the sample
//! scattering angle `a4` without driving any component into a wall or into
//! another component. This crate computes such motions:
//!
//! 1. the two-dimensional angular configuration space is rasterized into an
//!    image by probing the instrument's collision predicate
//!    ([`PathsBuilder::calculate_config_space`]),
//! 2. the obstacle regions are traced into contours and line segments
//!    ([`PathsBuilder::calculate_wall_contours`],
//!    [`PathsBuilder::calculate_line_segments`]),
//! 3. the line-segment Voronoi diagram — the locus of maximal clearance —
//!    becomes a weighted roadmap graph
//!    ([`PathsBuilder::calculate_voronoi`]),
//! 4. start and target are retracted onto the roadmap, connected with a
//!    shortest-path search and decoded back into a sequence of angular
//!    positions ([`PathsBuilder::find_path`],
//!    [`PathsBuilder::path_vertices`]).
//!
//! # Modules
//!
//! - [`geom`]: the 2D geometry kernel — intersections, containment,
//!   polygon collision, contour tracing, convex splitting, polyline
//!   utilities
//! - [`instrument`]: axes, components, walls, the collision predicate and
//!   the XML instrument-description reader
//! - [`builder`]: the paths builder driving the pipeline and the path
//!   search
//! - [`voronoi`]: the line-segment Voronoi roadmap
//! - [`export`]: path exporters for instrument control systems

pub mod builder;
pub mod error;
pub mod export;
pub mod geom;
pub mod graph;
pub mod image;
pub mod instrument;
pub mod tas;
pub mod voronoi;

pub use builder::{CalculationState, InstrumentPath, PathStrategy, PathsBuilder};
pub use error::PathsError;
pub use image::{ConfigSpaceImage, PIXEL_COLLISION, PIXEL_FORBIDDEN_ANGLE, PIXEL_FREE};
pub use instrument::config::{load_instrument_space, ConfigError, INSTRUMENT_FILE_IDENT};
pub use instrument::{Axis, AxisAngle, Geometry, Instrument, InstrumentSpace};
pub use tas::TasCalculator;
pub use voronoi::{VoronoiBackend, VoronoiResults};

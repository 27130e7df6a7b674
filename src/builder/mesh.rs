//! Path-mesh pipeline: rasterize the angular configuration space, trace and
//! simplify the obstacle contours, emit line segments and build the Voronoi
//! roadmap.

use std::io::Write;

use geo_types::{coord, Coord, Line};
use log::debug;
use rayon::prelude::*;
use rstar::RTree;

use super::{CalculationState, PathsBuilder};
use crate::error::PathsError;
use crate::geom::contour::{simplify_contour, trace_boundaries};
use crate::geom::convex_split::convex_split;
use crate::image::{ConfigSpaceImage, PIXEL_COLLISION, PIXEL_FORBIDDEN_ANGLE, PIXEL_FREE};
use crate::instrument::space::InstrumentSpace;
use crate::instrument::{AxisAngle, AXIS_ANA, AXIS_MONO, AXIS_SAMPLE};
use crate::voronoi::{calc_voronoi, VoronoiBackend, VoronoiRegions};

/// Maximum number of `Running` progress reports during a stage.
const MAX_PROGRESS_REPORTS: usize = 25;

/// Outside point used for the region parity tests; any point outside the
/// image works.
const POINT_OUTSIDE_REGIONS: Coord<f64> = Coord { x: -50., y: -40. };

fn set_instrument_angles(space: &mut InstrumentSpace, a2: f64, a4: f64, a6: f64, kf_fixed: bool) {
    let instr = space.instrument_mut();

    // a2 and a6 swap roles when kf is not fixed
    instr.set_axis_angle(AXIS_MONO, AxisAngle::Outgoing, if kf_fixed { a2 } else { a6 });
    instr.set_axis_angle(AXIS_SAMPLE, AxisAngle::Outgoing, a4);
    instr.set_axis_angle(AXIS_ANA, AxisAngle::Outgoing, if kf_fixed { a6 } else { a2 });

    // crystal angles are half the scattering angles
    instr.set_axis_angle(
        AXIS_MONO,
        AxisAngle::Internal,
        if kf_fixed { 0.5 * a2 } else { 0.5 * a6 },
    );
    instr.set_axis_angle(AXIS_SAMPLE, AxisAngle::Internal, 0.5 * a4);
    instr.set_axis_angle(
        AXIS_ANA,
        AxisAngle::Internal,
        if kf_fixed { 0.5 * a6 } else { 0.5 * a2 },
    );
}

/// Classify one instrument configuration.
pub(crate) fn classify_configuration(
    space: &mut InstrumentSpace,
    a2: f64,
    a4: f64,
    a6: f64,
    kf_fixed: bool,
) -> u8 {
    set_instrument_angles(space, a2, a4, a6, kf_fixed);

    if !space.check_angular_limits() {
        PIXEL_FORBIDDEN_ANGLE
    } else if space.check_collision_2d() {
        PIXEL_COLLISION
    } else {
        PIXEL_FREE
    }
}

impl PathsBuilder<'_> {
    /// Rasterize the forbidden region of the `(a4, a2)` configuration space
    /// into the image. Angles are radians; the scattering senses flip the
    /// scan direction.
    pub fn calculate_config_space(
        &mut self,
        da2: f64,
        da4: f64,
        starta2: f64,
        enda2: f64,
        starta4: f64,
        enda4: f64,
    ) -> Result<(), PathsError> {
        self.sample_range = [starta4, enda4];
        self.mono_range = [starta2, enda2];

        let msg = format!(
            "Calculating configuration space in {} threads...",
            self.maxnum_threads
        );
        self.set_state(CalculationState::CspaceBuilding);
        if !self.emit_progress(CalculationState::CspaceBuilding, 0., &msg) {
            self.set_state(CalculationState::Ready);
            return Err(PathsError::Cancelled);
        }

        let senses = *self.tascalc.scattering_senses();
        let (_, kf_fixed) = self.tascalc.kfix();
        let mono_idx = self.mono_sense_idx();

        let instr = self.instrspace.instrument();
        // analyser angle, or the monochromator angle when kf is not fixed
        let a6 = if kf_fixed {
            instr.analyser().angle(AxisAngle::Outgoing)
        } else {
            instr.monochromator().angle(AxisAngle::Outgoing)
        };

        // scan direction includes the scattering senses
        let da4_s = da4 * senses[1];
        let starta4_s = starta4 * senses[1];
        let enda4_s = enda4 * senses[1];
        let da2_s = da2 * senses[mono_idx];
        let starta2_s = starta2 * senses[mono_idx];
        let enda2_s = enda2 * senses[mono_idx];

        let width = ((enda4_s - starta4_s) / da4_s).ceil() as usize;
        let height = ((enda2_s - starta2_s) / da2_s).ceil() as usize;
        debug!("configuration space image: {width} x {height}");

        if width == 0 || height == 0 {
            self.set_state(CalculationState::Ready);
            return Err(PathsError::InvalidInput);
        }

        let mut img = ConfigSpaceImage::new(width, height);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.maxnum_threads)
            .build()
            .map_err(|err| PathsError::Failed(err.to_string()))?;

        // machine angles of a pixel, senses included
        let pixel_angles = move |col: usize, row: usize| -> (f64, f64) {
            let a4 = (starta4 + (enda4 - starta4) * (col as f64 / width as f64)) * senses[1];
            let a2 = (starta2 + (enda2 - starta2) * (row as f64 / height as f64)) * senses[mono_idx];
            (a4, a2)
        };

        let instrspace = self.instrspace;

        // compute rows in at most MAX_PROGRESS_REPORTS batches; the progress
        // handlers run on the calling thread between batches
        let num_batches = height.clamp(1, MAX_PROGRESS_REPORTS);
        let rows_per_batch = height.div_ceil(num_batches);

        let mut rows: Vec<(usize, &mut [u8])> = img.rows_mut().enumerate().collect();
        let mut cancelled = false;

        for (batch_idx, batch) in rows.chunks_mut(rows_per_batch).enumerate() {
            let frac = batch_idx as f64 / num_batches as f64;
            if !self.emit_progress(CalculationState::CspaceBuilding, frac, &msg) {
                cancelled = true;
                break;
            }

            pool.install(|| {
                batch.par_iter_mut().for_each_init(
                    || instrspace.clone(),
                    |space, (row, row_data)| {
                        for (col, pixel) in row_data.iter_mut().enumerate() {
                            let (a4, a2) = pixel_angles(col, *row);
                            *pixel = classify_configuration(space, a2, a4, a6, kf_fixed);
                        }
                    },
                )
            });
        }

        drop(rows);

        if cancelled {
            // partial images are not used
            self.set_state(CalculationState::Ready);
            return Err(PathsError::Cancelled);
        }

        self.img = img;
        self.emit_progress(CalculationState::CspaceBuilding, 1., &msg);
        self.set_state(CalculationState::Ready);
        Ok(())
    }

    /// Store all occupied pixel positions in a spatial index for
    /// nearest-wall queries.
    pub fn calculate_walls_index_tree(&mut self) {
        let mut entries = vec![];
        for row in 0..self.img.height() {
            for col in 0..self.img.width() {
                if self.img.pixel(col, row) != PIXEL_FREE {
                    entries.push([col as f64, row as f64]);
                }
            }
        }

        debug!("walls index tree: {} occupied pixels", entries.len());
        self.walls_rtree = RTree::bulk_load(entries);
    }

    /// Trace the obstacle contours on the image, optionally simplifying and
    /// convex-splitting them.
    pub fn calculate_wall_contours(
        &mut self,
        simplify: bool,
        do_convex_split: bool,
    ) -> Result<(), PathsError> {
        let msg = "Calculating obstacle contours...";
        self.set_state(CalculationState::Contouring);
        if !self.emit_progress(CalculationState::Contouring, 0., msg) {
            self.set_state(CalculationState::Ready);
            return Err(PathsError::Cancelled);
        }

        let img = &self.img;
        self.full_wall_contours =
            trace_boundaries(img.width(), img.height(), |x, y| img.occupied(x as i64, y as i64));
        self.wall_contours = self.full_wall_contours.clone();

        if !self.emit_progress(CalculationState::Contouring, 0.33, msg) {
            self.set_state(CalculationState::Ready);
            return Err(PathsError::Cancelled);
        }

        if simplify {
            for contour in &mut self.wall_contours {
                simplify_contour::<f64>(contour, self.simplify_mindist, self.eps_angular);
            }
        }

        if !self.emit_progress(CalculationState::Contouring, 0.66, msg) {
            self.set_state(CalculationState::Ready);
            return Err(PathsError::Cancelled);
        }

        if do_convex_split {
            let mut split_contours = Vec::with_capacity(self.wall_contours.len() * 2);

            for contour in &self.wall_contours {
                let real: Vec<Coord<f64>> = contour
                    .iter()
                    .map(|v| coord! { x: v.x as f64, y: v.y as f64 })
                    .collect();

                let parts = convex_split(&real, self.eps);
                if parts.is_empty() {
                    // already convex, or no valid split was found
                    split_contours.push(contour.clone());
                } else {
                    for part in parts {
                        split_contours.push(
                            part.iter()
                                .map(|v| Coord {
                                    x: v.x.round() as i32,
                                    y: v.y.round() as i32,
                                })
                                .collect(),
                        );
                    }
                }
            }

            self.wall_contours = split_contours;
        }

        self.emit_progress(CalculationState::Contouring, 1., msg);
        self.set_state(CalculationState::Ready);
        Ok(())
    }

    /// Emit one line segment per contour edge, recording the group index
    /// range and the inverted-region flag per obstacle.
    pub fn calculate_line_segments(&mut self) -> Result<(), PathsError> {
        let msg = "Calculating obstacle line segments...";
        self.set_state(CalculationState::Linearizing);
        if !self.emit_progress(CalculationState::Linearizing, 0., msg) {
            self.set_state(CalculationState::Ready);
            return Err(PathsError::Cancelled);
        }

        self.lines.clear();
        self.line_groups.clear();
        self.points_outside_regions.clear();
        self.inverted_regions.clear();

        let total_verts: usize = self.wall_contours.iter().map(|c| c.len()).sum();
        self.lines.reserve(total_verts);

        for (contour_idx, contour) in self.wall_contours.iter().enumerate() {
            let group_start = self.lines.len();

            for vert1 in 0..contour.len() {
                let vert2 = (vert1 + 1) % contour.len();
                self.lines.push(Line::new(
                    coord! { x: contour[vert1].x as f64, y: contour[vert1].y as f64 },
                    coord! { x: contour[vert2].x as f64, y: contour[vert2].y as f64 },
                ));
            }

            let group_end = self.lines.len();

            // a region is inverted when the pixel one step outside its
            // minimum vertex is not free: it encircles allowed coordinates
            let min_x = contour.iter().map(|v| v.x).min().unwrap_or(0);
            let min_y = contour.iter().map(|v| v.y).min().unwrap_or(0);
            let inverted = self.img.occupied(min_x as i64 - 1, min_y as i64 - 1);

            // the first contour is the outer bounding region if it encircles
            // the allowed space; its segments still take part in the
            // Voronoi diagram but it forms no obstacle group
            if contour_idx == 0 && inverted {
                continue;
            }

            self.line_groups.push((group_start, group_end));
            self.points_outside_regions.push(POINT_OUTSIDE_REGIONS);
            self.inverted_regions.push(inverted);
        }

        self.emit_progress(CalculationState::Linearizing, 1., msg);
        self.set_state(CalculationState::Ready);
        Ok(())
    }

    /// Compute the Voronoi roadmap from the line segments.
    pub fn calculate_voronoi(
        &mut self,
        group_lines: bool,
        backend: VoronoiBackend,
        use_region_function: bool,
    ) -> Result<(), PathsError> {
        let msg = "Calculating Voronoi diagram...";
        self.set_state(CalculationState::Voronoi);
        if !self.emit_progress(CalculationState::Voronoi, 0., msg) {
            self.set_state(CalculationState::Ready);
            return Err(PathsError::Cancelled);
        }

        let result = {
            // a vertex on an occupied pixel lies inside a forbidden region
            let img = &self.img;
            let region_fn = move |vert: Coord<f64>| -> bool {
                if vert.x < 0. || vert.y < 0. {
                    return true;
                }
                img.occupied(vert.x as i64, vert.y as i64)
            };

            // a vertex is valid if it keeps enough distance to the walls
            let validate_fn =
                |vert: Coord<f64>| self.dist_to_nearest_wall(vert) >= self.min_angular_dist_to_walls;

            let mut regions = VoronoiRegions::new();
            regions.set_group_lines(group_lines);
            regions.set_remove_vertices_in_regions(true);
            regions.set_line_groups(&self.line_groups);
            regions.set_points_outside_regions(&self.points_outside_regions);
            regions.set_inverted_regions(&self.inverted_regions);
            if use_region_function {
                regions.set_region_fn(Some(&region_fn));
            }
            if self.remove_bisectors_below_min_wall_dist {
                regions.set_validate_fn(Some(&validate_fn));
            }

            calc_voronoi(&self.lines, self.eps, self.voroedge_eps, Some(&regions), backend)
        };

        match result {
            Ok(voro) => {
                self.voro = voro;
                self.emit_progress(CalculationState::Voronoi, 1., msg);
                self.set_state(CalculationState::Ready);
                Ok(())
            }
            Err(err) => {
                self.emit_progress(CalculationState::Failed, 1., msg);
                self.set_state(CalculationState::Failed);
                Err(err)
            }
        }
    }

    /// Run the full path-mesh pipeline.
    pub fn build_path_mesh(
        &mut self,
        da2: f64,
        da4: f64,
        starta2: f64,
        enda2: f64,
        starta4: f64,
        enda4: f64,
    ) -> Result<(), PathsError> {
        self.calculate_config_space(da2, da4, starta2, enda2, starta4, enda4)?;
        self.calculate_walls_index_tree();
        self.calculate_wall_contours(true, false)?;
        self.calculate_line_segments()?;
        self.calculate_voronoi(true, VoronoiBackend::BoostPolygon, true)
    }

    /// Export the contour line segments and their groups in the format of
    /// the standalone lines tool.
    pub fn save_to_lines_tool<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "<lines2d>")?;

        let mut group_indices = Vec::with_capacity(self.line_groups.len());
        let mut vert_ctr = 0_usize;

        writeln!(writer, "<vertices>")?;
        for (group_idx, &(begin, end)) in self.line_groups.iter().enumerate() {
            writeln!(writer, "\t<!-- contour {group_idx} -->")?;
            let group_begin = vert_ctr;

            for line in &self.lines[begin..end] {
                writeln!(
                    writer,
                    "\t<{vert_ctr} x=\"{}\" y=\"{}\"/>",
                    line.start.x, line.start.y
                )?;
                vert_ctr += 1;
                writeln!(
                    writer,
                    "\t<{vert_ctr} x=\"{}\" y=\"{}\"/>",
                    line.end.x, line.end.y
                )?;
                vert_ctr += 1;
            }

            group_indices.push((group_begin, vert_ctr));
        }
        writeln!(writer, "</vertices>")?;

        writeln!(writer, "\n<groups>")?;
        for (group_idx, (begin, end)) in group_indices.iter().enumerate() {
            writeln!(writer, "\t<!-- contour {group_idx} -->")?;
            writeln!(writer, "\t<{group_idx}>")?;
            writeln!(writer, "\t\t<begin>{begin}</begin>")?;
            writeln!(writer, "\t\t<end>{end}</end>")?;
            writeln!(writer, "\t</{group_idx}>")?;
        }
        writeln!(writer, "</groups>")?;

        writeln!(writer, "</lines2d>")?;
        Ok(())
    }
}

//! The instrument space: floor, walls and instrument, with the angular
//! limits predicate and the planar collision predicate.

use std::collections::HashSet;

use geo_types::{Coord, Rect};

use super::geometry::{Geometry, Trafo};
use super::{AxisAngle, Instrument, AXIS_ANA, AXIS_MONO, AXIS_SAMPLE};
use crate::geom::collide::{
    circles_bounding_rect, collide_circle_circle, collide_circle_poly, collide_poly_poly,
    polys_bounding_rect, rects_overlap,
};

const COLLISION_EPS: f64 = 1e-6;

type Circle<'a> = (&'a str, Coord<f64>, f64);
type Polygon<'a> = (&'a str, Vec<Coord<f64>>);

/// Floor, walls and the instrument.
#[derive(Clone, Debug, Default)]
pub struct InstrumentSpace {
    floor_len: [f64; 2],
    walls: Vec<Geometry>,
    instrument: Instrument,
    /// Unordered component-id pairs whose collisions are ignored (components
    /// known to overlap in the instrument definition).
    ignored_pairs: HashSet<(String, String)>,
}

impl InstrumentSpace {
    pub fn new() -> Self {
        Self {
            floor_len: [10., 10.],
            walls: vec![],
            instrument: Instrument::new(),
            ignored_pairs: HashSet::new(),
        }
    }

    pub fn floor_len_x(&self) -> f64 {
        self.floor_len[0]
    }

    pub fn floor_len_y(&self) -> f64 {
        self.floor_len[1]
    }

    pub fn set_floor_len(&mut self, len_x: f64, len_y: f64) {
        self.floor_len = [len_x, len_y];
    }

    pub fn walls(&self) -> &[Geometry] {
        &self.walls
    }

    pub fn add_wall(&mut self, mut wall: Geometry, id: &str) {
        if wall.id().is_empty() {
            wall.set_id(id);
        }
        self.walls.push(wall);
    }

    pub fn delete_wall(&mut self, id: &str) -> bool {
        let before = self.walls.len();
        self.walls.retain(|wall| wall.id() != id);
        self.walls.len() != before
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut Instrument {
        &mut self.instrument
    }

    /// Suppress collision reports between the two given component ids.
    pub fn ignore_collisions_between(&mut self, id1: &str, id2: &str) {
        let key = if id1 <= id2 {
            (id1.to_owned(), id2.to_owned())
        } else {
            (id2.to_owned(), id1.to_owned())
        };
        self.ignored_pairs.insert(key);
    }

    fn is_ignored(&self, id1: &str, id2: &str) -> bool {
        if self.ignored_pairs.is_empty() {
            return false;
        }
        let key = if id1 <= id2 {
            (id1.to_owned(), id2.to_owned())
        } else {
            (id2.to_owned(), id1.to_owned())
        };
        self.ignored_pairs.contains(&key)
    }

    /// True iff every axis's three angles lie within their limits.
    pub fn check_angular_limits(&self) -> bool {
        [AXIS_MONO, AXIS_SAMPLE, AXIS_ANA]
            .iter()
            .all(|&idx| self.instrument.axis(idx).angles_within_limits())
    }

    fn axis_circles(&self, axis_idx: usize, frames: &[AxisAngle]) -> Vec<Circle<'_>> {
        let mut circles = vec![];
        for &which in frames {
            let frame = self.instrument.axis_trafo(axis_idx, which);
            for comp in self.instrument.axis(axis_idx).comps(which) {
                if let Some((org, rad)) = comp.circle_2d(&frame) {
                    circles.push((comp.id(), org, rad));
                }
            }
        }
        circles
    }

    fn axis_polys(&self, axis_idx: usize, frames: &[AxisAngle]) -> Vec<Polygon<'_>> {
        let mut polys = vec![];
        for &which in frames {
            let frame = self.instrument.axis_trafo(axis_idx, which);
            for comp in self.instrument.axis(axis_idx).comps(which) {
                if let Some(poly) = comp.polygon_2d(&frame) {
                    polys.push((comp.id(), poly));
                }
            }
        }
        polys
    }

    fn circles_collide(&self, circles1: &[Circle], circles2: &[Circle]) -> bool {
        for (id1, org1, rad1) in circles1 {
            for (id2, org2, rad2) in circles2 {
                if self.is_ignored(id1, id2) {
                    continue;
                }
                if collide_circle_circle(*org1, *rad1, *org2, *rad2) {
                    return true;
                }
            }
        }
        false
    }

    fn circles_polys_collide(
        &self,
        circles: &[Circle],
        polys: &[Polygon],
        circles_bb: Option<Rect<f64>>,
        polys_bb: Option<Rect<f64>>,
    ) -> bool {
        if !rects_overlap(circles_bb, polys_bb) {
            return false;
        }

        for (id1, org, rad) in circles {
            for (id2, poly) in polys {
                if self.is_ignored(id1, id2) {
                    continue;
                }
                if collide_circle_poly(*org, *rad, poly, COLLISION_EPS) {
                    return true;
                }
            }
        }
        false
    }

    fn polys_collide(
        &self,
        polys1: &[Polygon],
        polys2: &[Polygon],
        bb1: Option<Rect<f64>>,
        bb2: Option<Rect<f64>>,
    ) -> bool {
        if !rects_overlap(bb1, bb2) {
            return false;
        }

        for (id1, poly1) in polys1 {
            for (id2, poly2) in polys2 {
                if self.is_ignored(id1, id2) {
                    continue;
                }
                if collide_poly_poly(poly1, poly2, COLLISION_EPS) {
                    return true;
                }
            }
        }
        false
    }

    /// Check all component pairs for collisions in the instrument plane at
    /// the current angles. Never fails; shapes that do not project (e.g.
    /// boxes queried as circles) simply do not participate.
    pub fn check_collision_2d(&self) -> bool {
        use AxisAngle::{Incoming, Internal, Outgoing};
        const ALL: [AxisAngle; 3] = [Incoming, Internal, Outgoing];
        const INT_OUT: [AxisAngle; 2] = [Internal, Outgoing];
        const IN: [AxisAngle; 1] = [Incoming];

        let mono_circles = self.axis_circles(AXIS_MONO, &ALL);
        let mono_circles_int_out = self.axis_circles(AXIS_MONO, &INT_OUT);
        let sample_circles = self.axis_circles(AXIS_SAMPLE, &ALL);
        let ana_circles = self.axis_circles(AXIS_ANA, &ALL);

        let mono_polys = self.axis_polys(AXIS_MONO, &ALL);
        let mono_polys_in = self.axis_polys(AXIS_MONO, &IN);
        let mono_polys_int_out = self.axis_polys(AXIS_MONO, &INT_OUT);
        let sample_polys = self.axis_polys(AXIS_SAMPLE, &ALL);
        let sample_polys_in = self.axis_polys(AXIS_SAMPLE, &IN);
        let ana_polys = self.axis_polys(AXIS_ANA, &ALL);

        let strip = |polys: &[Polygon]| polys.iter().map(|(_, p)| p.clone()).collect::<Vec<_>>();
        let strip_circ =
            |circles: &[Circle]| circles.iter().map(|(_, o, r)| (*o, *r)).collect::<Vec<_>>();

        let mono_bb = polys_bounding_rect(&strip(&mono_polys));
        let mono_in_bb = polys_bounding_rect(&strip(&mono_polys_in));
        let mono_int_out_bb = polys_bounding_rect(&strip(&mono_polys_int_out));
        let sample_bb = polys_bounding_rect(&strip(&sample_polys));
        let sample_in_bb = polys_bounding_rect(&strip(&sample_polys_in));
        let ana_bb = polys_bounding_rect(&strip(&ana_polys));

        let mono_circ_bb = circles_bounding_rect(&strip_circ(&mono_circles));
        let mono_circ_int_out_bb = circles_bounding_rect(&strip_circ(&mono_circles_int_out));
        let sample_circ_bb = circles_bounding_rect(&strip_circ(&sample_circles));
        let ana_circ_bb = circles_bounding_rect(&strip_circ(&ana_circles));

        // collisions with the walls; the monochromator's incoming frame (the
        // fixed beam tube) is exempt
        for wall in &self.walls {
            if let Some(poly) = wall.polygon_2d(&Trafo::identity()) {
                let wall_polys = vec![(wall.id(), poly)];
                let wall_bb = polys_bounding_rect(&strip(&wall_polys));

                if self.polys_collide(&mono_polys_int_out, &wall_polys, mono_int_out_bb, wall_bb)
                    || self.polys_collide(&sample_polys, &wall_polys, sample_bb, wall_bb)
                    || self.polys_collide(&ana_polys, &wall_polys, ana_bb, wall_bb)
                {
                    return true;
                }

                if self.circles_polys_collide(
                    &mono_circles_int_out,
                    &wall_polys,
                    mono_circ_int_out_bb,
                    wall_bb,
                ) || self.circles_polys_collide(
                    &sample_circles,
                    &wall_polys,
                    sample_circ_bb,
                    wall_bb,
                ) || self.circles_polys_collide(&ana_circles, &wall_polys, ana_circ_bb, wall_bb)
                {
                    return true;
                }
            }

            if let Some((org, rad)) = wall.circle_2d(&Trafo::identity()) {
                let wall_circles = vec![(wall.id(), org, rad)];
                let wall_circ_bb = circles_bounding_rect(&strip_circ(&wall_circles));

                if self.circles_collide(&mono_circles_int_out, &wall_circles)
                    || self.circles_collide(&sample_circles, &wall_circles)
                    || self.circles_collide(&ana_circles, &wall_circles)
                {
                    return true;
                }

                if self.circles_polys_collide(&wall_circles, &mono_polys, wall_circ_bb, mono_bb)
                    || self.circles_polys_collide(
                        &wall_circles,
                        &sample_polys,
                        wall_circ_bb,
                        sample_bb,
                    )
                    || self.circles_polys_collide(&wall_circles, &ana_polys, wall_circ_bb, ana_bb)
                {
                    return true;
                }
            }
        }

        // collisions between the axes
        if self.circles_collide(&mono_circles, &sample_circles)
            || self.circles_collide(&sample_circles, &ana_circles)
            || self.circles_collide(&mono_circles, &ana_circles)
        {
            return true;
        }

        self.circles_polys_collide(&mono_circles, &ana_polys, mono_circ_bb, ana_bb)
            || self.circles_polys_collide(&mono_circles, &sample_polys, mono_circ_bb, sample_bb)
            || self.circles_polys_collide(&sample_circles, &mono_polys_in, sample_circ_bb, mono_in_bb)
            || self.circles_polys_collide(&sample_circles, &ana_polys, sample_circ_bb, ana_bb)
            || self.circles_polys_collide(&ana_circles, &mono_polys, ana_circ_bb, mono_bb)
            || self.circles_polys_collide(&ana_circles, &sample_polys_in, ana_circ_bb, sample_in_bb)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cylinder(id: &str, x: f64, radius: f64) -> Geometry {
        Geometry::Cylinder {
            id: id.into(),
            pos: [x, 0., 0.],
            radius,
            height: 1.,
        }
    }

    fn space_with_arms() -> InstrumentSpace {
        let mut space = InstrumentSpace::new();
        let instr = space.instrument_mut();
        instr.axis_mut(AXIS_SAMPLE).set_pos([2., 0., 0.]);
        instr.axis_mut(AXIS_ANA).set_pos([2., 0., 0.]);

        instr
            .axis_mut(AXIS_MONO)
            .comps_mut(AxisAngle::Internal)
            .push(cylinder("mono crystal", 0., 0.5));
        instr
            .axis_mut(AXIS_SAMPLE)
            .comps_mut(AxisAngle::Internal)
            .push(cylinder("sample table", 0., 0.4));
        instr
            .axis_mut(AXIS_ANA)
            .comps_mut(AxisAngle::Internal)
            .push(cylinder("ana crystal", 0., 0.5));
        space
    }

    #[test]
    fn free_configuration() {
        let space = space_with_arms();
        assert!(space.check_angular_limits());
        assert!(!space.check_collision_2d());
    }

    #[test]
    fn wall_collision_depends_on_angles() {
        let mut space = space_with_arms();
        space.add_wall(
            Geometry::Box {
                id: String::new(),
                pos: [3.5, 0., 0.],
                rot: 0.,
                length: 0.2,
                depth: 6.,
                height: 1.,
            },
            "wall 1",
        );

        // arms stretched out: the analyser circle spans x in [3.5, 4.5] and
        // reaches into the wall band at [3.4, 3.6]
        assert!(space.check_collision_2d());

        // rotating the sample arm away clears the wall
        space
            .instrument_mut()
            .set_axis_angle(AXIS_SAMPLE, AxisAngle::Outgoing, std::f64::consts::FRAC_PI_2);
        assert!(!space.check_collision_2d());
    }

    #[test]
    fn self_collision_when_folded_back() {
        let mut space = space_with_arms();

        // fold the analyser arm back onto the monochromator
        space
            .instrument_mut()
            .set_axis_angle(AXIS_SAMPLE, AxisAngle::Outgoing, std::f64::consts::PI);
        assert!(space.check_collision_2d());
    }

    #[test]
    fn ignored_pairs_suppress_reports() {
        let mut space = space_with_arms();
        space
            .instrument_mut()
            .set_axis_angle(AXIS_SAMPLE, AxisAngle::Outgoing, std::f64::consts::PI);
        assert!(space.check_collision_2d());

        space.ignore_collisions_between("mono crystal", "ana crystal");
        assert!(!space.check_collision_2d());
    }
}

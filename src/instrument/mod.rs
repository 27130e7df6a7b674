//! The instrument model: axes with their components, the axis chain, and
//! the instrument space with its collision predicate.
//!
//! The monochromator → sample → analyser chain is stored as a flat arena;
//! an axis refers to its predecessor by index, so the chain is acyclic by
//! construction and the forward transforms compose iteratively.

pub mod config;
pub mod geometry;
pub mod space;

use std::f64::consts::PI;

pub use geometry::{Geometry, Trafo};
pub use space::InstrumentSpace;

/// Frame selector for an axis: fixed to the incoming beam, rotating with
/// the crystal, or fixed to the outgoing beam.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AxisAngle {
    Incoming,
    Internal,
    Outgoing,
}

/// Inclusive angular limits in radians.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AngleLimits {
    pub lower: f64,
    pub upper: f64,
}

impl Default for AngleLimits {
    fn default() -> Self {
        Self {
            lower: -PI,
            upper: PI,
        }
    }
}

impl AngleLimits {
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.lower && angle <= self.upper
    }
}

/// One rotation axis of the instrument.
#[derive(Clone, Debug)]
pub struct Axis {
    id: String,
    prev: Option<usize>,

    pos: [f64; 3],

    angle_in: f64,
    angle_internal: f64,
    angle_out: f64,

    limits_in: AngleLimits,
    limits_internal: AngleLimits,
    limits_out: AngleLimits,

    speed_in: f64,
    speed_internal: f64,
    speed_out: f64,

    comps_in: Vec<Geometry>,
    comps_internal: Vec<Geometry>,
    comps_out: Vec<Geometry>,
}

impl Axis {
    pub fn new(id: &str, prev: Option<usize>) -> Self {
        Self {
            id: id.to_owned(),
            prev,
            pos: [0.; 3],
            angle_in: 0.,
            angle_internal: 0.,
            angle_out: 0.,
            limits_in: AngleLimits::default(),
            limits_internal: AngleLimits::default(),
            limits_out: AngleLimits::default(),
            speed_in: 1.,
            speed_internal: 1.,
            speed_out: 1.,
            comps_in: vec![],
            comps_internal: vec![],
            comps_out: vec![],
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn prev(&self) -> Option<usize> {
        self.prev
    }

    pub fn pos(&self) -> [f64; 3] {
        self.pos
    }

    pub fn set_pos(&mut self, pos: [f64; 3]) {
        self.pos = pos;
    }

    pub fn angle(&self, which: AxisAngle) -> f64 {
        match which {
            AxisAngle::Incoming => self.angle_in,
            AxisAngle::Internal => self.angle_internal,
            AxisAngle::Outgoing => self.angle_out,
        }
    }

    pub(crate) fn set_angle_internal_only(&mut self, which: AxisAngle, angle: f64) {
        match which {
            AxisAngle::Incoming => self.angle_in = angle,
            AxisAngle::Internal => self.angle_internal = angle,
            AxisAngle::Outgoing => self.angle_out = angle,
        }
    }

    pub fn limits(&self, which: AxisAngle) -> AngleLimits {
        match which {
            AxisAngle::Incoming => self.limits_in,
            AxisAngle::Internal => self.limits_internal,
            AxisAngle::Outgoing => self.limits_out,
        }
    }

    pub fn set_limits(&mut self, which: AxisAngle, limits: AngleLimits) {
        match which {
            AxisAngle::Incoming => self.limits_in = limits,
            AxisAngle::Internal => self.limits_internal = limits,
            AxisAngle::Outgoing => self.limits_out = limits,
        }
    }

    /// Angular speed of the given drive.
    pub fn speed(&self, which: AxisAngle) -> f64 {
        match which {
            AxisAngle::Incoming => self.speed_in,
            AxisAngle::Internal => self.speed_internal,
            AxisAngle::Outgoing => self.speed_out,
        }
    }

    pub fn set_speed(&mut self, which: AxisAngle, speed: f64) {
        match which {
            AxisAngle::Incoming => self.speed_in = speed,
            AxisAngle::Internal => self.speed_internal = speed,
            AxisAngle::Outgoing => self.speed_out = speed,
        }
    }

    pub fn comps(&self, which: AxisAngle) -> &[Geometry] {
        match which {
            AxisAngle::Incoming => &self.comps_in,
            AxisAngle::Internal => &self.comps_internal,
            AxisAngle::Outgoing => &self.comps_out,
        }
    }

    pub fn comps_mut(&mut self, which: AxisAngle) -> &mut Vec<Geometry> {
        match which {
            AxisAngle::Incoming => &mut self.comps_in,
            AxisAngle::Internal => &mut self.comps_internal,
            AxisAngle::Outgoing => &mut self.comps_out,
        }
    }

    /// True iff all three angles lie within their limits.
    pub fn angles_within_limits(&self) -> bool {
        self.limits_in.contains(self.angle_in)
            && self.limits_internal.contains(self.angle_internal)
            && self.limits_out.contains(self.angle_out)
    }
}

/// Arena index of the monochromator axis.
pub const AXIS_MONO: usize = 0;
/// Arena index of the sample axis.
pub const AXIS_SAMPLE: usize = 1;
/// Arena index of the analyser axis.
pub const AXIS_ANA: usize = 2;

type UpdateHandler = Box<dyn Fn() + Send + Sync>;

/// The triple-axis instrument: a chain of three axes.
pub struct Instrument {
    axes: Vec<Axis>,
    update_handlers: Vec<UpdateHandler>,
}

impl Clone for Instrument {
    fn clone(&self) -> Self {
        // update subscribers stay with the original
        Self {
            axes: self.axes.clone(),
            update_handlers: vec![],
        }
    }
}

impl std::fmt::Debug for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrument").field("axes", &self.axes).finish()
    }
}

impl Default for Instrument {
    fn default() -> Self {
        Self::new()
    }
}

impl Instrument {
    pub fn new() -> Self {
        Self {
            axes: vec![
                Axis::new("monochromator", None),
                Axis::new("sample", Some(AXIS_MONO)),
                Axis::new("analyser", Some(AXIS_SAMPLE)),
            ],
            update_handlers: vec![],
        }
    }

    pub fn axis(&self, idx: usize) -> &Axis {
        &self.axes[idx]
    }

    pub fn axis_mut(&mut self, idx: usize) -> &mut Axis {
        &mut self.axes[idx]
    }

    pub fn monochromator(&self) -> &Axis {
        &self.axes[AXIS_MONO]
    }

    pub fn sample(&self) -> &Axis {
        &self.axes[AXIS_SAMPLE]
    }

    pub fn analyser(&self) -> &Axis {
        &self.axes[AXIS_ANA]
    }

    /// Set an axis angle and notify subscribers.
    pub fn set_axis_angle(&mut self, axis_idx: usize, which: AxisAngle, angle: f64) {
        self.axes[axis_idx].set_angle_internal_only(which, angle);
        self.emit_update();
    }

    /// Forward transform of the selected frame of an axis: the predecessor's
    /// outgoing transform, then the axis translation, then the rotation of
    /// the selected angle.
    pub fn axis_trafo(&self, axis_idx: usize, which: AxisAngle) -> Trafo {
        let axis = &self.axes[axis_idx];

        let prev = match axis.prev() {
            Some(prev_idx) => self.axis_trafo(prev_idx, AxisAngle::Outgoing),
            None => Trafo::identity(),
        };

        let pos = axis.pos();
        let mut trafo = prev
            .compose(&Trafo::translation(pos[0], pos[1]))
            .compose(&Trafo::rotation(axis.angle(AxisAngle::Incoming)));

        match which {
            AxisAngle::Incoming => {}
            AxisAngle::Internal => {
                trafo = trafo.compose(&Trafo::rotation(axis.angle(AxisAngle::Internal)));
            }
            AxisAngle::Outgoing => {
                trafo = trafo.compose(&Trafo::rotation(axis.angle(AxisAngle::Outgoing)));
            }
        }

        trafo
    }

    pub fn add_update_handler(&mut self, handler: UpdateHandler) {
        self.update_handlers.push(handler);
    }

    pub fn emit_update(&self) {
        for handler in &self.update_handlers {
            handler();
        }
    }

    pub fn clear(&mut self) {
        for axis in &mut self.axes {
            axis.comps_in.clear();
            axis.comps_internal.clear();
            axis.comps_out.clear();
        }
        self.update_handlers.clear();
    }
}

//! Reciprocal-space collaborator interface.
//!
//! The engine itself performs no crystallographic calculations; it only
//! needs the per-axis scattering senses and the fixed-wavevector selection
//! from the surrounding TAS calculator.

/// Read-only view of the TAS calculator state the planner depends on.
#[derive(Clone, Debug)]
pub struct TasCalculator {
    senses_ccw: [f64; 3],
    kfix: f64,
    kf_fixed: bool,
}

impl Default for TasCalculator {
    fn default() -> Self {
        Self {
            senses_ccw: [1., -1., 1.],
            kfix: 2.662,
            kf_fixed: true,
        }
    }
}

impl TasCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-axis scattering senses, each `-1` or `+1`, in the order
    /// monochromator, sample, analyser.
    pub fn scattering_senses(&self) -> &[f64; 3] {
        &self.senses_ccw
    }

    pub fn set_scattering_senses(&mut self, senses: [f64; 3]) {
        self.senses_ccw = senses;
    }

    /// The fixed wavevector and whether kf (true) or ki (false) is kept
    /// fixed. With kf fixed the monochromator carries the independent `a2`
    /// scattering angle, otherwise the analyser does.
    pub fn kfix(&self) -> (f64, bool) {
        (self.kfix, self.kf_fixed)
    }

    pub fn set_kfix(&mut self, kfix: f64, kf_fixed: bool) {
        self.kfix = kfix;
        self.kf_fixed = kf_fixed;
    }
}

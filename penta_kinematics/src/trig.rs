//! Memoized sin/cos of the rotary angles.
//!
//! The transforms evaluate sin/cos of (A, C) for every point; on paths where
//! the orientation drifts slowly this recomputes far more often than the
//! chord-error budget requires. The cache keeps the last sampled pair and
//! only recomputes when either angle moved by more than the tolerance
//! derived from the machine geometry (see
//! [`PivotGeometry::trig_tolerance_deg`](crate::settings::PivotGeometry::trig_tolerance_deg)).

/// One sampled set of rotary trig values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrigSample {
    pub sin_a: f32,
    pub cos_a: f32,
    pub sin_c: f32,
    pub cos_c: f32,
}

impl TrigSample {
    /// Exact evaluation at the given angles [degrees].
    pub fn compute(a_deg: f32, c_deg: f32) -> Self {
        let (sin_a, cos_a) = a_deg.to_radians().sin_cos();
        let (sin_c, cos_c) = c_deg.to_radians().sin_cos();
        Self {
            sin_a,
            cos_a,
            sin_c,
            cos_c,
        }
    }
}

/// Trig cache for the inverse-transform hot path.
///
/// Single writer: only the inverse transform updates it. The forward
/// transform computes locally because it may run from the reporting context
/// concurrently with an in-progress inverse transform.
#[derive(Debug, Clone)]
pub struct TrigCache {
    last_a: f32,
    last_c: f32,
    sample: TrigSample,
    valid: bool,
    tol_deg: f32,
}

impl TrigCache {
    /// New invalid cache with the given angular tolerance [degrees].
    pub fn new(tol_deg: f32) -> Self {
        Self {
            last_a: 0.0,
            last_c: 0.0,
            sample: TrigSample::compute(0.0, 0.0),
            valid: false,
            tol_deg,
        }
    }

    /// Trig values for (A, C), reusing the cached sample when both angles
    /// are within tolerance of the last computed pair.
    pub fn lookup(&mut self, a_deg: f32, c_deg: f32) -> TrigSample {
        if !self.valid
            || (a_deg - self.last_a).abs() > self.tol_deg
            || (c_deg - self.last_c).abs() > self.tol_deg
        {
            self.sample = TrigSample::compute(a_deg, c_deg);
            self.last_a = a_deg;
            self.last_c = c_deg;
            self.valid = true;
        }
        self.sample
    }

    /// Drop the cached sample. Call on geometry changes, homing completion
    /// and mode transitions.
    #[inline]
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Replace the angular tolerance and drop the cached sample.
    pub fn set_tolerance(&mut self, tol_deg: f32) {
        self.tol_deg = tol_deg;
        self.valid = false;
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn tolerance_deg(&self) -> f32 {
        self.tol_deg
    }
}

impl Default for TrigCache {
    fn default() -> Self {
        Self::new(0.001)
    }
}

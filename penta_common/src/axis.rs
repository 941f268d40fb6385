//! Axis layout and coordinate primitives.
//!
//! A move is a vector of [`N_AXIS`] floats: three linear joints (mm) followed
//! by the rotary inclination axis A and the rotary azimuth axis C (degrees).

use bitflags::bitflags;
use static_assertions::const_assert;

/// Number of controlled axes.
pub const N_AXIS: usize = 5;

/// Linear X joint index.
pub const X_AXIS: usize = 0;
/// Linear Y joint index.
pub const Y_AXIS: usize = 1;
/// Linear Z joint index.
pub const Z_AXIS: usize = 2;
/// Rotary inclination axis index (tilt about X, degrees).
pub const A_AXIS: usize = 3;
/// Rotary azimuth axis index (spin about Z, degrees).
pub const C_AXIS: usize = 4;

// AxisMask is a u8 bit-per-index mask; the rotary axes must sit above Z.
const_assert!(N_AXIS <= 8);
const_assert!(A_AXIS > Z_AXIS && C_AXIS > A_AXIS && C_AXIS < N_AXIS);

/// One coordinate per axis: mm for X/Y/Z, degrees for A/C.
pub type Coords = [f32; N_AXIS];

bitflags! {
    /// Axis selection mask with a 1-bit-per-index layout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisMask: u8 {
        const X = 1 << X_AXIS;
        const Y = 1 << Y_AXIS;
        const Z = 1 << Z_AXIS;
        const A = 1 << A_AXIS;
        const C = 1 << C_AXIS;
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::empty()
    }
}

impl AxisMask {
    /// Mask with the single bit for axis index `idx` set.
    #[inline]
    pub const fn from_index(idx: usize) -> Self {
        Self::from_bits_truncate(1 << idx)
    }

    /// Returns true if the bit for axis index `idx` is set.
    #[inline]
    pub const fn has(&self, idx: usize) -> bool {
        self.bits() & (1 << idx) != 0
    }
}

/// Euclidean distance over all axes.
#[inline]
pub fn distance(p0: &Coords, p1: &Coords) -> f32 {
    let mut acc = 0.0f32;
    for idx in 0..N_AXIS {
        let d = p0[idx] - p1[idx];
        acc += d * d;
    }
    acc.sqrt()
}

/// Euclidean distance over the linear axes only.
#[inline]
pub fn linear_distance(p0: &Coords, p1: &Coords) -> f32 {
    let mut acc = 0.0f32;
    for idx in X_AXIS..=Z_AXIS {
        let d = p0[idx] - p1[idx];
        acc += d * d;
    }
    acc.sqrt()
}

/// Per-axis midpoint of two coordinate vectors.
#[inline]
pub fn midpoint(p0: &Coords, p1: &Coords) -> Coords {
    let mut mid = [0.0f32; N_AXIS];
    for idx in 0..N_AXIS {
        mid[idx] = 0.5 * (p0[idx] + p1[idx]);
    }
    mid
}

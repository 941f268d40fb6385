//! Forward and inverse AC-head transforms.
//!
//! The machine geometry is an A (tilt about X) axis nested inside a C (spin
//! about Z) axis, meeting at the pivot point. The inverse transform maps an
//! operator-frame TCP point to joint coordinates:
//!
//! ```text
//! Q = pivot + Ra · Rc · (P − pivot)
//! ```
//!
//! with the A-to-C axis offsets `(dy, dz)` folded into the A-stage, and the
//! active tool-length offset combined into `dz` so the tool tip stays
//! spatially fixed under re-orientation. Leaving the TLO out of the rotation
//! produces a TCP error of roughly `TLO · sin A`.
//!
//! The forward transform applies the inverse rotations in reverse order and
//! restores the TLO on the returned Z so reported coordinates stay in the
//! operator's TLO-inclusive frame. It computes its trig locally: it may be
//! called from the reporting context while an inverse transform is mid-way
//! through a cache update.

use penta_common::axis::{A_AXIS, C_AXIS, Coords, X_AXIS, Y_AXIS, Z_AXIS};

use crate::settings::PivotGeometry;
use crate::trig::{TrigCache, TrigSample};

/// Rotary angles below this magnitude [degrees] are treated as zero and the
/// transforms collapse to identity without touching trigonometry.
pub const ROTARY_EPSILON_DEG: f32 = 0.001;

/// Inverse kinematics: TCP Cartesian point to joint point.
///
/// A, C and any axis above Z pass through unchanged. `tlo_z` is the active
/// tool-length offset on Z as tracked by the parser.
pub fn inverse(
    geometry: &PivotGeometry,
    cache: &mut TrigCache,
    tlo_z: f32,
    position: &Coords,
) -> Coords {
    let a_deg = position[A_AXIS];
    let c_deg = position[C_AXIS];

    if a_deg.abs() < ROTARY_EPSILON_DEG && c_deg.abs() < ROTARY_EPSILON_DEG {
        return *position;
    }

    let t = cache.lookup(a_deg, c_deg);

    let dy = geometry.axis_offset_y;
    let dz = geometry.axis_offset_z + tlo_z;

    // Into the pivot frame, with the TLO taken off Z so it can re-enter
    // through the rotation stage.
    let px = position[X_AXIS] - geometry.pivot_x;
    let py = position[Y_AXIS] - geometry.pivot_y;
    let pz = (position[Z_AXIS] - tlo_z) - geometry.pivot_z;

    // C rotation about Z; Z is unchanged by this stage.
    let xc = px * t.cos_c - py * t.sin_c;
    let yc = px * t.sin_c + py * t.cos_c;

    // A rotation about X with the axis offsets folded in.
    let y_rot = yc * t.cos_a - pz * t.sin_a - t.cos_a * dy + t.sin_a * dz + dy;
    let z_rot = yc * t.sin_a + pz * t.cos_a - t.sin_a * dy - t.cos_a * dz + dz;

    let mut target = *position;
    target[X_AXIS] = xc + geometry.pivot_x;
    target[Y_AXIS] = y_rot + geometry.pivot_y;
    target[Z_AXIS] = z_rot + geometry.pivot_z;
    target
}

/// Forward kinematics: joint point to TCP Cartesian point.
///
/// Exact inverse of [`inverse`]; used for status reports and for the TCP
/// position at the start of a segmented move.
pub fn forward(geometry: &PivotGeometry, tlo_z: f32, joint: &Coords) -> Coords {
    let a_deg = joint[A_AXIS];
    let c_deg = joint[C_AXIS];

    if a_deg.abs() < ROTARY_EPSILON_DEG && c_deg.abs() < ROTARY_EPSILON_DEG {
        return *joint;
    }

    // Local trig; the shared cache belongs to the inverse transform.
    let t = TrigSample::compute(a_deg, c_deg);

    let dy = geometry.axis_offset_y;
    let dz = geometry.axis_offset_z + tlo_z;

    let px = joint[X_AXIS] - geometry.pivot_x;
    let py = joint[Y_AXIS] - dy - geometry.pivot_y;
    let pz = joint[Z_AXIS] - dz - geometry.pivot_z;

    // Undo the A rotation.
    let yt = t.cos_a * py + t.sin_a * pz + dy;
    let zi = -t.sin_a * py + t.cos_a * pz + dz;

    // Undo the C rotation.
    let xi = t.cos_c * px + t.sin_c * yt;
    let yi = -t.sin_c * px + t.cos_c * yt;

    let mut target = *joint;
    target[X_AXIS] = xi + geometry.pivot_x;
    target[Y_AXIS] = yi + geometry.pivot_y;
    target[Z_AXIS] = zi + geometry.pivot_z + tlo_z;
    target
}

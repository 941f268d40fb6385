//! Travel-limit hook contract and the host-native implementation.
//!
//! The host exposes two replaceable hooks: a validity check for a target
//! point and a destination clip for interactive jogs. A kinematics module
//! that installs its own hooks records the prior implementation and
//! delegates to it for the cases it does not fully handle.

use crate::axis::{AxisMask, Coords, N_AXIS};
use crate::machine::Machine;

/// Replaceable travel-limit hook pair.
pub trait TravelLimits {
    /// Returns true when `target` lies within the machine's travel limits.
    ///
    /// `is_cartesian` tells whether `target` is a Cartesian (TCP-frame) or a
    /// joint-frame point. Only axes that are both homed and selected in
    /// `axes` are checked.
    fn check(
        &mut self,
        target: &Coords,
        axes: AxisMask,
        is_cartesian: bool,
        machine: &Machine,
    ) -> bool;

    /// Clip a jog destination into the valid envelope.
    ///
    /// `position` is the current (assumed valid) position; `None` means no
    /// reference is available and the destination is left untouched.
    fn clip(&mut self, target: &mut Coords, position: Option<&Coords>, machine: &Machine);
}

/// The host's native Cartesian-only limit hooks.
///
/// The check rejects joint-frame input unconditionally — non-trivial
/// kinematics must interpose their own hook to validate joint points. The
/// clip is a straight per-axis clamp, which is only correct when the
/// Cartesian and joint envelopes coincide.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartesianLimits;

impl TravelLimits for CartesianLimits {
    fn check(
        &mut self,
        target: &Coords,
        axes: AxisMask,
        is_cartesian: bool,
        machine: &Machine,
    ) -> bool {
        if !is_cartesian {
            return false;
        }
        let checked = machine.sys.homed & axes;
        for idx in 0..N_AXIS {
            if checked.has(idx) && !machine.sys.work_envelope.contains(idx, target[idx]) {
                return false;
            }
        }
        true
    }

    fn clip(&mut self, target: &mut Coords, _position: Option<&Coords>, machine: &Machine) {
        for idx in 0..N_AXIS {
            if machine.sys.homed.has(idx) {
                let env = &machine.sys.work_envelope;
                target[idx] = target[idx].clamp(env.min[idx], env.max[idx]);
            }
        }
    }
}

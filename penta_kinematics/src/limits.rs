//! Joint-frame travel-limit hooks.
//!
//! The host's native check only understands Cartesian targets and rejects
//! joint-frame input unconditionally; its clip is a per-axis clamp. Neither
//! survives a non-linear kinematic: the segmenter validates joint points,
//! and a jog destination inside the Cartesian box can still leave the joint
//! envelope. This module replaces both hooks, delegating to the recorded
//! prior implementation for everything it does not handle itself.

use penta_common::axis::{AxisMask, Coords, N_AXIS, midpoint};
use penta_common::limits::TravelLimits;
use penta_common::machine::Machine;

use crate::engine::RtcpKinematics;

/// Bisection depth for the jog clip; resolves the boundary to 1/2^16 of the
/// commanded span.
pub const BISECTION_ITERATIONS: u32 = 16;

impl TravelLimits for RtcpKinematics {
    fn check(
        &mut self,
        target: &Coords,
        axes: AxisMask,
        is_cartesian: bool,
        machine: &Machine,
    ) -> bool {
        if !self.enabled() {
            return self.prior_limits.check(target, axes, is_cartesian, machine);
        }

        let motors = if is_cartesian {
            self.to_joint(machine, target)
        } else {
            *target
        };

        let checked = machine.sys.homed & axes;
        for idx in 0..N_AXIS {
            if checked.has(idx) && !machine.sys.work_envelope.contains(idx, motors[idx]) {
                return false;
            }
        }

        // Joint-frame limits passed; a Cartesian input must additionally
        // satisfy the native Cartesian check. Joint-frame input skips it —
        // the native check would reject unconditionally.
        if is_cartesian && !self.prior_limits.check(target, axes, true, machine) {
            return false;
        }

        true
    }

    fn clip(&mut self, target: &mut Coords, position: Option<&Coords>, machine: &Machine) {
        if machine.sys.homed.is_empty() {
            return;
        }
        let Some(position) = position else {
            return;
        };
        if self.check(target, machine.sys.soft_limits, true, machine) {
            return;
        }

        // A per-axis clamp is wrong here: validity is not monotonic per
        // Cartesian axis once the rotations couple them. Bisect along the
        // commanded line between the current (valid) position and the
        // (invalid) destination, keeping the farthest valid midpoint.
        let mut start = *position;
        let mut end = *target;
        let mut best = *position;

        for _ in 0..BISECTION_ITERATIONS {
            let mid = midpoint(&start, &end);
            if self.check(&mid, machine.sys.soft_limits, true, machine) {
                best = mid;
                start = mid;
            } else {
                end = mid;
            }
        }

        *target = best;
    }
}

//! Homing hooks.
//!
//! The linear joints are independent, so the per-axis mapping is 1:1 and the
//! position bookkeeping matches the host's native behavior. The one
//! kinematic obligation is invalidating the trig cache once the counters
//! move: a cached sample keyed to pre-homing angles must not survive.

use penta_common::axis::{AxisMask, N_AXIS};
use penta_common::machine::Machine;
use tracing::debug;

use crate::engine::RtcpKinematics;

impl RtcpKinematics {
    /// Establish machine positions for the axes in `cycle` after homing.
    pub(crate) fn homing_set_machine_positions(&mut self, machine: &mut Machine, cycle: AxisMask) {
        let homing = machine.settings.homing;
        for idx in 0..N_AXIS {
            if !cycle.has(idx) {
                continue;
            }
            if homing.force_set_origin {
                machine.sys.position[idx] = 0;
                machine.sys.home_position[idx] = 0.0;
            } else {
                let axis = machine.settings.axis[idx];
                let home = if homing.dir_mask.has(idx) {
                    axis.max_travel + homing.pulloff
                } else {
                    -homing.pulloff
                };
                machine.sys.home_position[idx] = home;
                machine.sys.position[idx] = (home * axis.steps_per_mm).round() as i32;
            }
        }

        // The counters moved; any cached trig sample is stale.
        self.invalidate_cache();
        debug!(cycle = ?cycle, "machine positions set after homing");
    }
}

//! The kinematics plug-in contract.
//!
//! A kinematics module translates between the operator's tool-center-point
//! Cartesian frame and the machine's joint frame. The host calls the eight
//! operations below; everything else (planning, step generation, homing
//! sequencing) stays on the host side.
//!
//! [`CartesianKinematics`] is the trivial identity implementation. It exists
//! to document the contract; machines with linear, independent axes behave
//! this way natively.

use crate::axis::{AxisMask, Coords, N_AXIS};
use crate::machine::Machine;
use crate::planner::PlanData;

/// Phase of a homing cycle, passed to the feed-rate hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingMode {
    /// Fast approach toward the switch.
    Seek,
    /// Slow re-approach for the precise trigger point.
    Locate,
    /// Retraction off the switch.
    Pulloff,
}

/// The eight-operation kinematics plug-in contract.
///
/// # Call flow for one linear move
///
/// 1. `segment_line(target, position, pl_data, init=true)` — validates the
///    destination, plans the segmentation, returns the joint-frame endpoint.
/// 2. `segment_line(.., init=false)` repeatedly — each call yields the next
///    joint-frame point (with `pl_data.feed_rate` scaled for TCP speed), or
///    `None` when the move is drained. The host restores the programmed feed
///    rate after every segment.
pub trait Kinematics {
    /// Inverse transform: TCP Cartesian point to joint point.
    fn transform_from_cartesian(&mut self, position: &Coords, machine: &Machine) -> Coords;

    /// Joint step counters to the TCP Cartesian position (for status/DRO).
    ///
    /// Implementations convert steps to mm themselves; calling back into a
    /// generic host helper would recurse into this very function.
    fn transform_steps_to_cartesian(&self, steps: &[i32; N_AXIS], machine: &Machine) -> Coords;

    /// Segment one linear move; see the trait-level call flow.
    fn segment_line(
        &mut self,
        target: &Coords,
        position: &Coords,
        pl_data: &mut PlanData,
        init: bool,
        machine: &Machine,
    ) -> Option<Coords>;

    /// Limit-switch mask for a joint index; 1:1 for independent axes.
    fn limits_get_axis_mask(&self, idx: usize) -> AxisMask {
        AxisMask::from_index(idx)
    }

    /// Zero the joint counter of the axis being homed.
    fn limits_set_target_pos(&self, machine: &mut Machine, idx: usize) {
        machine.sys.position[idx] = 0;
    }

    /// Establish machine positions after the axes in `cycle` finished homing.
    fn limits_set_machine_positions(&mut self, machine: &mut Machine, cycle: AxisMask);

    /// Whether the given homing cycle mask is executable. Always true for
    /// independent axes.
    fn homing_cycle_validate(&self, _cycle: AxisMask) -> bool {
        true
    }

    /// Per-cycle homing feed rate; pass-through for independent axes.
    fn homing_cycle_get_feedrate(&self, _cycle: AxisMask, feed_rate: f32, _mode: HomingMode) -> f32 {
        feed_rate
    }
}

/// Identity kinematics for a plain Cartesian machine.
#[derive(Debug, Default)]
pub struct CartesianKinematics {
    iterations: u8,
    trsf: Coords,
}

impl CartesianKinematics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Kinematics for CartesianKinematics {
    fn transform_from_cartesian(&mut self, position: &Coords, _machine: &Machine) -> Coords {
        *position
    }

    fn transform_steps_to_cartesian(&self, steps: &[i32; N_AXIS], machine: &Machine) -> Coords {
        let mut position = [0.0f32; N_AXIS];
        for idx in 0..N_AXIS {
            position[idx] = steps[idx] as f32 / machine.settings.axis[idx].steps_per_mm;
        }
        position
    }

    fn segment_line(
        &mut self,
        target: &Coords,
        _position: &Coords,
        _pl_data: &mut PlanData,
        init: bool,
        _machine: &Machine,
    ) -> Option<Coords> {
        // A straight Cartesian move needs no subdivision: one segment.
        if init {
            self.iterations = 2;
            self.trsf = *target;
        }
        if self.iterations == 0 {
            return None;
        }
        self.iterations -= 1;
        Some(self.trsf)
    }

    fn limits_set_machine_positions(&mut self, machine: &mut Machine, cycle: AxisMask) {
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
    }
}

//! Host-owned machine state visible to kinematics modules.
//!
//! The host (interpreter + planner foreground) owns a [`Machine`] bundle and
//! passes it into every plug-in operation: read-only for the transforms and
//! the segmenter, mutable for the homing hooks.

use crate::axis::{AxisMask, Coords, N_AXIS};

/// Joint-frame work envelope: per-axis soft-limit bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkEnvelope {
    /// Per-axis lower bound (mm / degrees).
    pub min: Coords,
    /// Per-axis upper bound (mm / degrees).
    pub max: Coords,
}

impl WorkEnvelope {
    /// Returns true if `value` lies within the bounds of axis `idx`.
    #[inline]
    pub fn contains(&self, idx: usize, value: f32) -> bool {
        value >= self.min[idx] && value <= self.max[idx]
    }
}

impl Default for WorkEnvelope {
    fn default() -> Self {
        Self {
            min: [-200.0; N_AXIS],
            max: [200.0; N_AXIS],
        }
    }
}

/// Static per-axis drive parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSettings {
    /// Step resolution [steps/mm, steps/degree for rotary axes].
    pub steps_per_mm: f32,
    /// Signed travel span used to place the home position.
    pub max_travel: f32,
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self {
            steps_per_mm: 250.0,
            max_travel: 200.0,
        }
    }
}

/// Homing cycle parameters shared by all axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HomingSettings {
    /// Force the origin to zero after homing instead of deriving it from
    /// travel direction and pulloff.
    pub force_set_origin: bool,
    /// Axes that home toward their positive travel end.
    pub dir_mask: AxisMask,
    /// Post-homing retraction distance [mm].
    pub pulloff: f32,
}

/// Full machine settings record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MachineSettings {
    /// Per-axis drive parameters.
    pub axis: [AxisSettings; N_AXIS],
    /// Homing parameters.
    pub homing: HomingSettings,
}

/// Volatile system state owned by the motion foreground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemState {
    /// Joint step counters.
    pub position: [i32; N_AXIS],
    /// Home position per axis [mm / degrees].
    pub home_position: Coords,
    /// Axes with a completed homing cycle.
    pub homed: AxisMask,
    /// Axes with soft limits enforced.
    pub soft_limits: AxisMask,
    /// Joint-frame soft-limit envelope.
    pub work_envelope: WorkEnvelope,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            position: [0; N_AXIS],
            home_position: [0.0; N_AXIS],
            homed: AxisMask::empty(),
            soft_limits: AxisMask::all(),
            work_envelope: WorkEnvelope::default(),
        }
    }
}

/// The slice of parser state the kinematics layer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GcodeState {
    /// Active tool-length offset per axis; the Z entry is the TLO proper.
    pub tool_length_offset: Coords,
}

/// Host-owned state bundle passed into every kinematics operation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Machine {
    pub settings: MachineSettings,
    pub sys: SystemState,
    pub gcode: GcodeState,
}

impl Machine {
    /// Current joint position in mm/degrees, converted from the step counters.
    pub fn joint_position(&self) -> Coords {
        let mut mpos = [0.0f32; N_AXIS];
        for idx in 0..N_AXIS {
            mpos[idx] = self.sys.position[idx] as f32 / self.settings.axis[idx].steps_per_mm;
        }
        mpos
    }

    /// Set the joint step counters from a position in mm/degrees.
    pub fn set_joint_position(&mut self, position: &Coords) {
        for idx in 0..N_AXIS {
            self.sys.position[idx] =
                (position[idx] * self.settings.axis[idx].steps_per_mm).round() as i32;
        }
    }
}

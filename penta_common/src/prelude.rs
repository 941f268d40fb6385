//! Prelude module for common re-exports.
//!
//! `use penta_common::prelude::*;` pulls in the types needed to implement or
//! drive a kinematics module without listing individual paths.

// ─── Axis Layout ────────────────────────────────────────────────────
pub use crate::axis::{
    A_AXIS, AxisMask, C_AXIS, Coords, N_AXIS, X_AXIS, Y_AXIS, Z_AXIS, distance, linear_distance,
    midpoint,
};

// ─── Machine State ──────────────────────────────────────────────────
pub use crate::machine::{
    AxisSettings, GcodeState, HomingSettings, Machine, MachineSettings, SystemState, WorkEnvelope,
};

// ─── Planner Data ───────────────────────────────────────────────────
pub use crate::planner::{McodeBlock, PlanCondition, PlanData};

// ─── Contracts ──────────────────────────────────────────────────────
pub use crate::kinematics::{CartesianKinematics, HomingMode, Kinematics};
pub use crate::limits::{CartesianLimits, TravelLimits};

//! # PENTA 5-Axis RTCP Kinematics
//!
//! Kinematics engine for an AC-head 5-axis machine: keeps the tool center
//! point (TCP) stationary in Cartesian space while the rotary axes
//! re-orient, by folding the rotations about the pivot (and the active
//! tool-length offset) into the linear joint targets.
//!
//! The engine plugs into the host motion foreground through the
//! [`penta_common::kinematics::Kinematics`] contract and replaces the host's
//! travel-limit hooks with joint-frame aware versions
//! ([`penta_common::limits::TravelLimits`]).
//!
//! ## Module Structure
//!
//! - [`transform`] - forward/inverse AC transforms with TLO folding
//! - [`trig`] - memoized sin/cos of (A, C) under a geometry-derived tolerance
//! - [`segment`] - chord-error-bounded move segmentation + feed compensation
//! - [`limits`] - joint-frame validity check and bisection jog clipping
//! - [`homing`] - per-axis homing hooks
//! - [`mode`] - M450/M451 mode control
//! - [`settings`] - persisted pivot/offset geometry ($640-$644)
//! - [`report`] - `$RTCP` diagnostics and status tokens
//! - [`engine`] - the [`engine::RtcpKinematics`] module state and contract impl

pub mod engine;
pub mod homing;
pub mod limits;
pub mod mode;
pub mod report;
pub mod segment;
pub mod settings;
pub mod transform;
pub mod trig;

pub use engine::RtcpKinematics;
pub use settings::{PivotGeometry, SettingsError, SettingsStore};

//! Engine state and the plug-in contract implementation.
//!
//! [`RtcpKinematics`] owns everything the module needs at runtime: the
//! read-only geometry snapshot, the trig cache, the per-move segmentation
//! cursor, the mode flag and the jog-cancel flag. The host installs it once
//! at startup, handing over the prior travel-limit implementation (and
//! optionally the prior jog-cancel handler) so every hook that does not
//! fully handle a call can delegate down the chain.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use penta_common::axis::{AxisMask, Coords, N_AXIS, Z_AXIS};
use penta_common::kinematics::Kinematics;
use penta_common::limits::{CartesianLimits, TravelLimits};
use penta_common::machine::Machine;
use penta_common::planner::PlanData;
use tracing::{debug, info};

use crate::segment::SegmentCursor;
use crate::settings::PivotGeometry;
use crate::transform;
use crate::trig::TrigCache;

/// Prior jog-cancel handler recorded at install time.
pub type JogCancelHandler = Box<dyn Fn() + Send + Sync>;

/// The 5-axis RTCP kinematics module.
///
/// Single-writer discipline: the motion foreground drives every `&mut self`
/// operation in sequence. The forward transform and the status reports take
/// `&self` and never touch the trig cache; `enabled` and the jog-cancel flag
/// are single-word atomics readable from any context.
pub struct RtcpKinematics {
    geometry: PivotGeometry,
    cache: TrigCache,
    pub(crate) cursor: SegmentCursor,
    enabled: AtomicBool,
    jog_cancel: Arc<AtomicBool>,
    pub(crate) prior_limits: Box<dyn TravelLimits + Send>,
    prior_jog_cancel: Option<JogCancelHandler>,
}

impl RtcpKinematics {
    /// New engine over the host's native Cartesian limit hooks.
    pub fn new(geometry: PivotGeometry) -> Self {
        Self::install(geometry, Box::new(CartesianLimits), None)
    }

    /// Install the module, recording the prior hook implementations.
    ///
    /// Starts in pure Cartesian mode (`enabled = false`).
    pub fn install(
        geometry: PivotGeometry,
        prior_limits: Box<dyn TravelLimits + Send>,
        prior_jog_cancel: Option<JogCancelHandler>,
    ) -> Self {
        let cache = TrigCache::new(geometry.trig_tolerance_deg());
        info!(%geometry, "RTCP kinematics installed");
        Self {
            geometry,
            cache,
            cursor: SegmentCursor::default(),
            enabled: AtomicBool::new(false),
            jog_cancel: Arc::new(AtomicBool::new(false)),
            prior_limits,
            prior_jog_cancel,
        }
    }

    /// Refresh the geometry working copy after a settings change.
    ///
    /// Re-derives the trig-cache tolerance and drops the cached sample.
    pub fn reload_geometry(&mut self, geometry: PivotGeometry) {
        self.geometry = geometry;
        self.cache.set_tolerance(geometry.trig_tolerance_deg());
        debug!(%geometry, tol_deg = self.cache.tolerance_deg(), "geometry reloaded");
    }

    /// The active geometry snapshot.
    #[inline]
    pub fn geometry(&self) -> &PivotGeometry {
        &self.geometry
    }

    /// Whether RTCP compensation is active.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the trig cache currently holds a valid sample.
    #[inline]
    pub fn cache_valid(&self) -> bool {
        self.cache.is_valid()
    }

    /// Drop the cached trig sample.
    #[inline]
    pub(crate) fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// Shared handle for asynchronous contexts to request jog cancellation.
    pub fn jog_cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.jog_cancel)
    }

    /// Jog-cancel event hook: raise the flag and delegate to the prior
    /// handler.
    pub fn on_jog_cancel(&self) {
        self.jog_cancel.store(true, Ordering::Relaxed);
        if let Some(prior) = &self.prior_jog_cancel {
            prior();
        }
    }

    #[inline]
    pub(crate) fn jog_cancelled(&self) -> bool {
        self.jog_cancel.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn clear_jog_cancel(&self) {
        self.jog_cancel.store(false, Ordering::Relaxed);
    }

    /// Raw inverse transform against the current geometry and parser TLO.
    pub(crate) fn to_joint(&mut self, machine: &Machine, position: &Coords) -> Coords {
        let tlo_z = machine.gcode.tool_length_offset[Z_AXIS];
        transform::inverse(&self.geometry, &mut self.cache, tlo_z, position)
    }

    /// Raw forward transform against the current geometry and parser TLO.
    pub(crate) fn to_cartesian(&self, machine: &Machine, joint: &Coords) -> Coords {
        let tlo_z = machine.gcode.tool_length_offset[Z_AXIS];
        transform::forward(&self.geometry, tlo_z, joint)
    }
}

impl Kinematics for RtcpKinematics {
    fn transform_from_cartesian(&mut self, position: &Coords, machine: &Machine) -> Coords {
        if !self.enabled() {
            return *position;
        }
        self.to_joint(machine, position)
    }

    fn transform_steps_to_cartesian(&self, steps: &[i32; N_AXIS], machine: &Machine) -> Coords {
        // Direct steps→mm conversion; the host's generic helper would route
        // back into this function.
        let mut mpos = [0.0f32; N_AXIS];
        for idx in 0..N_AXIS {
            mpos[idx] = steps[idx] as f32 / machine.settings.axis[idx].steps_per_mm;
        }
        if !self.enabled() {
            return mpos;
        }
        self.to_cartesian(machine, &mpos)
    }

    fn segment_line(
        &mut self,
        target: &Coords,
        position: &Coords,
        pl_data: &mut PlanData,
        init: bool,
        machine: &Machine,
    ) -> Option<Coords> {
        if init {
            Some(self.segment_init(target, position, pl_data, machine))
        } else {
            self.segment_next(pl_data, machine)
        }
    }

    fn limits_set_machine_positions(&mut self, machine: &mut Machine, cycle: AxisMask) {
        self.homing_set_machine_positions(machine, cycle);
    }
}

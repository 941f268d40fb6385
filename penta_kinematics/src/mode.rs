//! RTCP mode control via user M-codes.
//!
//! `M450` turns compensation off, `M451` turns it on. Both are synchronous:
//! validation marks the parsed block for a motion-buffer drain, so the mode
//! flips only between moves. Turning compensation off while a rotary axis is
//! away from zero changes what the linear coordinates mean, so that
//! transition carries an operator warning.

use penta_common::axis::{A_AXIS, C_AXIS};
use penta_common::machine::Machine;
use penta_common::planner::McodeBlock;
use tracing::{info, warn};

use crate::engine::RtcpKinematics;

/// M-code disabling RTCP compensation.
pub const MCODE_RTCP_OFF: u16 = 450;
/// M-code enabling RTCP compensation.
pub const MCODE_RTCP_ON: u16 = 451;

/// Rotary positions beyond this magnitude [degrees] trigger the
/// disable-time warning.
const ROTARY_WARN_THRESHOLD_DEG: f32 = 0.1;

/// Operator warning emitted when disabling RTCP away from rotary zero.
pub const ROTARY_WARNING: &str = "[MSG:Warning: RTCP off with rotary axes not at zero]";

/// Outcome of a mode-change command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSwitch {
    /// The mode in effect after the command.
    pub enabled: bool,
    /// Warning line for the host stream, if any.
    pub warning: Option<&'static str>,
}

impl RtcpKinematics {
    /// Whether the module claims this M-code.
    #[inline]
    pub fn mcode_handles(mcode: u16) -> bool {
        mcode == MCODE_RTCP_OFF || mcode == MCODE_RTCP_ON
    }

    /// Validate a claimed M-code block: request a motion-buffer drain.
    ///
    /// Returns false for blocks this module does not claim, so the host can
    /// pass them down the prior handler chain.
    pub fn mcode_validate(block: &mut McodeBlock) -> bool {
        if !Self::mcode_handles(block.mcode) {
            return false;
        }
        block.buffer_sync = true;
        true
    }

    /// Execute a mode-change command after the buffer drain.
    ///
    /// Returns `None` for unclaimed M-codes (delegate to the prior
    /// handler); otherwise the resulting mode and any operator warning.
    pub fn mcode_execute(&mut self, machine: &Machine, mcode: u16) -> Option<ModeSwitch> {
        match mcode {
            MCODE_RTCP_OFF => {
                let warning = if self.enabled() {
                    let joint = machine.joint_position();
                    let off_zero = joint[A_AXIS].abs() > ROTARY_WARN_THRESHOLD_DEG
                        || joint[C_AXIS].abs() > ROTARY_WARN_THRESHOLD_DEG;
                    if off_zero {
                        warn!(
                            a = joint[A_AXIS],
                            c = joint[C_AXIS],
                            "RTCP disabled with rotary axes not at zero"
                        );
                    }
                    self.set_enabled(false);
                    self.invalidate_cache();
                    info!("RTCP compensation off");
                    off_zero.then_some(ROTARY_WARNING)
                } else {
                    None
                };
                Some(ModeSwitch {
                    enabled: false,
                    warning,
                })
            }
            MCODE_RTCP_ON => {
                self.set_enabled(true);
                self.invalidate_cache();
                info!("RTCP compensation on");
                Some(ModeSwitch {
                    enabled: true,
                    warning: None,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penta_common::kinematics::Kinematics;

    use crate::settings::PivotGeometry;

    fn engine() -> RtcpKinematics {
        RtcpKinematics::new(PivotGeometry::default())
    }

    #[test]
    fn initial_mode_is_off() {
        let kin = engine();
        assert!(!kin.enabled());
    }

    #[test]
    fn claims_only_450_and_451() {
        assert!(RtcpKinematics::mcode_handles(450));
        assert!(RtcpKinematics::mcode_handles(451));
        assert!(!RtcpKinematics::mcode_handles(452));
        assert!(!RtcpKinematics::mcode_handles(3));
    }

    #[test]
    fn validate_requests_buffer_sync() {
        let mut block = McodeBlock::new(451);
        assert!(RtcpKinematics::mcode_validate(&mut block));
        assert!(block.buffer_sync);

        let mut other = McodeBlock::new(104);
        assert!(!RtcpKinematics::mcode_validate(&mut other));
        assert!(!other.buffer_sync);
    }

    #[test]
    fn enable_then_disable_toggles_and_invalidates() {
        let mut kin = engine();
        let machine = Machine::default();

        let on = kin.mcode_execute(&machine, MCODE_RTCP_ON).unwrap();
        assert!(on.enabled);
        assert!(kin.enabled());

        // Prime the cache, then verify the transition drops it.
        let _ = kin.transform_from_cartesian(&[0.0, 0.0, 0.0, 30.0, 0.0], &machine);
        assert!(kin.cache_valid());

        let off = kin.mcode_execute(&machine, MCODE_RTCP_OFF).unwrap();
        assert!(!off.enabled);
        assert!(off.warning.is_none());
        assert!(!kin.enabled());
        assert!(!kin.cache_valid());
    }

    #[test]
    fn enable_invalidates_cache() {
        let mut kin = engine();
        let machine = Machine::default();
        kin.mcode_execute(&machine, MCODE_RTCP_ON).unwrap();
        let _ = kin.transform_from_cartesian(&[0.0, 0.0, 0.0, 30.0, 0.0], &machine);
        assert!(kin.cache_valid());

        // Re-enabling still passes through the invalidation path.
        kin.mcode_execute(&machine, MCODE_RTCP_ON).unwrap();
        assert!(!kin.cache_valid());
    }

    #[test]
    fn disable_warns_when_rotary_axes_off_zero() {
        let mut kin = engine();
        let mut machine = Machine::default();
        machine.set_joint_position(&[0.0, 0.0, 0.0, 15.0, 0.0]);

        kin.mcode_execute(&machine, MCODE_RTCP_ON).unwrap();
        let off = kin.mcode_execute(&machine, MCODE_RTCP_OFF).unwrap();
        assert_eq!(off.warning, Some(ROTARY_WARNING));
    }

    #[test]
    fn disable_warns_on_c_axis_too() {
        let mut kin = engine();
        let mut machine = Machine::default();
        machine.set_joint_position(&[0.0, 0.0, 0.0, 0.0, -0.2]);

        kin.mcode_execute(&machine, MCODE_RTCP_ON).unwrap();
        let off = kin.mcode_execute(&machine, MCODE_RTCP_OFF).unwrap();
        assert_eq!(off.warning, Some(ROTARY_WARNING));
    }

    #[test]
    fn no_warning_within_threshold() {
        let mut kin = engine();
        let mut machine = Machine::default();
        machine.set_joint_position(&[10.0, 20.0, 30.0, 0.05, -0.05]);

        kin.mcode_execute(&machine, MCODE_RTCP_ON).unwrap();
        let off = kin.mcode_execute(&machine, MCODE_RTCP_OFF).unwrap();
        assert!(off.warning.is_none());
    }

    #[test]
    fn disable_when_already_off_is_silent() {
        let mut kin = engine();
        let mut machine = Machine::default();
        machine.set_joint_position(&[0.0, 0.0, 0.0, 90.0, 0.0]);
        let off = kin.mcode_execute(&machine, MCODE_RTCP_OFF).unwrap();
        assert!(!off.enabled);
        assert!(off.warning.is_none());
    }

    #[test]
    fn unclaimed_mcodes_return_none() {
        let mut kin = engine();
        let machine = Machine::default();
        assert!(kin.mcode_execute(&machine, 104).is_none());
    }
}

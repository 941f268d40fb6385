//! Diagnostics and status reporting.
//!
//! Three host-facing surfaces: the token appended to real-time status
//! reports, the identification string for the options report, and the
//! `$RTCP` diagnostic block. Report text is assembled into fixed-capacity
//! buffers; the reporting context does not allocate.

use core::fmt::{self, Write};

use penta_common::axis::{A_AXIS, C_AXIS, X_AXIS, Y_AXIS, Z_AXIS};
use penta_common::machine::Machine;

use crate::engine::RtcpKinematics;
use crate::settings::{
    SETTING_AXIS_OFFSET_Y, SETTING_AXIS_OFFSET_Z, SETTING_PIVOT_X, SETTING_PIVOT_Y,
    SETTING_PIVOT_Z,
};

/// Identification string appended to the host's options report.
pub const OPTIONS_TOKEN: &str = "[KINEMATICS:5-axis RTCP AC]";

/// Fixed-capacity buffer for the `$RTCP` diagnostic block.
pub type ReportBuffer = heapless::String<512>;

/// Token appended to every real-time status report.
#[inline]
pub fn realtime_token(enabled: bool) -> &'static str {
    if enabled { "|RTCP:ON" } else { "|RTCP:OFF" }
}

impl RtcpKinematics {
    /// Render the `$RTCP` diagnostic block into `out`.
    pub fn write_status<W: Write>(&self, machine: &Machine, out: &mut W) -> fmt::Result {
        let joint = machine.joint_position();
        let tcp = self.to_cartesian(machine, &joint);
        let geometry = self.geometry();

        writeln!(out, "5-axis RTCP status")?;
        writeln!(
            out,
            " Mode: {}",
            if self.enabled() {
                "ON (M451)"
            } else {
                "OFF (M450)"
            }
        )?;
        writeln!(out, " Pivot point:")?;
        writeln!(out, "   ${SETTING_PIVOT_X} X = {:.3} mm", geometry.pivot_x)?;
        writeln!(out, "   ${SETTING_PIVOT_Y} Y = {:.3} mm", geometry.pivot_y)?;
        writeln!(out, "   ${SETTING_PIVOT_Z} Z = {:.3} mm", geometry.pivot_z)?;
        writeln!(out, " Axis offsets:")?;
        writeln!(
            out,
            "   ${SETTING_AXIS_OFFSET_Y} Y = {:.3} mm",
            geometry.axis_offset_y
        )?;
        writeln!(
            out,
            "   ${SETTING_AXIS_OFFSET_Z} Z = {:.3} mm",
            geometry.axis_offset_z
        )?;
        writeln!(
            out,
            " TCP position: X = {:.3} Y = {:.3} Z = {:.3} mm",
            tcp[X_AXIS], tcp[Y_AXIS], tcp[Z_AXIS]
        )?;
        writeln!(
            out,
            " Joint position: X = {:.3} Y = {:.3} Z = {:.3} mm",
            joint[X_AXIS], joint[Y_AXIS], joint[Z_AXIS]
        )?;
        writeln!(
            out,
            " Rotary: A = {:.2} deg, C = {:.2} deg",
            joint[A_AXIS], joint[C_AXIS]
        )?;
        writeln!(
            out,
            " Trig cache: {}",
            if self.cache_valid() { "valid" } else { "invalid" }
        )
    }

    /// The `$RTCP` diagnostic block as an allocation-free buffer.
    pub fn status_report(&self, machine: &Machine) -> ReportBuffer {
        let mut out = ReportBuffer::new();
        // Capacity is sized for the widest field values; a hypothetical
        // overflow truncates the report rather than failing the caller.
        let _ = self.write_status(machine, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penta_common::kinematics::Kinematics;

    use crate::settings::PivotGeometry;

    #[test]
    fn realtime_token_reflects_mode() {
        assert_eq!(realtime_token(true), "|RTCP:ON");
        assert_eq!(realtime_token(false), "|RTCP:OFF");
    }

    #[test]
    fn options_token_identifies_the_module() {
        assert!(OPTIONS_TOKEN.starts_with("[KINEMATICS:"));
        assert!(OPTIONS_TOKEN.ends_with(']'));
    }

    #[test]
    fn status_report_contains_all_sections() {
        let kin = RtcpKinematics::new(PivotGeometry {
            pivot_x: 1.5,
            pivot_y: -2.25,
            pivot_z: 200.0,
            axis_offset_y: 0.5,
            axis_offset_z: -0.75,
        });
        let machine = Machine::default();
        let report = kin.status_report(&machine);

        assert!(report.contains("Mode: OFF (M450)"));
        assert!(report.contains("$640 X = 1.500 mm"));
        assert!(report.contains("$641 Y = -2.250 mm"));
        assert!(report.contains("$642 Z = 200.000 mm"));
        assert!(report.contains("$643 Y = 0.500 mm"));
        assert!(report.contains("$644 Z = -0.750 mm"));
        assert!(report.contains("TCP position:"));
        assert!(report.contains("Joint position:"));
        assert!(report.contains("Rotary: A = 0.00 deg, C = 0.00 deg"));
        assert!(report.contains("Trig cache: invalid"));
    }

    #[test]
    fn status_report_shows_enabled_mode_and_cache_state() {
        let mut kin = RtcpKinematics::new(PivotGeometry::default());
        kin.set_enabled(true);
        let machine = Machine::default();
        let _ = kin.transform_from_cartesian(&[0.0, 0.0, 0.0, 45.0, 0.0], &machine);

        let report = kin.status_report(&machine);
        assert!(report.contains("Mode: ON (M451)"));
        assert!(report.contains("Trig cache: valid"));
    }

    #[test]
    fn status_report_transforms_the_joint_position() {
        let kin = RtcpKinematics::new(PivotGeometry {
            pivot_z: 200.0,
            ..PivotGeometry::default()
        });
        let mut machine = Machine::default();
        machine.set_joint_position(&[0.0, 150.0, 250.0, 90.0, 0.0]);
        machine.gcode.tool_length_offset[Z_AXIS] = 50.0;

        let report = kin.status_report(&machine);
        // forward((0,150,250,90,0)) with TLO 50 is the TCP (0,0,150); the
        // joint line keeps its untransformed 250.
        assert!(report.contains("Z = 150.000 mm"), "{report}");
        assert!(report.contains("Z = 250.000 mm"), "{report}");
        assert!(report.contains("Rotary: A = 90.00 deg, C = 0.00 deg"));
    }
}

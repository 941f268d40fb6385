//! Chord-error-bounded segmentation of linear moves.
//!
//! A linear TCP move with rotary motion maps to a curved joint path. The
//! segmenter subdivides the Cartesian line so that the piecewise-linear
//! joint path stays within the chord-error budget, and scales the planner
//! feed rate per segment so the TCP speed matches what the operator
//! programmed.
//!
//! One move is one init call followed by produce calls until `None`:
//!
//! ```text
//! let endpoint = kin.segment_line(&target, &position, &mut pl, true, &machine);
//! // host soft-limit check against `endpoint` / pl.condition
//! while let Some(q) = kin.segment_line(&target, &position, &mut pl, false, &machine) {
//!     plan_buffer_line(&q, &pl);
//!     pl.feed_rate = programmed;       // host restores after every segment
//!     pl.rate_multiplier = 1.0;
//! }
//! ```

use penta_common::axis::{A_AXIS, C_AXIS, Coords, N_AXIS, Z_AXIS, distance, midpoint};
use penta_common::limits::TravelLimits;
use penta_common::machine::Machine;
use penta_common::planner::PlanData;
use tracing::trace;

use crate::engine::RtcpKinematics;
use crate::transform::ROTARY_EPSILON_DEG;

/// Chord-error budget for feed moves [mm].
pub const MAX_CHORD_ERROR_MM: f32 = 0.01;
/// Relaxed chord-error budget for rapids [mm].
pub const MAX_CHORD_ERROR_RAPID_MM: f32 = 0.5;
/// Upper bound on segments per input move.
pub const MAX_SEGMENTS: u16 = 2000;

/// TCP distances per segment below this [mm] skip feed compensation.
const MIN_FEED_COMP_DISTANCE: f32 = 1e-4;

/// Per-move segmentation state, re-initialized on every init call.
#[derive(Debug, Clone, Default)]
pub struct SegmentCursor {
    /// Remaining produce calls plus one (decrement-then-test protocol).
    iterations: u16,
    /// True when the move was subdivided.
    segmented: bool,
    /// TCP linear distance covered by each segment [mm].
    tcp_distance_per_segment: f32,
    /// Cartesian step per segment.
    delta: Coords,
    /// Rolling Cartesian position of the cursor.
    segment_target: Coords,
    /// Requested Cartesian endpoint.
    final_target: Coords,
    /// Joint position of the previous segment, for feed compensation.
    last_motors: Coords,
}

impl RtcpKinematics {
    /// Init phase: validate the destination, plan the subdivision, return
    /// the joint-frame endpoint.
    pub(crate) fn segment_init(
        &mut self,
        target: &Coords,
        position: &Coords,
        pl_data: &mut PlanData,
        machine: &Machine,
    ) -> Coords {
        self.clear_jog_cancel();

        if !self.enabled() {
            // Bypass: one untransformed segment, Cartesian validation.
            self.cursor = SegmentCursor {
                iterations: 2,
                segmented: false,
                segment_target: *target,
                final_target: *target,
                ..SegmentCursor::default()
            };
            if !pl_data.condition.target_validated {
                pl_data.condition.target_validated = true;
                pl_data.condition.target_valid =
                    self.check(target, machine.sys.soft_limits, true, machine);
            }
            return *target;
        }

        let mpos = self.to_joint(machine, target);

        // Joint-frame validation of the final destination. An invalid
        // target aborts the move in the host's soft-limit pass.
        if !pl_data.condition.target_validated {
            pl_data.condition.target_validated = true;
            pl_data.condition.target_valid =
                self.check(&mpos, machine.sys.soft_limits, false, machine);
        }

        // Current TCP position from the supplied joint position.
        let segment_target = self.to_cartesian(machine, position);

        let mut delta = [0.0f32; N_AXIS];
        let mut dist_sq = 0.0f32;
        let mut rot_delta_a = 0.0f32;
        let mut rot_delta_c = 0.0f32;
        for idx in 0..N_AXIS {
            delta[idx] = target[idx] - segment_target[idx];
            if idx <= Z_AXIS {
                dist_sq += delta[idx] * delta[idx];
            } else if idx == A_AXIS {
                rot_delta_a = delta[idx].abs();
            } else if idx == C_AXIS {
                rot_delta_c = delta[idx].abs();
            }
        }

        let mut cursor = SegmentCursor {
            segmented: rot_delta_a.max(rot_delta_c) > ROTARY_EPSILON_DEG,
            segment_target,
            final_target: *target,
            last_motors: *position,
            delta,
            ..SegmentCursor::default()
        };

        let iterations = if cursor.segmented {
            // Midpoint evaluation: the joint position of the TCP midpoint
            // via the exact transform vs the linear joint interpolation.
            // Captures chord error and linear/rotary cross-coupling alike.
            let tcp_mid = midpoint(&cursor.segment_target, &cursor.final_target);
            let motor_mid_real = self.to_joint(machine, &tcp_mid);

            let mut err_sq = 0.0f32;
            for idx in 0..=Z_AXIS {
                let motor_mid_interp = 0.5 * (position[idx] + mpos[idx]);
                let d = motor_mid_real[idx] - motor_mid_interp;
                err_sq += d * d;
            }

            let tol = if pl_data.condition.rapid_motion {
                MAX_CHORD_ERROR_RAPID_MM
            } else {
                MAX_CHORD_ERROR_MM
            };

            let iterations = if err_sq > tol * tol {
                let err = err_sq.sqrt();
                ((err / tol).sqrt().ceil() * 2.0) as u16
            } else {
                1
            };
            let iterations = iterations.clamp(1, MAX_SEGMENTS);

            for idx in 0..N_AXIS {
                cursor.delta[idx] /= iterations as f32;
            }
            iterations
        } else {
            cursor.segment_target = cursor.final_target;
            1
        };

        cursor.tcp_distance_per_segment = dist_sq.sqrt() / iterations as f32;
        // Plus one: the produce phase decrements before testing.
        cursor.iterations = iterations + 1;

        trace!(
            iterations,
            segmented = cursor.segmented,
            tcp_distance = cursor.tcp_distance_per_segment,
            "segmentation planned"
        );

        self.cursor = cursor;
        mpos
    }

    /// Produce phase: next joint-frame point, or `None` when the move is
    /// drained or a jog cancel was observed.
    pub(crate) fn segment_next(
        &mut self,
        pl_data: &mut PlanData,
        machine: &Machine,
    ) -> Option<Coords> {
        self.cursor.iterations = self.cursor.iterations.saturating_sub(1);

        if !self.enabled() {
            let mpos = self.cursor.final_target;
            return (self.cursor.iterations > 0 && !self.jog_cancelled()).then_some(mpos);
        }

        if self.cursor.segmented && self.cursor.iterations > 1 {
            for idx in 0..N_AXIS {
                self.cursor.segment_target[idx] += self.cursor.delta[idx];
            }
        } else {
            // Final segment lands on the requested endpoint exactly,
            // clearing accumulated increment rounding.
            self.cursor.segment_target = self.cursor.final_target;
        }

        let segment_target = self.cursor.segment_target;
        let mpos = self.to_joint(machine, &segment_target);

        // The programmed feed rate is TCP speed; scale it by the ratio of
        // joint travel to TCP travel for this segment. The host restores
        // the original feed rate before the next produce call.
        if !pl_data.condition.rapid_motion
            && self.cursor.tcp_distance_per_segment > MIN_FEED_COMP_DISTANCE
        {
            let motor_distance = distance(&mpos, &self.cursor.last_motors);
            let rate_multiplier =
                (motor_distance / self.cursor.tcp_distance_per_segment).clamp(0.5, 2.0);
            pl_data.feed_rate *= rate_multiplier;
            pl_data.rate_multiplier = 1.0 / rate_multiplier;
        }

        self.cursor.last_motors = mpos;

        (self.cursor.iterations > 0 && !self.jog_cancelled()).then_some(mpos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penta_common::axis::{AxisMask, X_AXIS, Y_AXIS};
    use penta_common::kinematics::Kinematics;

    use crate::settings::PivotGeometry;

    fn machine() -> Machine {
        let mut machine = Machine::default();
        machine.sys.work_envelope.min = [-1000.0, -1000.0, -1000.0, -360.0, -360.0];
        machine.sys.work_envelope.max = [1000.0, 1000.0, 1000.0, 360.0, 360.0];
        machine
    }

    fn engine(pivot_z: f32) -> RtcpKinematics {
        let kin = RtcpKinematics::new(PivotGeometry {
            pivot_z,
            ..PivotGeometry::default()
        });
        kin.set_enabled(true);
        kin
    }

    /// Drive a whole move through the init/produce protocol the way the
    /// host does, restoring the feed rate after every segment.
    fn run_move(
        kin: &mut RtcpKinematics,
        machine: &Machine,
        position: &Coords,
        target: &Coords,
        pl_data: &mut PlanData,
    ) -> Vec<Coords> {
        let programmed = pl_data.feed_rate;
        let _endpoint = kin
            .segment_line(target, position, pl_data, true, machine)
            .expect("init returns the joint endpoint");
        let mut segments = Vec::new();
        while let Some(q) = kin.segment_line(target, position, pl_data, false, machine) {
            segments.push(q);
            pl_data.feed_rate = programmed;
            pl_data.rate_multiplier = 1.0;
        }
        segments
    }

    #[test]
    fn disabled_mode_emits_one_untransformed_segment() {
        let mut kin = engine(200.0);
        kin.set_enabled(false);
        let machine = machine();
        let mut pl = PlanData::new(600.0);
        let position = [0.0; N_AXIS];
        let target = [10.0, 20.0, 30.0, 90.0, 45.0];

        let endpoint = kin
            .segment_line(&target, &position, &mut pl, true, &machine)
            .unwrap();
        assert_eq!(endpoint, target);
        assert!(pl.condition.target_validated);
        assert!(pl.condition.target_valid);

        let segments: Vec<_> = std::iter::from_fn(|| {
            kin.segment_line(&target, &position, &mut pl, false, &machine)
        })
        .collect();
        assert_eq!(segments, vec![target]);
        assert_eq!(pl.rate_multiplier, 1.0);
    }

    #[test]
    fn pure_linear_move_is_a_single_segment() {
        let mut kin = engine(200.0);
        let machine = machine();
        let mut pl = PlanData::new(600.0);
        let position = [0.0; N_AXIS];
        let target = [500.0, 0.0, 0.0, 0.0, 0.0];

        let segments = run_move(&mut kin, &machine, &position, &target, &mut pl);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0], target);
    }

    #[test]
    fn rotary_move_is_subdivided_and_converges() {
        let mut kin = engine(200.0);
        let machine = machine();
        let mut pl = PlanData::new(600.0);
        let position = [0.0, 0.0, 0.0, 0.0, 0.0];
        let target = [0.0, 0.0, 0.0, 90.0, 0.0];

        let segments = run_move(&mut kin, &machine, &position, &target, &mut pl);
        assert!(segments.len() > 1, "got {} segments", segments.len());
        assert!(segments.len() <= MAX_SEGMENTS as usize);

        // The joint endpoint equals the transform of the requested TCP
        // endpoint; mapping it back recovers the request within 1e-4 mm.
        let last = segments.last().unwrap();
        let tcp = kin.to_cartesian(&machine, last);
        for idx in 0..=Z_AXIS {
            assert!(
                (tcp[idx] - target[idx]).abs() <= 1e-4,
                "axis {idx}: {} vs {}",
                tcp[idx],
                target[idx]
            );
        }
        assert_eq!(last[A_AXIS], 90.0);
    }

    #[test]
    fn chord_error_stays_within_budget() {
        let mut kin = engine(200.0);
        let machine = machine();
        let mut pl = PlanData::new(600.0);
        let position = [0.0, 0.0, 0.0, 0.0, 0.0];
        let target = [40.0, 0.0, 0.0, 90.0, 60.0];

        let start_joint = position;
        let start_tcp = kin.to_cartesian(&machine, &start_joint);
        let segments = run_move(&mut kin, &machine, &position, &target, &mut pl);

        // Re-evaluate the midpoint of every emitted sub-segment against the
        // exact transform.
        let mut prev_joint = start_joint;
        let mut prev_tcp = start_tcp;
        let n = segments.len() as f32;
        for (i, joint) in segments.iter().enumerate() {
            let tcp_here = {
                // The cursor walks the Cartesian line uniformly.
                let frac = (i as f32 + 1.0) / n;
                let mut p = [0.0f32; N_AXIS];
                for idx in 0..N_AXIS {
                    p[idx] = start_tcp[idx] + (target[idx] - start_tcp[idx]) * frac;
                }
                p
            };
            let tcp_mid = midpoint(&prev_tcp, &tcp_here);
            let exact_mid = kin.to_joint(&machine, &tcp_mid);
            let lin_mid = midpoint(&prev_joint, joint);
            let mut err_sq = 0.0f32;
            for idx in 0..=Z_AXIS {
                let d = exact_mid[idx] - lin_mid[idx];
                err_sq += d * d;
            }
            assert!(
                err_sq.sqrt() <= MAX_CHORD_ERROR_MM * 1.5,
                "segment {i}: chord error {}",
                err_sq.sqrt()
            );
            prev_joint = *joint;
            prev_tcp = tcp_here;
        }
    }

    #[test]
    fn rapid_moves_use_the_relaxed_budget() {
        let machine = machine();
        let position = [0.0, 0.0, 0.0, 0.0, 0.0];
        let target = [0.0, 0.0, 0.0, 90.0, 0.0];

        let mut kin = engine(200.0);
        let mut feed_pl = PlanData::new(600.0);
        let feed_segments = run_move(&mut kin, &machine, &position, &target, &mut feed_pl);

        let mut kin = engine(200.0);
        let mut rapid_pl = PlanData::rapid();
        let rapid_segments = run_move(&mut kin, &machine, &position, &target, &mut rapid_pl);

        assert!(
            rapid_segments.len() < feed_segments.len(),
            "rapid {} vs feed {}",
            rapid_segments.len(),
            feed_segments.len()
        );
    }

    #[test]
    fn feed_multiplier_is_clamped_and_inverted() {
        let mut kin = engine(200.0);
        let machine = machine();
        let position = [0.0, 0.0, 0.0, 0.0, 0.0];
        let target = [30.0, -20.0, 10.0, 60.0, 45.0];
        let programmed = 1200.0f32;
        let mut pl = PlanData::new(programmed);

        let _ = kin
            .segment_line(&target, &position, &mut pl, true, &machine)
            .unwrap();
        while let Some(_q) = kin.segment_line(&target, &position, &mut pl, false, &machine) {
            let k = pl.feed_rate / programmed;
            assert!((0.5..=2.0).contains(&k), "multiplier {k} out of bounds");
            assert!(
                (pl.rate_multiplier * k - 1.0).abs() < 1e-5,
                "rate_multiplier {} not inverse of {k}",
                pl.rate_multiplier
            );
            pl.feed_rate = programmed;
            pl.rate_multiplier = 1.0;
        }
    }

    #[test]
    fn segment_count_respects_upper_bound() {
        let mut kin = RtcpKinematics::new(PivotGeometry {
            pivot_x: 5000.0,
            pivot_y: 5000.0,
            pivot_z: 5000.0,
            ..PivotGeometry::default()
        });
        kin.set_enabled(true);
        let mut machine = machine();
        machine.sys.work_envelope.min = [-20000.0; N_AXIS];
        machine.sys.work_envelope.max = [20000.0; N_AXIS];
        let mut pl = PlanData::new(600.0);
        let position = [0.0; N_AXIS];
        let target = [0.0, 0.0, 0.0, 180.0, -180.0];

        let segments = run_move(&mut kin, &machine, &position, &target, &mut pl);
        assert!(!segments.is_empty());
        assert!(segments.len() <= MAX_SEGMENTS as usize);
    }

    #[test]
    fn invalid_destination_is_flagged_for_abort() {
        let mut kin = engine(0.0);
        let mut machine = machine();
        machine.sys.homed = AxisMask::all();
        machine.sys.work_envelope.min = [-50.0; N_AXIS];
        machine.sys.work_envelope.max = [50.0; N_AXIS];
        let mut pl = PlanData::new(600.0);
        let position = [0.0; N_AXIS];
        // Joint Y swings far outside the envelope under the A rotation.
        let target = [0.0, 45.0, -120.0, 45.0, 0.0];

        let _ = kin.segment_line(&target, &position, &mut pl, true, &machine);
        assert!(pl.condition.target_validated);
        assert!(!pl.condition.target_valid);
    }

    #[test]
    fn jog_cancel_terminates_production() {
        let mut kin = engine(200.0);
        let machine = machine();
        let mut pl = PlanData::new(600.0);
        let position = [0.0; N_AXIS];
        let target = [0.0, 0.0, 0.0, 90.0, 0.0];

        let _ = kin
            .segment_line(&target, &position, &mut pl, true, &machine)
            .unwrap();
        let first = kin.segment_line(&target, &position, &mut pl, false, &machine);
        assert!(first.is_some());

        kin.on_jog_cancel();
        let next = kin.segment_line(&target, &position, &mut pl, false, &machine);
        assert!(next.is_none());
    }

    #[test]
    fn init_clears_a_stale_jog_cancel() {
        let mut kin = engine(200.0);
        let machine = machine();
        let mut pl = PlanData::new(600.0);
        let position = [0.0; N_AXIS];
        let target = [10.0, 0.0, 0.0, 0.0, 0.0];

        kin.on_jog_cancel();
        let segments = run_move(&mut kin, &machine, &position, &target, &mut pl);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn small_rotation_is_single_segment() {
        let mut kin = engine(200.0);
        let machine = machine();
        let mut pl = PlanData::new(600.0);
        let position = [0.0; N_AXIS];
        let target = [100.0, 50.0, 0.0, 0.0005, 0.0];

        let segments = run_move(&mut kin, &machine, &position, &target, &mut pl);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0][X_AXIS], 100.0);
        assert_eq!(segments[0][Y_AXIS], 50.0);
    }
}

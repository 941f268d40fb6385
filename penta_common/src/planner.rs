//! Planner block data threaded through the segmentation flow.
//!
//! The host saves the programmed feed rate before a move and restores it
//! after every produced segment; the kinematics module is free to scale
//! `feed_rate` per segment and record the inverse scale in
//! `rate_multiplier` so downstream planning can recover the TCP rate.

/// Per-block condition flags relevant to kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanCondition {
    /// Rapid (G0) motion — segmented under a relaxed chord-error budget.
    pub rapid_motion: bool,
    /// The destination has been checked against travel limits.
    pub target_validated: bool,
    /// Result of that check; the host aborts the move when false.
    pub target_valid: bool,
}

/// Planner data for one linear move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanData {
    /// Programmed feed rate [mm/min], scaled per segment by the kinematics.
    pub feed_rate: f32,
    /// Inverse of the per-segment feed scale; 1.0 when unscaled.
    pub rate_multiplier: f32,
    /// Condition flags.
    pub condition: PlanCondition,
}

impl PlanData {
    /// New block with the given programmed feed rate.
    pub fn new(feed_rate: f32) -> Self {
        Self {
            feed_rate,
            rate_multiplier: 1.0,
            condition: PlanCondition::default(),
        }
    }

    /// New rapid-motion block.
    pub fn rapid() -> Self {
        Self {
            feed_rate: 0.0,
            rate_multiplier: 1.0,
            condition: PlanCondition {
                rapid_motion: true,
                ..PlanCondition::default()
            },
        }
    }
}

/// A parsed user M-code block awaiting validation/execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McodeBlock {
    /// The user M-code number (e.g. 450, 451).
    pub mcode: u16,
    /// Execution must wait for the motion buffer to drain.
    pub buffer_sync: bool,
}

impl McodeBlock {
    pub fn new(mcode: u16) -> Self {
        Self {
            mcode,
            buffer_sync: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_data_defaults() {
        let pl = PlanData::new(1200.0);
        assert_eq!(pl.feed_rate, 1200.0);
        assert_eq!(pl.rate_multiplier, 1.0);
        assert!(!pl.condition.rapid_motion);
        assert!(!pl.condition.target_validated);
    }

    #[test]
    fn rapid_block_flags_rapid_motion() {
        let pl = PlanData::rapid();
        assert!(pl.condition.rapid_motion);
    }

    #[test]
    fn mcode_block_starts_unsynced() {
        let block = McodeBlock::new(451);
        assert_eq!(block.mcode, 451);
        assert!(!block.buffer_sync);
    }
}

//! Segmenter throughput benchmark.
//!
//! Drives complete moves through the init/produce protocol: a pure rotary
//! sweep (worst case for segment count) and a mixed linear+rotary move.

use criterion::{Criterion, criterion_group, criterion_main};

use penta_common::axis::N_AXIS;
use penta_common::kinematics::Kinematics;
use penta_common::machine::Machine;
use penta_common::planner::PlanData;
use penta_kinematics::RtcpKinematics;
use penta_kinematics::mode::MCODE_RTCP_ON;
use penta_kinematics::settings::PivotGeometry;

fn engine() -> RtcpKinematics {
    let mut kin = RtcpKinematics::new(PivotGeometry {
        pivot_z: 200.0,
        ..PivotGeometry::default()
    });
    kin.mcode_execute(&Machine::default(), MCODE_RTCP_ON);
    kin
}

fn bench_rotary_sweep(c: &mut Criterion) {
    let mut kin = engine();
    let mut machine = Machine::default();
    machine.sys.work_envelope.min = [-1000.0, -1000.0, -1000.0, -360.0, -360.0];
    machine.sys.work_envelope.max = [1000.0, 1000.0, 1000.0, 360.0, 360.0];
    let position = [0.0f32; N_AXIS];
    let target = [0.0, 0.0, 0.0, 90.0, 0.0];

    c.bench_function("segment_rotary_sweep_90deg", |b| {
        b.iter(|| {
            let mut pl = PlanData::new(600.0);
            let mut count = 0usize;
            let _ = kin.segment_line(&target, &position, &mut pl, true, &machine);
            while kin
                .segment_line(&target, &position, &mut pl, false, &machine)
                .is_some()
            {
                count += 1;
                pl.feed_rate = 600.0;
                pl.rate_multiplier = 1.0;
            }
            count
        });
    });
}

fn bench_mixed_move(c: &mut Criterion) {
    let mut kin = engine();
    let mut machine = Machine::default();
    machine.sys.work_envelope.min = [-1000.0, -1000.0, -1000.0, -360.0, -360.0];
    machine.sys.work_envelope.max = [1000.0, 1000.0, 1000.0, 360.0, 360.0];
    let position = [0.0f32; N_AXIS];
    let target = [80.0, -40.0, 25.0, 30.0, 45.0];

    c.bench_function("segment_mixed_linear_rotary", |b| {
        b.iter(|| {
            let mut pl = PlanData::new(600.0);
            let mut count = 0usize;
            let _ = kin.segment_line(&target, &position, &mut pl, true, &machine);
            while kin
                .segment_line(&target, &position, &mut pl, false, &machine)
                .is_some()
            {
                count += 1;
                pl.feed_rate = 600.0;
                pl.rate_multiplier = 1.0;
            }
            count
        });
    });
}

criterion_group!(benches, bench_rotary_sweep, bench_mixed_move);
criterion_main!(benches);

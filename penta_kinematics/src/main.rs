//! # PENTA Kinematics Diagnostic Binary
//!
//! Loads the persisted pivot geometry, optionally enables RTCP
//! compensation, and prints the `$RTCP`-style status block for a given
//! joint position — the same reporting path the controller exposes online.
//!
//! # Usage
//!
//! ```bash
//! # Status with persisted geometry, RTCP off
//! penta_kinematics --settings rtcp.toml
//!
//! # RTCP on, at a joint position, machine-readable output
//! penta_kinematics -s rtcp.toml --enable --joint 0,150,250,90,0 --json
//! ```

use std::path::PathBuf;

use clap::Parser;
use penta_common::axis::{Coords, N_AXIS, Z_AXIS};
use penta_common::kinematics::Kinematics;
use penta_common::machine::Machine;
use penta_kinematics::mode::MCODE_RTCP_ON;
use penta_kinematics::settings::PivotGeometry;
use penta_kinematics::{RtcpKinematics, SettingsStore};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// PENTA 5-axis RTCP kinematics diagnostics
#[derive(Parser, Debug)]
#[command(name = "penta_kinematics")]
#[command(version)]
#[command(about = "5-axis RTCP kinematics diagnostics")]
struct Args {
    /// Path to the persisted geometry settings
    #[arg(short, long, default_value = "rtcp.toml")]
    settings: PathBuf,

    /// Enable RTCP compensation before reporting
    #[arg(short, long)]
    enable: bool,

    /// Joint position as X,Y,Z,A,C (mm / degrees)
    #[arg(short, long, value_delimiter = ',', num_args = 5)]
    joint: Option<Vec<f32>>,

    /// Active tool-length offset on Z [mm]
    #[arg(short, long, default_value_t = 0.0)]
    tlo: f32,

    /// Print a machine-readable JSON snapshot instead of the text block
    #[arg(long)]
    json: bool,
}

/// Machine-readable status snapshot.
#[derive(Debug, Serialize)]
struct StatusSnapshot {
    enabled: bool,
    geometry: PivotGeometry,
    joint: Coords,
    tcp: Coords,
    cache_valid: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let store = SettingsStore::open(&args.settings);
    let geometry = store.geometry();
    info!(%geometry, "geometry loaded");

    let mut kin = RtcpKinematics::new(geometry);

    let mut machine = Machine::default();
    machine.gcode.tool_length_offset[Z_AXIS] = args.tlo;
    if let Some(joint) = &args.joint {
        let mut position = [0.0f32; N_AXIS];
        position.copy_from_slice(joint);
        machine.set_joint_position(&position);
    }

    if args.enable {
        kin.mcode_execute(&machine, MCODE_RTCP_ON);
    }

    if args.json {
        let joint = machine.joint_position();
        let snapshot = StatusSnapshot {
            enabled: kin.enabled(),
            geometry,
            joint,
            tcp: kin.transform_steps_to_cartesian(&machine.sys.position, &machine),
            cache_valid: kin.cache_valid(),
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", kin.status_report(&machine));
    }

    Ok(())
}

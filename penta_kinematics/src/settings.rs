//! Persisted machine geometry: pivot point and A-to-C axis offsets.
//!
//! The five values are user-visible as settings 640–644. The settings store
//! owns the persisted record; the engine keeps a read-only working copy
//! refreshed through [`crate::engine::RtcpKinematics::reload_geometry`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use thiserror::Error;
use tracing::{debug, warn};

use crate::segment::MAX_CHORD_ERROR_MM;

/// Setting id of the pivot X coordinate.
pub const SETTING_PIVOT_X: u16 = 640;
/// Setting id of the pivot Y coordinate.
pub const SETTING_PIVOT_Y: u16 = 641;
/// Setting id of the pivot Z coordinate.
pub const SETTING_PIVOT_Z: u16 = 642;
/// Setting id of the A-to-C offset in Y.
pub const SETTING_AXIS_OFFSET_Y: u16 = 643;
/// Setting id of the A-to-C offset in Z.
pub const SETTING_AXIS_OFFSET_Z: u16 = 644;

/// Conservative lower bound on the machine-origin-to-pivot distance used
/// when deriving the trig-cache tolerance from small pivot values [mm].
pub const MIN_ARM_LENGTH_MM: f32 = 500.0;

/// Settings subsystem error.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(String),

    #[error("settings parse error: {0}")]
    Parse(String),

    #[error("setting ${id} value {value} out of range [{min}, {max}]")]
    OutOfRange {
        id: u16,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("unknown setting ${0}")]
    Unknown(u16),
}

/// Static metadata for one user-visible setting.
#[derive(Debug, Clone, Copy)]
pub struct SettingDescriptor {
    pub id: u16,
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f32,
    pub max: f32,
    pub description: &'static str,
}

/// The 640–644 setting surface.
pub const SETTINGS: [SettingDescriptor; 5] = [
    SettingDescriptor {
        id: SETTING_PIVOT_X,
        name: "RTCP Pivot X",
        unit: "mm",
        min: -10_000.0,
        max: 10_000.0,
        description: "X distance from machine origin to the A/C rotation center. \
                      Measure carefully - affects TCP accuracy proportionally.",
    },
    SettingDescriptor {
        id: SETTING_PIVOT_Y,
        name: "RTCP Pivot Y",
        unit: "mm",
        min: -10_000.0,
        max: 10_000.0,
        description: "Y distance from machine origin to the A/C rotation center.",
    },
    SettingDescriptor {
        id: SETTING_PIVOT_Z,
        name: "RTCP Pivot Z",
        unit: "mm",
        min: -10_000.0,
        max: 10_000.0,
        description: "Z distance from machine origin to the A/C rotation center. \
                      This is typically the most critical dimension.",
    },
    SettingDescriptor {
        id: SETTING_AXIS_OFFSET_Y,
        name: "Axis Offset Y",
        unit: "mm",
        min: -1_000.0,
        max: 1_000.0,
        description: "Y offset between the A and C rotation axes. \
                      Set 0 if the axes intersect.",
    },
    SettingDescriptor {
        id: SETTING_AXIS_OFFSET_Z,
        name: "Axis Offset Z",
        unit: "mm",
        min: -1_000.0,
        max: 1_000.0,
        description: "Z offset between the A and C rotation axes. \
                      Set 0 if the axes intersect.",
    },
];

/// Look up the descriptor for a setting id.
pub fn descriptor(id: u16) -> Option<&'static SettingDescriptor> {
    SETTINGS.iter().find(|d| d.id == id)
}

/// Machine geometry record persisted by the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PivotGeometry {
    /// Pivot X in machine coordinates [mm].
    #[serde(default)]
    pub pivot_x: f32,
    /// Pivot Y in machine coordinates [mm].
    #[serde(default)]
    pub pivot_y: f32,
    /// Pivot Z in machine coordinates [mm].
    #[serde(default)]
    pub pivot_z: f32,
    /// A-to-C axis offset in Y [mm].
    #[serde(default)]
    pub axis_offset_y: f32,
    /// A-to-C axis offset in Z [mm].
    #[serde(default)]
    pub axis_offset_z: f32,
}

const_assert!(size_of::<PivotGeometry>() == 5 * size_of::<f32>());

impl PivotGeometry {
    /// Read one setting by id.
    pub fn get(&self, id: u16) -> Result<f32, SettingsError> {
        match id {
            SETTING_PIVOT_X => Ok(self.pivot_x),
            SETTING_PIVOT_Y => Ok(self.pivot_y),
            SETTING_PIVOT_Z => Ok(self.pivot_z),
            SETTING_AXIS_OFFSET_Y => Ok(self.axis_offset_y),
            SETTING_AXIS_OFFSET_Z => Ok(self.axis_offset_z),
            other => Err(SettingsError::Unknown(other)),
        }
    }

    /// Write one setting by id, enforcing its declared range.
    pub fn set(&mut self, id: u16, value: f32) -> Result<(), SettingsError> {
        let desc = descriptor(id).ok_or(SettingsError::Unknown(id))?;
        if !value.is_finite() || value < desc.min || value > desc.max {
            return Err(SettingsError::OutOfRange {
                id,
                value,
                min: desc.min,
                max: desc.max,
            });
        }
        match id {
            SETTING_PIVOT_X => self.pivot_x = value,
            SETTING_PIVOT_Y => self.pivot_y = value,
            SETTING_PIVOT_Z => self.pivot_z = value,
            SETTING_AXIS_OFFSET_Y => self.axis_offset_y = value,
            SETTING_AXIS_OFFSET_Z => self.axis_offset_z = value,
            _ => unreachable!(),
        }
        Ok(())
    }

    /// Validate every field against its declared range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut checked = *self;
        for desc in &SETTINGS {
            checked.set(desc.id, self.get(desc.id)?)?;
        }
        Ok(())
    }

    /// Machine-origin-to-pivot distance, floored at [`MIN_ARM_LENGTH_MM`].
    pub fn arm_length(&self) -> f32 {
        let arm = (self.pivot_x * self.pivot_x
            + self.pivot_y * self.pivot_y
            + self.pivot_z * self.pivot_z)
            .sqrt();
        arm.max(MIN_ARM_LENGTH_MM)
    }

    /// Trig-cache angular tolerance [degrees]: the angle at which a cached
    /// sample's worst-case TCP translation error reaches the chord-error
    /// budget at arm's length.
    pub fn trig_tolerance_deg(&self) -> f32 {
        (MAX_CHORD_ERROR_MM / self.arm_length()).to_degrees()
    }
}

impl fmt::Display for PivotGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pivot ({:.3}, {:.3}, {:.3}) mm, axis offsets ({:.3}, {:.3}) mm",
            self.pivot_x, self.pivot_y, self.pivot_z, self.axis_offset_y, self.axis_offset_z
        )
    }
}

/// File-backed store for the geometry record.
///
/// Corrupt or missing data restores the zero defaults, matching first-boot
/// behavior.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    geometry: PivotGeometry,
}

impl SettingsStore {
    /// Open the store at `path`, loading the persisted record if present.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let geometry = match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<PivotGeometry>(&text) {
                Ok(geometry) if geometry.validate().is_ok() => geometry,
                Ok(_) | Err(_) => {
                    warn!(path = %path.display(), "persisted geometry invalid, restoring defaults");
                    PivotGeometry::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "no persisted geometry, using defaults");
                PivotGeometry::default()
            }
        };
        Self { path, geometry }
    }

    /// The active geometry record.
    #[inline]
    pub fn geometry(&self) -> PivotGeometry {
        self.geometry
    }

    /// Update one setting, persist, and return the new record for the
    /// engine's on-change reload.
    pub fn set(&mut self, id: u16, value: f32) -> Result<PivotGeometry, SettingsError> {
        self.geometry.set(id, value)?;
        self.save()?;
        debug!(setting = id, value, "geometry setting changed");
        Ok(self.geometry)
    }

    /// Persist the active record.
    pub fn save(&self) -> Result<(), SettingsError> {
        let text = toml::to_string(&self.geometry).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| SettingsError::Io(e.to_string()))
    }

    /// Reset to the zero defaults and persist.
    pub fn restore_defaults(&mut self) -> Result<PivotGeometry, SettingsError> {
        self.geometry = PivotGeometry::default();
        self.save()?;
        Ok(self.geometry)
    }
}

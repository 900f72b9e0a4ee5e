// silboard_sim/src/simulation/config.rs

//! Loading and validating scenario files.
//!
//! A scenario is a TOML file merged with `SILBOARD_`-prefixed environment
//! variables, where `__` separates nesting levels
//! (`SILBOARD_SENSORS__GYRO_STDEV=0.2` overrides `[sensors] gyro_stdev`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use silboard_core::config::SensorConfig;
use silboard_core::types::VehicleType;

use super::error::SimError;
use super::utils::serde_helpers;

pub const ENV_PREFIX: &str = "SILBOARD_";

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: Simulation,

    #[serde(default)]
    pub vehicle: Vehicle,

    /// Flat table of numeric sensor options handed to the board as its
    /// parameter source. Absent keys take the board's defaults.
    #[serde(default)]
    pub sensors: BTreeMap<String, f64>,

    #[serde(default)]
    pub rc: RcScript,
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in the scenario file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Simulation {
    /// Optional seed for the sensor noise generator, for determinism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Duration of the simulation in seconds.
    pub duration_seconds: f64,
    /// Physics tick rate in Hz.
    pub physics_rate_hz: f64,
    /// Instance identifier; scopes the board's non-volatile memory.
    pub namespace: String,
    /// Directory under which non-volatile memory is kept.
    pub memory_root: PathBuf,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            seed: None,
            duration_seconds: 10.0,
            physics_rate_hz: 1000.0,
            namespace: String::new(),
            memory_root: PathBuf::from("."),
        }
    }
}

/// The simulated airframe and its scripted motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Vehicle {
    /// `multirotor` or `fixedwing`.
    #[serde(rename = "type")]
    pub kind: String,
    pub initial_pose: Pose,
    /// Constant velocity in the world (NWU) frame, m/s.
    #[serde(with = "serde_helpers::vec3_from_array")]
    pub velocity: Vector3<f64>,
    /// Constant yaw rate about the body z axis, rad/s.
    pub yaw_rate: f64,
    /// World gravity, m/s^2.
    #[serde(with = "serde_helpers::vec3_from_array")]
    pub gravity: Vector3<f64>,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            kind: VehicleType::default().to_string(),
            initial_pose: Pose::default(),
            velocity: Vector3::zeros(),
            yaw_rate: 0.0,
            gravity: Vector3::new(0.0, 0.0, -9.81),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Pose {
    #[serde(with = "serde_helpers::vec3_from_array", default = "Vector3::zeros")]
    pub translation: Vector3<f64>,

    #[serde(
        with = "serde_helpers::quat_from_euler_deg",
        default = "UnitQuaternion::identity"
    )]
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl Pose {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

/// Operator input played back during the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RcScript {
    /// Whether a transmitter is present at all. Without one the firmware sees
    /// the fail-safe values whatever frames are scripted.
    pub connected: bool,
    pub frames: Vec<ScriptedRcFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedRcFrame {
    /// Simulation time (s) at which the frame is sent.
    pub time: f64,
    /// One value per channel, starting at channel 0.
    pub values: Vec<u16>,
}

// =========================================================================
// == Loading ==
// =========================================================================

/// Wrapper that places the resolved sensor options under `[board]`.
#[derive(Debug, Serialize, Deserialize)]
struct ResolvedBoard {
    board: SensorConfig,
}

impl ScenarioConfig {
    /// The provider stack for a scenario file: the file, then environment overrides.
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        if !path.is_file() {
            return Err(SimError::InvalidScenario(format!(
                "scenario file {} does not exist",
                path.display()
            )));
        }
        info!("Loading scenario from: {}", path.display());
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a scenario from TOML text, without environment overrides.
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        let config: Self = Figment::new().merge(Toml::string(text)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The sensor options the board will actually run with: the `[sensors]`
    /// table resolved against the board defaults.
    pub fn resolved_sensors(&self) -> SensorConfig {
        SensorConfig::load(&self.sensors)
    }

    /// The scenario followed by a `[board]` table holding the resolved sensor
    /// options, so every default the board fills in is visible.
    pub fn to_resolved_toml_string(&self) -> Result<String, SimError> {
        let board = toml::to_string_pretty(&ResolvedBoard {
            board: self.resolved_sensors(),
        })?;
        Ok(format!("{}\n{}", self.to_toml_string()?, board))
    }

    pub fn vehicle_type(&self) -> Result<VehicleType, SimError> {
        Ok(self.vehicle.kind.parse()?)
    }

    /// Physics step length in seconds.
    pub fn tick_period(&self) -> f64 {
        1.0 / self.simulation.physics_rate_hz
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let rate = self.simulation.physics_rate_hz;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "physics_rate_hz must be positive, got {rate}"
            )));
        }
        let duration = self.simulation.duration_seconds;
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "duration_seconds must be non-negative, got {duration}"
            )));
        }
        if let Some(frame) = self.rc.frames.iter().find(|f| f.time.is_nan() || f.time < 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "RC frame scheduled at invalid time {}",
                frame.time
            )));
        }
        self.vehicle_type()?;
        Ok(())
    }
}

// silboard_core/src/config.rs

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::abstractions::ParameterSource;

// =========================================================================
// == Noise Parameters ==
// =========================================================================

/// Stochastic error model for one sensor: zero-mean noise plus a bias that
/// starts uniformly in `[-bias_range, bias_range]` and random-walks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    pub stdev: f64,
    pub bias_range: f64,
    pub bias_walk_stdev: f64,
}

impl NoiseParams {
    /// Reads `{prefix}_stdev`, `{prefix}_bias_range` and `{prefix}_bias_walk_stdev`.
    fn load(params: &dyn ParameterSource, prefix: &str, defaults: NoiseParams) -> Self {
        Self {
            stdev: params.get(&format!("{prefix}_stdev"), defaults.stdev),
            bias_range: params.get(&format!("{prefix}_bias_range"), defaults.bias_range),
            bias_walk_stdev: params.get(
                &format!("{prefix}_bias_walk_stdev"),
                defaults.bias_walk_stdev,
            ),
        }
    }
}

// =========================================================================
// == Sensor Configuration ==
// =========================================================================

/// Every sensor option the board recognizes. Loaded once at setup and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub gyro: NoiseParams,
    pub acc: NoiseParams,
    pub mag: NoiseParams,
    pub baro: NoiseParams,
    pub airspeed: NoiseParams,

    pub sonar_stdev: f64,
    pub sonar_min_range: f64,
    pub sonar_max_range: f64,

    /// IMU sample rate in Hz.
    pub imu_update_rate: f64,

    /// Magnetic inclination (dip) in radians.
    pub inclination: f64,
    /// Magnetic declination in radians.
    pub declination: f64,

    /// Altitude of the world origin above sea level (m), for the barometer.
    pub ground_altitude: f64,

    /// Below this body speed (m/s) the accelerometer reports gravity only, hiding
    /// contact jitter from the physics engine. Zero disables the substitution.
    pub acc_still_velocity_threshold: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        let noisy = NoiseParams {
            stdev: 1.15,
            bias_range: 0.15,
            bias_walk_stdev: 0.001,
        };
        Self {
            gyro: NoiseParams {
                stdev: 0.13,
                ..noisy
            },
            acc: noisy,
            mag: noisy,
            baro: noisy,
            airspeed: noisy,
            sonar_stdev: 1.15,
            sonar_min_range: 0.25,
            sonar_max_range: 8.0,
            imu_update_rate: 1000.0,
            inclination: 1.14316156541,
            declination: 0.198584539676,
            ground_altitude: 1387.0,
            acc_still_velocity_threshold: 0.05,
        }
    }
}

impl SensorConfig {
    /// Resolves every option from `params`, falling back to the defaults for
    /// anything absent. Nonsensical rates are replaced by the default with a warning.
    pub fn load(params: &dyn ParameterSource) -> Self {
        let d = Self::default();

        let mut config = Self {
            gyro: NoiseParams::load(params, "gyro", d.gyro),
            acc: NoiseParams::load(params, "acc", d.acc),
            mag: NoiseParams::load(params, "mag", d.mag),
            baro: NoiseParams::load(params, "baro", d.baro),
            airspeed: NoiseParams::load(params, "airspeed", d.airspeed),
            sonar_stdev: params.get("sonar_stdev", d.sonar_stdev),
            sonar_min_range: params.get("sonar_min_range", d.sonar_min_range),
            sonar_max_range: params.get("sonar_max_range", d.sonar_max_range),
            imu_update_rate: params.get("imu_update_rate", d.imu_update_rate),
            inclination: params.get("inclination", d.inclination),
            declination: params.get("declination", d.declination),
            ground_altitude: params.get("ground_altitude", d.ground_altitude),
            acc_still_velocity_threshold: params.get(
                "acc_still_velocity_threshold",
                d.acc_still_velocity_threshold,
            ),
        };

        if !(config.imu_update_rate.is_finite() && config.imu_update_rate > 0.0) {
            warn!(
                "imu_update_rate of {} Hz is not usable, falling back to {} Hz",
                config.imu_update_rate, d.imu_update_rate
            );
            config.imu_update_rate = d.imu_update_rate;
        }

        if config.sonar_min_range > config.sonar_max_range {
            warn!(
                "sonar_min_range {} exceeds sonar_max_range {}, swapping them",
                config.sonar_min_range, config.sonar_max_range
            );
            std::mem::swap(&mut config.sonar_min_range, &mut config.sonar_max_range);
        }

        debug!("Resolved sensor configuration: {:?}", config);
        config
    }

    /// IMU sample period, truncated to whole microseconds.
    pub fn imu_update_period_us(&self) -> u64 {
        (1e6 / self.imu_update_rate) as u64
    }

    /// The inertial magnetic field direction in the NWU world frame.
    ///
    /// The field is defined in NED terms from inclination and declination; the
    /// negated angles account for the NWU handedness.
    pub fn inertial_magnetic_field(&self) -> Vector3<f64> {
        magnetic_field(self.inclination, self.declination)
    }
}

/// Unit field vector for the given inclination and declination (radians).
pub fn magnetic_field(inclination: f64, declination: f64) -> Vector3<f64> {
    Vector3::new(
        (-inclination).cos() * (-declination).cos(),
        (-inclination).cos() * (-declination).sin(),
        (-inclination).sin(),
    )
}

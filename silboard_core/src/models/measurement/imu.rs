// silboard_core/src/models/measurement/imu.rs

use nalgebra::Vector3;

use super::{SampleContext, SimulatedSensor, SENSOR_TEMPERATURE_C};
use crate::abstractions::NoiseSource;
use crate::config::{NoiseParams, SensorConfig};
use crate::frames::to_output_frame;
use crate::noise::{gaussian_noise, BiasState};
use crate::types::GroundTruthState;

/// One accelerometer + gyroscope sample in the firmware's NED body frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuReading {
    /// Specific force (m/s^2).
    pub accel: [f32; 3],
    /// Angular rate (rad/s).
    pub gyro: [f32; 3],
    /// Die temperature (°C).
    pub temperature: f32,
}

// --- Concrete Model for a 6-DOF IMU ---
#[derive(Debug, Clone)]
pub struct ImuModel {
    acc: NoiseParams,
    gyro: NoiseParams,
    acc_bias: BiasState<Vector3<f64>>,
    gyro_bias: BiasState<Vector3<f64>>,
    /// Body speed under which the accelerometer reports gravity only. Zero disables.
    still_velocity_threshold: f64,
}

impl ImuModel {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            acc: config.acc,
            gyro: config.gyro,
            acc_bias: BiasState::new(config.acc.bias_range, config.acc.bias_walk_stdev),
            gyro_bias: BiasState::new(config.gyro.bias_range, config.gyro.bias_walk_stdev),
            still_velocity_threshold: config.acc_still_velocity_threshold,
        }
    }

    pub fn acc_bias(&self) -> Vector3<f64> {
        self.acc_bias.value()
    }

    pub fn gyro_bias(&self) -> Vector3<f64> {
        self.gyro_bias.value()
    }

    /// Proper acceleration in the body frame (NWU body axes), before noise and bias.
    ///
    /// ProperAccel = R^-1 * (CoordAccel - Gravity). A body at rest reads +g along Up.
    pub fn specific_force(&self, truth: &GroundTruthState) -> Vector3<f64> {
        let still = self.still_velocity_threshold > 0.0
            && truth.linear_velocity.norm() < self.still_velocity_threshold;
        let proper_accel_world = if still {
            -truth.gravity
        } else {
            truth.linear_acceleration - truth.gravity
        };
        truth.orientation.inverse_transform_vector(&proper_accel_world)
    }
}

impl SimulatedSensor for ImuModel {
    type Reading = ImuReading;

    fn initialize(&mut self, noise: &mut dyn NoiseSource) {
        self.gyro_bias.initialize(noise);
        self.acc_bias.initialize(noise);
    }

    fn sample(
        &mut self,
        truth: &GroundTruthState,
        context: SampleContext,
        noise: &mut dyn NoiseSource,
    ) -> ImuReading {
        // --- 1. Accelerometer ---
        let mut y_acc = self.specific_force(truth);
        if context.motors_spinning {
            y_acc += gaussian_noise::<Vector3<f64>>(self.acc.stdev, noise);
        }
        y_acc += self.acc_bias.walk(noise);

        // --- 2. Gyroscope ---
        // Ground truth angular velocity is already expressed in the body frame.
        let mut y_gyro = truth.angular_velocity;
        if context.motors_spinning {
            y_gyro += gaussian_noise::<Vector3<f64>>(self.gyro.stdev, noise);
        }
        y_gyro += self.gyro_bias.walk(noise);

        ImuReading {
            accel: to_output_frame(&y_acc),
            gyro: to_output_frame(&y_gyro),
            temperature: SENSOR_TEMPERATURE_C,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::tests::{Constant, Silent};
    use crate::noise::NoiseEngine;
    use approx::assert_abs_diff_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    const SPINNING: SampleContext = SampleContext {
        motors_spinning: true,
    };
    const IDLE: SampleContext = SampleContext {
        motors_spinning: false,
    };

    fn assert_reading_eq(actual: [f32; 3], expected: [f32; 3], epsilon: f32) {
        for axis in 0..3 {
            assert_abs_diff_eq!(actual[axis], expected[axis], epsilon = epsilon);
        }
    }

    #[test]
    fn level_and_still_reads_minus_g_down() {
        let mut imu = ImuModel::new(&SensorConfig::default());
        let truth = GroundTruthState::default();

        let reading = imu.sample(&truth, IDLE, &mut Silent);

        // +g along NWU Up is -g along NED Down.
        assert_reading_eq(reading.accel, [0.0, 0.0, -9.81], 1e-6);
        assert_reading_eq(reading.gyro, [0.0, 0.0, 0.0], 1e-6);
        assert_eq!(reading.temperature, 27.0);
    }

    #[test]
    fn rolled_body_sees_gravity_on_side_axis() {
        let mut imu = ImuModel::new(&SensorConfig::default());
        let truth = GroundTruthState {
            orientation: UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2),
            ..GroundTruthState::default()
        };

        // Rolled 90° about north: body +Y (west) now points up.
        let reading = imu.sample(&truth, IDLE, &mut Silent);
        assert_reading_eq(reading.accel, [0.0, -9.81, 0.0], 1e-5);
    }

    #[test]
    fn moving_body_includes_coordinate_acceleration() {
        let mut imu = ImuModel::new(&SensorConfig::default());
        let truth = GroundTruthState {
            linear_velocity: Vector3::new(3.0, 0.0, 0.0),
            linear_acceleration: Vector3::new(2.0, 0.0, 0.0),
            ..GroundTruthState::default()
        };

        let reading = imu.sample(&truth, IDLE, &mut Silent);
        assert_reading_eq(reading.accel, [2.0, 0.0, -9.81], 1e-5);
    }

    #[test]
    fn still_body_hides_contact_jitter() {
        let mut imu = ImuModel::new(&SensorConfig::default());
        let truth = GroundTruthState {
            linear_velocity: Vector3::new(0.01, 0.0, 0.0),
            linear_acceleration: Vector3::new(40.0, -25.0, 12.0),
            ..GroundTruthState::default()
        };

        let reading = imu.sample(&truth, IDLE, &mut Silent);
        assert_reading_eq(reading.accel, [0.0, 0.0, -9.81], 1e-6);
    }

    #[test]
    fn still_substitution_can_be_disabled() {
        let config = SensorConfig {
            acc_still_velocity_threshold: 0.0,
            ..SensorConfig::default()
        };
        let mut imu = ImuModel::new(&config);
        let truth = GroundTruthState {
            linear_acceleration: Vector3::new(1.0, 0.0, 0.0),
            ..GroundTruthState::default()
        };

        let reading = imu.sample(&truth, IDLE, &mut Silent);
        assert_reading_eq(reading.accel, [1.0, 0.0, -9.81], 1e-6);
    }

    #[test]
    fn gyro_output_is_ned() {
        let mut imu = ImuModel::new(&SensorConfig::default());
        let truth = GroundTruthState {
            angular_velocity: Vector3::new(0.1, 0.2, 0.3),
            ..GroundTruthState::default()
        };

        let reading = imu.sample(&truth, IDLE, &mut Silent);
        assert_reading_eq(reading.gyro, [0.1, -0.2, -0.3], 1e-6);
    }

    #[test]
    fn noise_only_when_motors_spin_but_bias_always_walks() {
        // Every draw returns 1.0: noise adds stdev, each walk step adds walk_stdev.
        let config = SensorConfig {
            acc: NoiseParams {
                stdev: 0.5,
                bias_range: 0.0,
                bias_walk_stdev: 0.01,
            },
            gyro: NoiseParams {
                stdev: 0.25,
                bias_range: 0.0,
                bias_walk_stdev: 0.02,
            },
            ..SensorConfig::default()
        };
        let truth = GroundTruthState::default();

        let mut imu = ImuModel::new(&config);
        let idle = imu.sample(&truth, IDLE, &mut Constant(1.0));
        assert_reading_eq(idle.accel, [0.01, -0.01, -9.81 - 0.01], 1e-5);
        assert_reading_eq(idle.gyro, [0.02, -0.02, -0.02], 1e-6);

        let spinning = imu.sample(&truth, SPINNING, &mut Constant(1.0));
        // Bias has now walked twice.
        assert_reading_eq(spinning.accel, [0.52, -0.52, -9.81 - 0.52], 1e-5);
        assert_reading_eq(spinning.gyro, [0.29, -0.29, -0.29], 1e-6);
    }

    #[test]
    fn initial_bias_is_within_range() {
        let config = SensorConfig::default();
        let mut engine = NoiseEngine::seeded(11);
        let mut imu = ImuModel::new(&config);
        imu.initialize(&mut engine);
        assert!(imu.acc_bias().amax() <= config.acc.bias_range);
        assert!(imu.gyro_bias().amax() <= config.gyro.bias_range);
    }

    #[test]
    fn spinning_noise_has_configured_spread() {
        let config = SensorConfig {
            gyro: NoiseParams {
                stdev: 0.13,
                bias_range: 0.0,
                bias_walk_stdev: 0.0,
            },
            ..SensorConfig::default()
        };
        let mut imu = ImuModel::new(&config);
        let mut engine = NoiseEngine::seeded(12);
        let truth = GroundTruthState::default();

        let n = 5_000;
        let samples: Vec<f64> = (0..n)
            .map(|_| imu.sample(&truth, SPINNING, &mut engine).gyro[0] as f64)
            .collect();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(var.sqrt(), 0.13, epsilon = 0.01);
    }
}

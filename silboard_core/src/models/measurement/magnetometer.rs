// silboard_core/src/models/measurement/magnetometer.rs

use nalgebra::Vector3;

use super::{SampleContext, SimulatedSensor};
use crate::abstractions::NoiseSource;
use crate::config::SensorConfig;
use crate::frames::to_output_frame;
use crate::noise::{gaussian_noise, BiasState};
use crate::types::GroundTruthState;

// --- Concrete Model for a 3-axis Magnetometer ---
// Noise and bias drift are independent of motor state.
#[derive(Debug, Clone)]
pub struct MagnetometerModel {
    stdev: f64,
    bias: BiasState<Vector3<f64>>,
    /// The Earth's field in the NWU world frame, fixed for the whole run.
    inertial_field: Vector3<f64>,
}

impl MagnetometerModel {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            stdev: config.mag.stdev,
            bias: BiasState::new(config.mag.bias_range, config.mag.bias_walk_stdev),
            inertial_field: config.inertial_magnetic_field(),
        }
    }

    pub fn inertial_field(&self) -> Vector3<f64> {
        self.inertial_field
    }

    /// Replaces the world field, e.g. after the inclination/declination are reloaded.
    pub fn set_inertial_field(&mut self, field: Vector3<f64>) {
        self.inertial_field = field;
    }

    pub fn bias(&self) -> Vector3<f64> {
        self.bias.value()
    }
}

impl SimulatedSensor for MagnetometerModel {
    /// Field strength per body axis, NED.
    type Reading = [f32; 3];

    fn initialize(&mut self, noise: &mut dyn NoiseSource) {
        self.bias.initialize(noise);
    }

    fn sample(
        &mut self,
        truth: &GroundTruthState,
        _context: SampleContext,
        noise: &mut dyn NoiseSource,
    ) -> [f32; 3] {
        let measurement_noise = gaussian_noise::<Vector3<f64>>(self.stdev, noise);
        let bias = self.bias.walk(noise);

        // Rotate the world field into the body frame, then corrupt it.
        let y_mag = truth.orientation.inverse_transform_vector(&self.inertial_field)
            + bias
            + measurement_noise;

        to_output_frame(&y_mag)
    }
}

// silboard_core/src/models/measurement/mod.rs

use std::fmt::Debug;

use crate::abstractions::NoiseSource;
use crate::types::GroundTruthState;

/// Die temperature reported by every simulated sensor (°C). There is no thermal model.
pub const SENSOR_TEMPERATURE_C: f32 = 27.0;

/// Board state a sensor may depend on besides ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleContext {
    /// Motor vibration is the dominant source of inertial noise; without it the
    /// IMU reads clean apart from bias.
    pub motors_spinning: bool,
}

// --- SIMULATED SENSOR TRAIT ---
// Represents one physical sensor: `y = h(truth) + bias + noise`, in the output frame.
pub trait SimulatedSensor: Debug + Send {
    /// What the firmware receives from one read.
    type Reading;

    /// Draws the initial biases. Called once at setup and again on sensor re-init.
    fn initialize(&mut self, noise: &mut dyn NoiseSource);

    /// Produces a firmware-frame reading and advances every bias this sensor owns.
    fn sample(
        &mut self,
        truth: &GroundTruthState,
        context: SampleContext,
        noise: &mut dyn NoiseSource,
    ) -> Self::Reading;
}

pub mod airspeed;
pub mod barometer;
pub mod imu;
pub mod magnetometer;
pub mod sonar;

pub use airspeed::{AirspeedModel, AirspeedReading};
pub use barometer::{BarometerModel, BarometerReading};
pub use imu::{ImuModel, ImuReading};
pub use magnetometer::MagnetometerModel;
pub use sonar::SonarModel;

// silboard_core/src/models/measurement/airspeed.rs

use super::{SampleContext, SimulatedSensor, SENSOR_TEMPERATURE_C};
use crate::abstractions::NoiseSource;
use crate::config::SensorConfig;
use crate::noise::{gaussian_noise, BiasState};
use crate::types::GroundTruthState;

/// Sea-level air density (kg/m^3).
pub const AIR_DENSITY: f64 = 1.225;

/// Incompressible dynamic pressure for a given airspeed: q = ½ ρ V².
pub fn dynamic_pressure(airspeed: f64) -> f64 {
    0.5 * AIR_DENSITY * airspeed * airspeed
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirspeedReading {
    /// Pitot minus static pressure (Pa).
    pub diff_pressure: f32,
    /// Die temperature (°C).
    pub temperature: f32,
}

// --- Concrete Model for a differential-pressure (pitot) sensor ---
// There is no wind model: airspeed is the body's speed relative to the world.
#[derive(Debug, Clone)]
pub struct AirspeedModel {
    stdev: f64,
    bias: BiasState<f64>,
}

impl AirspeedModel {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            stdev: config.airspeed.stdev,
            bias: BiasState::new(config.airspeed.bias_range, config.airspeed.bias_walk_stdev),
        }
    }

    pub fn bias(&self) -> f64 {
        self.bias.value()
    }
}

impl SimulatedSensor for AirspeedModel {
    type Reading = AirspeedReading;

    fn initialize(&mut self, noise: &mut dyn NoiseSource) {
        self.bias.initialize(noise);
    }

    fn sample(
        &mut self,
        truth: &GroundTruthState,
        _context: SampleContext,
        noise: &mut dyn NoiseSource,
    ) -> AirspeedReading {
        let airspeed = truth.linear_velocity.norm();

        let mut y_as = dynamic_pressure(airspeed);
        y_as += gaussian_noise::<f64>(self.stdev, noise);
        y_as += self.bias.walk(noise);

        AirspeedReading {
            diff_pressure: y_as as f32,
            temperature: SENSOR_TEMPERATURE_C,
        }
    }
}

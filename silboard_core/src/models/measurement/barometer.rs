// silboard_core/src/models/measurement/barometer.rs

use super::{SampleContext, SimulatedSensor, SENSOR_TEMPERATURE_C};
use crate::abstractions::NoiseSource;
use crate::config::SensorConfig;
use crate::noise::{gaussian_noise, BiasState};
use crate::types::GroundTruthState;

/// Sea-level standard pressure (Pa).
pub const SEA_LEVEL_PRESSURE_PA: f64 = 101_325.0;
const LAPSE_COEFFICIENT: f64 = 2.25694e-5;
const PRESSURE_EXPONENT: f64 = 5.2553;

/// Standard-atmosphere pressure at `altitude` metres above sea level.
pub fn pressure_from_altitude(altitude: f64) -> f64 {
    SEA_LEVEL_PRESSURE_PA * (1.0 - LAPSE_COEFFICIENT * altitude).powf(PRESSURE_EXPONENT)
}

/// Inverse of `pressure_from_altitude`.
pub fn altitude_from_pressure(pressure: f64) -> f64 {
    (1.0 - (pressure / SEA_LEVEL_PRESSURE_PA).powf(1.0 / PRESSURE_EXPONENT)) / LAPSE_COEFFICIENT
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarometerReading {
    /// Static pressure (Pa).
    pub pressure: f32,
    /// Die temperature (°C).
    pub temperature: f32,
}

// --- Concrete Model for a static-pressure Barometer ---
#[derive(Debug, Clone)]
pub struct BarometerModel {
    stdev: f64,
    bias: BiasState<f64>,
    /// Altitude of the world origin above sea level (m).
    ground_altitude: f64,
}

impl BarometerModel {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            stdev: config.baro.stdev,
            bias: BiasState::new(config.baro.bias_range, config.baro.bias_walk_stdev),
            ground_altitude: config.ground_altitude,
        }
    }

    pub fn bias(&self) -> f64 {
        self.bias.value()
    }

    /// The noiseless pressure for a given ground truth.
    pub fn true_pressure(&self, truth: &GroundTruthState) -> f64 {
        pressure_from_altitude(truth.altitude() + self.ground_altitude)
    }
}

impl SimulatedSensor for BarometerModel {
    type Reading = BarometerReading;

    fn initialize(&mut self, noise: &mut dyn NoiseSource) {
        self.bias.initialize(noise);
    }

    fn sample(
        &mut self,
        truth: &GroundTruthState,
        _context: SampleContext,
        noise: &mut dyn NoiseSource,
    ) -> BarometerReading {
        let mut y_baro = self.true_pressure(truth);
        y_baro += gaussian_noise::<f64>(self.stdev, noise);
        y_baro += self.bias.walk(noise);

        BarometerReading {
            pressure: y_baro as f32,
            temperature: SENSOR_TEMPERATURE_C,
        }
    }
}

// silboard_core/src/models/measurement/sonar.rs

use super::{SampleContext, SimulatedSensor};
use crate::abstractions::NoiseSource;
use crate::config::SensorConfig;
use crate::types::GroundTruthState;

// --- Concrete Model for a downward Sonar rangefinder ---
// Saturates silently at both ends of its range. It has no bias.
#[derive(Debug, Clone)]
pub struct SonarModel {
    stdev: f64,
    min_range: f64,
    max_range: f64,
}

impl SonarModel {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            stdev: config.sonar_stdev,
            min_range: config.sonar_min_range,
            max_range: config.sonar_max_range,
        }
    }

    pub fn min_range(&self) -> f64 {
        self.min_range
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }
}

impl SimulatedSensor for SonarModel {
    /// Range to ground (m).
    type Reading = f32;

    fn initialize(&mut self, _noise: &mut dyn NoiseSource) {}

    fn sample(
        &mut self,
        truth: &GroundTruthState,
        _context: SampleContext,
        noise: &mut dyn NoiseSource,
    ) -> f32 {
        // Height above the world origin; the ground-altitude offset does not apply.
        let alt = truth.altitude();

        if alt < self.min_range {
            self.min_range as f32
        } else if alt > self.max_range {
            self.max_range as f32
        } else {
            (alt + self.stdev * noise.gaussian()) as f32
        }
    }
}

// silboard_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::abstractions::{
    Defaults, NoRc, NoiseSource, ParameterSource, PhysicsStateProvider, RcSource,
};
pub use crate::board::{Board, ImuSample, SilBoard};
pub use crate::models::measurement::SimulatedSensor;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::actuators::{RcFrame, RcInbox, NUM_PWM_OUTPUTS, NUM_RC_CHANNELS};
pub use crate::config::{NoiseParams, SensorConfig};
pub use crate::error::BoardError;
pub use crate::messages::{Odometry, WorldFrame};
pub use crate::persistence::PersistentStore;
pub use crate::types::{GroundTruthState, Rotation, Vec3, VehicleType};

// --- Noise ---
pub use crate::noise::NoiseEngine;

// --- Sensor Readings ---
pub use crate::models::measurement::{AirspeedReading, BarometerReading, ImuReading};

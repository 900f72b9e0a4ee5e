// silboard_sim/src/prelude.rs

// Re-export the core library's prelude.
pub use silboard_core::prelude::*;

pub use crate::simulation::config::{ScenarioConfig, ScriptedRcFrame};
pub use crate::simulation::error::SimError;
pub use crate::simulation::firmware::{Firmware, ProbeFirmware, ProbeStats};
pub use crate::simulation::physics::KinematicPhysics;
pub use crate::simulation::rc::ChannelRcSource;
pub use crate::simulation::runner::SimulationRunner;
pub use crate::simulation::truth::{LogTruthSink, RecordingTruthSink, TruthSink};

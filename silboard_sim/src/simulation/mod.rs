// silboard_sim/src/simulation/mod.rs

pub mod config;
pub mod error;
pub mod firmware;
pub mod physics;
pub mod rc;
pub mod runner;
pub mod truth;
pub mod utils;

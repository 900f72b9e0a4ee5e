// silboard_sim/src/simulation/utils/mod.rs

pub mod serde_helpers;

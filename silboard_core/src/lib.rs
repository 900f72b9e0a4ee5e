// silboard_core/src/lib.rs

// This file defines the public modules of the board core.
pub mod abstractions;
pub mod actuators;
pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod frames;
pub mod messages;
pub mod models;
pub mod noise;
pub mod persistence;
pub mod prelude;
pub mod scheduling;
pub mod types;

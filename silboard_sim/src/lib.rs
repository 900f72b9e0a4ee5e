// silboard_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the silboard_sim crate.
pub mod prelude;

// This module contains all the host-side simulation logic.
pub mod cli;
pub mod simulation;

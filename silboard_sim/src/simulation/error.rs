// silboard_sim/src/simulation/error.rs

use silboard_core::error::BoardError;
use thiserror::Error;

/// Errors raised while setting up or driving a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The scenario file or environment overrides could not be parsed.
    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    /// The scenario parsed but describes something that cannot be simulated.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("failed to spawn the RC delivery thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("failed to render scenario as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

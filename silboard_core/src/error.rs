// silboard_core/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised inside the board core. None of these are fatal to the
/// firmware; the board surface turns them into `false` plus a log line.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The namespace directory for persistent memory could not be created.
    #[error("unable to create memory directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The memory blob could not be opened or read.
    #[error("unable to load memory file {path}: {source}")]
    ReadMemory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The memory blob could not be written.
    #[error("unable to write memory file {path}: {source}")]
    WriteMemory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured airframe is not one the board knows how to emulate.
    #[error("unknown or unsupported vehicle type '{0}'")]
    UnknownVehicleType(String),
}

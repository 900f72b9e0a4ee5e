// silboard_core/src/abstractions.rs

//! The contracts between the board core and the world around it. The board
//! depends only on these traits, never on a particular simulator, transport
//! or parameter server.

use std::collections::{BTreeMap, HashMap};

use crate::actuators::RcInbox;
use crate::types::GroundTruthState;

// --- PHYSICS STATE PROVIDER ---
/// Supplies ground truth at each simulation tick.
/// Implementations must be `Send + Sync` so the provider can be shared with the
/// loop that steps it.
pub trait PhysicsStateProvider: Send + Sync {
    /// Returns an immutable snapshot of the body state at the current simulation time.
    fn snapshot(&self) -> GroundTruthState;

    /// Current simulation time in seconds. Defaults to the snapshot timestamp.
    fn sim_time(&self) -> f64 {
        self.snapshot().timestamp
    }
}

// --- PARAMETER SOURCE ---
/// A read-only table of numeric options. Absent keys are not an error: callers
/// pass the documented default and get it back.
pub trait ParameterSource {
    fn get(&self, key: &str, default: f64) -> f64;
}

impl ParameterSource for HashMap<String, f64> {
    fn get(&self, key: &str, default: f64) -> f64 {
        HashMap::get(self, key).copied().unwrap_or(default)
    }
}

impl ParameterSource for BTreeMap<String, f64> {
    fn get(&self, key: &str, default: f64) -> f64 {
        BTreeMap::get(self, key).copied().unwrap_or(default)
    }
}

/// An empty parameter table; every lookup yields its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Defaults;

impl ParameterSource for Defaults {
    fn get(&self, _key: &str, default: f64) -> f64 {
        default
    }
}

// --- RC SOURCE ---
/// An external operator-input source (a transmitter, a joystick bridge, a script).
///
/// Frames arrive asynchronously: the source pushes them into the `RcInbox` it was
/// handed in `subscribe`, from whatever thread it likes.
pub trait RcSource: Send + Sync {
    /// True while something is actively publishing RC frames.
    fn connected(&self) -> bool;

    /// Registers the inbox that incoming frames must be delivered to.
    /// A later call replaces the previous inbox.
    fn subscribe(&self, inbox: RcInbox);
}

/// An RC source that never connects. Every read falls back to the fail-safe defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRc;

impl RcSource for NoRc {
    fn connected(&self) -> bool {
        false
    }

    fn subscribe(&self, _inbox: RcInbox) {}
}

// --- NOISE SOURCE ---
/// The board's only source of non-determinism.
pub trait NoiseSource: Send {
    /// A sample from N(0, 1).
    fn gaussian(&mut self) -> f64;

    /// A sample from U(-1, 1).
    fn uniform(&mut self) -> f64;
}

// silboard_core/src/types.rs

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

// --- Core Type Aliases ---
pub type Vec3 = Vector3<f64>;
pub type Rotation = UnitQuaternion<f64>;

// =========================================================================
// == Ground Truth ==
// =========================================================================

/// The simulation's exact, noiseless kinematic state of the vehicle body,
/// as handed over by the physics provider once per read.
///
/// All world-frame quantities use the simulation's native north-west-up frame.
/// `orientation` rotates body-frame vectors into the world frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthState {
    /// Position of the body origin in the world frame (m).
    pub position: Vec3,
    /// Rotation from the body frame to the world frame.
    pub orientation: Rotation,
    /// Linear velocity expressed in the BODY frame (m/s).
    pub linear_velocity: Vec3,
    /// Angular velocity expressed in the BODY frame (rad/s).
    pub angular_velocity: Vec3,
    /// Coordinate acceleration expressed in the WORLD frame (m/s^2).
    pub linear_acceleration: Vec3,
    /// Gravity vector in the world frame, e.g. `[0, 0, -9.81]`.
    pub gravity: Vec3,
    /// Simulation time in seconds.
    pub timestamp: f64,
}

impl GroundTruthState {
    /// A body at rest at the world origin, level, at time zero.
    pub fn at_rest(gravity: Vec3) -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Rotation::identity(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            linear_acceleration: Vec3::zeros(),
            gravity,
            timestamp: 0.0,
        }
    }

    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.into(), self.orientation)
    }

    /// Height above the world origin (the "up" component of position).
    pub fn altitude(&self) -> f64 {
        self.position.z
    }
}

impl Default for GroundTruthState {
    fn default() -> Self {
        Self::at_rest(Vec3::new(0.0, 0.0, -9.81))
    }
}

// =========================================================================
// == Vehicle Type ==
// =========================================================================

/// The airframe class being simulated. Only affects which sensors report as present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleType {
    #[default]
    Multirotor,
    Fixedwing,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Multirotor => "multirotor",
            VehicleType::Fixedwing => "fixedwing",
        }
    }

    /// Fixed-wing airframes carry a pitot tube.
    pub fn has_airspeed_sensor(&self) -> bool {
        matches!(self, VehicleType::Fixedwing)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multirotor" => Ok(VehicleType::Multirotor),
            "fixedwing" | "fixed-wing" | "fixed_wing" => Ok(VehicleType::Fixedwing),
            other => Err(BoardError::UnknownVehicleType(other.to_string())),
        }
    }
}

// silboard_core/src/messages.rs

use nalgebra::{Isometry3, Vector3};
use std::fmt;

use crate::frames::{nwu_to_ned, nwu_to_ned_pose};
use crate::types::GroundTruthState;

// =========================================================================
// == Public API Messages (Topic Data) ==
// =========================================================================

/// The world frame an `Odometry` message is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorldFrame {
    /// North-west-up, the simulation's native frame.
    #[default]
    Nwu,
    /// North-east-down, the firmware's frame.
    Ned,
}

impl WorldFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldFrame::Nwu => "world_nwu",
            WorldFrame::Ned => "world_ned",
        }
    }
}

impl fmt::Display for WorldFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact vehicle state, published alongside the simulated sensors so that
/// estimators can be scored against it.
#[derive(Clone, Debug, PartialEq)]
pub struct Odometry {
    pub timestamp: f64,
    pub frame: WorldFrame,
    pub pose: Isometry3<f64>,
    pub linear_velocity_body: Vector3<f64>,
    pub angular_velocity_body: Vector3<f64>,
}

impl Odometry {
    pub fn from_truth(truth: &GroundTruthState) -> Self {
        Self {
            timestamp: truth.timestamp,
            frame: WorldFrame::Nwu,
            pose: truth.pose(),
            linear_velocity_body: truth.linear_velocity,
            angular_velocity_body: truth.angular_velocity,
        }
    }

    /// The same message expressed in NED. Already-NED messages are returned unchanged.
    pub fn to_ned(&self) -> Self {
        if self.frame == WorldFrame::Ned {
            return self.clone();
        }
        Self {
            timestamp: self.timestamp,
            frame: WorldFrame::Ned,
            pose: nwu_to_ned_pose(&self.pose),
            linear_velocity_body: nwu_to_ned(&self.linear_velocity_body),
            angular_velocity_body: nwu_to_ned(&self.angular_velocity_body),
        }
    }
}

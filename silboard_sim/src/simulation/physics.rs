// silboard_sim/src/simulation/physics.rs

use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use parking_lot::RwLock;
use tracing::debug;

use silboard_core::abstractions::PhysicsStateProvider;
use silboard_core::types::GroundTruthState;

use super::config::Vehicle;

/// A kinematic stand-in for a physics engine: the body moves at a constant
/// world velocity and yaws at a constant rate. It has no dynamics and ignores
/// actuator outputs.
#[derive(Debug)]
pub struct KinematicPhysics {
    initial_pose: Isometry3<f64>,
    /// World-frame (NWU) velocity.
    velocity: Vector3<f64>,
    yaw_rate: f64,
    state: RwLock<GroundTruthState>,
}

impl KinematicPhysics {
    pub fn new(
        initial_pose: Isometry3<f64>,
        velocity: Vector3<f64>,
        yaw_rate: f64,
        gravity: Vector3<f64>,
    ) -> Self {
        let mut state = GroundTruthState::at_rest(gravity);
        state.position = initial_pose.translation.vector;
        state.orientation = initial_pose.rotation;
        Self::fill_rates(&mut state, velocity, yaw_rate);

        Self {
            initial_pose,
            velocity,
            yaw_rate,
            state: RwLock::new(state),
        }
    }

    pub fn from_config(vehicle: &Vehicle) -> Self {
        Self::new(
            vehicle.initial_pose.to_isometry(),
            vehicle.velocity,
            vehicle.yaw_rate,
            vehicle.gravity,
        )
    }

    // Body-frame velocities follow from the world velocity and current attitude.
    fn fill_rates(state: &mut GroundTruthState, velocity: Vector3<f64>, yaw_rate: f64) {
        state.linear_velocity = state.orientation.inverse_transform_vector(&velocity);
        state.angular_velocity = Vector3::new(0.0, 0.0, yaw_rate);
        state.linear_acceleration = Vector3::zeros();
    }

    /// Advances the body by `dt` seconds.
    pub fn step(&self, dt: f64) {
        let mut state = self.state.write();
        state.position += self.velocity * dt;
        state.orientation *= UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.yaw_rate * dt);
        Self::fill_rates(&mut state, self.velocity, self.yaw_rate);
        state.timestamp += dt;
    }

    /// Puts the body back at its initial pose. Simulation time keeps running.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.position = self.initial_pose.translation.vector;
        state.orientation = self.initial_pose.rotation;
        Self::fill_rates(&mut state, self.velocity, self.yaw_rate);
        debug!("Vehicle reset to initial pose at t = {:.3} s", state.timestamp);
    }
}

impl PhysicsStateProvider for KinematicPhysics {
    fn snapshot(&self) -> GroundTruthState {
        self.state.read().clone()
    }

    fn sim_time(&self) -> f64 {
        self.state.read().timestamp
    }
}

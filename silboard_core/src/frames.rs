// silboard_core/src/frames.rs

//! Conversions between the simulation's north-west-up (NWU) world frame and the
//! north-east-down (NED) frame the firmware expects.
//!
//! The two frames differ by a half turn about the shared north (x) axis, so the
//! conversion is its own inverse: negate the second and third components.

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

/// Sign pattern applied to each axis when crossing between NWU and NED.
pub const NWU_NED_AXIS_SIGNS: [f64; 3] = [1.0, -1.0, -1.0];

/// Converts a 3-vector from NWU to NED.
pub fn nwu_to_ned(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(
        v.x,  // North -> North
        -v.y, // West -> East
        -v.z, // Up -> Down
    )
}

/// Converts a 3-vector from NED to NWU. Identical to `nwu_to_ned`.
pub fn ned_to_nwu(v: &Vector3<f64>) -> Vector3<f64> {
    nwu_to_ned(v)
}

/// Converts a body-to-world rotation expressed in NWU into the same physical
/// attitude expressed in NED.
///
/// q_ned = q_flip * q_nwu * q_flip^-1 with q_flip a half turn about x, which
/// reduces to negating the quaternion's y and z parts.
pub fn nwu_to_ned_rotation(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let c = q.quaternion();
    UnitQuaternion::new_unchecked(Quaternion::new(c.w, c.i, -c.j, -c.k))
}

/// Converts a rotation from NED to NWU. Identical to `nwu_to_ned_rotation`.
pub fn ned_to_nwu_rotation(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    nwu_to_ned_rotation(q)
}

/// Converts a full pose from NWU to NED.
pub fn nwu_to_ned_pose(pose: &Isometry3<f64>) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(nwu_to_ned(&pose.translation.vector)),
        nwu_to_ned_rotation(&pose.rotation),
    )
}

/// Writes a vector into a firmware-facing `f32` triple in NED.
pub fn to_output_frame(v: &Vector3<f64>) -> [f32; 3] {
    let ned = nwu_to_ned(v);
    [ned.x as f32, ned.y as f32, ned.z as f32]
}

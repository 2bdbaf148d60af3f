//! Rotation helpers for goal computation
//!
//! Orientation errors are expressed as scaled-axis (log-map) vectors so that the direct and
//! interpolated error paths agree.

use nalgebra::{Matrix3, Rotation3, Vector3};

/// Any orientation-delta component above this magnitude counts as a real command
pub const ORIENTATION_DELTA_EPSILON: f64 = 1e-9;

/// End effector pointing straight down, used when orientation is not controlled
pub fn down_orientation() -> Rotation3<f64> {
    Rotation3::from_matrix_unchecked(Matrix3::new(
        0.0, 1.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 0.0, -1.0,
    ))
}

/// Rotation taking `current` to `desired`, as a world-frame scaled axis
pub fn orientation_error(desired: &Rotation3<f64>, current: &Rotation3<f64>) -> Vector3<f64> {
    (desired * current.inverse()).scaled_axis()
}

/// Rotation from an axis-angle vector (direction = axis, norm = angle)
pub fn axis_angle_to_rotation(axis_angle: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::new(*axis_angle)
}

/// True if any component of the orientation delta is non-negligible
pub fn is_orientation_command(delta: &Vector3<f64>) -> bool {
    delta.iter().any(|v| v.abs() > ORIENTATION_DELTA_EPSILON)
}

/// Clip a position per axis
pub fn clip_position(
    position: &Vector3<f64>,
    limits: Option<&[[f64; 3]; 2]>,
) -> Vector3<f64> {
    match limits {
        Some([low, high]) => Vector3::from_fn(|i, _| position[i].max(low[i]).min(high[i])),
        None => *position,
    }
}

/// Clip an orientation's roll/pitch/yaw per axis
pub fn clip_orientation(
    orientation: &Rotation3<f64>,
    limits: Option<&[[f64; 3]; 2]>,
) -> Rotation3<f64> {
    let Some([low, high]) = limits else {
        return *orientation;
    };
    let (roll, pitch, yaw) = orientation.euler_angles();
    let euler = [roll, pitch, yaw];
    let clipped: Vec<f64> = (0..3).map(|i| euler[i].max(low[i]).min(high[i])).collect();
    if clipped.iter().zip(euler.iter()).all(|(a, b)| a == b) {
        return *orientation;
    }
    Rotation3::from_euler_angles(clipped[0], clipped[1], clipped[2])
}

/// Goal position from a delta (or override), then clipped
pub fn goal_position(
    delta: &Vector3<f64>,
    current: &Vector3<f64>,
    limits: Option<&[[f64; 3]; 2]>,
    set_pos: Option<Vector3<f64>>,
) -> Vector3<f64> {
    let goal = set_pos.unwrap_or(current + delta);
    clip_position(&goal, limits)
}

/// Goal orientation from an axis-angle delta (or override), then clipped
pub fn goal_orientation(
    delta: &Vector3<f64>,
    current: &Rotation3<f64>,
    limits: Option<&[[f64; 3]; 2]>,
    set_ori: Option<Rotation3<f64>>,
) -> Rotation3<f64> {
    let goal = set_ori.unwrap_or_else(|| axis_angle_to_rotation(delta) * current);
    clip_orientation(&goal, limits)
}

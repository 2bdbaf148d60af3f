// Force/torque message types for end-effector sensing
//
// A wrench is carried as two 3-vectors; control code works on the stacked
// six-vector `[fx, fy, fz, tx, ty, tz]`.

use nalgebra::{Isometry3, Vector3, Vector6};
use oscft_core::core::LogSummary;
use serde::{Deserialize, Serialize};

/// Force and torque measurement (wrench)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Wrench {
    /// Force vector [fx, fy, fz] in Newtons
    pub force: Vector3<f64>,
    /// Torque vector [tx, ty, tz] in Newton-meters
    pub torque: Vector3<f64>,
}

impl Wrench {
    /// Create a new wrench
    pub fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }

    /// Stack as `[force; torque]`
    pub fn to_vector(&self) -> Vector6<f64> {
        let mut v = Vector6::zeros();
        v.fixed_rows_mut::<3>(0).copy_from(&self.force);
        v.fixed_rows_mut::<3>(3).copy_from(&self.torque);
        v
    }

    /// Express a wrench measured at `frame`'s origin in the frame's own axes
    ///
    /// `f' = Rᵀ f` and `τ' = Rᵀ τ - Rᵀ (p × f)`, with `R`, `p` the frame's world rotation and
    /// position.
    pub fn in_frame(&self, frame: &Isometry3<f64>) -> Self {
        let r_t = frame.rotation.to_rotation_matrix().transpose();
        let p = frame.translation.vector;
        let force = r_t * self.force;
        let torque = r_t * self.torque - r_t * p.cross(&self.force);
        Self::new(force, torque)
    }
}

impl LogSummary for Wrench {
    fn log_summary(&self) -> String {
        format!(
            "Wrench(F=[{:.2}, {:.2}, {:.2}]N, T=[{:.2}, {:.2}, {:.2}]Nm)",
            self.force.x, self.force.y, self.force.z, self.torque.x, self.torque.y, self.torque.z
        )
    }
}

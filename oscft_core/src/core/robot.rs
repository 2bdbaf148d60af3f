//! Boundary to the external kinematics/simulation provider
//!
//! The controller never simulates dynamics itself. Each cycle it pulls one
//! [`KinematicSnapshot`] plus named sensor readings through [`RobotInterface`].

use super::LogSummary;
use crate::error::{OscError, OscResult};
use nalgebra::{DMatrix, DVector, Isometry3, Rotation3, Vector3};

/// Read-only dynamics and kinematics for one control cycle
#[derive(Debug, Clone)]
pub struct KinematicSnapshot {
    /// Joint-space mass matrix (dof x dof)
    pub mass_matrix: DMatrix<f64>,
    /// Full end-effector Jacobian (6 x dof), linear rows first
    pub j_full: DMatrix<f64>,
    /// Positional Jacobian (3 x dof)
    pub j_pos: DMatrix<f64>,
    /// Rotational Jacobian (3 x dof)
    pub j_ori: DMatrix<f64>,
    /// End-effector position in the world frame
    pub ee_pos: Vector3<f64>,
    /// End-effector orientation in the world frame
    pub ee_ori: Rotation3<f64>,
    /// End-effector linear velocity
    pub ee_pos_vel: Vector3<f64>,
    /// End-effector angular velocity
    pub ee_ori_vel: Vector3<f64>,
    pub joint_pos: DVector<f64>,
    pub joint_vel: DVector<f64>,
    /// Posture the nullspace term pulls redundant joints toward
    pub reference_joint_pos: DVector<f64>,
    /// Gravity/Coriolis compensation torque
    pub torque_compensation: DVector<f64>,
}

impl KinematicSnapshot {
    /// Build a snapshot from the full Jacobian, slicing out the positional and rotational rows
    #[allow(clippy::too_many_arguments)]
    pub fn from_full_jacobian(
        mass_matrix: DMatrix<f64>,
        j_full: DMatrix<f64>,
        ee_pos: Vector3<f64>,
        ee_ori: Rotation3<f64>,
        ee_pos_vel: Vector3<f64>,
        ee_ori_vel: Vector3<f64>,
        joint_pos: DVector<f64>,
        joint_vel: DVector<f64>,
        reference_joint_pos: DVector<f64>,
        torque_compensation: DVector<f64>,
    ) -> OscResult<Self> {
        if j_full.nrows() != 6 {
            return Err(OscError::dimension("full Jacobian rows", 6, j_full.nrows()));
        }
        let j_pos = j_full.rows(0, 3).into_owned();
        let j_ori = j_full.rows(3, 3).into_owned();
        let snapshot = Self {
            mass_matrix,
            j_full,
            j_pos,
            j_ori,
            ee_pos,
            ee_ori,
            ee_pos_vel,
            ee_ori_vel,
            joint_pos,
            joint_vel,
            reference_joint_pos,
            torque_compensation,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Degrees of freedom of the arm
    pub fn dof(&self) -> usize {
        self.mass_matrix.nrows()
    }

    /// Check that every matrix and vector agrees on the degree-of-freedom count
    pub fn validate(&self) -> OscResult<()> {
        let n = self.dof();
        if n == 0 {
            return Err(OscError::InvalidSnapshot("arm has zero degrees of freedom".into()));
        }
        if self.mass_matrix.ncols() != n {
            return Err(OscError::InvalidSnapshot(format!(
                "mass matrix is {}x{}, expected square",
                n,
                self.mass_matrix.ncols()
            )));
        }
        let jacobians = [
            ("j_full", &self.j_full, 6),
            ("j_pos", &self.j_pos, 3),
            ("j_ori", &self.j_ori, 3),
        ];
        for (name, jacobian, rows) in jacobians {
            if jacobian.shape() != (rows, n) {
                return Err(OscError::InvalidSnapshot(format!(
                    "{} is {}x{}, expected {}x{}",
                    name,
                    jacobian.nrows(),
                    jacobian.ncols(),
                    rows,
                    n
                )));
            }
        }
        let vectors = [
            ("joint_pos", &self.joint_pos),
            ("joint_vel", &self.joint_vel),
            ("reference_joint_pos", &self.reference_joint_pos),
            ("torque_compensation", &self.torque_compensation),
        ];
        for (name, vector) in vectors {
            if vector.len() != n {
                return Err(OscError::InvalidSnapshot(format!(
                    "{} has length {}, expected {}",
                    name,
                    vector.len(),
                    n
                )));
            }
        }
        Ok(())
    }
}

impl LogSummary for KinematicSnapshot {
    fn log_summary(&self) -> String {
        format!(
            "KinematicSnapshot(dof={}, ee_pos=[{:.3}, {:.3}, {:.3}])",
            self.dof(),
            self.ee_pos.x,
            self.ee_pos.y,
            self.ee_pos.z
        )
    }
}

/// Provider of per-cycle robot state
///
/// Implemented by the simulation or hardware bridge. All lookups are by name so the same
/// controller can be pointed at different robots through configuration alone.
pub trait RobotInterface {
    /// Fresh dynamics/kinematics for the current cycle
    fn snapshot(&self) -> OscResult<KinematicSnapshot>;

    /// Raw reading of a named sensor
    fn sensor_measurement(&self, name: &str) -> OscResult<DVector<f64>>;

    /// World pose of a named body
    fn body_pose(&self, name: &str) -> OscResult<Isometry3<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_snapshot(n: usize) -> OscResult<KinematicSnapshot> {
        let mut j_full = DMatrix::zeros(6, n);
        for i in 0..n.min(6) {
            j_full[(i, i)] = 1.0;
        }
        KinematicSnapshot::from_full_jacobian(
            DMatrix::identity(n, n),
            j_full,
            Vector3::zeros(),
            Rotation3::identity(),
            Vector3::zeros(),
            Vector3::zeros(),
            DVector::zeros(n),
            DVector::zeros(n),
            DVector::zeros(n),
            DVector::zeros(n),
        )
    }

    #[test]
    fn test_from_full_jacobian_slices_rows() {
        let snapshot = identity_snapshot(7).unwrap();
        assert_eq!(snapshot.dof(), 7);
        assert_eq!(snapshot.j_pos.shape(), (3, 7));
        assert_eq!(snapshot.j_ori[(0, 3)], 1.0);
    }

    #[test]
    fn test_validate_rejects_short_vectors() {
        let mut snapshot = identity_snapshot(6).unwrap();
        snapshot.joint_vel = DVector::zeros(5);
        assert!(matches!(
            snapshot.validate(),
            Err(OscError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_jacobian_height() {
        let result = KinematicSnapshot::from_full_jacobian(
            DMatrix::identity(6, 6),
            DMatrix::zeros(5, 6),
            Vector3::zeros(),
            Rotation3::identity(),
            Vector3::zeros(),
            Vector3::zeros(),
            DVector::zeros(6),
            DVector::zeros(6),
            DVector::zeros(6),
            DVector::zeros(6),
        );
        assert!(matches!(result, Err(OscError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_log_summary() {
        let snapshot = identity_snapshot(6).unwrap();
        assert!(snapshot.log_summary().starts_with("KinematicSnapshot(dof=6"));
    }
}

//! Operational-space dynamics
//!
//! Effective end-effector inertia, the dynamically consistent nullspace projector and the
//! posture torque that lives in that nullspace.
//!
//! Inversions go through [`robust_inverse`]: a well-conditioned matrix is inverted exactly,
//! a near-singular one falls back to a damped pseudo-inverse and the result is flagged.

use nalgebra::{DMatrix, DVector};
use oscft_core::error::{OscError, OscResult};
use tracing::warn;

/// Smallest accepted ratio between the smallest and largest singular value
pub const MIN_RECIPROCAL_CONDITION: f64 = 1e-10;

/// Damping of the pseudo-inverse fallback
pub const PSEUDO_INVERSE_DAMPING: f64 = 1e-3;

/// Inverse of a square matrix, possibly regularised
#[derive(Debug, Clone)]
pub struct RobustInverse {
    pub matrix: DMatrix<f64>,
    /// The damped pseudo-inverse was used instead of the exact inverse
    pub damped: bool,
}

/// Invert `a`, falling back to `aᵀ(aaᵀ + λ²I)⁻¹` when it is near-singular
pub fn robust_inverse(a: &DMatrix<f64>, what: &str) -> OscResult<RobustInverse> {
    if !a.is_square() {
        return Err(OscError::Numerical(format!(
            "cannot invert non-square {} ({}x{})",
            what,
            a.nrows(),
            a.ncols()
        )));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(OscError::Numerical(format!("{} contains non-finite entries", what)));
    }

    let singular_values = a.clone().svd(false, false).singular_values;
    let max = singular_values.max();
    let min = singular_values.min();
    let well_conditioned = max > 0.0 && min / max > MIN_RECIPROCAL_CONDITION;

    if well_conditioned {
        if let Some(matrix) = a.clone().try_inverse() {
            return Ok(RobustInverse {
                matrix,
                damped: false,
            });
        }
    }

    warn!(
        "{} is near-singular (sigma_min={:.3e}, sigma_max={:.3e}); using damped pseudo-inverse",
        what, min, max
    );
    let n = a.nrows();
    let regularised = a * a.transpose()
        + DMatrix::identity(n, n) * (PSEUDO_INVERSE_DAMPING * PSEUDO_INVERSE_DAMPING);
    let inv = regularised.try_inverse().ok_or_else(|| {
        OscError::Numerical(format!("damped pseudo-inverse of {} failed", what))
    })?;
    Ok(RobustInverse {
        matrix: a.transpose() * inv,
        damped: true,
    })
}

/// Operational-space matrices for one control cycle
#[derive(Debug, Clone)]
pub struct OpspaceMatrices {
    pub mass_inv: DMatrix<f64>,
    /// Full 6x6 task inertia
    pub lambda_full: DMatrix<f64>,
    /// 3x3 inertia seen by translational motion
    pub lambda_pos: DMatrix<f64>,
    /// 3x3 inertia seen by rotational motion
    pub lambda_ori: DMatrix<f64>,
    /// `I - J̄ J`, projector onto motions that leave the end effector still
    pub nullspace: DMatrix<f64>,
    /// Any inversion needed the damped fallback
    pub degraded: bool,
}

impl OpspaceMatrices {
    pub fn compute(
        mass_matrix: &DMatrix<f64>,
        j_full: &DMatrix<f64>,
        j_pos: &DMatrix<f64>,
        j_ori: &DMatrix<f64>,
    ) -> OscResult<Self> {
        let mass_inv = robust_inverse(mass_matrix, "mass matrix")?;

        let task_inv = |j: &DMatrix<f64>, what: &str| -> OscResult<RobustInverse> {
            robust_inverse(&(j * &mass_inv.matrix * j.transpose()), what)
        };
        let lambda_full = task_inv(j_full, "full task inertia")?;
        let lambda_pos = task_inv(j_pos, "position task inertia")?;
        let lambda_ori = task_inv(j_ori, "orientation task inertia")?;

        let dof = mass_matrix.nrows();
        let j_bar = &mass_inv.matrix * j_full.transpose() * &lambda_full.matrix;
        let nullspace = DMatrix::identity(dof, dof) - j_bar * j_full;

        let degraded =
            mass_inv.damped || lambda_full.damped || lambda_pos.damped || lambda_ori.damped;

        Ok(Self {
            mass_inv: mass_inv.matrix,
            lambda_full: lambda_full.matrix,
            lambda_pos: lambda_pos.matrix,
            lambda_ori: lambda_ori.matrix,
            nullspace,
            degraded,
        })
    }
}

/// Critically damped posture spring toward `reference`, projected into the nullspace
pub fn nullspace_torques(
    mass_matrix: &DMatrix<f64>,
    nullspace: &DMatrix<f64>,
    reference: &DVector<f64>,
    joint_pos: &DVector<f64>,
    joint_vel: &DVector<f64>,
    kp: f64,
) -> DVector<f64> {
    let kv = 2.0 * kp.sqrt();
    let posture = mass_matrix * ((reference - joint_pos) * kp - joint_vel * kv);
    nullspace.transpose() * posture
}

//! Impedance torque engine
//!
//! Pose error -> desired wrench -> task-space decoupling -> force/position blend -> joint
//! torques with the nullspace posture term.

use super::state::Stiffness;
use crate::algorithms::opspace::{nullspace_torques, OpspaceMatrices};
use nalgebra::{DVector, Matrix6, Vector3, Vector6};
use oscft_core::core::{ForceBlendMode, KinematicSnapshot};

/// Spring-damper force and torque for the given errors
pub fn desired_wrench(
    stiffness: &Stiffness,
    position_error: &Vector3<f64>,
    linear_vel: &Vector3<f64>,
    orientation_error: &Vector3<f64>,
    angular_vel: &Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    let (kp_pos, kd_pos) = stiffness.position_gains();
    let (kp_ori, kd_ori) = stiffness.orientation_gains();
    let force = kp_pos * position_error + kd_pos * (-linear_vel);
    let torque = kp_ori * orientation_error + kd_ori * (-angular_vel);
    (force, torque)
}

/// Scale the desired force/torque by the task inertia
pub fn decouple(
    ops: &OpspaceMatrices,
    force: &Vector3<f64>,
    torque: &Vector3<f64>,
    uncouple_pos_ori: bool,
) -> Vector6<f64> {
    let mut wrench = Vector6::zeros();
    if uncouple_pos_ori {
        let f = &ops.lambda_pos * DVector::from_column_slice(force.as_slice());
        let t = &ops.lambda_ori * DVector::from_column_slice(torque.as_slice());
        wrench.fixed_rows_mut::<3>(0).copy_from(&f);
        wrench.fixed_rows_mut::<3>(3).copy_from(&t);
    } else {
        let stacked = DVector::from_iterator(6, force.iter().chain(torque.iter()).copied());
        wrench.copy_from(&(&ops.lambda_full * stacked));
    }
    wrench
}

type BlendFn = fn(&Vector6<f64>, &Vector6<f64>, &Vector6<f64>) -> Vector6<f64>;

/// Blend rule for `mode`: `(impedance wrench, active force, selection diagonal) -> wrench`
pub fn blend_rule(mode: ForceBlendMode) -> BlendFn {
    match mode {
        ForceBlendMode::Position => |w, _, _| *w,
        ForceBlendMode::Active => |_, a, _| *a,
        ForceBlendMode::Both => |w, a, _| w + a,
        ForceBlendMode::Hybrid => |w, a, s| {
            let selection = Matrix6::from_diagonal(s);
            selection * w + (Matrix6::identity() - selection) * a
        },
    }
}

/// Final joint torques: task wrench through `Jᵀ`, compensation, nullspace posture
pub fn joint_torques(
    snapshot: &KinematicSnapshot,
    ops: &OpspaceMatrices,
    task_wrench: &Vector6<f64>,
    nullspace_kp: f64,
) -> DVector<f64> {
    let wrench = DVector::from_column_slice(task_wrench.as_slice());
    let task = snapshot.j_full.transpose() * wrench;
    let posture = nullspace_torques(
        &snapshot.mass_matrix,
        &ops.nullspace,
        &snapshot.reference_joint_pos,
        &snapshot.joint_pos,
        &snapshot.joint_vel,
        nullspace_kp,
    );
    task + &snapshot.torque_compensation + posture
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn wrench_pair() -> (Vector6<f64>, Vector6<f64>) {
        (
            Vector6::new(1.0, 2.0, 3.0, 0.1, 0.2, 0.3),
            Vector6::new(-4.0, 0.5, 7.0, 0.0, -1.0, 2.0),
        )
    }

    #[test]
    fn test_blend_algebra() {
        let (w, a) = wrench_pair();
        let half = Vector6::repeat(0.5);
        assert_eq!(blend_rule(ForceBlendMode::Position)(&w, &a, &half), w);
        assert_eq!(blend_rule(ForceBlendMode::Active)(&w, &a, &half), a);
        assert_eq!(blend_rule(ForceBlendMode::Both)(&w, &a, &half), w + a);

        let hybrid = blend_rule(ForceBlendMode::Hybrid);
        assert_relative_eq!(hybrid(&w, &a, &Vector6::repeat(1.0)), w, epsilon = 1e-15);
        assert_relative_eq!(hybrid(&w, &a, &Vector6::zeros()), a, epsilon = 1e-15);
        assert_relative_eq!(hybrid(&w, &a, &half), (w + a) * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_hybrid_per_axis_selection() {
        let (w, a) = wrench_pair();
        let s = Vector6::new(1.0, 1.0, 0.0, 1.0, 1.0, 1.0);
        let out = blend_rule(ForceBlendMode::Hybrid)(&w, &a, &s);
        assert_eq!(out[0], w[0]);
        assert_eq!(out[2], a[2]);
    }

    #[test]
    fn test_desired_wrench_spring_damper() {
        let stiffness = Stiffness::diagonal(Vector6::repeat(100.0), &Vector6::repeat(1.0));
        let (force, torque) = desired_wrench(
            &stiffness,
            &Vector3::new(0.01, 0.0, 0.0),
            &Vector3::new(0.0, 0.5, 0.0),
            &Vector3::new(0.0, 0.0, 0.1),
            &Vector3::zeros(),
        );
        assert_relative_eq!(force, Vector3::new(1.0, -10.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(torque, Vector3::new(0.0, 0.0, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn test_full_blocks_couple_axes() {
        let stiffness = Stiffness::Full {
            kp_pos: nalgebra::Matrix3::new(0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            kp_ori: nalgebra::Matrix3::zeros(),
            kd_pos: nalgebra::Matrix3::zeros(),
            kd_ori: nalgebra::Matrix3::zeros(),
        };
        let (force, _) = desired_wrench(
            &stiffness,
            &Vector3::new(0.0, 2.0, 0.0),
            &Vector3::zeros(),
            &Vector3::zeros(),
            &Vector3::zeros(),
        );
        assert_eq!(force, Vector3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_decouple_modes_agree_for_block_diagonal_inertia() {
        let eye = DMatrix::<f64>::identity(6, 6) * 2.0;
        let ops = OpspaceMatrices::compute(
            &DMatrix::identity(6, 6),
            &eye,
            &eye.rows(0, 3).into_owned(),
            &eye.rows(3, 3).into_owned(),
        )
        .unwrap();
        let f = Vector3::new(1.0, 2.0, 3.0);
        let t = Vector3::new(-1.0, 0.0, 1.0);
        let uncoupled = decouple(&ops, &f, &t, true);
        let coupled = decouple(&ops, &f, &t, false);
        assert_relative_eq!(uncoupled, coupled, epsilon = 1e-12);
        assert_relative_eq!(uncoupled[0], 0.25, epsilon = 1e-12);
    }
}

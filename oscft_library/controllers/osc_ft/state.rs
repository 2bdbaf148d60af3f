use nalgebra::{Matrix3, Rotation3, Vector3, Vector6};

/// Impedance gains, per axis or as full 3x3 blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stiffness {
    /// `[x, y, z, rx, ry, rz]` stiffness and damping
    Diagonal { kp: Vector6<f64>, kd: Vector6<f64> },
    /// Coupled position and orientation blocks
    Full {
        kp_pos: Matrix3<f64>,
        kp_ori: Matrix3<f64>,
        kd_pos: Matrix3<f64>,
        kd_ori: Matrix3<f64>,
    },
}

impl Stiffness {
    /// Critically damped (scaled by `damping_ratio`) diagonal gains
    pub fn diagonal(kp: Vector6<f64>, damping_ratio: &Vector6<f64>) -> Self {
        let kd = kp.map(f64::sqrt).component_mul(damping_ratio) * 2.0;
        Stiffness::Diagonal { kp, kd }
    }

    /// Block-diagonal gains with no coupling terms
    pub fn uncoupled_blocks(kp: Vector6<f64>, damping_ratio: &Vector6<f64>) -> Self {
        let kd = kp.map(f64::sqrt).component_mul(damping_ratio) * 2.0;
        Stiffness::Full {
            kp_pos: Matrix3::from_diagonal(&kp.fixed_rows::<3>(0).into_owned()),
            kp_ori: Matrix3::from_diagonal(&kp.fixed_rows::<3>(3).into_owned()),
            kd_pos: Matrix3::from_diagonal(&kd.fixed_rows::<3>(0).into_owned()),
            kd_ori: Matrix3::from_diagonal(&kd.fixed_rows::<3>(3).into_owned()),
        }
    }

    /// `(kp, kd)` acting on position error and linear velocity
    pub fn position_gains(&self) -> (Matrix3<f64>, Matrix3<f64>) {
        match self {
            Stiffness::Diagonal { kp, kd } => (
                Matrix3::from_diagonal(&kp.fixed_rows::<3>(0).into_owned()),
                Matrix3::from_diagonal(&kd.fixed_rows::<3>(0).into_owned()),
            ),
            Stiffness::Full { kp_pos, kd_pos, .. } => (*kp_pos, *kd_pos),
        }
    }

    /// `(kp, kd)` acting on orientation error and angular velocity
    pub fn orientation_gains(&self) -> (Matrix3<f64>, Matrix3<f64>) {
        match self {
            Stiffness::Diagonal { kp, kd } => (
                Matrix3::from_diagonal(&kp.fixed_rows::<3>(3).into_owned()),
                Matrix3::from_diagonal(&kd.fixed_rows::<3>(3).into_owned()),
            ),
            Stiffness::Full { kp_ori, kd_ori, .. } => (*kp_ori, *kd_ori),
        }
    }
}

/// Goal and gains owned by one controller instance
///
/// Written by goal decoding, read by every control cycle. The force-loop accumulators live in
/// the PID and the sensing pipeline.
#[derive(Debug, Clone)]
pub struct ControlState {
    pub goal_pos: Vector3<f64>,
    pub goal_ori: Rotation3<f64>,
    pub force_reference: Vector6<f64>,
    pub stiffness: Stiffness,
    /// Orientation at the last goal update, origin of the interpolated orientation error
    pub ori_ref: Rotation3<f64>,
    /// Rotation from `ori_ref` to the current orientation
    pub relative_ori: Vector3<f64>,
}

impl ControlState {
    /// Hold the given pose with zero force reference
    pub fn holding(pos: Vector3<f64>, ori: Rotation3<f64>, stiffness: Stiffness) -> Self {
        Self {
            goal_pos: pos,
            goal_ori: ori,
            force_reference: Vector6::zeros(),
            stiffness,
            ori_ref: ori,
            relative_ori: Vector3::zeros(),
        }
    }

    /// Move the goal to the given pose, keeping gains and force reference
    pub fn reseed(&mut self, pos: Vector3<f64>, ori: Rotation3<f64>) {
        self.goal_pos = pos;
        self.goal_ori = ori;
        self.ori_ref = ori;
        self.relative_ori = Vector3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_critical_damping() {
        let s = Stiffness::diagonal(Vector6::repeat(100.0), &Vector6::repeat(1.0));
        let (kp, kd) = s.position_gains();
        assert_eq!(kp[(0, 0)], 100.0);
        assert_relative_eq!(kd[(2, 2)], 20.0, epsilon = 1e-12);
        assert_eq!(kd[(0, 1)], 0.0);
    }

    #[test]
    fn test_blocks_match_diagonal() {
        let kp = Vector6::new(100.0, 120.0, 140.0, 10.0, 20.0, 30.0);
        let ratio = Vector6::repeat(0.7);
        let diag = Stiffness::diagonal(kp, &ratio);
        let blocks = Stiffness::uncoupled_blocks(kp, &ratio);
        assert_eq!(diag.position_gains(), blocks.position_gains());
        assert_eq!(diag.orientation_gains(), blocks.orientation_gains());
    }
}

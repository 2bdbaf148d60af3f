//! Press a toy seven-joint arm against a compliant table
//!
//! The arm moves like a point mass in task space (`J = [I | e]`) and the table pushes back
//! with a linear spring below `z = 0`. The controller tracks the pose in x/y and orientation
//! while the force loop regulates the contact force along z.
//!
//! ```sh
//! RUST_LOG=oscft_library=debug cargo run --example hold_pose
//! ```

use oscft::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DOF: usize = 7;
const SIM_FREQ: f64 = 500.0;
const POLICY_FREQ: f64 = 20.0;
const TABLE_STIFFNESS: f64 = 2000.0;

struct ToyArm {
    q: DVector<f64>,
    qd: DVector<f64>,
    mass: DMatrix<f64>,
    jacobian: DMatrix<f64>,
}

impl ToyArm {
    fn new() -> Self {
        let mut jacobian = DMatrix::zeros(6, DOF);
        for i in 0..6 {
            jacobian[(i, i)] = 1.0;
        }
        // Redundant joint moves x and yaw together
        jacobian[(0, 6)] = 0.5;
        jacobian[(5, 6)] = 0.5;

        let mut q = DVector::zeros(DOF);
        q[2] = 0.02;
        Self {
            q,
            qd: DVector::zeros(DOF),
            mass: DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 2.0, 2.0, 0.5, 0.5, 0.5, 1.0])),
            jacobian,
        }
    }

    fn ee(&self) -> (Vector3<f64>, Rotation3<f64>) {
        let x = &self.jacobian * &self.q;
        (
            Vector3::new(x[0], x[1], x[2]),
            Rotation3::new(Vector3::new(x[3], x[4], x[5])),
        )
    }

    fn contact_force(&self) -> f64 {
        let (pos, _) = self.ee();
        if pos.z < 0.0 {
            -TABLE_STIFFNESS * pos.z
        } else {
            0.0
        }
    }

    fn step(&mut self, torques: &DVector<f64>, dt: f64) {
        let mut external = DVector::<f64>::zeros(6);
        external[2] = self.contact_force();
        let tau = torques + self.jacobian.transpose() * external - &self.qd * 5.0;
        let qdd = self
            .mass
            .clone()
            .try_inverse()
            .map(|inv| inv * tau)
            .unwrap_or_else(|| DVector::zeros(DOF));
        self.qd += qdd * dt;
        self.q += &self.qd * dt;
    }
}

impl RobotInterface for ToyArm {
    fn snapshot(&self) -> OscResult<KinematicSnapshot> {
        let (ee_pos, ee_ori) = self.ee();
        let twist = &self.jacobian * &self.qd;
        KinematicSnapshot::from_full_jacobian(
            self.mass.clone(),
            self.jacobian.clone(),
            ee_pos,
            ee_ori,
            Vector3::new(twist[0], twist[1], twist[2]),
            Vector3::new(twist[3], twist[4], twist[5]),
            self.q.clone(),
            self.qd.clone(),
            DVector::zeros(DOF),
            DVector::zeros(DOF),
        )
    }

    fn sensor_measurement(&self, name: &str) -> OscResult<DVector<f64>> {
        match name {
            // Force the arm exerts on the table
            "robot0_force_ee" => Ok(DVector::from_vec(vec![0.0, 0.0, -self.contact_force()])),
            "robot0_torque_ee" => Ok(DVector::zeros(3)),
            other => Err(OscError::SensorNotFound(other.to_string())),
        }
    }

    fn body_pose(&self, name: &str) -> OscResult<Isometry3<f64>> {
        match name {
            "robot0_eef" => Ok(Isometry3::identity()),
            other => Err(OscError::BodyNotFound(other.to_string())),
        }
    }
}

fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = OscFtConfig {
        force_active_case: "hybrid".into(),
        selection_diagonal: ScalarOrVec::Vector(vec![1.0, 1.0, 0.0, 1.0, 1.0, 1.0]),
        ft_limits: (ScalarOrVec::Scalar(-20.0), ScalarOrVec::Scalar(20.0)),
        wrench_offset: [0.0; 6],
        ..OscFtConfig::default()
    };

    let mut arm = ToyArm::new();
    let mut controller = OscFtController::new(config, &arm)
        .context("controller construction")?
        .with_position_interpolator(Box::new(LinearInterpolator::new(SIM_FREQ, POLICY_FREQ, 0.2)))
        .with_orientation_interpolator(Box::new(LinearInterpolator::new(SIM_FREQ, POLICY_FREQ, 0.2)));
    info!("{} with {} action dims", controller.name(), controller.control_dim());

    // Hold the pose, push down on the table with 5 N
    let mut action = vec![0.0; controller.control_dim()];
    action[8] = -5.0;

    let substeps = (SIM_FREQ / POLICY_FREQ) as usize;
    for policy_step in 0..40 {
        controller.set_goal(&arm, &action, GoalOverride::none())?;
        let mut last = None;
        for _ in 0..substeps {
            let output = controller.run_controller(&arm)?;
            arm.step(&output.torques, 1.0 / SIM_FREQ);
            last = Some(output);
        }
        if let Some(output) = last {
            if policy_step % 5 == 0 {
                let (pos, _) = arm.ee();
                info!(
                    "step {:>2}: z={:+.4} m, contact={:.2} N, {}",
                    policy_step,
                    pos.z,
                    arm.contact_force(),
                    output.log_summary()
                );
            }
        }
    }

    controller.reset_goal(&arm)?;
    Ok(())
}

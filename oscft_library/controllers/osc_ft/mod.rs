//! Operational-space force/impedance controller
//!
//! Tracks an end-effector pose with a task-space spring-damper while a force PID tracks a
//! wrench reference. How the two combine is selected by [`ForceBlendMode`]; how the action
//! vector sets the gains is selected by [`ImpedanceMode`].
//!
//! # Example
//!
//! ```rust,ignore
//! use oscft_library::controllers::OscFtController;
//! use oscft_core::{ArmController, GoalOverride, OscFtConfig};
//!
//! let mut controller = OscFtController::new(OscFtConfig::default(), &robot)?;
//! controller.set_goal(&robot, &[0.0; 12], GoalOverride::none())?;
//! let output = controller.run_controller(&robot)?;
//! ```

pub mod decoder;
pub mod engine;
pub mod sensor;
pub mod state;

pub use decoder::{ActionScaler, GainLimits};
pub use sensor::{ForceSensing, WrenchFilter, WrenchReader};
pub use state::{ControlState, Stiffness};

use crate::algorithms::delta_buffer::DeltaBuffer;
use crate::algorithms::interpolator::Interpolator;
use crate::algorithms::opspace::OpspaceMatrices;
use crate::algorithms::orientation::{
    axis_angle_to_rotation, down_orientation, goal_orientation, goal_position,
    is_orientation_command, orientation_error,
};
use crate::algorithms::pid::ForcePid;
use crate::messages::{ActionLayout, SegmentBounds};
use nalgebra::{DVector, Rotation3, Vector3, Vector6};
use oscft_core::core::{
    ArmController, ControlOutput, ForceBlendMode, GoalOverride, ImpedanceMode, LogSummary,
    RobotInterface,
};
use oscft_core::error::OscResult;
use oscft_core::params::OscFtConfig;
use tracing::{debug, info, trace};

/// Name reported when orientation is controlled
pub const POSE_CONTROLLER_NAME: &str = "OSC_POSE_FT";
/// Name reported for position-only control
pub const POSITION_CONTROLLER_NAME: &str = "OSC_POSITION_FT";

fn vector6(v: &DVector<f64>) -> Vector6<f64> {
    Vector6::from_column_slice(v.as_slice())
}

/// Task-space impedance controller with a force-tracking loop
pub struct OscFtController {
    name: &'static str,
    impedance_mode: ImpedanceMode,
    blend_mode: ForceBlendMode,
    layout: ActionLayout,
    scaler: ActionScaler,
    gain_limits: GainLimits,
    limits: (DVector<f64>, DVector<f64>),

    control_ori: bool,
    control_delta: bool,
    uncouple_pos_ori: bool,
    position_limits: Option<[[f64; 3]; 2]>,
    orientation_limits: Option<[[f64; 3]; 2]>,
    selection: Vector6<f64>,
    nullspace_kp: f64,
    clear_force_state_on_reset: bool,

    state: ControlState,
    pid: ForcePid,
    sensing: ForceSensing,
    active_force: DeltaBuffer,

    pos_interpolator: Option<Box<dyn Interpolator>>,
    ori_interpolator: Option<Box<dyn Interpolator>>,
}

impl OscFtController {
    /// Validate `config` and hold the robot's current end-effector pose
    pub fn new(config: OscFtConfig, robot: &dyn RobotInterface) -> OscResult<Self> {
        config.validate()?;
        let impedance_mode = config.impedance_mode()?;
        let blend_mode = config.blend_mode()?;
        let pose_dim = config.pose_dim();
        let layout = ActionLayout::new(impedance_mode, pose_dim, config.ft_ref_flag);

        let input_min = config.input_min.expand(pose_dim, "input_min")?;
        let input_max = config.input_max.expand(pose_dim, "input_max")?;
        let scaler = ActionScaler::new(
            input_min.clone(),
            input_max.clone(),
            config.output_min_values()?,
            config.output_max_values()?,
        )?;

        let kp_len = impedance_mode.stiffness_len().max(6);
        let kp_min = config.kp_limits.0.expand(kp_len, "kp_limits.min")?;
        let kp_max = config.kp_limits.1.expand(kp_len, "kp_limits.max")?;
        let dr_min = config.damping_ratio_limits.0.expand(6, "damping_ratio_limits.min")?;
        let dr_max = config.damping_ratio_limits.1.expand(6, "damping_ratio_limits.max")?;
        let gain_limits = GainLimits {
            kp_min: kp_min.clone(),
            kp_max: kp_max.clone(),
            damping_ratio_min: vector6(&dr_min),
            damping_ratio_max: vector6(&dr_max),
        };
        let limits = layout.limits(&SegmentBounds {
            damping_ratio: (dr_min, dr_max),
            kp: (kp_min, kp_max),
            input: (input_min, input_max),
            force: (
                config.ft_limits.0.expand(6, "ft_limits.min")?,
                config.ft_limits.1.expand(6, "ft_limits.max")?,
            ),
        })?;

        let kp = vector6(&config.kp.expand(6, "kp")?);
        let damping_ratio = vector6(&config.damping_ratio.expand(6, "damping_ratio")?);
        let stiffness = if impedance_mode.is_full_matrix() {
            Stiffness::uncoupled_blocks(kp, &damping_ratio)
        } else {
            Stiffness::diagonal(kp, &damping_ratio)
        };

        let pid = ForcePid::with_frequency(
            vector6(&config.kp_force.expand(6, "kp_force")?),
            vector6(&config.ki_force.expand(6, "ki_force")?),
            vector6(&config.kd_force.expand(6, "kd_force")?),
            config.control_freq,
        );
        let sensing = ForceSensing::new(
            WrenchReader::from_config(&config),
            WrenchFilter::from_config(&config.filter, config.control_freq)?,
        );

        let snapshot = robot.snapshot()?;
        snapshot.validate()?;
        let state = ControlState::holding(snapshot.ee_pos, snapshot.ee_ori, stiffness);

        let name = if config.control_ori {
            POSE_CONTROLLER_NAME
        } else {
            POSITION_CONTROLLER_NAME
        };
        info!(
            "{} ready: impedance={}, blend={}, control_dim={}, dof={}",
            name,
            impedance_mode,
            blend_mode,
            layout.control_dim(),
            snapshot.dof()
        );

        Ok(Self {
            name,
            impedance_mode,
            blend_mode,
            layout,
            scaler,
            gain_limits,
            limits,
            control_ori: config.control_ori,
            control_delta: config.control_delta,
            uncouple_pos_ori: config.uncouple_pos_ori,
            position_limits: config.position_limits,
            orientation_limits: config.orientation_limits,
            selection: vector6(&config.selection_diagonal.expand(6, "selection_diagonal")?),
            nullspace_kp: config.nullspace_kp,
            clear_force_state_on_reset: config.clear_force_state_on_reset,
            state,
            pid,
            sensing,
            active_force: DeltaBuffer::new(),
            pos_interpolator: None,
            ori_interpolator: None,
        })
    }

    /// Smooth the position goal between policy steps
    pub fn with_position_interpolator(mut self, mut interpolator: Box<dyn Interpolator>) -> Self {
        interpolator.reset(self.state.goal_pos);
        self.pos_interpolator = Some(interpolator);
        self
    }

    /// Smooth the orientation error between policy steps
    pub fn with_orientation_interpolator(
        mut self,
        mut interpolator: Box<dyn Interpolator>,
    ) -> Self {
        interpolator.reset(orientation_error(&self.state.goal_ori, &self.state.ori_ref));
        self.ori_interpolator = Some(interpolator);
        self
    }

    pub fn impedance_mode(&self) -> ImpedanceMode {
        self.impedance_mode
    }

    pub fn blend_mode(&self) -> ForceBlendMode {
        self.blend_mode
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn pid(&self) -> &ForcePid {
        &self.pid
    }

    /// Most recent filtered wrench
    pub fn filtered_wrench(&self) -> &Vector6<f64> {
        self.sensing.current()
    }

    /// Last two active-force commands
    pub fn active_force(&self) -> &DeltaBuffer {
        &self.active_force
    }

    /// Goal pose from the pose segment of the action and any overrides
    fn decode_pose(
        &self,
        pose: &DVector<f64>,
        overrides: GoalOverride,
    ) -> OscResult<(Vector3<f64>, Vector3<f64>, Option<Vector3<f64>>, Option<Rotation3<f64>>)> {
        let mut set_pos = overrides.position;
        let mut set_ori = overrides.orientation;

        let command = if self.control_delta {
            let scaled = self.scaler.scale(pose)?;
            if !self.control_ori && set_ori.is_none() {
                set_ori = Some(down_orientation());
            }
            scaled
        } else {
            if set_pos.is_none() {
                set_pos = Some(Vector3::new(pose[0], pose[1], pose[2]));
            }
            if set_ori.is_none() {
                set_ori = Some(if self.control_ori {
                    axis_angle_to_rotation(&Vector3::new(pose[3], pose[4], pose[5]))
                } else {
                    down_orientation()
                });
            }
            pose.clone()
        };

        let delta_pos = Vector3::new(command[0], command[1], command[2]);
        let delta_ori = if command.len() >= 6 {
            Vector3::new(command[3], command[4], command[5])
        } else {
            Vector3::zeros()
        };
        Ok((delta_pos, delta_ori, set_pos, set_ori))
    }

    fn clear_force_state(&mut self) {
        self.pid.reset();
        self.sensing.clear();
        self.active_force.clear();
    }
}

impl ArmController for OscFtController {
    fn name(&self) -> &str {
        self.name
    }

    fn control_dim(&self) -> usize {
        self.layout.control_dim()
    }

    fn control_limits(&self) -> (DVector<f64>, DVector<f64>) {
        self.limits.clone()
    }

    fn set_goal(
        &mut self,
        robot: &dyn RobotInterface,
        action: &[f64],
        overrides: GoalOverride,
    ) -> OscResult<()> {
        let parts = self.layout.split(action)?;
        let snapshot = robot.snapshot()?;
        snapshot.validate()?;

        let decode_gains = decoder::gain_decoder(self.impedance_mode);
        if let Some(stiffness) = decode_gains(&parts, &self.gain_limits)? {
            self.state.stiffness = stiffness;
        }
        if let Some(reference) = parts.force_reference {
            self.state.force_reference = reference;
        }

        let (delta_pos, delta_ori, set_pos, set_ori) =
            self.decode_pose(&parts.pose, overrides)?;

        if is_orientation_command(&delta_ori) || set_ori.is_some() {
            self.state.goal_ori = goal_orientation(
                &delta_ori,
                &snapshot.ee_ori,
                self.orientation_limits.as_ref(),
                set_ori,
            );
        }
        self.state.goal_pos = goal_position(
            &delta_pos,
            &snapshot.ee_pos,
            self.position_limits.as_ref(),
            set_pos,
        );

        if let Some(interpolator) = self.pos_interpolator.as_mut() {
            interpolator.set_goal(self.state.goal_pos);
        }
        if let Some(interpolator) = self.ori_interpolator.as_mut() {
            // Re-base on the current orientation, where the error relative to ori_ref is zero
            self.state.ori_ref = snapshot.ee_ori;
            self.state.relative_ori = Vector3::zeros();
            interpolator.reset(self.state.relative_ori);
            interpolator.set_goal(orientation_error(&self.state.goal_ori, &self.state.ori_ref));
        }

        debug!(
            "goal set: pos=[{:.4}, {:.4}, {:.4}], force_ref={:?}",
            self.state.goal_pos.x,
            self.state.goal_pos.y,
            self.state.goal_pos.z,
            self.state.force_reference.as_slice()
        );
        Ok(())
    }

    fn run_controller(&mut self, robot: &dyn RobotInterface) -> OscResult<ControlOutput> {
        let snapshot = robot.snapshot()?;
        snapshot.validate()?;
        trace!("{}", snapshot.log_summary());

        // No state is mutated before the last fallible step
        let ops = OpspaceMatrices::compute(
            &snapshot.mass_matrix,
            &snapshot.j_full,
            &snapshot.j_pos,
            &snapshot.j_ori,
        )?;

        let filtered_wrench = self.sensing.update(robot)?;
        let force_error = self.state.force_reference - filtered_wrench;
        let active_force = self.pid.compute(&force_error);
        self.active_force.push(active_force);

        let desired_pos = match self.pos_interpolator.as_mut() {
            Some(interpolator) => interpolator.get_interpolated_goal(),
            None => self.state.goal_pos,
        };
        let ori_error = match self.ori_interpolator.as_mut() {
            Some(interpolator) => {
                self.state.relative_ori = orientation_error(&snapshot.ee_ori, &self.state.ori_ref);
                interpolator.get_interpolated_goal() - self.state.relative_ori
            }
            None => orientation_error(&self.state.goal_ori, &snapshot.ee_ori),
        };

        let position_error = desired_pos - snapshot.ee_pos;
        let (desired_force, desired_torque) = engine::desired_wrench(
            &self.state.stiffness,
            &position_error,
            &snapshot.ee_pos_vel,
            &ori_error,
            &snapshot.ee_ori_vel,
        );

        let impedance_wrench =
            engine::decouple(&ops, &desired_force, &desired_torque, self.uncouple_pos_ori);

        let blend = engine::blend_rule(self.blend_mode);
        let task_wrench = blend(&impedance_wrench, self.active_force.current(), &self.selection);

        let torques = engine::joint_torques(&snapshot, &ops, &task_wrench, self.nullspace_kp);

        let output = ControlOutput {
            torques,
            filtered_wrench,
            active_force,
            task_wrench,
            degraded: ops.degraded,
        };
        trace!("{}", output.log_summary());
        Ok(output)
    }

    fn reset_goal(&mut self, robot: &dyn RobotInterface) -> OscResult<()> {
        let snapshot = robot.snapshot()?;
        snapshot.validate()?;
        self.state.reseed(snapshot.ee_pos, snapshot.ee_ori);

        if let Some(interpolator) = self.pos_interpolator.as_mut() {
            interpolator.reset(self.state.goal_pos);
        }
        if let Some(interpolator) = self.ori_interpolator.as_mut() {
            interpolator.reset(Vector3::zeros());
        }
        if self.clear_force_state_on_reset {
            self.clear_force_state();
        }

        info!(
            "{} goal reset to [{:.4}, {:.4}, {:.4}] (force state {})",
            self.name,
            self.state.goal_pos.x,
            self.state.goal_pos.y,
            self.state.goal_pos.z,
            if self.clear_force_state_on_reset { "cleared" } else { "kept" }
        );
        Ok(())
    }
}

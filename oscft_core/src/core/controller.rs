use super::robot::RobotInterface;
use super::LogSummary;
use crate::error::OscResult;
use nalgebra::{DVector, Rotation3, Vector3, Vector6};

/// Absolute pose values that take precedence over the decoded action
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GoalOverride {
    pub position: Option<Vector3<f64>>,
    pub orientation: Option<Rotation3<f64>>,
}

impl GoalOverride {
    /// No override; the action alone determines the goal
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vector3<f64>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_orientation(mut self, orientation: Rotation3<f64>) -> Self {
        self.orientation = Some(orientation);
        self
    }
}

/// Result of one control cycle
#[derive(Debug, Clone)]
pub struct ControlOutput {
    /// Joint torques, one per degree of freedom (not clipped to actuator range)
    pub torques: DVector<f64>,
    /// Filtered end-effector wrench used for force tracking
    pub filtered_wrench: Vector6<f64>,
    /// Output of the force PID loop
    pub active_force: Vector6<f64>,
    /// Task-space wrench after force/position blending
    pub task_wrench: Vector6<f64>,
    /// True when a near-singular matrix forced a damped pseudo-inverse this cycle
    pub degraded: bool,
}

impl LogSummary for ControlOutput {
    fn log_summary(&self) -> String {
        format!(
            "ControlOutput(dof={}, |tau|={:.3}, |F_task|={:.3}, degraded={})",
            self.torques.len(),
            self.torques.norm(),
            self.task_wrench.norm(),
            self.degraded
        )
    }
}

/// Common interface of arm controllers driven by an outer policy loop
///
/// `set_goal` runs at the policy rate, `run_controller` at the (faster) simulation rate.
/// A controller instance is owned by exactly one loop; no method is reentrant.
pub trait ArmController {
    /// Identifier of the active mode/feature combination
    fn name(&self) -> &str;

    /// Length of the action vector accepted by [`ArmController::set_goal`]
    fn control_dim(&self) -> usize;

    /// Per-element `(low, high)` bounds of the action vector
    fn control_limits(&self) -> (DVector<f64>, DVector<f64>);

    /// Decode a policy action into gains, goal pose and force reference
    fn set_goal(
        &mut self,
        robot: &dyn RobotInterface,
        action: &[f64],
        overrides: GoalOverride,
    ) -> OscResult<()>;

    /// Compute joint torques for the current cycle
    fn run_controller(&mut self, robot: &dyn RobotInterface) -> OscResult<ControlOutput>;

    /// Re-seed the goal from the current end-effector pose (episode boundary)
    fn reset_goal(&mut self, robot: &dyn RobotInterface) -> OscResult<()>;
}

//! # Core types and traits
//!
//! - **ArmController**: the contract every arm controller exposes to the policy loop
//! - **RobotInterface**: the boundary to the external simulation/kinematics provider
//! - **KinematicSnapshot**: per-cycle dynamics handed across that boundary
//! - **Modes**: the closed impedance and force-blend variants
//!
//! ## Controller Lifecycle
//!
//! 1. **Construction** - configuration is validated, goal seeded from the current pose
//! 2. **Goal update** - `set_goal()` at the policy rate
//! 3. **Execution** - `run_controller()` at the simulation rate
//! 4. **Reset** - `reset_goal()` at episode boundaries

pub mod controller;
pub mod modes;
pub mod robot;

pub use controller::{ArmController, ControlOutput, GoalOverride};
pub use modes::{ForceBlendMode, ImpedanceMode, FULL_KP_DIAGONAL};
pub use robot::{KinematicSnapshot, RobotInterface};

/// Trait for providing lightweight logging summaries
///
/// Used by `trace!` output inside the control loop so that matrices are not formatted in full
/// every cycle.
pub trait LogSummary {
    /// Return a compact string representation suitable for logging
    fn log_summary(&self) -> String;
}

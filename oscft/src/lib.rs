//! # OSC-FT
//!
//! Operational-space force/impedance control: given a goal pose (or pose delta) and a wrench
//! reference, compute the joint torques that track both on a serial manipulator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oscft::prelude::*;
//!
//! fn drive(robot: &dyn RobotInterface) -> OscResult<DVector<f64>> {
//!     let config = OscFtConfig::default().with_blend_mode(ForceBlendMode::Hybrid);
//!     let mut controller = OscFtController::new(config, robot)?;
//!     let action = vec![0.0; controller.control_dim()];
//!     controller.set_goal(robot, &action, GoalOverride::none())?;
//!     Ok(controller.run_controller(robot)?.torques)
//! }
//! ```
//!
//! ## Features
//!
//! - **Four impedance modes** from fixed gains to full 3x3 stiffness blocks
//! - **Force tracking** through a filtered wrench and a six-axis PID
//! - **Position/force blending** including per-axis hybrid selection
//! - **Nullspace posture control** for redundant arms

// Re-export core components
pub use oscft_core::{self, *};

// Re-export standard library with alias
pub use oscft_library as library;

/// The OSC-FT prelude - everything you need to get started
pub mod prelude {
    pub use oscft_library::prelude::*;

    // Math types used across the API
    pub use nalgebra::{DMatrix, DVector, Isometry3, Rotation3, Vector3, Vector6};

    // Common traits
    pub use serde::{Deserialize, Serialize};

    // Re-export anyhow for error handling in applications
    pub use anyhow::{anyhow, bail, ensure, Context, Result as AnyResult};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get OSC-FT version
pub fn version() -> &'static str {
    VERSION
}

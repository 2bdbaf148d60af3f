//! # OSC-FT Core
//!
//! Shared building blocks of the task-space force/impedance controller:
//!
//! - **Controllers**: the `ArmController` contract driven by the policy loop
//! - **Robot boundary**: `RobotInterface` and the per-cycle `KinematicSnapshot`
//! - **Params**: serde-backed `OscFtConfig` with validation
//! - **Errors**: one `OscError` enum for every crate in the workspace
//!
//! ## Quick Start
//!
//! ```rust
//! use oscft_core::params::OscFtConfig;
//! use oscft_core::core::ImpedanceMode;
//!
//! let config = OscFtConfig::default().with_impedance_mode(ImpedanceMode::VariableKp);
//! config.validate().unwrap();
//! assert_eq!(config.impedance_mode().unwrap(), ImpedanceMode::VariableKp);
//! ```

pub mod core;
pub mod error;
pub mod params;

// Re-export commonly used types for easy access
pub use crate::core::{
    ArmController, ControlOutput, ForceBlendMode, GoalOverride, ImpedanceMode,
    KinematicSnapshot, LogSummary, RobotInterface,
};
pub use error::{OscError, OscResult};
pub use params::{FilterConfig, OscFtConfig, ScalarOrVec};

//! # OSC-FT Library
//!
//! Algorithms, message types and the controller built on `oscft_core`.
//!
//! ## Structure
//!
//! ```text
//! oscft_library/
//! ── algorithms/     # Filters, PID, operational-space math, interpolation
//! ── messages/       # Wrench and action-layout types
//! ── controllers/    # The force/impedance arm controller
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oscft_library::prelude::*;
//!
//! let controller = OscFtController::new(OscFtConfig::default(), &robot)?
//!     .with_position_interpolator(Box::new(LinearInterpolator::new(500.0, 20.0, 0.2)));
//! ```

pub mod algorithms;
pub mod controllers;
pub mod messages;

// Re-export core traits needed by callers
pub use oscft_core::core::{ArmController, LogSummary, RobotInterface};

// Re-export message types at the crate root for convenience
pub use messages::*;

pub use controllers::OscFtController;

/// Everything needed to build and drive a controller
pub mod prelude {
    pub use crate::algorithms::interpolator::{Interpolator, LinearInterpolator};
    pub use crate::controllers::osc_ft::{ControlState, Stiffness};
    pub use crate::controllers::OscFtController;
    pub use crate::messages::{ActionLayout, Wrench};
    pub use oscft_core::core::{
        ArmController, ControlOutput, ForceBlendMode, GoalOverride, ImpedanceMode,
        KinematicSnapshot, LogSummary, RobotInterface,
    };
    pub use oscft_core::error::{OscError, OscResult};
    pub use oscft_core::params::{FilterConfig, OscFtConfig, ScalarOrVec};
}

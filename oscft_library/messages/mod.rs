//! Message types exchanged with the controller
//!
//! - Wrench: force/torque samples from the end-effector sensor
//! - Action: layout of the policy action vector
//!
//! All message types are re-exported at the crate root for convenience.

pub mod action;
pub mod wrench;

pub use action::{ActionLayout, ActionParts, SegmentBounds, FORCE_REFERENCE_LEN};
pub use wrench::Wrench;

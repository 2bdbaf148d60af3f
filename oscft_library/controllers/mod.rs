//! Arm controllers
//!
//! - **osc_ft**: operational-space impedance control with a force-tracking loop

pub mod osc_ft;

pub use osc_ft::OscFtController;

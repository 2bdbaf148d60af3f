//! Pure computational algorithms for force/impedance control
//!
//! Nothing in here talks to a robot; every function takes plain nalgebra values and is tested
//! in isolation.
//!
//! # Available Algorithms
//!
//! ## Dynamics
//! - **opspace**: task-space inertia, nullspace projector, posture torque
//! - **orientation**: log-map orientation error, goal clipping
//!
//! ## Force Control
//! - **pid**: six-axis force PID with a bounded integral term
//!
//! ## Signal Processing
//! - **butterworth**: low-pass design and zero-phase filtering
//! - **delta_buffer**: previous/current sample pair
//!
//! ## Goal Smoothing
//! - **interpolator**: the `Interpolator` trait and a linear ramp

pub mod butterworth;
pub mod delta_buffer;
pub mod interpolator;
pub mod opspace;
pub mod orientation;
pub mod pid;

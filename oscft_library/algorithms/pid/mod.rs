//! Six-axis force PID
//!
//! Turns a force/torque tracking error into an active force command.
//!
//! # Features
//!
//! - Per-axis proportional, integral and derivative gains
//! - Integral accumulated for the life of the loop (only `reset()` clears it)
//! - Integral contribution clamped to ±[`INTEGRAL_TERM_LIMIT`] per axis, whatever `ki` is
//! - Derivative suppressed while the stored error is still exactly zero
//!
//! # Example
//!
//! ```rust
//! use oscft_library::algorithms::pid::ForcePid;
//! use nalgebra::Vector6;
//!
//! let mut pid = ForcePid::new(Vector6::repeat(10.0), Vector6::repeat(1.0), Vector6::zeros(), 0.05);
//!
//! let error = Vector6::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0);
//! let output = pid.compute(&error);
//! assert!(output[0] > 20.0);
//! ```

use nalgebra::Vector6;

/// Bound on the integral contribution per axis
pub const INTEGRAL_TERM_LIMIT: f64 = 1.0;

/// PID over a six-axis wrench error
#[derive(Debug, Clone)]
pub struct ForcePid {
    kp: Vector6<f64>,
    ki: Vector6<f64>,
    kd: Vector6<f64>,

    dt: f64,

    integral: Vector6<f64>,
    last_error: Vector6<f64>,
}

impl ForcePid {
    /// Create a new loop with sample time `dt` (seconds)
    pub fn new(kp: Vector6<f64>, ki: Vector6<f64>, kd: Vector6<f64>, dt: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            dt,
            integral: Vector6::zeros(),
            last_error: Vector6::zeros(),
        }
    }

    /// Create a loop sampled at `frequency` Hz
    pub fn with_frequency(
        kp: Vector6<f64>,
        ki: Vector6<f64>,
        kd: Vector6<f64>,
        frequency: f64,
    ) -> Self {
        Self::new(kp, ki, kd, 1.0 / frequency)
    }

    /// Reset integral and stored error
    pub fn reset(&mut self) {
        self.integral = Vector6::zeros();
        self.last_error = Vector6::zeros();
    }

    /// Compute the active force for this cycle's error
    pub fn compute(&mut self, error: &Vector6<f64>) -> Vector6<f64> {
        self.integral += error * self.dt;

        let p_term = self.kp.component_mul(error);
        let i_term = self
            .ki
            .component_mul(&self.integral)
            .map(|v| v.clamp(-INTEGRAL_TERM_LIMIT, INTEGRAL_TERM_LIMIT));

        // A zero stored error means there is no previous sample yet
        let d_term = if self.last_error == Vector6::zeros() {
            Vector6::zeros()
        } else {
            self.kd.component_mul(&(error - self.last_error)) / self.dt
        };

        self.last_error = *error;

        p_term + i_term + d_term
    }

    /// Sample time (seconds)
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Get integral value
    pub fn integral(&self) -> &Vector6<f64> {
        &self.integral
    }

    /// Get the error stored by the last `compute`
    pub fn last_error(&self) -> &Vector6<f64> {
        &self.last_error
    }
}

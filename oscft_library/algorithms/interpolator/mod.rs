//! Goal smoothing between policy steps
//!
//! The controller treats interpolators as a black box: it hands over a new goal at the policy
//! rate and asks for an intermediate value at every simulation step.

use nalgebra::Vector3;

/// Smooths a three-component goal over several simulation steps
pub trait Interpolator: Send {
    /// Start a new ramp from the last emitted value toward `goal`
    fn set_goal(&mut self, goal: Vector3<f64>);

    /// Next intermediate goal; advances the ramp by one step
    fn get_interpolated_goal(&mut self) -> Vector3<f64>;

    /// Jump to `start` without ramping (episode boundary)
    fn reset(&mut self, start: Vector3<f64>);
}

/// Straight-line ramp reaching the goal after a fixed number of steps
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    total_steps: usize,
    step: usize,
    start: Vector3<f64>,
    goal: Vector3<f64>,
    last: Vector3<f64>,
}

impl LinearInterpolator {
    /// Ramp over `ceil(ramp_ratio * sim_freq / policy_freq)` steps (at least one)
    pub fn new(sim_freq: f64, policy_freq: f64, ramp_ratio: f64) -> Self {
        let steps = (ramp_ratio * sim_freq / policy_freq).ceil();
        let total_steps = if steps.is_finite() && steps >= 1.0 {
            steps as usize
        } else {
            1
        };
        Self {
            total_steps,
            step: 0,
            start: Vector3::zeros(),
            goal: Vector3::zeros(),
            last: Vector3::zeros(),
        }
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl Interpolator for LinearInterpolator {
    fn set_goal(&mut self, goal: Vector3<f64>) {
        self.start = self.last;
        self.goal = goal;
        self.step = 0;
    }

    fn get_interpolated_goal(&mut self) -> Vector3<f64> {
        if self.step < self.total_steps {
            self.step += 1;
        }
        let fraction = self.step as f64 / self.total_steps as f64;
        self.last = self.start + (self.goal - self.start) * fraction;
        self.last
    }

    fn reset(&mut self, start: Vector3<f64>) {
        self.start = start;
        self.goal = start;
        self.last = start;
        self.step = self.total_steps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_step_count() {
        assert_eq!(LinearInterpolator::new(500.0, 20.0, 0.2).total_steps(), 5);
        assert_eq!(LinearInterpolator::new(500.0, 20.0, 1.0).total_steps(), 25);
        assert_eq!(LinearInterpolator::new(500.0, 20.0, 0.0).total_steps(), 1);
    }

    #[test]
    fn test_ramps_linearly_then_holds() {
        let mut interp = LinearInterpolator::new(100.0, 20.0, 0.8);
        assert_eq!(interp.total_steps(), 4);
        interp.set_goal(Vector3::new(4.0, 0.0, -8.0));

        for i in 1..=4 {
            let value = interp.get_interpolated_goal();
            assert_relative_eq!(value.x, i as f64, epsilon = 1e-12);
            assert_relative_eq!(value.z, -2.0 * i as f64, epsilon = 1e-12);
        }
        let held = interp.get_interpolated_goal();
        assert_relative_eq!(held, Vector3::new(4.0, 0.0, -8.0), epsilon = 1e-12);
    }

    #[test]
    fn test_new_goal_starts_from_last_output() {
        let mut interp = LinearInterpolator::new(100.0, 20.0, 0.4);
        interp.set_goal(Vector3::new(2.0, 0.0, 0.0));
        interp.get_interpolated_goal();
        interp.set_goal(Vector3::new(-1.0, 0.0, 0.0));
        let first = interp.get_interpolated_goal();
        assert_relative_eq!(first.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reset_holds_start() {
        let mut interp = LinearInterpolator::new(100.0, 20.0, 1.0);
        interp.set_goal(Vector3::new(5.0, 0.0, 0.0));
        interp.reset(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(interp.get_interpolated_goal(), Vector3::new(1.0, 2.0, 3.0));
    }
}

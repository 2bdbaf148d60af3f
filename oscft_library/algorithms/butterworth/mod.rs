//! Butterworth low-pass design and zero-phase filtering
//!
//! Digital filter design by the classic route: analog prototype poles, frequency
//! pre-warping, bilinear transform, then expansion of poles/zeros into transfer-function
//! coefficients. Filtering runs forward then backward (zero phase), with both passes
//! started from the filter's steady state for the first sample they see.
//!
//! # Example
//!
//! ```rust
//! use oscft_library::algorithms::butterworth::Butterworth;
//!
//! // 5th order, 2 Hz cutoff, sampled at 20 Hz
//! let filter = Butterworth::low_pass(5, 2.0, 20.0).unwrap();
//! let smoothed = filter.filtfilt(&[1.0, 1.0, 1.0]);
//! assert!((smoothed[2] - 1.0).abs() < 1e-9);
//! ```

use nalgebra::{Complex, DMatrix, DVector};
use oscft_core::error::{OscError, OscResult};
use std::f64::consts::PI;

/// Transfer-function coefficients of a digital low-pass, `a[0] == 1`
#[derive(Debug, Clone, PartialEq)]
pub struct Butterworth {
    b: Vec<f64>,
    a: Vec<f64>,
    /// Steady-state initial conditions for a unit step
    zi: Vec<f64>,
}

impl Butterworth {
    /// Design an `order`-th order low-pass with cutoff `cutoff_hz` for sample rate `sample_hz`
    pub fn low_pass(order: usize, cutoff_hz: f64, sample_hz: f64) -> OscResult<Self> {
        if order == 0 {
            return Err(OscError::InvalidConfig(
                "Butterworth order must be at least 1".into(),
            ));
        }
        let nyquist = sample_hz / 2.0;
        if !(cutoff_hz > 0.0 && cutoff_hz < nyquist) {
            return Err(OscError::InvalidConfig(format!(
                "Butterworth cutoff {} Hz must lie in (0, {}) Hz",
                cutoff_hz, nyquist
            )));
        }

        let normalized = cutoff_hz / nyquist;
        // Pre-warp against the bilinear transform with an internal sample rate of 2
        let fs = 2.0;
        let warped = 2.0 * fs * (PI * normalized / fs).tan();

        // Analog prototype: poles on the left half of the unit circle
        let n = order as f64;
        let poles: Vec<Complex<f64>> = (0..order)
            .map(|i| {
                let m = -(n - 1.0) + 2.0 * i as f64;
                let angle = PI * m / (2.0 * n);
                -Complex::new(angle.cos(), angle.sin()) * warped
            })
            .collect();
        let gain = warped.powi(order as i32);

        // Bilinear transform; every analog zero at infinity maps to z = -1
        let fs2 = Complex::new(2.0 * fs, 0.0);
        let digital_poles: Vec<Complex<f64>> =
            poles.iter().map(|p| (fs2 + p) / (fs2 - p)).collect();
        let denominator = poles
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, p| acc * (fs2 - p));
        let digital_gain = (Complex::new(gain, 0.0) / denominator).re;

        let zeros = vec![Complex::new(-1.0, 0.0); order];
        let b: Vec<f64> = poly(&zeros).iter().map(|c| c.re * digital_gain).collect();
        let a: Vec<f64> = poly(&digital_poles).iter().map(|c| c.re).collect();

        Self::from_coefficients(b, a)
    }

    /// Build from raw coefficients; `a` is normalised so that `a[0] == 1`
    pub fn from_coefficients(b: Vec<f64>, a: Vec<f64>) -> OscResult<Self> {
        if a.is_empty() || b.is_empty() || a[0] == 0.0 {
            return Err(OscError::InvalidConfig(
                "filter needs non-empty coefficients with a[0] != 0".into(),
            ));
        }
        let len = a.len().max(b.len());
        let a0 = a[0];
        let mut a: Vec<f64> = a.iter().map(|v| v / a0).collect();
        let mut b: Vec<f64> = b.iter().map(|v| v / a0).collect();
        a.resize(len, 0.0);
        b.resize(len, 0.0);

        let zi = steady_state(&b, &a)?;
        Ok(Self { b, a, zi })
    }

    /// Numerator coefficients
    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// Denominator coefficients
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Gain at zero frequency
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Direct-form II transposed filtering starting from state `z`
    fn lfilter(&self, x: &[f64], mut z: Vec<f64>) -> Vec<f64> {
        let n = self.a.len();
        let mut y = Vec::with_capacity(x.len());
        for &sample in x {
            let out = self.b[0] * sample + z.first().copied().unwrap_or(0.0);
            for i in 0..n.saturating_sub(2) {
                z[i] = self.b[i + 1] * sample + z[i + 1] - self.a[i + 1] * out;
            }
            if n >= 2 {
                z[n - 2] = self.b[n - 1] * sample - self.a[n - 1] * out;
            }
            y.push(out);
        }
        y
    }

    /// Forward-backward filtering without padding
    pub fn filtfilt(&self, x: &[f64]) -> Vec<f64> {
        if x.is_empty() {
            return Vec::new();
        }
        let forward_state = self.zi.iter().map(|z| z * x[0]).collect();
        let mut forward = self.lfilter(x, forward_state);

        forward.reverse();
        let backward_state = self.zi.iter().map(|z| z * forward[0]).collect();
        let mut backward = self.lfilter(&forward, backward_state);
        backward.reverse();
        backward
    }
}

/// Coefficients (highest power first) of the monic polynomial with the given roots
fn poly(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for root in roots {
        let mut next = vec![Complex::new(0.0, 0.0); coeffs.len() + 1];
        for (i, c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

/// Initial state for which a unit step input produces the steady-state response
fn steady_state(b: &[f64], a: &[f64]) -> OscResult<Vec<f64>> {
    let n = a.len();
    if n < 2 {
        return Ok(Vec::new());
    }
    let m = n - 1;
    // (I - companion(a)^T) zi = b[1..] - a[1..] * b[0]
    let mut system = DMatrix::<f64>::identity(m, m);
    for i in 0..m {
        system[(i, 0)] += a[i + 1];
        if i + 1 < m {
            system[(i, i + 1)] -= 1.0;
        }
    }
    let rhs = DVector::from_iterator(m, (0..m).map(|i| b[i + 1] - a[i + 1] * b[0]));
    system
        .lu()
        .solve(&rhs)
        .map(|zi| zi.iter().copied().collect())
        .ok_or_else(|| OscError::Numerical("filter steady state is singular".into()))
}

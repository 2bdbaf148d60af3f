//! Two-slot signal history
//!
//! Keeps exactly the previous and the current sample of a six-axis signal. Used for the
//! filtered wrench and for the active force command.
//!
//! # Example
//!
//! ```rust
//! use oscft_library::algorithms::delta_buffer::DeltaBuffer;
//! use nalgebra::Vector6;
//!
//! let mut buffer = DeltaBuffer::new();
//! buffer.push(Vector6::repeat(1.0));
//! buffer.push(Vector6::repeat(3.0));
//!
//! assert_eq!(buffer.last(), &Vector6::repeat(1.0));
//! assert_eq!(buffer.current(), &Vector6::repeat(3.0));
//! ```

use nalgebra::Vector6;

/// Previous/current pair of a six-axis signal, both initialised to zero
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeltaBuffer {
    last: Vector6<f64>,
    current: Vector6<f64>,
}

impl DeltaBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift `current` into `last` and store the new sample
    pub fn push(&mut self, value: Vector6<f64>) {
        self.last = self.current;
        self.current = value;
    }

    /// Sample before the current one
    pub fn last(&self) -> &Vector6<f64> {
        &self.last
    }

    /// Most recently pushed sample
    pub fn current(&self) -> &Vector6<f64> {
        &self.current
    }

    /// Zero both samples
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let buffer = DeltaBuffer::new();
        assert_eq!(buffer.current(), &Vector6::zeros());
        assert_eq!(buffer.last(), &Vector6::zeros());
    }

    #[test]
    fn test_push_shifts() {
        let mut buffer = DeltaBuffer::new();
        for i in 1..=3 {
            buffer.push(Vector6::repeat(i as f64));
        }
        assert_eq!(buffer.last(), &Vector6::repeat(2.0));
        assert_eq!(buffer.current(), &Vector6::repeat(3.0));
    }

    #[test]
    fn test_clear() {
        let mut buffer = DeltaBuffer::new();
        buffer.push(Vector6::repeat(4.0));
        buffer.clear();
        assert_eq!(buffer, DeltaBuffer::default());
    }
}

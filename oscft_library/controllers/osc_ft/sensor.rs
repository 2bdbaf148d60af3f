//! Wrench sensing pipeline: read, transform, remove bias, smooth

use crate::algorithms::butterworth::Butterworth;
use crate::algorithms::delta_buffer::DeltaBuffer;
use crate::messages::Wrench;
use nalgebra::{Vector3, Vector6};
use oscft_core::core::{LogSummary, RobotInterface};
use oscft_core::error::{OscError, OscResult};
use oscft_core::params::{FilterConfig, OscFtConfig};
use tracing::trace;

/// Smoothing over the window `[previous, current, new]`
#[derive(Debug, Clone)]
pub enum WrenchFilter {
    Butterworth(Butterworth),
    MovingAverage,
}

impl WrenchFilter {
    /// Build the configured filter sampled at `sample_hz`
    pub fn from_config(config: &FilterConfig, sample_hz: f64) -> OscResult<Self> {
        match config {
            FilterConfig::Butterworth { order, cutoff_hz } => Ok(WrenchFilter::Butterworth(
                Butterworth::low_pass(*order, *cutoff_hz, sample_hz)?,
            )),
            FilterConfig::MovingAverage => Ok(WrenchFilter::MovingAverage),
        }
    }

    /// Filtered value at the position of `new`
    pub fn apply(&self, history: &DeltaBuffer, new: &Vector6<f64>) -> Vector6<f64> {
        let last = history.last();
        let current = history.current();
        match self {
            WrenchFilter::Butterworth(filter) => Vector6::from_fn(|i, _| {
                let window = [last[i], current[i], new[i]];
                filter.filtfilt(&window)[2]
            }),
            WrenchFilter::MovingAverage => (last + current + new) / 3.0,
        }
    }
}

/// Reads the end-effector wrench from two three-axis sensors
#[derive(Debug, Clone)]
pub struct WrenchReader {
    force_sensor: String,
    torque_sensor: String,
    frame_body: String,
    offset: Vector6<f64>,
}

impl WrenchReader {
    pub fn from_config(config: &OscFtConfig) -> Self {
        Self {
            force_sensor: config.force_sensor_name(),
            torque_sensor: config.torque_sensor_name(),
            frame_body: config.sensor_frame_body_name(),
            offset: Vector6::from_row_slice(&config.wrench_offset),
        }
    }

    fn read_axis(robot: &dyn RobotInterface, name: &str) -> OscResult<Vector3<f64>> {
        let raw = robot.sensor_measurement(name)?;
        if raw.len() != 3 {
            return Err(OscError::InvalidSnapshot(format!(
                "sensor {} returned {} values, expected 3",
                name,
                raw.len()
            )));
        }
        Ok(Vector3::new(raw[0], raw[1], raw[2]))
    }

    /// Wrench rotated from the world frame into the sensor body frame, bias removed
    pub fn read(&self, robot: &dyn RobotInterface) -> OscResult<Vector6<f64>> {
        let force = Self::read_axis(robot, &self.force_sensor)?;
        let torque = Self::read_axis(robot, &self.torque_sensor)?;
        let frame = robot.body_pose(&self.frame_body)?;
        let wrench = Wrench::new(force, torque).in_frame(&frame);
        trace!("{} in {}", wrench.log_summary(), self.frame_body);
        Ok(wrench.to_vector() - self.offset)
    }
}

/// Reader, filter and the history of filtered samples
#[derive(Debug, Clone)]
pub struct ForceSensing {
    reader: WrenchReader,
    filter: WrenchFilter,
    history: DeltaBuffer,
}

impl ForceSensing {
    pub fn new(reader: WrenchReader, filter: WrenchFilter) -> Self {
        Self {
            reader,
            filter,
            history: DeltaBuffer::new(),
        }
    }

    /// Read a new sample, filter it and push it into the history
    pub fn update(&mut self, robot: &dyn RobotInterface) -> OscResult<Vector6<f64>> {
        let raw = self.reader.read(robot)?;
        let filtered = self.filter.apply(&self.history, &raw);
        self.history.push(filtered);
        Ok(filtered)
    }

    /// Most recent filtered wrench
    pub fn current(&self) -> &Vector6<f64> {
        self.history.current()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

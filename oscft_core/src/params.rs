//! Controller configuration
//!
//! Every field has a default, so a configuration file only needs to list what it changes.
//! Files are read as TOML, YAML or JSON depending on their extension.

use crate::core::{ForceBlendMode, ImpedanceMode};
use crate::error::{OscError, OscResult};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Six-component payload/tool bias removed from every wrench reading (sensor body frame)
pub const DEFAULT_WRENCH_OFFSET: [f64; 6] = [
    0.0011635382606757878,
    -0.0011644652330827126,
    2.9429995396193043,
    0.000520645845461271,
    -0.00042506640050181784,
    -3.740287389696474e-07,
];

/// Either one value applied to every axis, or one value per axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarOrVec {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl ScalarOrVec {
    /// Broadcast to `n` components, rejecting lists of any other length
    pub fn expand(&self, n: usize, what: &'static str) -> OscResult<DVector<f64>> {
        match self {
            ScalarOrVec::Scalar(v) => Ok(DVector::from_element(n, *v)),
            ScalarOrVec::Vector(values) if values.len() == n => {
                Ok(DVector::from_column_slice(values))
            }
            ScalarOrVec::Vector(values) => Err(OscError::dimension(what, n, values.len())),
        }
    }
}

impl From<f64> for ScalarOrVec {
    fn from(value: f64) -> Self {
        ScalarOrVec::Scalar(value)
    }
}

impl From<Vec<f64>> for ScalarOrVec {
    fn from(values: Vec<f64>) -> Self {
        ScalarOrVec::Vector(values)
    }
}

impl<const N: usize> From<[f64; N]> for ScalarOrVec {
    fn from(values: [f64; N]) -> Self {
        ScalarOrVec::Vector(values.to_vec())
    }
}

/// Smoothing applied to the measured wrench
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Zero-phase Butterworth low-pass over the three-sample window
    Butterworth { order: usize, cutoff_hz: f64 },
    /// Plain average of the three-sample window
    MovingAverage,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig::Butterworth {
            order: 5,
            cutoff_hz: 2.0,
        }
    }
}

/// Configuration of the task-space force/impedance controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscFtConfig {
    /// End-effector name; the text before the first `_` prefixes the sensor names
    pub eef_name: String,
    /// Force sensor name (default `{prefix}_force_ee`)
    pub force_sensor: Option<String>,
    /// Torque sensor name (default `{prefix}_torque_ee`)
    pub torque_sensor: Option<String>,
    /// Body whose frame world-frame sensor readings are rotated into (default `{prefix}_eef`)
    pub sensor_frame_body: Option<String>,

    /// Action-space bounds of the pose channel
    pub input_max: ScalarOrVec,
    pub input_min: ScalarOrVec,
    /// Pose-delta bounds after scaling; defaults depend on whether orientation is controlled
    pub output_max: Option<ScalarOrVec>,
    pub output_min: Option<ScalarOrVec>,

    pub kp: ScalarOrVec,
    pub damping_ratio: ScalarOrVec,
    pub impedance_mode: String,
    pub kp_limits: (ScalarOrVec, ScalarOrVec),
    pub damping_ratio_limits: (ScalarOrVec, ScalarOrVec),

    /// Rate of the force loop (PID dt and filter sample rate), Hz
    pub control_freq: f64,

    /// Per-axis `[min, max]` clip of the goal position
    pub position_limits: Option<[[f64; 3]; 2]>,
    /// Per-axis `[min, max]` clip of the goal roll/pitch/yaw
    pub orientation_limits: Option<[[f64; 3]; 2]>,

    pub control_ori: bool,
    pub control_delta: bool,
    pub uncouple_pos_ori: bool,

    /// Append a six-element force/torque reference to the action
    pub ft_ref_flag: bool,
    pub ft_limits: (ScalarOrVec, ScalarOrVec),
    pub force_active_case: String,
    pub kp_force: ScalarOrVec,
    pub ki_force: ScalarOrVec,
    pub kd_force: ScalarOrVec,

    pub filter: FilterConfig,
    pub wrench_offset: [f64; 6],
    /// Diagonal of the hybrid selection matrix (1 = impedance, 0 = force)
    pub selection_diagonal: ScalarOrVec,
    /// Stiffness of the nullspace posture spring
    pub nullspace_kp: f64,
    /// Clear PID and filter history in `reset_goal`
    pub clear_force_state_on_reset: bool,
}

impl Default for OscFtConfig {
    fn default() -> Self {
        Self {
            eef_name: "robot0_eef".to_string(),
            force_sensor: None,
            torque_sensor: None,
            sensor_frame_body: None,
            input_max: ScalarOrVec::Scalar(1.0),
            input_min: ScalarOrVec::Scalar(-1.0),
            output_max: None,
            output_min: None,
            kp: ScalarOrVec::Scalar(150.0),
            damping_ratio: ScalarOrVec::Scalar(1.0),
            impedance_mode: "fixed".to_string(),
            kp_limits: (ScalarOrVec::Scalar(0.0), ScalarOrVec::Scalar(300.0)),
            damping_ratio_limits: (ScalarOrVec::Scalar(0.0), ScalarOrVec::Scalar(100.0)),
            control_freq: 20.0,
            position_limits: None,
            orientation_limits: None,
            control_ori: true,
            control_delta: true,
            uncouple_pos_ori: true,
            ft_ref_flag: true,
            ft_limits: (ScalarOrVec::Scalar(0.0), ScalarOrVec::Scalar(20.0)),
            force_active_case: "position".to_string(),
            kp_force: ScalarOrVec::Scalar(10.0),
            ki_force: ScalarOrVec::Scalar(1.0),
            kd_force: ScalarOrVec::Scalar(0.0),
            filter: FilterConfig::default(),
            wrench_offset: DEFAULT_WRENCH_OFFSET,
            selection_diagonal: ScalarOrVec::Scalar(0.5),
            nullspace_kp: 10.0,
            clear_force_state_on_reset: false,
        }
    }
}

impl OscFtConfig {
    /// Position-only control with no force channel
    pub fn position_only() -> Self {
        Self {
            control_ori: false,
            ft_ref_flag: false,
            ..Self::default()
        }
    }

    pub fn with_impedance_mode(mut self, mode: ImpedanceMode) -> Self {
        self.impedance_mode = mode.as_str().to_string();
        self
    }

    pub fn with_blend_mode(mut self, mode: ForceBlendMode) -> Self {
        self.force_active_case = mode.as_str().to_string();
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(text: &str) -> OscResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a `.toml`, `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> OscResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&text)?),
            Some("json") => Ok(serde_json::from_str(&text)?),
            other => Err(OscError::InvalidConfig(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Sensor name prefix derived from the end-effector name
    pub fn sensor_prefix(&self) -> &str {
        self.eef_name.split('_').next().unwrap_or(&self.eef_name)
    }

    pub fn force_sensor_name(&self) -> String {
        self.force_sensor
            .clone()
            .unwrap_or_else(|| format!("{}_force_ee", self.sensor_prefix()))
    }

    pub fn torque_sensor_name(&self) -> String {
        self.torque_sensor
            .clone()
            .unwrap_or_else(|| format!("{}_torque_ee", self.sensor_prefix()))
    }

    pub fn sensor_frame_body_name(&self) -> String {
        self.sensor_frame_body
            .clone()
            .unwrap_or_else(|| format!("{}_eef", self.sensor_prefix()))
    }

    /// Length of the pose channel: 6 with orientation, 3 without
    pub fn pose_dim(&self) -> usize {
        if self.control_ori {
            6
        } else {
            3
        }
    }

    /// Parsed impedance mode; unsupported strings are fatal
    pub fn impedance_mode(&self) -> OscResult<ImpedanceMode> {
        self.impedance_mode.parse()
    }

    /// Parsed blend mode; forced to `position` when the force channel is disabled
    pub fn blend_mode(&self) -> OscResult<ForceBlendMode> {
        if !self.ft_ref_flag {
            return Ok(ForceBlendMode::Position);
        }
        self.force_active_case.parse()
    }

    /// Upper pose-delta bound after scaling
    pub fn output_max_values(&self) -> OscResult<DVector<f64>> {
        match &self.output_max {
            Some(values) => values.expand(self.pose_dim(), "output_max"),
            None => Ok(default_output_bound(self.pose_dim(), 1.0)),
        }
    }

    /// Lower pose-delta bound after scaling
    pub fn output_min_values(&self) -> OscResult<DVector<f64>> {
        match &self.output_min {
            Some(values) => values.expand(self.pose_dim(), "output_min"),
            None => Ok(default_output_bound(self.pose_dim(), -1.0)),
        }
    }

    /// Check everything that can be checked without a robot
    pub fn validate(&self) -> OscResult<()> {
        let mode = self.impedance_mode()?;
        self.blend_mode()?;

        if !(self.control_freq > 0.0) {
            return Err(OscError::InvalidConfig(format!(
                "control_freq must be positive, got {}",
                self.control_freq
            )));
        }

        let pose_dim = self.pose_dim();
        let input_min = self.input_min.expand(pose_dim, "input_min")?;
        let input_max = self.input_max.expand(pose_dim, "input_max")?;
        check_ordered("input", &input_min, &input_max, true)?;
        let output_min = self.output_min_values()?;
        let output_max = self.output_max_values()?;
        check_ordered("output", &output_min, &output_max, false)?;

        let kp = self.kp.expand(6, "kp")?;
        self.damping_ratio.expand(6, "damping_ratio")?;
        let kp_len = mode.stiffness_len().max(6);
        let kp_min = self.kp_limits.0.expand(kp_len, "kp_limits.min")?;
        let kp_max = self.kp_limits.1.expand(kp_len, "kp_limits.max")?;
        check_ordered("kp_limits", &kp_min, &kp_max, false)?;
        for (axis, limit) in mode.axis_limit_indices().into_iter().enumerate() {
            let low = if mode.is_full_matrix() {
                kp_min[limit].max(0.0)
            } else {
                kp_min[limit]
            };
            let high = kp_max[limit];
            if !(low..=high).contains(&kp[axis]) {
                return Err(OscError::InvalidConfig(format!(
                    "kp[{}] = {} lies outside kp_limits [{}, {}]",
                    axis, kp[axis], low, high
                )));
            }
        }
        let dr_min = self.damping_ratio_limits.0.expand(6, "damping_ratio_limits.min")?;
        let dr_max = self.damping_ratio_limits.1.expand(6, "damping_ratio_limits.max")?;
        check_ordered("damping_ratio_limits", &dr_min, &dr_max, false)?;
        let ft_min = self.ft_limits.0.expand(6, "ft_limits.min")?;
        let ft_max = self.ft_limits.1.expand(6, "ft_limits.max")?;
        check_ordered("ft_limits", &ft_min, &ft_max, false)?;

        self.kp_force.expand(6, "kp_force")?;
        self.ki_force.expand(6, "ki_force")?;
        self.kd_force.expand(6, "kd_force")?;

        let selection = self.selection_diagonal.expand(6, "selection_diagonal")?;
        if selection.iter().any(|s| !(0.0..=1.0).contains(s)) {
            return Err(OscError::InvalidConfig(
                "selection_diagonal entries must lie in [0, 1]".into(),
            ));
        }

        for (name, limits) in [
            ("position_limits", &self.position_limits),
            ("orientation_limits", &self.orientation_limits),
        ] {
            if let Some([low, high]) = limits {
                if low.iter().zip(high.iter()).any(|(l, h)| l > h) {
                    return Err(OscError::InvalidConfig(format!(
                        "{} minimum exceeds maximum",
                        name
                    )));
                }
            }
        }

        if let FilterConfig::Butterworth { order, cutoff_hz } = &self.filter {
            let nyquist = self.control_freq / 2.0;
            if *order == 0 {
                return Err(OscError::InvalidConfig("filter order must be at least 1".into()));
            }
            if !(*cutoff_hz > 0.0 && *cutoff_hz < nyquist) {
                return Err(OscError::InvalidConfig(format!(
                    "filter cutoff {} Hz must lie in (0, {}) Hz",
                    cutoff_hz, nyquist
                )));
            }
        }

        if self.nullspace_kp < 0.0 {
            return Err(OscError::InvalidConfig(
                "nullspace_kp must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

fn default_output_bound(pose_dim: usize, sign: f64) -> DVector<f64> {
    let full = [0.05, 0.05, 0.05, 0.5, 0.5, 0.5];
    DVector::from_iterator(pose_dim, full.iter().take(pose_dim).map(|v| sign * v))
}

fn check_ordered(
    name: &str,
    low: &DVector<f64>,
    high: &DVector<f64>,
    strict: bool,
) -> OscResult<()> {
    let bad = low
        .iter()
        .zip(high.iter())
        .any(|(l, h)| if strict { l >= h } else { l > h });
    if bad {
        return Err(OscError::InvalidConfig(format!(
            "{} minimum must be below maximum",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = OscFtConfig::default();
        config.validate().unwrap();
        assert_eq!(config.pose_dim(), 6);
        assert_eq!(config.impedance_mode().unwrap(), ImpedanceMode::Fixed);
        assert_eq!(config.blend_mode().unwrap(), ForceBlendMode::Position);
    }

    #[test]
    fn test_sensor_names_from_prefix() {
        let config = OscFtConfig {
            eef_name: "gripper0_right_eef".into(),
            ..OscFtConfig::default()
        };
        assert_eq!(config.force_sensor_name(), "gripper0_force_ee");
        assert_eq!(config.torque_sensor_name(), "gripper0_torque_ee");
        assert_eq!(config.sensor_frame_body_name(), "gripper0_eef");
    }

    #[test]
    fn test_output_bounds_follow_pose_dim() {
        let config = OscFtConfig::position_only();
        let max = config.output_max_values().unwrap();
        assert_eq!(max.len(), 3);
        assert_eq!(max[0], 0.05);
        let config = OscFtConfig::default();
        assert_eq!(config.output_min_values().unwrap()[5], -0.5);
    }

    #[test]
    fn test_blend_forced_to_position_without_force_channel() {
        let config = OscFtConfig {
            ft_ref_flag: false,
            force_active_case: "not-a-mode".into(),
            ..OscFtConfig::default()
        };
        assert_eq!(config.blend_mode().unwrap(), ForceBlendMode::Position);
    }

    #[test]
    fn test_unsupported_modes_rejected() {
        let config = OscFtConfig {
            impedance_mode: "adaptive".into(),
            ..OscFtConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OscError::UnsupportedImpedanceMode(_))
        ));

        let config = OscFtConfig {
            force_active_case: "mixed".into(),
            ..OscFtConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OscError::UnsupportedBlendMode(_))
        ));
    }

    #[test]
    fn test_cutoff_above_nyquist_rejected() {
        let config = OscFtConfig {
            filter: FilterConfig::Butterworth {
                order: 5,
                cutoff_hz: 10.0,
            },
            ..OscFtConfig::default()
        };
        assert!(matches!(config.validate(), Err(OscError::InvalidConfig(_))));
    }

    #[test]
    fn test_wrong_list_length_rejected() {
        let config = OscFtConfig {
            kp: vec![100.0, 100.0].into(),
            ..OscFtConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OscError::DimensionMismatch { what: "kp", .. })
        ));
    }

    #[test]
    fn test_full_kp_limits_expand_to_eighteen() {
        let config = OscFtConfig::default().with_impedance_mode(ImpedanceMode::VariableFullKp);
        config.validate().unwrap();

        let config = OscFtConfig {
            kp_limits: (vec![0.0; 6].into(), ScalarOrVec::Scalar(300.0)),
            ..OscFtConfig::default().with_impedance_mode(ImpedanceMode::VariableFullKp)
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kp_outside_limits_rejected() {
        let config = OscFtConfig {
            kp: ScalarOrVec::Scalar(1000.0),
            ..OscFtConfig::default()
        };
        assert!(matches!(config.validate(), Err(OscError::InvalidConfig(_))));

        let config = OscFtConfig {
            kp: vec![150.0, 150.0, 150.0, 150.0, 150.0, -1.0].into(),
            ..OscFtConfig::default()
        };
        assert!(matches!(config.validate(), Err(OscError::InvalidConfig(_))));
    }

    #[test]
    fn test_kp_checked_against_diagonal_limits_in_full_mode() {
        let mut max = vec![1.0; 18];
        for i in [0, 4, 8, 9, 13, 17] {
            max[i] = 300.0;
        }
        let config = OscFtConfig {
            kp_limits: (ScalarOrVec::Scalar(0.0), max.into()),
            ..OscFtConfig::default().with_impedance_mode(ImpedanceMode::VariableFullKp)
        };
        config.validate().unwrap();

        let config = OscFtConfig {
            kp_limits: (ScalarOrVec::Scalar(0.0), ScalarOrVec::Scalar(100.0)),
            ..OscFtConfig::default().with_impedance_mode(ImpedanceMode::VariableFullKp)
        };
        assert!(matches!(config.validate(), Err(OscError::InvalidConfig(_))));
    }

    #[test]
    fn test_toml_round_trip_of_selected_fields() {
        let text = r#"
            eef_name = "robot1_eef"
            impedance_mode = "variable_kp"
            force_active_case = "hybrid"
            kp = [100.0, 100.0, 100.0, 50.0, 50.0, 50.0]
            kp_limits = [0.0, 250.0]
            selection_diagonal = [1.0, 1.0, 0.0, 1.0, 1.0, 1.0]

            [filter]
            kind = "moving_average"
        "#;
        let config = OscFtConfig::from_toml_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.impedance_mode().unwrap(), ImpedanceMode::VariableKp);
        assert_eq!(config.blend_mode().unwrap(), ForceBlendMode::Hybrid);
        assert_eq!(config.filter, FilterConfig::MovingAverage);
        assert_eq!(config.kp_limits.1, ScalarOrVec::Scalar(250.0));
        assert_eq!(config.control_freq, 20.0);
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "control_ori: false\nft_ref_flag: false\ncontrol_freq: 40.0").unwrap();
        let config = OscFtConfig::from_file(file.path()).unwrap();
        assert!(!config.control_ori);
        assert_eq!(config.control_freq, 40.0);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            OscFtConfig::from_file(file.path()),
            Err(OscError::InvalidConfig(_))
        ));
    }
}

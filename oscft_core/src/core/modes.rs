//! Closed controller mode variants
//!
//! Both modes are parsed once, at controller construction, and never change afterwards.

use crate::error::OscError;
use std::fmt;
use std::str::FromStr;

/// Indices of the diagonal entries of the two stacked 3x3 stiffness blocks
pub const FULL_KP_DIAGONAL: [usize; 6] = [0, 4, 8, 9, 13, 17];

/// How the stiffness/damping gains are sourced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpedanceMode {
    /// Gains fixed at construction; the action carries only the pose (and force) channel
    Fixed,
    /// Action carries damping ratios and stiffness per axis
    Variable,
    /// Action carries stiffness per axis; damping is critical
    VariableKp,
    /// Action carries two full 3x3 stiffness blocks (position, orientation)
    VariableFullKp,
}

impl ImpedanceMode {
    pub const ALL: [ImpedanceMode; 4] = [
        ImpedanceMode::Fixed,
        ImpedanceMode::Variable,
        ImpedanceMode::VariableKp,
        ImpedanceMode::VariableFullKp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Variable => "variable",
            Self::VariableKp => "variable_kp",
            Self::VariableFullKp => "variable_full_kp",
        }
    }

    /// Number of stiffness values carried by the action (0 in fixed mode)
    pub fn stiffness_len(&self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Variable | Self::VariableKp => 6,
            Self::VariableFullKp => 18,
        }
    }

    /// Number of damping-ratio values carried by the action
    pub fn damping_ratio_len(&self) -> usize {
        match self {
            Self::Variable => 6,
            _ => 0,
        }
    }

    /// Whether stiffness is stored as two full 3x3 blocks
    pub fn is_full_matrix(&self) -> bool {
        matches!(self, Self::VariableFullKp)
    }

    /// Entries of the stiffness limits that bound the six per-axis gains
    pub fn axis_limit_indices(&self) -> [usize; 6] {
        if self.is_full_matrix() {
            FULL_KP_DIAGONAL
        } else {
            [0, 1, 2, 3, 4, 5]
        }
    }
}

impl fmt::Display for ImpedanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImpedanceMode {
    type Err = OscError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| OscError::UnsupportedImpedanceMode(s.to_string()))
    }
}

/// How the active force command combines with the impedance wrench
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForceBlendMode {
    /// Impedance wrench only
    Position,
    /// Active force only
    Active,
    /// Impedance wrench plus active force
    Both,
    /// Per-axis selection between impedance wrench and active force
    Hybrid,
}

impl ForceBlendMode {
    pub const ALL: [ForceBlendMode; 4] = [
        ForceBlendMode::Position,
        ForceBlendMode::Active,
        ForceBlendMode::Both,
        ForceBlendMode::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Active => "active",
            Self::Both => "both",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ForceBlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ForceBlendMode {
    type Err = OscError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| OscError::UnsupportedBlendMode(s.to_string()))
    }
}

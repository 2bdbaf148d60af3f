//! Error types shared by every OSC-FT crate

use thiserror::Error;

/// Errors raised by configuration, goal decoding and the control cycle
///
/// Configuration errors are fatal and surface at construction. Numerical trouble inside a
/// control cycle (near-singular inertia, singular mass matrix) is NOT reported through this
/// type; it degrades to a damped pseudo-inverse and is flagged on the cycle output instead.
#[derive(Debug, Error)]
pub enum OscError {
    #[error(
        "Unsupported impedance mode '{0}' (supported: fixed, variable, variable_kp, variable_full_kp)"
    )]
    UnsupportedImpedanceMode(String),

    #[error("Unsupported force blend mode '{0}' (supported: position, active, both, hybrid)")]
    UnsupportedBlendMode(String),

    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sensor '{0}' not found")]
    SensorNotFound(String),

    #[error("Body '{0}' not found")]
    BodyNotFound(String),

    #[error("Invalid kinematic snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for OSC-FT operations
pub type OscResult<T> = Result<T, OscError>;

impl OscError {
    /// Shorthand for a length check failure
    pub fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        OscError::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Whether the error stems from configuration (and will never succeed on retry)
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            OscError::UnsupportedImpedanceMode(_)
                | OscError::UnsupportedBlendMode(_)
                | OscError::InvalidConfig(_)
                | OscError::Toml(_)
                | OscError::Yaml(_)
                | OscError::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_message() {
        let err = OscError::dimension("action", 12, 9);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for action: expected 12, got 9"
        );
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_config_classification() {
        assert!(OscError::UnsupportedImpedanceMode("stiff".into()).is_config_error());
        assert!(OscError::UnsupportedBlendMode("mixed".into()).is_config_error());
        assert!(!OscError::SensorNotFound("ft".into()).is_config_error());
    }
}

// Policy action layout
//
// The action vector is the only contract between a policy and the controller. Its segments,
// in order: damping ratios, stiffness, pose command, force/torque reference. Which segments
// exist depends on the impedance mode and on whether the force channel is enabled.

use nalgebra::{DVector, Vector6};
use oscft_core::core::ImpedanceMode;
use oscft_core::error::{OscError, OscResult};

/// Length of the force/torque reference segment
pub const FORCE_REFERENCE_LEN: usize = 6;

/// Segment sizes of the action vector for one controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionLayout {
    pub mode: ImpedanceMode,
    /// 6 with orientation control, 3 without
    pub pose_dim: usize,
    /// Force/torque reference appended at the end
    pub force_reference: bool,
}

/// One action vector cut into its segments
#[derive(Debug, Clone, PartialEq)]
pub struct ActionParts {
    pub damping_ratio: Option<DVector<f64>>,
    pub kp: Option<DVector<f64>>,
    pub pose: DVector<f64>,
    pub force_reference: Option<Vector6<f64>>,
}

/// `(min, max)` of every segment, used to build the action limits
#[derive(Debug, Clone)]
pub struct SegmentBounds {
    pub damping_ratio: (DVector<f64>, DVector<f64>),
    pub kp: (DVector<f64>, DVector<f64>),
    pub input: (DVector<f64>, DVector<f64>),
    pub force: (DVector<f64>, DVector<f64>),
}

impl ActionLayout {
    pub fn new(mode: ImpedanceMode, pose_dim: usize, force_reference: bool) -> Self {
        Self {
            mode,
            pose_dim,
            force_reference,
        }
    }

    fn force_len(&self) -> usize {
        if self.force_reference {
            FORCE_REFERENCE_LEN
        } else {
            0
        }
    }

    /// Total action length
    pub fn control_dim(&self) -> usize {
        self.mode.damping_ratio_len() + self.mode.stiffness_len() + self.pose_dim + self.force_len()
    }

    /// Cut `action` into segments; its length must equal [`ActionLayout::control_dim`]
    pub fn split(&self, action: &[f64]) -> OscResult<ActionParts> {
        if action.len() != self.control_dim() {
            return Err(OscError::dimension("action", self.control_dim(), action.len()));
        }

        let mut rest = action;

        let damping_len = self.mode.damping_ratio_len();
        let damping_ratio =
            (damping_len > 0).then(|| DVector::from_column_slice(take(&mut rest, damping_len)));
        let kp_len = self.mode.stiffness_len();
        let kp = (kp_len > 0).then(|| DVector::from_column_slice(take(&mut rest, kp_len)));
        let pose = DVector::from_column_slice(take(&mut rest, self.pose_dim));
        let force_reference = self
            .force_reference
            .then(|| Vector6::from_column_slice(take(&mut rest, FORCE_REFERENCE_LEN)));

        Ok(ActionParts {
            damping_ratio,
            kp,
            pose,
            force_reference,
        })
    }

    /// Concatenate the `(low, high)` bounds of the segments present in this layout
    pub fn limits(&self, bounds: &SegmentBounds) -> OscResult<(DVector<f64>, DVector<f64>)> {
        let mut segments: Vec<(&(DVector<f64>, DVector<f64>), usize, &'static str)> = Vec::new();
        if self.mode.damping_ratio_len() > 0 {
            segments.push((&bounds.damping_ratio, self.mode.damping_ratio_len(), "damping ratio limits"));
        }
        if self.mode.stiffness_len() > 0 {
            segments.push((&bounds.kp, self.mode.stiffness_len(), "kp limits"));
        }
        segments.push((&bounds.input, self.pose_dim, "input limits"));
        if self.force_reference {
            segments.push((&bounds.force, FORCE_REFERENCE_LEN, "force limits"));
        }

        let mut low = Vec::with_capacity(self.control_dim());
        let mut high = Vec::with_capacity(self.control_dim());
        for ((min, max), len, what) in segments {
            if min.len() != len || max.len() != len {
                return Err(OscError::dimension(what, len, min.len().min(max.len())));
            }
            low.extend(min.iter());
            high.extend(max.iter());
        }
        Ok((DVector::from_vec(low), DVector::from_vec(high)))
    }
}

/// Pop the first `n` values off `rest`
fn take<'a>(rest: &mut &'a [f64], n: usize) -> &'a [f64] {
    let slice: &'a [f64] = *rest;
    let (head, tail) = slice.split_at(n);
    *rest = tail;
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_dim_per_mode() {
        let cases = [
            (ImpedanceMode::Fixed, 6, true, 12),
            (ImpedanceMode::Fixed, 3, false, 3),
            (ImpedanceMode::Variable, 6, true, 24),
            (ImpedanceMode::Variable, 3, false, 15),
            (ImpedanceMode::VariableKp, 6, true, 18),
            (ImpedanceMode::VariableKp, 6, false, 12),
            (ImpedanceMode::VariableFullKp, 6, true, 30),
            (ImpedanceMode::VariableFullKp, 6, false, 24),
        ];
        for (mode, pose_dim, ft, expected) in cases {
            assert_eq!(ActionLayout::new(mode, pose_dim, ft).control_dim(), expected);
        }
    }

    #[test]
    fn test_split_variable() {
        let layout = ActionLayout::new(ImpedanceMode::Variable, 6, true);
        let action: Vec<f64> = (0..24).map(|i| i as f64).collect();
        let parts = layout.split(&action).unwrap();
        assert_eq!(parts.damping_ratio.unwrap()[0], 0.0);
        assert_eq!(parts.kp.unwrap()[0], 6.0);
        assert_eq!(parts.pose[0], 12.0);
        assert_eq!(parts.force_reference.unwrap()[5], 23.0);
    }

    #[test]
    fn test_split_fixed_without_force() {
        let layout = ActionLayout::new(ImpedanceMode::Fixed, 3, false);
        let parts = layout.split(&[0.1, 0.2, 0.3]).unwrap();
        assert!(parts.kp.is_none());
        assert!(parts.damping_ratio.is_none());
        assert!(parts.force_reference.is_none());
        assert_eq!(parts.pose.len(), 3);
    }

    #[test]
    fn test_split_rejects_wrong_length() {
        let layout = ActionLayout::new(ImpedanceMode::VariableKp, 6, true);
        assert!(matches!(
            layout.split(&[0.0; 17]),
            Err(OscError::DimensionMismatch {
                expected: 18,
                actual: 17,
                ..
            })
        ));
    }

    #[test]
    fn test_limits_order() {
        let layout = ActionLayout::new(ImpedanceMode::Variable, 3, true);
        let bounds = SegmentBounds {
            damping_ratio: (DVector::from_element(6, 0.0), DVector::from_element(6, 100.0)),
            kp: (DVector::from_element(6, 0.0), DVector::from_element(6, 300.0)),
            input: (DVector::from_element(3, -1.0), DVector::from_element(3, 1.0)),
            force: (DVector::from_element(6, 0.0), DVector::from_element(6, 20.0)),
        };
        let (low, high) = layout.limits(&bounds).unwrap();
        assert_eq!(low.len(), 21);
        assert_eq!(high[0], 100.0);
        assert_eq!(high[6], 300.0);
        assert_eq!(low[12], -1.0);
        assert_eq!(high[20], 20.0);
    }
}

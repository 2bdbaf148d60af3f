//! Action decoding: gain updates and pose-command scaling
//!
//! Each impedance mode has its own gain decoder, selected by an exhaustive `match` so a new
//! mode cannot be added without deciding how its stiffness is read.

use super::state::Stiffness;
use crate::messages::ActionParts;
use nalgebra::{DVector, Matrix3, Vector6};
use oscft_core::core::{ImpedanceMode, FULL_KP_DIAGONAL};
use oscft_core::error::{OscError, OscResult};


/// Clip without panicking on inverted bounds (upper bound wins)
fn clip(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

/// Sign with `sign(0) == 0`
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Bounds applied to decoded gains
#[derive(Debug, Clone)]
pub struct GainLimits {
    /// 6 entries, or 18 in full-matrix mode
    pub kp_min: DVector<f64>,
    pub kp_max: DVector<f64>,
    pub damping_ratio_min: Vector6<f64>,
    pub damping_ratio_max: Vector6<f64>,
}

type GainDecoder = fn(&ActionParts, &GainLimits) -> OscResult<Option<Stiffness>>;

/// Gain decoder for `mode`
pub fn gain_decoder(mode: ImpedanceMode) -> GainDecoder {
    match mode {
        ImpedanceMode::Fixed => decode_fixed,
        ImpedanceMode::Variable => decode_variable,
        ImpedanceMode::VariableKp => decode_variable_kp,
        ImpedanceMode::VariableFullKp => decode_variable_full_kp,
    }
}

fn segment<'a>(value: &'a Option<DVector<f64>>, what: &'static str, len: usize) -> OscResult<&'a DVector<f64>> {
    match value {
        Some(v) if v.len() == len => Ok(v),
        Some(v) => Err(OscError::dimension(what, len, v.len())),
        None => Err(OscError::dimension(what, len, 0)),
    }
}

fn clipped_kp(raw: &DVector<f64>, limits: &GainLimits) -> Vector6<f64> {
    Vector6::from_fn(|i, _| clip(raw[i], limits.kp_min[i], limits.kp_max[i]))
}

fn decode_fixed(_: &ActionParts, _: &GainLimits) -> OscResult<Option<Stiffness>> {
    Ok(None)
}

fn decode_variable(parts: &ActionParts, limits: &GainLimits) -> OscResult<Option<Stiffness>> {
    let raw_kp = segment(&parts.kp, "kp", 6)?;
    let raw_ratio = segment(&parts.damping_ratio, "damping_ratio", 6)?;
    let kp = clipped_kp(raw_kp, limits);
    let ratio = Vector6::from_fn(|i, _| {
        clip(
            raw_ratio[i],
            limits.damping_ratio_min[i],
            limits.damping_ratio_max[i],
        )
    });
    Ok(Some(Stiffness::diagonal(kp, &ratio)))
}

fn decode_variable_kp(parts: &ActionParts, limits: &GainLimits) -> OscResult<Option<Stiffness>> {
    let raw_kp = segment(&parts.kp, "kp", 6)?;
    let kp = clipped_kp(raw_kp, limits);
    Ok(Some(Stiffness::diagonal(kp, &Vector6::repeat(1.0))))
}

fn decode_variable_full_kp(
    parts: &ActionParts,
    limits: &GainLimits,
) -> OscResult<Option<Stiffness>> {
    let raw = segment(&parts.kp, "kp", 18)?;
    if limits.kp_min.len() != 18 || limits.kp_max.len() != 18 {
        return Err(OscError::dimension("kp limits", 18, limits.kp_min.len()));
    }

    let kp: Vec<f64> = (0..18)
        .map(|i| {
            if FULL_KP_DIAGONAL.contains(&i) {
                clip(raw[i], limits.kp_min[i].max(0.0), limits.kp_max[i])
            } else {
                sign(raw[i]) * clip(raw[i].abs(), 0.0, limits.kp_max[i])
            }
        })
        .collect();
    let kd: Vec<f64> = kp.iter().map(|k| 2.0 * sign(*k) * k.abs().sqrt()).collect();

    Ok(Some(Stiffness::Full {
        kp_pos: Matrix3::from_row_slice(&kp[0..9]),
        kp_ori: Matrix3::from_row_slice(&kp[9..18]),
        kd_pos: Matrix3::from_row_slice(&kd[0..9]),
        kd_ori: Matrix3::from_row_slice(&kd[9..18]),
    }))
}

/// Affine map of the pose command from input range to output range
#[derive(Debug, Clone)]
pub struct ActionScaler {
    input_min: DVector<f64>,
    input_max: DVector<f64>,
    scale: DVector<f64>,
    input_center: DVector<f64>,
    output_center: DVector<f64>,
}

impl ActionScaler {
    pub fn new(
        input_min: DVector<f64>,
        input_max: DVector<f64>,
        output_min: DVector<f64>,
        output_max: DVector<f64>,
    ) -> OscResult<Self> {
        let n = input_min.len();
        for (what, v) in [
            ("input_max", &input_max),
            ("output_min", &output_min),
            ("output_max", &output_max),
        ] {
            if v.len() != n {
                return Err(OscError::dimension(what, n, v.len()));
            }
        }
        let scale = DVector::from_fn(n, |i, _| {
            (output_max[i] - output_min[i]).abs() / (input_max[i] - input_min[i]).abs()
        });
        let input_center = (&input_max + &input_min) / 2.0;
        let output_center = (&output_max + &output_min) / 2.0;
        Ok(Self {
            input_min,
            input_max,
            scale,
            input_center,
            output_center,
        })
    }

    /// Clip to the input range, then map onto the output range
    pub fn scale(&self, action: &DVector<f64>) -> OscResult<DVector<f64>> {
        if action.len() != self.scale.len() {
            return Err(OscError::dimension("pose command", self.scale.len(), action.len()));
        }
        Ok(DVector::from_fn(action.len(), |i, _| {
            let clipped = clip(action[i], self.input_min[i], self.input_max[i]);
            (clipped - self.input_center[i]) * self.scale[i] + self.output_center[i]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn limits(kp_len: usize) -> GainLimits {
        GainLimits {
            kp_min: DVector::zeros(kp_len),
            kp_max: DVector::from_element(kp_len, 300.0),
            damping_ratio_min: Vector6::zeros(),
            damping_ratio_max: Vector6::repeat(100.0),
        }
    }

    fn parts(kp: Option<Vec<f64>>, damping_ratio: Option<Vec<f64>>) -> ActionParts {
        ActionParts {
            damping_ratio: damping_ratio.map(DVector::from_vec),
            kp: kp.map(DVector::from_vec),
            pose: DVector::zeros(6),
            force_reference: None,
        }
    }

    #[test]
    fn test_sign_of_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(-3.0), -1.0);
    }

    #[test]
    fn test_fixed_leaves_gains() {
        let decode = gain_decoder(ImpedanceMode::Fixed);
        assert_eq!(decode(&parts(None, None), &limits(6)).unwrap(), None);
    }

    #[test]
    fn test_variable_kp_clipped_to_max() {
        let decode = gain_decoder(ImpedanceMode::VariableKp);
        let stiffness = decode(&parts(Some(vec![1000.0; 6]), None), &limits(6))
            .unwrap()
            .unwrap();
        let (kp, kd) = stiffness.orientation_gains();
        assert_eq!(kp[(1, 1)], 300.0);
        assert_relative_eq!(kd[(1, 1)], 2.0 * 300f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_variable_scales_damping() {
        let decode = gain_decoder(ImpedanceMode::Variable);
        let stiffness = decode(
            &parts(Some(vec![100.0; 6]), Some(vec![0.5, 0.5, 0.5, 0.5, 0.5, 500.0])),
            &limits(6),
        )
        .unwrap()
        .unwrap();
        let (_, kd_pos) = stiffness.position_gains();
        let (_, kd_ori) = stiffness.orientation_gains();
        assert_relative_eq!(kd_pos[(0, 0)], 10.0, epsilon = 1e-12);
        // ratio clipped to 100
        assert_relative_eq!(kd_ori[(2, 2)], 2000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_full_kp_signs_and_bounds() {
        let decode = gain_decoder(ImpedanceMode::VariableFullKp);
        let mut raw = vec![-50.0; 18];
        raw[1] = 900.0;
        raw[2] = -900.0;
        raw[3] = 0.0;
        let stiffness = decode(&parts(Some(raw), None), &limits(18)).unwrap().unwrap();
        let Stiffness::Full {
            kp_pos,
            kp_ori,
            kd_pos,
            ..
        } = stiffness
        else {
            panic!("expected full blocks");
        };
        for i in 0..3 {
            assert_eq!(kp_pos[(i, i)], 0.0);
            assert_eq!(kp_ori[(i, i)], 0.0);
        }
        assert_eq!(kp_pos[(0, 1)], 300.0);
        assert_eq!(kp_pos[(0, 2)], -300.0);
        assert_eq!(kp_pos[(1, 0)], 0.0);
        assert_eq!(kp_ori[(0, 1)], -50.0);
        assert_relative_eq!(kd_pos[(0, 2)], -2.0 * 300f64.sqrt(), epsilon = 1e-12);
        assert_eq!(kd_pos[(1, 0)], 0.0);
    }

    #[test]
    fn test_full_kp_row_major_blocks() {
        let decode = gain_decoder(ImpedanceMode::VariableFullKp);
        let raw: Vec<f64> = (0..18).map(|i| i as f64).collect();
        let stiffness = decode(&parts(Some(raw), None), &limits(18)).unwrap().unwrap();
        let (kp_pos, _) = stiffness.position_gains();
        let (kp_ori, _) = stiffness.orientation_gains();
        assert_eq!(kp_pos[(0, 1)], 1.0);
        assert_eq!(kp_pos[(1, 0)], 3.0);
        assert_eq!(kp_ori[(2, 2)], 17.0);
    }

    #[test]
    fn test_missing_segment_is_dimension_error() {
        let decode = gain_decoder(ImpedanceMode::Variable);
        assert!(matches!(
            decode(&parts(Some(vec![1.0; 6]), None), &limits(6)),
            Err(OscError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_scaler_maps_unit_range() {
        let scaler = ActionScaler::new(
            DVector::from_element(3, -1.0),
            DVector::from_element(3, 1.0),
            DVector::from_element(3, -0.05),
            DVector::from_element(3, 0.05),
        )
        .unwrap();
        let out = scaler.scale(&DVector::from_vec(vec![1.0, -0.5, 4.0])).unwrap();
        assert_relative_eq!(out[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(out[1], -0.025, epsilon = 1e-12);
        // clipped to the input range first
        assert_relative_eq!(out[2], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_scaler_offset_ranges() {
        let scaler = ActionScaler::new(
            DVector::from_element(1, 0.0),
            DVector::from_element(1, 2.0),
            DVector::from_element(1, 10.0),
            DVector::from_element(1, 20.0),
        )
        .unwrap();
        assert_relative_eq!(scaler.scale(&DVector::from_element(1, 1.0)).unwrap()[0], 15.0);
        assert!(scaler.scale(&DVector::zeros(2)).is_err());
    }
}

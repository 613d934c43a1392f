//! Bit-error rate and signal-to-noise scoring for a single trial.

use crate::error::{Result, SimError};
use crate::signal::Waveform;
use crate::stats::mean_std;

/// Fraction of positions where `decoded` differs from `truth`.
pub fn bit_error_rate(truth: &[bool], decoded: &[bool]) -> Result<f64> {
    if truth.is_empty() {
        return Err(SimError::invalid("bits", "cannot score an empty sequence"));
    }
    if truth.len() != decoded.len() {
        return Err(SimError::invalid(
            "decoded",
            format!("length {} does not match ground truth length {}", decoded.len(), truth.len()),
        ));
    }
    let errors = truth.iter().zip(decoded).filter(|(a, b)| a != b).count();
    Ok(errors as f64 / truth.len() as f64)
}

/// Level separation between 1-slots and 0-slots over the pooled noise.
///
/// ```text
/// SNR = |mean(samples in 1-slots) − mean(samples in 0-slots)| / σ_pooled
/// σ_pooled = sqrt((σ₁² + σ₀²) / 2)
/// ```
///
/// Uses ground truth to split the waveform into driven and baseline regions,
/// so it grows linearly with the overlap for fixed noise. Slots are paired
/// with `truth` positionally; [`TrialScore::compute`] rejects a length
/// mismatch before calling this. Returns 0.0 when either class is empty or
/// the pooled spread is zero.
pub fn signal_to_noise(waveform: &Waveform, truth: &[bool]) -> f64 {
    let ones = waveform
        .blocks()
        .zip(truth)
        .filter(|&(_, &b)| b)
        .flat_map(|(block, _)| block.iter());
    let zeros = waveform
        .blocks()
        .zip(truth)
        .filter(|&(_, &b)| !b)
        .flat_map(|(block, _)| block.iter());

    let (m1, s1) = mean_std(ones.clone());
    let (m0, s0) = mean_std(zeros.clone());
    if ones.count() == 0 || zeros.count() == 0 {
        return 0.0;
    }
    let pooled = ((s1 * s1 + s0 * s0) / 2.0).sqrt();
    if pooled == 0.0 {
        return 0.0;
    }
    (m1 - m0).abs() / pooled
}

/// Scores of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialScore {
    pub ber: f64,
    pub snr: f64,
}

impl TrialScore {
    pub fn compute(waveform: &Waveform, truth: &[bool], decoded: &[bool]) -> Result<Self> {
        if truth.len() != waveform.bit_count() {
            return Err(SimError::invalid(
                "bits",
                format!(
                    "ground truth has {} bits but the waveform carries {} slots",
                    truth.len(),
                    waveform.bit_count()
                ),
            ));
        }
        let ber = bit_error_rate(truth, decoded)?;
        let snr = signal_to_noise(waveform, truth);
        if !snr.is_finite() {
            return Err(SimError::anomaly(format!("SNR evaluated to {}", snr)));
        }
        Ok(Self { ber, snr })
    }
}

/// Convert an amplitude SNR to decibels.
pub fn snr_db(snr: f64) -> f64 {
    20.0 * snr.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waveform(levels: &[f64], spb: usize) -> Waveform {
        let samples = levels
            .iter()
            .flat_map(|&l| std::iter::repeat(l).take(spb))
            .collect();
        Waveform::from_samples(samples, spb, 200.0).unwrap()
    }

    #[test]
    fn ber_counts_mismatches() {
        let truth = [true, false, true, true];
        assert_eq!(bit_error_rate(&truth, &truth).unwrap(), 0.0);
        assert_eq!(bit_error_rate(&truth, &[false, false, true, false]).unwrap(), 0.5);
        assert_eq!(bit_error_rate(&truth, &[false, true, false, false]).unwrap(), 1.0);
    }

    #[test]
    fn ber_rejects_length_mismatch_and_empty() {
        assert!(bit_error_rate(&[true, false], &[true]).is_err());
        assert!(bit_error_rate(&[], &[]).is_err());
    }

    #[test]
    fn snr_scales_with_separation() {
        // Alternating ±0.01 jitter inside each slot gives a known spread.
        let spb = 4;
        let build = |level: f64| {
            let mut s = Vec::new();
            for &bit in &[true, false, true, false] {
                let base = if bit { level } else { 0.0 };
                s.extend_from_slice(&[base + 0.01, base - 0.01, base + 0.01, base - 0.01]);
            }
            Waveform::from_samples(s, spb, 200.0).unwrap()
        };
        let truth = [true, false, true, false];
        let low = signal_to_noise(&build(0.1), &truth);
        let high = signal_to_noise(&build(1.0), &truth);
        assert!((low - 10.0).abs() < 1e-9, "low {}", low);
        assert!((high - 100.0).abs() < 1e-9, "high {}", high);
    }

    #[test]
    fn snr_zero_for_single_class_or_flat() {
        let wf = waveform(&[1.0, 1.0], 3);
        assert_eq!(signal_to_noise(&wf, &[true, true]), 0.0);
        let wf = waveform(&[1.0, 0.0], 3);
        assert_eq!(signal_to_noise(&wf, &[true, false]), 0.0);
    }

    #[test]
    fn trial_score_flags_non_finite_snr() {
        let mut wf = waveform(&[1.0, 0.0], 3);
        wf.samples_mut()[0] = f64::INFINITY;
        let err = TrialScore::compute(&wf, &[true, false], &[true, false]).unwrap_err();
        assert!(matches!(err, SimError::NumericalAnomaly(_)));
    }

    #[test]
    fn truth_longer_than_waveform_is_rejected() {
        let wf = waveform(&[1.0, 0.0], 2);
        let truth = [true, false, true];
        let err = TrialScore::compute(&wf, &truth, &truth).unwrap_err();
        assert!(err.is_invalid_parameter(), "{}", err);
        // The raw estimator pairs slots positionally and never indexes past
        // the waveform.
        assert_eq!(signal_to_noise(&wf, &truth), 0.0);
    }

    #[test]
    fn truth_shorter_than_waveform_is_rejected() {
        let wf = waveform(&[1.0, 0.0, 1.0], 2);
        let truth = [true, false];
        assert!(TrialScore::compute(&wf, &truth, &truth).is_err());
    }

    #[test]
    fn decibels() {
        assert!((snr_db(10.0) - 20.0).abs() < 1e-12);
        assert!((snr_db(1.0)).abs() < 1e-12);
    }
}

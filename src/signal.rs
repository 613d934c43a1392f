//! Bitstream synthesis.
//!
//! One trial draws N fair ground-truth bits, lays each bit down as a constant
//! level over `samples_per_bit = round(T · fs)` samples, scales the level by
//! the topological overlap, and superposes the receiver [`NoiseModel`].
//!
//! ```text
//! bits:      1        0        1        1
//!         ┌──────┐          ┌───────────────┐
//! level:  │  o   │    0     │       o       │     (unipolar)
//!      ───┘      └──────────┘               └───
//!         + Gaussian + drift + Poisson spikes
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::noise::NoiseModel;

/// Largest waveform a single trial may synthesize, in samples.
pub const MAX_TRIAL_SAMPLES: usize = 50_000_000;

/// How a bit value maps onto a signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineCoding {
    /// On-off keying: 1 → +o, 0 → 0.
    #[default]
    Unipolar,
    /// Antipodal: 1 → +o, 0 → -o.
    Bipolar,
}

impl LineCoding {
    pub fn level(&self, bit: bool, overlap: f64) -> f64 {
        match (self, bit) {
            (_, true) => overlap,
            (LineCoding::Unipolar, false) => 0.0,
            (LineCoding::Bipolar, false) => -overlap,
        }
    }
}

/// Everything the synthesizer needs besides the overlap and the RNG.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalParams {
    pub bit_count: usize,
    pub sampling_rate_hz: f64,
    pub bit_duration_seconds: f64,
    pub coding: LineCoding,
    pub noise: NoiseModel,
}

impl SignalParams {
    /// `round(T · fs)`, validated to be at least one sample.
    pub fn samples_per_bit(&self) -> Result<usize> {
        if !(self.sampling_rate_hz > 0.0) || !self.sampling_rate_hz.is_finite() {
            return Err(SimError::invalid(
                "sampling_rate_hz",
                format!("must be positive and finite, got {}", self.sampling_rate_hz),
            ));
        }
        if !(self.bit_duration_seconds > 0.0) || !self.bit_duration_seconds.is_finite() {
            return Err(SimError::invalid(
                "bit_duration_seconds",
                format!("must be positive and finite, got {}", self.bit_duration_seconds),
            ));
        }
        let n = (self.bit_duration_seconds * self.sampling_rate_hz).round();
        if !(n <= MAX_TRIAL_SAMPLES as f64) {
            return Err(SimError::invalid(
                "bit_duration_seconds",
                format!(
                    "{} s at {} Hz exceeds {} samples per bit",
                    self.bit_duration_seconds, self.sampling_rate_hz, MAX_TRIAL_SAMPLES
                ),
            ));
        }
        if n < 1.0 {
            return Err(SimError::invalid(
                "bit_duration_seconds",
                format!(
                    "{} s at {} Hz rounds to zero samples per bit",
                    self.bit_duration_seconds, self.sampling_rate_hz
                ),
            ));
        }
        Ok(n as usize)
    }

    pub fn validate(&self) -> Result<()> {
        self.total_samples()?;
        self.noise.validate()
    }

    /// `bit_count × samples_per_bit`, capped at [`MAX_TRIAL_SAMPLES`].
    pub fn total_samples(&self) -> Result<usize> {
        if self.bit_count == 0 {
            return Err(SimError::invalid("bit_count", "must be at least 1"));
        }
        let spb = self.samples_per_bit()?;
        match self.bit_count.checked_mul(spb) {
            Some(n) if n <= MAX_TRIAL_SAMPLES => Ok(n),
            _ => Err(SimError::invalid(
                "bit_count",
                format!(
                    "{} bits × {} samples per bit exceeds {} samples",
                    self.bit_count, spb, MAX_TRIAL_SAMPLES
                ),
            )),
        }
    }
}

/// Sampled receiver signal, `bit_count × samples_per_bit` long.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    samples_per_bit: usize,
    sampling_rate_hz: f64,
}

impl Waveform {
    /// Wrap raw samples. The length must be a non-zero multiple of
    /// `samples_per_bit`.
    pub fn from_samples(samples: Vec<f64>, samples_per_bit: usize, sampling_rate_hz: f64) -> Result<Self> {
        if samples_per_bit == 0 {
            return Err(SimError::invalid("samples_per_bit", "must be at least 1"));
        }
        if samples.is_empty() || samples.len() % samples_per_bit != 0 {
            return Err(SimError::invalid(
                "samples",
                format!(
                    "length {} is not a non-zero multiple of {} samples per bit",
                    samples.len(),
                    samples_per_bit
                ),
            ));
        }
        Ok(Self {
            samples,
            samples_per_bit,
            sampling_rate_hz,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Mutable access for channel taps and fault injection.
    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.samples
    }

    pub fn samples_per_bit(&self) -> usize {
        self.samples_per_bit
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    pub fn bit_count(&self) -> usize {
        self.samples.len() / self.samples_per_bit
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples belonging to bit slot `i`.
    pub fn block(&self, i: usize) -> &[f64] {
        let start = i * self.samples_per_bit;
        &self.samples[start..start + self.samples_per_bit]
    }

    pub fn blocks(&self) -> std::slice::Chunks<'_, f64> {
        self.samples.chunks(self.samples_per_bit)
    }

    /// Index of the first non-finite sample, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.samples.iter().position(|s| !s.is_finite())
    }
}

/// Ground truth plus the received waveform of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub bits: Vec<bool>,
    pub waveform: Waveform,
}

/// Draw `n` fair random bits.
pub fn random_bits<R: Rng>(n: usize, rng: &mut R) -> Vec<bool> {
    (0..n).map(|_| rng.gen::<bool>()).collect()
}

/// Synthesize one trial.
///
/// `overlap` scales the signal level; 0.0 gives a pure-noise waveform.
pub fn synthesize<R: Rng>(params: &SignalParams, overlap: f64, rng: &mut R) -> Result<Trial> {
    params.validate()?;
    if !overlap.is_finite() {
        return Err(SimError::anomaly(format!("overlap is {}", overlap)));
    }

    let spb = params.samples_per_bit()?;
    let bits = random_bits(params.bit_count, rng);

    let mut samples = Vec::with_capacity(params.total_samples()?);
    for &bit in &bits {
        let level = params.coding.level(bit, overlap);
        samples.extend(std::iter::repeat(level).take(spb));
    }

    params.noise.apply(&mut samples, params.sampling_rate_hz, rng)?;

    let waveform = Waveform::from_samples(samples, spb, params.sampling_rate_hz)?;
    Ok(Trial { bits, waveform })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(noise: NoiseModel) -> SignalParams {
        SignalParams {
            bit_count: 16,
            sampling_rate_hz: 200.0,
            bit_duration_seconds: 1.5,
            coding: LineCoding::Unipolar,
            noise,
        }
    }

    #[test]
    fn waveform_length_is_bits_times_block() {
        let p = params(NoiseModel::reference());
        let trial = synthesize(&p, 1.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(trial.bits.len(), 16);
        assert_eq!(trial.waveform.samples_per_bit(), 300);
        assert_eq!(trial.waveform.len(), 16 * 300);
        assert_eq!(trial.waveform.bit_count(), 16);
    }

    #[test]
    fn samples_per_bit_rounds() {
        let p = SignalParams {
            bit_duration_seconds: 0.0126,
            sampling_rate_hz: 1000.0,
            ..params(NoiseModel::silent())
        };
        assert_eq!(p.samples_per_bit().unwrap(), 13);
    }

    #[test]
    fn noiseless_levels_follow_bits() {
        let p = params(NoiseModel::silent());
        let trial = synthesize(&p, 0.7, &mut StdRng::seed_from_u64(2)).unwrap();
        for (i, &bit) in trial.bits.iter().enumerate() {
            let want = if bit { 0.7 } else { 0.0 };
            assert!(trial.waveform.block(i).iter().all(|&s| s == want));
        }
    }

    #[test]
    fn bipolar_zero_is_negative_level() {
        let p = SignalParams {
            coding: LineCoding::Bipolar,
            ..params(NoiseModel::silent())
        };
        let trial = synthesize(&p, 0.4, &mut StdRng::seed_from_u64(3)).unwrap();
        for (i, &bit) in trial.bits.iter().enumerate() {
            let want = if bit { 0.4 } else { -0.4 };
            assert_eq!(trial.waveform.block(i)[0], want);
        }
    }

    #[test]
    fn zero_overlap_is_valid_pure_noise() {
        let p = params(NoiseModel::reference());
        let trial = synthesize(&p, 0.0, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(trial.waveform.len(), 4800);
        assert!(trial.waveform.first_non_finite().is_none());
        let mean = trial.waveform.samples().iter().sum::<f64>() / 4800.0;
        assert!(mean.abs() < 0.05, "pure-noise mean {}", mean);
    }

    #[test]
    fn zero_bits_rejected() {
        let p = SignalParams {
            bit_count: 0,
            ..params(NoiseModel::reference())
        };
        let err = synthesize(&p, 1.0, &mut StdRng::seed_from_u64(5)).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn non_positive_rate_rejected() {
        let p = SignalParams {
            sampling_rate_hz: 0.0,
            ..params(NoiseModel::reference())
        };
        assert!(synthesize(&p, 1.0, &mut StdRng::seed_from_u64(5)).is_err());
    }

    #[test]
    fn oversized_waveforms_rejected_before_allocation() {
        let p = SignalParams {
            sampling_rate_hz: 1e300,
            ..params(NoiseModel::silent())
        };
        assert!(p.samples_per_bit().unwrap_err().is_invalid_parameter());

        let p = SignalParams {
            bit_count: usize::MAX / 2,
            ..params(NoiseModel::silent())
        };
        match synthesize(&p, 1.0, &mut StdRng::seed_from_u64(8)) {
            Err(SimError::InvalidParameter { name, .. }) => assert_eq!(name, "bit_count"),
            other => panic!("expected InvalidParameter, got {:?}", other.map(|t| t.bits.len())),
        }

        let p = params(NoiseModel::silent());
        assert_eq!(p.total_samples().unwrap(), 16 * 300);
    }

    #[test]
    fn non_finite_overlap_is_an_anomaly() {
        let p = params(NoiseModel::reference());
        let err = synthesize(&p, f64::NAN, &mut StdRng::seed_from_u64(6)).unwrap_err();
        assert!(matches!(err, SimError::NumericalAnomaly(_)));
    }

    #[test]
    fn seeded_synthesis_is_reproducible() {
        let p = params(NoiseModel::reference());
        let a = synthesize(&p, 0.8, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = synthesize(&p, 0.8, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        let c = synthesize(&p, 0.8, &mut StdRng::seed_from_u64(43)).unwrap();
        assert_ne!(a.waveform, c.waveform);
    }

    #[test]
    fn from_samples_checks_shape() {
        assert!(Waveform::from_samples(vec![0.0; 10], 3, 200.0).is_err());
        assert!(Waveform::from_samples(vec![], 3, 200.0).is_err());
        assert!(Waveform::from_samples(vec![0.0; 9], 0, 200.0).is_err());
        let w = Waveform::from_samples(vec![0.0; 9], 3, 200.0).unwrap();
        assert_eq!(w.bit_count(), 3);
        assert_eq!(w.blocks().count(), 3);
    }
}

//! Receiver noise model for the synthesized bitstream.
//!
//! Three independent impairments are superposed on the clean level signal:
//!
//! 1. **Measurement noise**: white Gaussian, mean 0, std σ_m, drawn per sample.
//! 2. **Drift**: a slow sinusoid A_d·sin(2π·f_d·t + φ). The phase φ is drawn
//!    once per trial and the term is continuous across bit boundaries.
//! 3. **Spikes**: impulses arriving as a Poisson process with rate λ per
//!    sample. Arrivals are generated from exponential inter-arrival gaps;
//!    each impulse has magnitude `spike_amplitude` and a random sign.
//!
//! All randomness comes from the caller's [`Rng`], so a seeded `StdRng`
//! reproduces the same noise realization bit for bit.

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Upper bound on the spike arrival rate λ.
pub const MAX_SPIKE_RATE: f64 = 1.0;

/// Parameters of the additive noise superposed on each waveform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Gaussian measurement noise standard deviation σ_m.
    pub gaussian_sigma: f64,
    /// Drift amplitude A_d.
    pub drift_amplitude: f64,
    /// Drift frequency f_d (Hz).
    pub drift_frequency_hz: f64,
    /// Expected spikes per sample λ.
    pub spike_rate: f64,
    /// Magnitude of each spike.
    pub spike_amplitude: f64,
}

impl NoiseModel {
    /// Reference receiver: σ_m = 0.05, A_d = 0.02 at 0.1 Hz, λ = 0.002.
    pub fn reference() -> Self {
        Self {
            gaussian_sigma: 0.05,
            drift_amplitude: 0.02,
            drift_frequency_hz: 0.1,
            spike_rate: 0.002,
            spike_amplitude: 0.5,
        }
    }

    /// No impairments at all.
    pub fn silent() -> Self {
        Self {
            gaussian_sigma: 0.0,
            drift_amplitude: 0.0,
            drift_frequency_hz: 0.0,
            spike_rate: 0.0,
            spike_amplitude: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("measurement_noise_sigma", self.gaussian_sigma)?;
        non_negative("drift_amplitude", self.drift_amplitude)?;
        non_negative("drift_frequency_hz", self.drift_frequency_hz)?;
        non_negative("spike_rate_per_sample", self.spike_rate)?;
        if self.spike_rate > MAX_SPIKE_RATE {
            return Err(SimError::invalid(
                "spike_rate_per_sample",
                format!("at most {} spike per sample, got {}", MAX_SPIKE_RATE, self.spike_rate),
            ));
        }
        non_negative("spike_amplitude", self.spike_amplitude)?;
        Ok(())
    }

    /// Drift term at time `t` for a given phase.
    pub fn drift_at(&self, t: f64, phase: f64) -> f64 {
        self.drift_amplitude * (2.0 * PI * self.drift_frequency_hz * t + phase).sin()
    }

    /// Superpose all three noise components onto `samples` in place.
    ///
    /// Draw order is fixed (drift phase, Gaussian per sample, then spike
    /// arrivals) so a given RNG state always yields the same realization.
    pub fn apply<R: Rng>(&self, samples: &mut [f64], sampling_rate_hz: f64, rng: &mut R) -> Result<()> {
        self.validate()?;
        if !(sampling_rate_hz > 0.0) {
            return Err(SimError::invalid(
                "sampling_rate_hz",
                format!("must be positive, got {}", sampling_rate_hz),
            ));
        }

        let phase = rng.gen::<f64>() * 2.0 * PI;
        let dt = 1.0 / sampling_rate_hz;
        for (i, s) in samples.iter_mut().enumerate() {
            *s += self.drift_at(i as f64 * dt, phase);
        }

        if self.gaussian_sigma > 0.0 {
            let normal = Normal::new(0.0, self.gaussian_sigma)
                .map_err(|e| SimError::invalid("measurement_noise_sigma", e.to_string()))?;
            for s in samples.iter_mut() {
                *s += normal.sample(rng);
            }
        }

        for idx in self.spike_positions(samples.len(), rng)? {
            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            samples[idx] += sign * self.spike_amplitude;
        }

        Ok(())
    }

    /// Sample indices hit by spikes in a waveform of `len` samples.
    ///
    /// Indices are ascending; the same index may appear more than once when
    /// two arrivals fall inside one sample period.
    pub fn spike_positions<R: Rng>(&self, len: usize, rng: &mut R) -> Result<Vec<usize>> {
        self.validate()?;
        if self.spike_rate <= 0.0 || len == 0 {
            return Ok(Vec::new());
        }
        let gaps = Exp::new(self.spike_rate)
            .map_err(|e| SimError::invalid("spike_rate_per_sample", e.to_string()))?;

        let mut positions = Vec::new();
        let mut t: f64 = gaps.sample(rng);
        while t < len as f64 {
            positions.push(t as usize);
            t += gaps.sample(rng);
        }
        Ok(positions)
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::reference()
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(SimError::invalid(
            name,
            format!("must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

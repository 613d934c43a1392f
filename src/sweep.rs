//! Mismatch sweep driver.
//!
//! For every receiver index in the configured range:
//! 1. compute the overlap with the fixed sender index,
//! 2. run `trials_per_point` seeded trials (synthesize → detect → score),
//! 3. average BER and SNR into one [`SweepPoint`].
//!
//! [`run_gain_sweep`] repeats the measurement over a logarithmic signal-gain
//! axis for every receiver index, for critical-gain analysis.
//!
//! Points are independent. With the `parallel` feature they are mapped on
//! rayon's pool; the indexed collect keeps submission order, and the result
//! is sorted by receiver index either way. A point whose trial fails is
//! recorded as [`PointOutcome::Failed`] and the sweep carries on.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{SweepConfig, MAX_SWEEP_POINTS};
use crate::detector::AdaptiveDetector;
use crate::error::{Result, SimError};
use crate::overlap::overlap;
use crate::report::{GainCurve, GainSweepReport, SweepReport};
use crate::scoring::TrialScore;
use crate::signal::{synthesize, SignalParams, Waveform};

/// Seed stride between sweep points.
const POINT_SEED_STRIDE: u64 = 1_000_003;
/// Seed stride between trials of one point.
const TRIAL_SEED_STRIDE: u64 = 7919;

/// Aggregated scores of a successful sweep point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Mean bit-error rate across trials.
    pub ber: f64,
    /// Population standard deviation of the per-trial BER.
    pub ber_std: f64,
    /// Mean SNR across trials.
    pub snr: f64,
    pub trials: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointOutcome {
    Measured(Measurement),
    Failed { reason: String },
}

/// One row of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub receiver_index: f64,
    /// `None` when the overlap itself could not be evaluated to a finite value.
    pub overlap: Option<f64>,
    pub outcome: PointOutcome,
}

impl SweepPoint {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, PointOutcome::Failed { .. })
    }

    pub fn measurement(&self) -> Option<&Measurement> {
        match &self.outcome {
            PointOutcome::Measured(m) => Some(m),
            PointOutcome::Failed { .. } => None,
        }
    }

    pub fn ber(&self) -> Option<f64> {
        self.measurement().map(|m| m.ber)
    }

    pub fn snr(&self) -> Option<f64> {
        self.measurement().map(|m| m.snr)
    }
}

/// Everything produced by one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub bits: Vec<bool>,
    pub waveform: Waveform,
    pub decoded: Vec<bool>,
    pub score: TrialScore,
}

/// Seed for trial `trial` of sweep point `point`.
pub fn trial_seed(base: u64, point: usize, trial: usize) -> u64 {
    base.wrapping_add((point as u64).wrapping_mul(POINT_SEED_STRIDE))
        .wrapping_add((trial as u64).wrapping_mul(TRIAL_SEED_STRIDE))
}

/// Run one seeded trial at `receiver_index` with no waveform tap. The signal
/// level is `signal_gain × overlap`.
pub fn run_trial(config: &SweepConfig, receiver_index: f64, seed: u64) -> Result<TrialRecord> {
    config.validate()?;
    let o = overlap(config.sender_index, receiver_index, config.coherence_width)?;
    let detector = config.detector()?;
    execute_trial(
        &config.signal_params(),
        &detector,
        config.signal_gain * o,
        seed,
        |_| {},
    )
}

fn execute_trial<F>(
    params: &SignalParams,
    detector: &AdaptiveDetector,
    amplitude: f64,
    seed: u64,
    tap: F,
) -> Result<TrialRecord>
where
    F: FnOnce(&mut Waveform),
{
    let mut rng = StdRng::seed_from_u64(seed);
    let trial = synthesize(params, amplitude, &mut rng)?;
    let bits = trial.bits;
    let mut waveform = trial.waveform;
    tap(&mut waveform);

    if let Some(i) = waveform.first_non_finite() {
        return Err(SimError::anomaly(format!(
            "sample {} of the waveform is {}",
            i,
            waveform.samples()[i]
        )));
    }

    let decoded = detector.decode(&waveform);
    let score = TrialScore::compute(&waveform, &bits, &decoded)?;
    Ok(TrialRecord {
        bits,
        waveform,
        decoded,
        score,
    })
}

/// Where a point sits in a sweep and how hard it is driven.
#[derive(Debug, Clone, Copy)]
struct Drive {
    point: usize,
    receiver_index: f64,
    gain: f64,
}

fn measure_point<T>(
    config: &SweepConfig,
    params: &SignalParams,
    detector: &AdaptiveDetector,
    drive: Drive,
    tap: &T,
) -> SweepPoint
where
    T: Fn(usize, &mut Waveform),
{
    let Drive {
        point,
        receiver_index,
        gain,
    } = drive;
    let o = match overlap(config.sender_index, receiver_index, config.coherence_width) {
        Ok(o) if o.is_finite() => o,
        Ok(o) => return failed(receiver_index, None, format!("overlap evaluated to {}", o)),
        Err(e) => return failed(receiver_index, None, e.to_string()),
    };

    let mut scores = Vec::with_capacity(config.trials_per_point);
    for trial in 0..config.trials_per_point {
        let seed = trial_seed(config.seed, point, trial);
        match execute_trial(params, detector, gain * o, seed, |w| tap(point, w)) {
            Ok(record) => scores.push(record.score),
            Err(e) => {
                warn!(
                    "sweep point {} (C_recv = {:.3}, gain {}) trial {} failed: {}",
                    point, receiver_index, gain, trial, e
                );
                return failed(receiver_index, Some(o), e.to_string());
            }
        }
    }

    let n = scores.len() as f64;
    let ber = scores.iter().map(|s| s.ber).sum::<f64>() / n;
    let ber_var = scores.iter().map(|s| (s.ber - ber).powi(2)).sum::<f64>() / n;
    let snr = scores.iter().map(|s| s.snr).sum::<f64>() / n;
    debug!(
        "C_recv = {:.3}, gain {}: overlap {:.4}, BER {:.4}, SNR {:.2}",
        receiver_index, gain, o, ber, snr
    );

    SweepPoint {
        receiver_index,
        overlap: Some(o),
        outcome: PointOutcome::Measured(Measurement {
            ber,
            ber_std: ber_var.sqrt(),
            snr,
            trials: scores.len(),
        }),
    }
}

fn failed(receiver_index: f64, overlap: Option<f64>, reason: String) -> SweepPoint {
    SweepPoint {
        receiver_index,
        overlap,
        outcome: PointOutcome::Failed { reason },
    }
}

/// Run the full sweep described by `config`.
pub fn run_sweep(config: &SweepConfig) -> Result<SweepReport> {
    run_sweep_with_tap(config, |_, _| {})
}

/// Run the sweep, passing every synthesized waveform through `tap` before
/// detection. The tap receives the sweep point index and may alter samples,
/// e.g. to inject faults or extra impairments.
///
/// Fails only if `config` is invalid; per-point failures are recorded in the
/// report.
pub fn run_sweep_with_tap<T>(config: &SweepConfig, tap: T) -> Result<SweepReport>
where
    T: Fn(usize, &mut Waveform) + Sync,
{
    config.validate()?;
    let params = config.signal_params();
    let detector = config.detector()?;
    let receivers = config.receiver_range.points();

    info!(
        "sweeping {} receiver indices around C_send = {} ({} trial(s) per point, ξ = {})",
        receivers.len(),
        config.sender_index,
        config.trials_per_point,
        config.coherence_width
    );

    let drive = |(point, &receiver_index): (usize, &f64)| Drive {
        point,
        receiver_index,
        gain: config.signal_gain,
    };

    #[cfg(feature = "parallel")]
    let mut points: Vec<SweepPoint> = receivers
        .par_iter()
        .enumerate()
        .map(|p| measure_point(config, &params, &detector, drive(p), &tap))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let mut points: Vec<SweepPoint> = receivers
        .iter()
        .enumerate()
        .map(|p| measure_point(config, &params, &detector, drive(p), &tap))
        .collect();

    points.sort_by(|a, b| a.receiver_index.total_cmp(&b.receiver_index));

    let failures = points.iter().filter(|p| p.is_failed()).count();
    if failures > 0 {
        warn!("{} of {} sweep points failed", failures, points.len());
    }
    info!("sweep complete: {} points", points.len());

    Ok(SweepReport::new(config, points))
}

/// Measure every receiver index at every gain of `config.gain_range`.
///
/// All gains of one receiver share that receiver's trial seeds, so the
/// ground-truth bits and noise are common along the gain axis and only the
/// signal level changes. `config.signal_gain` is ignored.
pub fn run_gain_sweep(config: &SweepConfig) -> Result<GainSweepReport> {
    config.validate()?;
    let params = config.signal_params();
    let detector = config.detector()?;
    let receivers = config.receiver_range.points();
    let gains = config.gain_range.values();
    if receivers.len().saturating_mul(gains.len()) > MAX_SWEEP_POINTS {
        return Err(SimError::invalid(
            "gain_range",
            format!(
                "{} receivers × {} gains exceeds {} sweep points",
                receivers.len(),
                gains.len(),
                MAX_SWEEP_POINTS
            ),
        ));
    }

    info!(
        "gain sweep: {} receiver indices × {} gains in [{}, {}]",
        receivers.len(),
        gains.len(),
        config.gain_range.min,
        config.gain_range.max
    );

    let drives: Vec<Drive> = receivers
        .iter()
        .enumerate()
        .flat_map(|(point, &receiver_index)| {
            gains.iter().map(move |&gain| Drive {
                point,
                receiver_index,
                gain,
            })
        })
        .collect();
    let no_tap = |_: usize, _: &mut Waveform| {};

    #[cfg(feature = "parallel")]
    let points: Vec<SweepPoint> = drives
        .par_iter()
        .map(|&d| measure_point(config, &params, &detector, d, &no_tap))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let points: Vec<SweepPoint> = drives
        .iter()
        .map(|&d| measure_point(config, &params, &detector, d, &no_tap))
        .collect();

    let curves = points
        .chunks(gains.len())
        .zip(&receivers)
        .map(|(row, &receiver_index)| GainCurve {
            receiver_index,
            overlap: row.iter().find_map(|p| p.overlap),
            outcomes: row.iter().map(|p| p.outcome.clone()).collect(),
        })
        .collect();

    Ok(GainSweepReport {
        sender_index: config.sender_index,
        coherence_width: config.coherence_width,
        gains,
        curves,
    })
}

//! Topological overlap between a sender and a receiver index.
//!
//! The coupling between two topological addresses decays as a Gaussian in
//! their difference:
//!
//! ```text
//! O(Cs, Cr; ξ) = exp(-k · (Cr - Cs)²),   k = 4π² · ξ
//! ```
//!
//! For the reference coherence width ξ = 0.03 this gives k ≈ 1.184, the
//! constant behind the worked mismatch table (ΔC = 1 → O ≈ 0.31,
//! ΔC = 2 → O ≈ 0.009).

use std::f64::consts::PI;

use crate::error::{Result, SimError};

/// Decay constant k = 4π²ξ of the overlap Gaussian.
pub fn decay_constant(coherence_width: f64) -> Result<f64> {
    if !(coherence_width > 0.0) || !coherence_width.is_finite() {
        return Err(SimError::invalid(
            "coherence_width",
            format!("must be positive and finite, got {}", coherence_width),
        ));
    }
    Ok(4.0 * PI * PI * coherence_width)
}

/// Overlap of sender index `cs` and receiver index `cr`.
///
/// Returns exactly 1.0 when the indices are equal, is symmetric in its
/// arguments, and never increases as |cr - cs| grows. Extreme mismatches
/// underflow to 0.0 rather than erroring.
pub fn overlap(cs: f64, cr: f64, coherence_width: f64) -> Result<f64> {
    let k = decay_constant(coherence_width)?;
    let delta = cr - cs;
    Ok((-k * delta * delta).exp())
}

/// Mismatch |ΔC| at which the overlap falls to `target`.
///
/// `target` must lie in (0, 1]; a target of 1.0 gives zero mismatch.
pub fn mismatch_for_overlap(target: f64, coherence_width: f64) -> Result<f64> {
    if !(target > 0.0 && target <= 1.0) {
        return Err(SimError::invalid(
            "target",
            format!("overlap target must lie in (0, 1], got {}", target),
        ));
    }
    let k = decay_constant(coherence_width)?;
    Ok((-target.ln() / k).sqrt())
}

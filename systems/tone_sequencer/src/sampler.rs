//! Stochastic pitch generation per quarter.

use prefire_core::Quarter;
use rand::{seq::SliceRandom, Rng};
use rand_distr::{Distribution, Normal};

/// Octave shifts considered when the sampled pitch sits above the range midpoint.
pub const SHIFTS_ABOVE_MIDPOINT: [i32; 5] = [-3, -2, -2, 0, 2];
/// Octave shifts considered when the sampled pitch sits at or below the midpoint.
pub const SHIFTS_BELOW_MIDPOINT: [i32; 5] = [3, 2, 2, 0, -2];

/// One draw from the frequency sampler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchSample {
    /// Gaussian pitch clamped into the quarter's range, before the octave shift.
    pub pitch: f64,
    /// Octave shift applied to the pitch.
    pub octave_shift: i32,
    /// Audible frequency, `pitch * 2^octave_shift`. Not clamped.
    pub frequency: f64,
}

/// Draws a Gaussian pitch for the quarter and applies a midpoint-biased octave shift.
///
/// The pitch is centred on the quarter's peak with a standard deviation of a
/// sixth of the range width and clamped into `[min, max]`. The octave shift is
/// picked uniformly from a five-element candidate set that leans away from the
/// half the pitch landed in; the shifted frequency is left unclamped.
pub fn sample_pitch<R: Rng + ?Sized>(quarter: Quarter, rng: &mut R) -> PitchSample {
    let range = quarter.pitch_range();
    let sigma = (range.max() - range.min()) / 6.0;
    let drawn = match Normal::new(range.peak(), sigma) {
        Ok(normal) => normal.sample(rng),
        Err(_) => range.peak(),
    };
    let pitch = drawn.clamp(range.min(), range.max());

    let candidates = if pitch > range.midpoint() {
        &SHIFTS_ABOVE_MIDPOINT
    } else {
        &SHIFTS_BELOW_MIDPOINT
    };
    let octave_shift = candidates.choose(rng).copied().unwrap_or(0);

    PitchSample {
        pitch,
        octave_shift,
        frequency: pitch * 2f64.powi(octave_shift),
    }
}

/// Absolute pitch distance between two frequencies in cents.
#[must_use]
pub fn cents_between(a: f64, b: f64) -> f64 {
    (1200.0 * (a / b).log2()).abs()
}

//! Vector and scalar helpers shared by every simulation module.
//!
//! Positions and velocities are [`glam::DVec2`] values. `DVec2` already covers
//! the immutable arithmetic (`a + b`, `a - b`, `a * k`) and the in-place
//! variants used on hot paths (`a += b`, `a *= k`); this module adds polar
//! conversion, angle normalization and clamping helpers that tolerate swapped
//! bounds.
//!
//! # Example
//!
//! ```
//! use tankwars_core::math::{bound, from_polar, normalize_angle};
//! use std::f64::consts::PI;
//!
//! let v = from_polar(2.0, 0.0);
//! assert!((v.x - 2.0).abs() < 1e-12);
//!
//! assert!((normalize_angle(-PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-12);
//!
//! // Swapped bounds still clamp.
//! assert_eq!(bound(15.0, 10.0, 0.0), 10.0);
//! ```

use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// 2D vector used for every position, velocity and acceleration.
pub type Vector = DVec2;

/// Builds a vector from a magnitude and an angle in radians.
#[must_use]
pub fn from_polar(magnitude: f64, angle: f64) -> Vector {
    DVec2::from_angle(angle) * magnitude
}

/// Wraps an angle in radians into `[0, 2π)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Orders a pair of bounds so that the first is never greater than the second.
fn ordered(min: f64, max: f64) -> (f64, f64) {
    if min <= max {
        (min, max)
    } else {
        (max, min)
    }
}

/// Clamps `value` into `[min, max]`.
///
/// Bounds given in the wrong order are swapped first. A NaN `value` clamps to
/// the lower bound, so the result is never NaN when the bounds are finite.
#[must_use]
pub fn bound(value: f64, min: f64, max: f64) -> f64 {
    let (lo, hi) = ordered(min, max);
    // f64::max discards a NaN operand, f64::clamp would panic on bad bounds.
    value.max(lo).min(hi)
}

/// Returns `true` if `value` lies in `[min, max]` (bounds may be swapped).
#[must_use]
pub fn in_bound(value: f64, min: f64, max: f64) -> bool {
    let (lo, hi) = ordered(min, max);
    lo <= value && value <= hi
}

/// Inclusive floating-point range used for tuning values drawn at random.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Lower end of the range.
    pub min: f64,
    /// Upper end of the range.
    pub max: f64,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `true` if both ends are finite and `min <= max`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Draws a uniformly distributed value from the span.
    ///
    /// A degenerate span (`min == max`) always yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = ordered(self.min, self.max);
        if lo >= hi {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }

    /// Returns `true` if at least one non-negative whole number lies in the span.
    #[must_use]
    pub fn contains_whole(&self) -> bool {
        let (lo, hi) = ordered(self.min.max(0.0), self.max.max(0.0));
        lo.ceil() <= hi.floor()
    }

    /// Draws a whole number from the span, both ends inclusive.
    ///
    /// Used for integer-valued tunings such as heal amounts or pellet bonuses.
    /// Spans without a whole number (see [`Span::contains_whole`]) yield
    /// `ceil(min)`; config validation rejects them.
    pub fn sample_whole<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let (lo, hi) = ordered(self.min.max(0.0), self.max.max(0.0));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (lo, hi) = (lo.ceil() as u32, hi.floor() as u32);
        if lo >= hi {
            return lo;
        }
        rng.gen_range(lo..=hi)
    }
}

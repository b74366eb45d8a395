//! # Mode Mapping Module
//!
//! Quantizes a frequency into the pair of mode numbers `(m, n)` that drive
//! the plate. Both numbers fall in `1..=6` and are never equal, because equal
//! modes collapse the figure into plain stripes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChladniError, Result};

/// Number of distinct values each mode can take.
pub const MODE_COUNT: u8 = 6;

/// Two distinct mode numbers, each in `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModePair {
    pub m: u8,
    pub n: u8,
}

impl ModePair {
    pub fn new(m: u8, n: u8) -> Self {
        Self { m, n }
    }

    /// The same modes with the axes exchanged.
    pub fn swapped(self) -> Self {
        Self { m: self.n, n: self.m }
    }

    /// Whether `m + n` is even, which selects the symmetric combination.
    pub fn is_even(self) -> bool {
        (self.m as u32 + self.n as u32) % 2 == 0
    }
}

impl fmt::Display for ModePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m = {}, n = {}", self.m, self.n)
    }
}

/// The two granularity constants of the mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Hz per step of `m`.
    pub m_divisor: f64,
    /// Hz per step of `n`.
    pub n_divisor: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self { m_divisor: 150.0, n_divisor: 100.0 }
    }
}

impl MappingConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("m_divisor", self.m_divisor), ("n_divisor", self.n_divisor)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChladniError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Maps a frequency onto two distinct mode numbers.
///
/// `m = floor(freq / m_divisor) mod 6 + 1` and likewise for `n`. If both land
/// on the same value, `n` advances one step around the cycle (6 wraps to 1).
///
/// Negative or non-finite frequencies are treated as 0 Hz so that the result
/// is always a valid pair.
pub fn map_to_modes(freq: f64, m_divisor: f64, n_divisor: f64) -> ModePair {
    let m = quantize(freq, m_divisor);
    let mut n = quantize(freq, n_divisor);
    if m == n {
        n = n % MODE_COUNT + 1;
    }
    ModePair { m, n }
}

/// [`map_to_modes`] with the divisors taken from a [`MappingConfig`].
pub fn map_with(freq: f64, config: &MappingConfig) -> ModePair {
    map_to_modes(freq, config.m_divisor, config.n_divisor)
}

fn quantize(freq: f64, divisor: f64) -> u8 {
    let freq = if freq.is_finite() && freq > 0.0 { freq } else { 0.0 };
    // Float-to-int casts saturate, so huge or NaN ratios still land in range.
    let steps = (freq / divisor).floor() as u64;
    (steps % MODE_COUNT as u64) as u8 + 1
}

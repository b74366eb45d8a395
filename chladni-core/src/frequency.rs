//! # Dominant Frequency Module
//!
//! This module reduces a whole waveform to the one frequency that carries
//! the most energy across a short-time spectral analysis.
//!
//! ## Features
//! - Leading/trailing silence trimming relative to the loudest frame
//! - Two interchangeable reduction policies (summed magnitude, per-frame vote)
//! - A fixed 440 Hz fallback for empty or silent input

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ChladniError, Result};
use crate::fft::{self, Spectrogram};

/// Frequency reported when the signal carries no usable energy.
pub const DEFAULT_FREQUENCY: f32 = 440.0;

/// Frame length used when measuring loudness for trimming.
const TRIM_FRAME_LENGTH: usize = 2048;
/// Hop length used when measuring loudness for trimming.
const TRIM_HOP_LENGTH: usize = 512;
/// Amplitudes below this are clamped before converting to dB.
const AMPLITUDE_FLOOR: f32 = 1e-5;

/// How the per-frame spectra are reduced to a single winning bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReductionPolicy {
    /// Sum every bin across all frames and take the loudest sum.
    #[default]
    SummedMagnitude,
    /// Let every frame vote for its loudest bin and take the most common vote.
    FrameVote,
}

impl ReductionPolicy {
    pub const ALL: [ReductionPolicy; 2] = [ReductionPolicy::SummedMagnitude, ReductionPolicy::FrameVote];
}

impl fmt::Display for ReductionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionPolicy::SummedMagnitude => write!(f, "Summed magnitude"),
            ReductionPolicy::FrameVote => write!(f, "Per-frame vote"),
        }
    }
}

/// Knobs for the frequency analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Window length of the transform in samples.
    pub n_fft: usize,
    /// Distance between consecutive windows in samples.
    pub hop_length: usize,
    /// Trim boundary frames quieter than this many dB below the peak; `None` disables trimming.
    pub trim_top_db: Option<f32>,
    pub policy: ReductionPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            trim_top_db: Some(20.0),
            policy: ReductionPolicy::SummedMagnitude,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_fft == 0 {
            return Err(ChladniError::InvalidConfig("n_fft must be positive".into()));
        }
        if self.hop_length == 0 {
            return Err(ChladniError::InvalidConfig("hop_length must be positive".into()));
        }
        if let Some(db) = self.trim_top_db {
            if !db.is_finite() || db <= 0.0 {
                return Err(ChladniError::InvalidConfig(format!(
                    "trim_top_db must be a positive number of dB, got {db}"
                )));
            }
        }
        Ok(())
    }
}

/// Finds the dominant frequency of a waveform in Hz.
///
/// This function runs the complete analysis:
/// 1. Optionally trims leading and trailing near-silence
/// 2. Computes the magnitude spectrogram
/// 3. Reduces it to a single bin using the configured policy
/// 4. Converts that bin to Hz
///
/// # Arguments
/// * `samples` - Mono audio samples, possibly empty or silent
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Transform sizes, trimming threshold and reduction policy
///
/// # Returns
/// * The dominant frequency, or exactly [`DEFAULT_FREQUENCY`] when the
///   signal is empty or carries no energy
pub fn analyze(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> f32 {
    if samples.is_empty() {
        debug!("Empty waveform, using default frequency");
        return DEFAULT_FREQUENCY;
    }

    let signal = match config.trim_top_db {
        Some(top_db) => {
            let trimmed = trim_silence(samples, top_db);
            if trimmed.is_empty() {
                debug!("Trimming removed everything, analysing untrimmed signal");
                samples
            } else {
                debug!("Trimmed {} -> {} samples", samples.len(), trimmed.len());
                trimmed
            }
        }
        None => samples,
    };

    let spectrogram = fft::stft_magnitudes(signal, config.n_fft, config.hop_length);
    match dominant_bin(&spectrogram, config.policy) {
        Some(bin) => fft::bin_to_frequency(bin, sample_rate, config.n_fft),
        None => {
            warn!(
                "No usable spectral energy in {} frames, falling back to {} Hz",
                spectrogram.num_frames(),
                DEFAULT_FREQUENCY
            );
            DEFAULT_FREQUENCY
        }
    }
}

/// Picks the winning bin of a spectrogram, or `None` if nothing has energy.
pub fn dominant_bin(spectrogram: &Spectrogram, policy: ReductionPolicy) -> Option<usize> {
    if spectrogram.is_empty() {
        return None;
    }
    match policy {
        ReductionPolicy::SummedMagnitude => summed_magnitude_bin(spectrogram),
        ReductionPolicy::FrameVote => frame_vote_bin(spectrogram),
    }
}

fn summed_magnitude_bin(spectrogram: &Spectrogram) -> Option<usize> {
    let mut sums = vec![0.0f64; spectrogram.num_bins()];
    for frame in &spectrogram.frames {
        for (sum, &magnitude) in sums.iter_mut().zip(frame) {
            *sum += magnitude as f64;
        }
    }
    first_max(&sums)
}

fn frame_vote_bin(spectrogram: &Spectrogram) -> Option<usize> {
    let mut votes = vec![0usize; spectrogram.num_bins()];
    for frame in &spectrogram.frames {
        let magnitudes: Vec<f64> = frame.iter().map(|&m| m as f64).collect();
        // Frames without energy do not vote.
        if let Some(bin) = first_max(&magnitudes) {
            votes[bin] += 1;
        }
    }
    // Ties go to the lowest bin.
    let mut best: Option<(usize, usize)> = None;
    for (bin, &count) in votes.iter().enumerate() {
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((bin, count));
        }
    }
    best.map(|(bin, _)| bin)
}

/// Index of the first strictly positive maximum, ignoring non-finite values.
fn first_max(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() && v > 0.0 && best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

/// Strips leading and trailing frames more than `top_db` below the loudest frame.
///
/// Loudness is the RMS of centred frames of [`TRIM_FRAME_LENGTH`] samples
/// spaced [`TRIM_HOP_LENGTH`] apart. The returned slice runs from the first
/// to the last frame that is not silent. A signal with no energy at all is
/// returned whole, since every frame is then as loud as the loudest one.
pub fn trim_silence(signal: &[f32], top_db: f32) -> &[f32] {
    if signal.is_empty() {
        return signal;
    }

    let rms = frame_rms(signal, TRIM_FRAME_LENGTH, TRIM_HOP_LENGTH);
    let reference = rms.iter().cloned().fold(0.0f32, f32::max).max(AMPLITUDE_FLOOR);
    let is_loud = |r: &f32| 20.0 * (r.max(AMPLITUDE_FLOOR) / reference).log10() > -top_db;

    let first = rms.iter().position(is_loud);
    let last = rms.iter().rposition(is_loud);
    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * TRIM_HOP_LENGTH).min(signal.len());
            let end = ((last + 1) * TRIM_HOP_LENGTH).min(signal.len());
            &signal[start..end]
        }
        _ => &signal[0..0],
    }
}

/// RMS of each centred, zero-padded frame.
fn frame_rms(signal: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    let pad = frame_length / 2;
    let padded_len = signal.len() + 2 * pad;
    let num_frames = 1 + (padded_len - frame_length) / hop_length;

    (0..num_frames)
        .map(|t| {
            // Frame t covers padded[t*hop .. t*hop + frame_length].
            let start = (t * hop_length) as isize - pad as isize;
            let end = start + frame_length as isize;
            let lo = start.max(0) as usize;
            let hi = (end.max(0) as usize).min(signal.len());
            let energy: f32 = signal[lo.min(hi)..hi].iter().map(|&s| s * s).sum();
            (energy / frame_length as f32).sqrt()
        })
        .collect()
}

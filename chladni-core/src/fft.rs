//! # Short-Time Fourier Transform Module
//!
//! This module turns a waveform into a magnitude spectrogram: the signal is
//! cut into overlapping, Hann-windowed frames and each frame is transformed
//! with RustFFT.
//!
//! ## Features
//! - Centred framing (the signal is zero-padded by half a window on each side)
//! - Periodic Hann windowing for reduced spectral leakage
//! - One planned FFT reused across all frames
//! - Bin-to-frequency conversion

use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrogram indexed by `[frame][bin]`.
///
/// Each frame holds `n_fft / 2 + 1` magnitudes, from 0 Hz up to Nyquist.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub n_fft: usize,
    pub frames: Vec<Vec<f32>>,
}

impl Spectrogram {
    /// Number of frequency bins per frame.
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Builds a periodic Hann window of the given size.
///
/// The periodic form (dividing by `size` rather than `size - 1`) is the one
/// used for spectral analysis, where consecutive windows tile the signal.
/// A single-point window is `[1.0]`, so one-sample frames keep their energy.
pub fn hann_window(size: usize) -> Vec<f32> {
    match size {
        0 => return Vec::new(),
        1 => return vec![1.0],
        _ => {}
    }
    let n = size as f32;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n).cos()))
        .collect()
}

/// Computes the magnitude spectrogram of a signal.
///
/// The signal is padded with `n_fft / 2` zeros on both sides so that frame
/// `t` is centred on sample `t * hop_length`. A non-empty signal therefore
/// always yields at least one frame, even when it is shorter than the window.
///
/// # Arguments
/// * `signal` - Mono audio samples
/// * `n_fft` - Window (and transform) length in samples
/// * `hop_length` - Distance between consecutive frame starts
///
/// # Returns
/// * `Spectrogram` - Empty if the signal is empty or either size is zero
pub fn stft_magnitudes(signal: &[f32], n_fft: usize, hop_length: usize) -> Spectrogram {
    if signal.is_empty() || n_fft == 0 || hop_length == 0 {
        return Spectrogram { n_fft, frames: Vec::new() };
    }

    let pad = n_fft / 2;
    let mut padded = vec![0.0f32; signal.len() + 2 * pad];
    padded[pad..pad + signal.len()].copy_from_slice(signal);

    let window = hann_window(n_fft);
    let num_frames = if padded.len() >= n_fft {
        1 + (padded.len() - n_fft) / hop_length
    } else {
        0
    };

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
    let num_bins = n_fft / 2 + 1;

    let mut frames = Vec::with_capacity(num_frames);
    for t in 0..num_frames {
        let start = t * hop_length;
        for (slot, (&sample, &w)) in buffer
            .iter_mut()
            .zip(padded[start..start + n_fft].iter().zip(window.iter()))
        {
            *slot = Complex::new(sample * w, 0.0);
        }
        fft.process(&mut buffer);
        frames.push(buffer.iter().take(num_bins).map(|c| c.norm()).collect());
    }

    Spectrogram { n_fft, frames }
}

/// Returns the centre frequency of every bin in Hz: `k * sample_rate / n_fft`.
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    if n_fft == 0 {
        return Vec::new();
    }
    (0..=n_fft / 2)
        .map(|k| bin_to_frequency(k, sample_rate, n_fft))
        .collect()
}

/// Converts a bin index to its centre frequency in Hz.
pub fn bin_to_frequency(bin: usize, sample_rate: u32, n_fft: usize) -> f32 {
    (bin as f64 * sample_rate as f64 / n_fft as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_hann_window() {
        let w = hann_window(1024);
        assert_eq!(w.len(), 1024);
        assert!(w[0].abs() < 1e-6);
        assert!((w[512] - 1.0).abs() < 1e-6);
        // Periodic: symmetric around the centre, excluding the first sample.
        assert!((w[1] - w[1023]).abs() < 1e-6);
    }

    #[test]
    fn test_single_point_window_passes_the_sample() {
        assert_eq!(hann_window(1), vec![1.0]);
        let spec = stft_magnitudes(&[0.3], 1, 1);
        assert_eq!(spec.num_frames(), 1);
        assert_eq!(spec.frames[0].len(), 1);
        assert!((spec.frames[0][0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_frame_count_is_centred() {
        let spec = stft_magnitudes(&vec![0.1; 44100], 2048, 512);
        assert_eq!(spec.num_frames(), 1 + 44100 / 512);
        assert!(spec.frames.iter().all(|f| f.len() == 1025));
    }

    #[test]
    fn test_short_signal_still_yields_a_frame() {
        let spec = stft_magnitudes(&[0.5, -0.5, 0.25], 2048, 512);
        assert_eq!(spec.num_frames(), 1);
    }

    #[test]
    fn test_empty_signal_has_no_frames() {
        assert!(stft_magnitudes(&[], 2048, 512).is_empty());
        assert!(stft_magnitudes(&[1.0; 16], 2048, 0).is_empty());
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        // 1000 Hz at 8000 Hz with n_fft 256 lands exactly on bin 32.
        let spec = stft_magnitudes(&sine(1000.0, 8000, 4096), 256, 128);
        let middle = &spec.frames[spec.num_frames() / 2];
        let peak = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(32));
    }

    #[test]
    fn test_fft_frequencies() {
        let freqs = fft_frequencies(44100, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1] - 21.533203).abs() < 1e-3);
        assert!((freqs[1024] - 22050.0).abs() < 1e-3);
    }
}

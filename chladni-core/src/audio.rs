//! # Audio Input Module
//!
//! This module delivers complete mono waveforms to the analysis. Audio comes
//! either from a WAV file (via hound) or from the default microphone (via
//! CPAL), where a background thread accumulates chunks until recording stops.
//!
//! ## Features
//! - WAV decoding for integer and float PCM at any sample rate
//! - Down-mixing of multi-channel audio to mono
//! - Microphone capture with device configuration fallback
//! - A recorder that hands over one finished waveform

use std::io::Read;
use std::path::Path;
use std::thread::{self, JoinHandle};

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};

use crate::error::{ChladniError, Result};

/// Preferred capture sample rate in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// A mono recording together with its sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length of the recording in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Loads a WAV file as a mono waveform at its native sample rate.
pub fn load_wav(path: impl AsRef<Path>) -> Result<Waveform> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path)?;
    let waveform = decode(reader)?;
    info!(
        "Loaded {}: {} samples at {} Hz ({:.2}s)",
        path.display(),
        waveform.samples.len(),
        waveform.sample_rate,
        waveform.duration_secs()
    );
    Ok(waveform)
}

/// Decodes WAV data from any reader, e.g. an in-memory buffer.
pub fn decode_wav<R: Read>(source: R) -> Result<Waveform> {
    decode(hound::WavReader::new(source)?)
}

fn decode<R: Read>(reader: hound::WavReader<R>) -> Result<Waveform> {
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        return Err(ChladniError::Audio(format!(
            "unsupported WAV layout: {} channels at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
    };

    Ok(Waveform::new(downmix(&interleaved, spec.channels as usize), spec.sample_rate))
}

/// Averages interleaved channels into a single mono channel.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Starts audio capture from the default input device.
///
/// Every callback delivers its data, down-mixed to mono, as one chunk on
/// `sender`. The stream keeps running until it is dropped.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Audio stream handle and sample rate
/// * `Err(e)` - No input device or no usable configuration
pub fn start_audio_capture(sender: Sender<Vec<f32>>) -> anyhow::Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = match find_supported_config(configs, TARGET_SAMPLE_RATE) {
        Some(range) => {
            let rate = TARGET_SAMPLE_RATE
                .clamp(range.min_sample_rate().0, range.max_sample_rate().0);
            range.with_sample_rate(cpal::SampleRate(rate))
        }
        None => {
            warn!("No f32 input format near {} Hz, using device default", TARGET_SAMPLE_RATE);
            device.default_input_config()?
        }
    };

    if supported_config.sample_format() != cpal::SampleFormat::F32 {
        return Err(anyhow!(
            "Unsupported input sample format {:?}",
            supported_config.sample_format()
        ));
    }

    let sample_rate = supported_config.sample_rate().0;
    let channels = supported_config.channels() as usize;
    let config: cpal::StreamConfig = supported_config.into();

    info!("Selected sample rate: {} Hz, {} channel(s)", sample_rate, channels);

    let err_fn = |err| error!("An error occurred on the audio stream: {}", err);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Dropping chunks is fine once the recorder has gone away.
            let _ = sender.try_send(downmix(data, channels));
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the f32 configuration whose rate range lies closest to the target.
///
/// Mono configurations win over multi-channel ones at equal distance.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let (min, max) = (c.min_sample_rate().0, c.max_sample_rate().0);
            let distance = if target_rate < min {
                min - target_rate
            } else if target_rate > max {
                target_rate - max
            } else {
                0
            };
            (distance, c.channels())
        })
}

/// A microphone recording in progress.
///
/// The CPAL stream lives on its own thread; chunks are accumulated there and
/// the finished [`Waveform`] is handed over once [`Recorder::stop`] is called.
#[derive(Debug)]
pub struct Recorder {
    shutdown_tx: Sender<()>,
    result_rx: Receiver<anyhow::Result<Waveform>>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Recorder {
    /// Opens the default input device and starts recording.
    pub fn start() -> Self {
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);

        let thread_handle = thread::spawn(move || {
            let (chunk_tx, chunk_rx) = crossbeam_channel::unbounded::<Vec<f32>>();
            let (stream, sample_rate) = match start_audio_capture(chunk_tx) {
                Ok(tuple) => tuple,
                Err(e) => {
                    error!("Could not start audio capture: {}", e);
                    let _ = result_tx.send(Err(e));
                    return;
                }
            };
            info!("Recording started");

            let mut samples = Vec::new();
            loop {
                crossbeam_channel::select! {
                    recv(chunk_rx) -> msg => match msg {
                        Ok(chunk) => samples.extend_from_slice(&chunk),
                        Err(_) => {
                            warn!("Audio channel closed");
                            break;
                        }
                    },
                    recv(shutdown_rx) -> _ => break,
                }
            }

            if let Err(e) = stream.pause() {
                warn!("Error pausing stream: {}", e);
            }
            drop(stream);
            // Collect whatever arrived between the stop request and the pause.
            samples.extend(chunk_rx.try_iter().flatten());

            info!(
                "Recording stopped: {} samples ({:.2}s at {} Hz)",
                samples.len(),
                samples.len() as f64 / sample_rate as f64,
                sample_rate
            );
            let _ = result_tx.send(Ok(Waveform::new(samples, sample_rate)));
        });

        Self { shutdown_tx, result_rx, thread_handle: Some(thread_handle) }
    }

    /// Returns the capture error if the device failed to open.
    pub fn failure(&self) -> Option<String> {
        match self.result_rx.try_recv() {
            Ok(Err(e)) => Some(e.to_string()),
            _ => None,
        }
    }

    /// Stops recording and returns everything captured so far.
    pub fn stop(mut self) -> Result<Waveform> {
        let _ = self.shutdown_tx.send(());
        let result = self
            .result_rx
            .recv()
            .map_err(|_| ChladniError::Audio("recording thread ended unexpectedly".into()))?;
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        result.map_err(|e| ChladniError::Audio(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes<S: hound::Sample + Copy>(spec: hound::WavSpec, samples: &[S]) -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for &sample in samples {
                writer.write_sample(sample).unwrap();
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn test_decode_int_wav_scales_to_unit_range() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, &[i16::MAX, 0, i16::MIN]);

        let waveform = decode_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(waveform.sample_rate, 22050);
        assert_eq!(waveform.samples.len(), 3);
        assert!((waveform.samples[0] - 1.0).abs() < 1e-4);
        assert_eq!(waveform.samples[1], 0.0);
        assert_eq!(waveform.samples[2], -1.0);
    }

    #[test]
    fn test_decode_stereo_float_wav_downmixes() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        // Interleaved left/right pairs.
        let bytes = wav_bytes(spec, &[1.0f32, 0.0, 0.5, -0.5]);

        let waveform = decode_wav(Cursor::new(bytes)).unwrap();
        assert_eq!(waveform.samples, vec![0.5, 0.0]);
        assert_eq!(waveform.sample_rate, 48000);
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        assert!(decode_wav(Cursor::new(b"not a wav file".to_vec())).is_err());
    }

    #[test]
    fn test_downmix_drops_incomplete_frame() {
        assert_eq!(downmix(&[1.0, 3.0, 2.0], 2), vec![2.0]);
        assert_eq!(downmix(&[1.0, 3.0], 1), vec![1.0, 3.0]);
    }

    #[test]
    fn test_duration() {
        assert_eq!(Waveform::new(vec![0.0; 22050], 44100).duration_secs(), 0.5);
        assert_eq!(Waveform::new(vec![0.0; 10], 0).duration_secs(), 0.0);
    }
}

//! # Pipeline Module
//!
//! Runs one complete pass from waveform to figure:
//! waveform → dominant frequency → `(m, n)` → field → nodal lines.
//!
//! Each pass is independent. The only thing that outlives it is the
//! caller-owned [`ResultSlot`], which holds the most recent success.

use log::info;

use crate::audio::Waveform;
use crate::config::ChladniConfig;
use crate::contour::{self, Contour};
use crate::error::{ChladniError, Result};
use crate::frequency::{self, AnalysisConfig};
use crate::modes::{self, MappingConfig, ModePair};
use crate::pattern::{self, PlateConfig};
use crate::ChladniResult;

/// The three stages of a run.
///
/// [`StandardStages`] is the real implementation; the trait exists so a
/// caller can observe or replace individual stages.
pub trait Stages {
    /// Reduces a waveform to its dominant frequency in Hz.
    fn analyze(&mut self, waveform: &Waveform, config: &AnalysisConfig) -> f32;

    /// Quantizes a frequency into two distinct mode numbers.
    fn map_modes(&mut self, frequency: f32, config: &MappingConfig) -> ModePair;

    /// Traces the nodal lines of the plate for the given modes.
    fn synthesize(&mut self, modes: ModePair, plate: &PlateConfig) -> Contour;
}

/// The stages as implemented by this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardStages;

impl Stages for StandardStages {
    fn analyze(&mut self, waveform: &Waveform, config: &AnalysisConfig) -> f32 {
        frequency::analyze(&waveform.samples, waveform.sample_rate, config)
    }

    fn map_modes(&mut self, frequency: f32, config: &MappingConfig) -> ModePair {
        modes::map_with(frequency as f64, config)
    }

    fn synthesize(&mut self, modes: ModePair, plate: &PlateConfig) -> Contour {
        contour::extract_zero_contour(&pattern::synthesize(modes, plate))
    }
}

/// Runs the full pipeline with the standard stages.
///
/// # Returns
/// * `Ok(result)` - Frequency, modes and contour of the run
/// * `Err(ChladniError::NoInput)` - `input` is `None` or has no samples
/// * `Err(ChladniError::InvalidConfig)` - A knob is out of range
pub fn run(input: Option<&Waveform>, config: &ChladniConfig) -> Result<ChladniResult> {
    run_with(&mut StandardStages, input, config)
}

/// Runs the full pipeline with caller-supplied stages.
///
/// Without input no stage is invoked at all.
pub fn run_with<S: Stages + ?Sized>(
    stages: &mut S,
    input: Option<&Waveform>,
    config: &ChladniConfig,
) -> Result<ChladniResult> {
    let waveform = match input {
        Some(waveform) if !waveform.is_empty() => waveform,
        _ => return Err(ChladniError::NoInput),
    };
    if waveform.sample_rate == 0 {
        return Err(ChladniError::Audio("sample rate must be positive".into()));
    }
    config.validate()?;

    let dominant_frequency_hz = stages.analyze(waveform, &config.analysis);
    let modes = stages.map_modes(dominant_frequency_hz, &config.mapping);
    let contour = stages.synthesize(modes, &config.plate);

    info!(
        "Run complete: {:.1} Hz -> {} ({} nodal line(s), {} segments)",
        dominant_frequency_hz,
        modes,
        contour.component_count(),
        contour.segment_count()
    );

    Ok(ChladniResult { dominant_frequency_hz, modes, contour })
}

/// A caller-owned slot holding the most recent successful result.
///
/// Each success replaces the previous result outright; a failed run leaves
/// it untouched so the last figure stays on display.
#[derive(Debug, Clone, Default)]
pub struct ResultSlot {
    current: Option<ChladniResult>,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ChladniResult> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Stores a result, returning the one it replaces.
    pub fn store(&mut self, result: ChladniResult) -> Option<ChladniResult> {
        self.current.replace(result)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Runs the pipeline and, on success, stores the result in the slot.
    pub fn run_and_store(
        &mut self,
        input: Option<&Waveform>,
        config: &ChladniConfig,
    ) -> Result<&ChladniResult> {
        let result = run(input, config)?;
        Ok(self.current.insert(result))
    }
}

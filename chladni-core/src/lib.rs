// chladni-core/src/lib.rs

//! The core logic for turning a sound into a Chladni figure.
//! This crate is responsible for audio acquisition, dominant-frequency
//! analysis, mode mapping and nodal-line synthesis. It is completely
//! headless and contains no GUI code.

pub mod audio;
pub mod config;
pub mod contour;
pub mod error;
pub mod fft;
pub mod frequency;
pub mod modes;
pub mod pattern;
pub mod pipeline;
pub mod render;

pub use audio::Waveform;
pub use config::ChladniConfig;
pub use contour::{Contour, Point};
pub use error::{ChladniError, Result};
pub use frequency::{AnalysisConfig, ReductionPolicy, DEFAULT_FREQUENCY};
pub use modes::{MappingConfig, ModePair};
pub use pattern::{Field, PlateConfig};
pub use pipeline::{ResultSlot, Stages, StandardStages};

/// Represents the outcome of one complete run: sound in, figure out.
#[derive(Debug, Clone, PartialEq)]
pub struct ChladniResult {
    /// The dominant frequency in Hz.
    pub dominant_frequency_hz: f32,
    /// The mode numbers the frequency was mapped to.
    pub modes: ModePair,
    /// The nodal lines of the plate for those modes.
    pub contour: Contour,
}

impl ChladniResult {
    /// The frequency as it is shown to the user, rounded to whole Hz.
    pub fn display_frequency(&self) -> String {
        format!("{:.0} Hz", self.dominant_frequency_hz)
    }
}

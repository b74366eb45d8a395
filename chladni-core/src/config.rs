//! Top-level configuration and its JSON persistence.
//!
//! Only the knob settings are ever written to disk; audio and rendered
//! figures stay in memory.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frequency::AnalysisConfig;
use crate::modes::MappingConfig;
use crate::pattern::PlateConfig;

/// Every knob of the pipeline in one place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChladniConfig {
    pub analysis: AnalysisConfig,
    pub mapping: MappingConfig,
    pub plate: PlateConfig,
}

impl ChladniConfig {
    /// Checks that every knob is usable before a run starts.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        self.mapping.validate()?;
        self.plate.validate()
    }

    /// Saves the settings to a JSON file.
    pub fn save_settings(&self, path: impl AsRef<Path>) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }

    /// Loads settings from a JSON file. Missing fields take their defaults.
    pub fn load_settings(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: ChladniConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChladniError;
    use crate::frequency::ReductionPolicy;

    #[test]
    fn test_defaults() {
        let config = ChladniConfig::default();
        assert_eq!(config.analysis.n_fft, 2048);
        assert_eq!(config.analysis.hop_length, 512);
        assert_eq!(config.analysis.policy, ReductionPolicy::SummedMagnitude);
        assert_eq!(config.mapping.m_divisor, 150.0);
        assert_eq!(config.mapping.n_divisor, 100.0);
        assert_eq!(config.plate.side_length, 1.0);
        assert_eq!(config.plate.resolution, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut config = ChladniConfig::default();
        config.analysis.n_fft = 1024;
        config.analysis.policy = ReductionPolicy::FrameVote;
        config.mapping.n_divisor = 250.0;
        config.save_settings(&path).unwrap();

        assert_eq!(ChladniConfig::load_settings(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let config: ChladniConfig =
            serde_json::from_str(r#"{ "mapping": { "m_divisor": 75.0 } }"#).unwrap();
        assert_eq!(config.mapping.m_divisor, 75.0);
        assert_eq!(config.mapping.n_divisor, 100.0);
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "plate": { "resolution": 1 } }"#).unwrap();

        let err = ChladniConfig::load_settings(&path).unwrap_err();
        assert!(matches!(err, ChladniError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ChladniConfig::load_settings("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ChladniError::Io(_)));
    }
}

//! Error types shared by every stage of the crate.

use thiserror::Error;

/// Everything that can go wrong between acquiring audio and exporting a figure.
///
/// The numeric stages themselves never fail: a silent signal falls back to
/// [`crate::DEFAULT_FREQUENCY`] and a mode collision is resolved by the mapper.
/// The only failure a user normally sees is [`ChladniError::NoInput`].
#[derive(Debug, Error)]
pub enum ChladniError {
    /// Analysis was requested before any audio was loaded or recorded.
    #[error("no audio data: load a file or record from the microphone first")]
    NoInput,

    /// A configuration knob is outside the range the analysis can work with.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Decoding a file or talking to the capture device failed.
    #[error("audio error: {0}")]
    Audio(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl From<hound::Error> for ChladniError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => ChladniError::Io(io),
            other => ChladniError::Audio(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChladniError>;

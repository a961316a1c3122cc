//! Error types for the pagemodel library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagemodel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building or emitting page models.
///
/// Problems with a single drawn item (a character without a font, an image
/// that can't be written) are not reported through this type: they are
/// recorded in the page's [`Diagnostics`](crate::Diagnostics) and the item
/// is dropped.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The font engine could not be set up. Processing can't continue.
    #[error("Font engine initialization failed: {0}")]
    FontEngineInit(String),

    /// A font substitution entry is malformed.
    #[error("Invalid font map entry: {0}")]
    InvalidFontMap(String),

    /// A font program failed validation.
    #[error("Invalid font source '{name}': {reason}")]
    InvalidFontSource {
        /// Sanitized font name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// No storage path could be resolved for an image.
    #[error("Unable to resolve image path for resource {0}")]
    ImagePath(i64),

    /// Image data could not be written to disk.
    #[error("Error writing '{}' to disk: {source}", path.display())]
    ImageWrite {
        /// Destination that failed
        path: PathBuf,
        /// Underlying I/O failure
        source: io::Error,
    },

    /// A base64 payload in an event stream could not be decoded.
    #[error("Decoding error: {0}")]
    Decode(String),

    /// An event stream references something that doesn't exist.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error during output rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::Decode(err.to_string())
    }
}

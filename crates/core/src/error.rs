//! Error types for slide rendering.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a presentation to images.
///
/// Only [`Error::MalformedSlide`] is recoverable at slide granularity; the
/// pipeline records it and moves on. Every other variant aborts the whole
/// conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The zip container is unreadable or a required part is missing.
    #[error("Corrupt package: {0}")]
    CorruptPackage(String),

    /// The requested slide range does not fit the deck.
    #[error("Invalid slide range {start}..={end} for a deck of {count} slides")]
    InvalidRange {
        start: usize,
        end: usize,
        count: usize,
    },

    /// A slide's shape tree is absent or unparsable.
    #[error("Malformed slide {index}: {reason}")]
    MalformedSlide { index: usize, reason: String },

    /// Theme-level defaults are missing, so styles cannot be made concrete.
    #[error("Unresolved style: {0}")]
    UnresolvedStyle(String),

    /// An XML part is not well-formed.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The scale factor is not a positive finite number.
    #[error("Invalid scale factor: {0}")]
    InvalidScale(f32),

    /// A font file or directory could not be loaded.
    #[error("Font error: {0}")]
    FontError(String),
}

impl Error {
    /// Whether the pipeline may record this error for one slide and continue.
    pub fn is_slide_local(&self) -> bool {
        matches!(self, Error::MalformedSlide { .. })
    }
}

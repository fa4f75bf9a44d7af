//! Error types for deck conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or converting a deck.
///
/// Only container-level variants abort a file; content-level problems are
/// logged and degraded instead of being returned.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to interpret the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// A part referenced by the package is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A picture could not be decoded, converted or encoded.
    #[error("Image error: {0}")]
    ImageError(String),

    /// The title outline could not be read.
    #[error("Outline error: {0}")]
    OutlineError(String),
}

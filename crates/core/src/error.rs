//! Error types for PPTX template analysis and deck editing.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, analyzing or rewriting a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write the underlying bytes.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP container error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A part the package structure requires is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The package is readable but does not form a valid presentation.
    #[error("Invalid presentation package: {0}")]
    InvalidPackage(String),

    /// Caller-supplied deck spec or patch operation cannot be applied.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the error is caused by the content of the presentation itself,
    /// as opposed to I/O or caller input.
    pub fn is_package_error(&self) -> bool {
        matches!(
            self,
            Error::ZipError(_) | Error::XmlError(_) | Error::MissingPart(_) | Error::InvalidPackage(_)
        )
    }
}

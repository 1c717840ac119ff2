//! Error types for the xlrows library.

use std::io;
use thiserror::Error;

/// Result type alias for xlrows operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a spreadsheet package.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while streaming a part's bytes.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a readable ZIP container.
    #[error("ZIP archive error: {0}")]
    Archive(String),

    /// A part is not present in the package.
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// A part exists but its content does not match the expected schema.
    #[error("Format error: {0}")]
    Format(String),
}

impl Error {
    /// Whether this error reports a missing part.
    pub fn is_part_not_found(&self) -> bool {
        matches!(self, Error::PartNotFound(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Format(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Format(err.to_string())
    }
}

use std::fmt::Formatter;
use std::path::{Path, PathBuf};

use crate::type1::Type1Error;
use crate::woff2::Woff2Error;

/// Why a recognized font file could not be decoded.
#[derive(Debug)]
pub enum FontError {
    IoError(std::io::Error),
    FaceError(ttf_parser::FaceParsingError),
    Woff2Error(Woff2Error),
    Type1Error(Type1Error),
}

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            FontError::IoError(e) => write!(f, "IO error: {}", e),
            FontError::FaceError(e) => write!(f, "Font error: {}", e),
            FontError::Woff2Error(e) => write!(f, "WOFF2 error: {}", e),
            FontError::Type1Error(e) => write!(f, "Type 1 error: {}", e),
        }
    }
}

impl std::error::Error for FontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontError::IoError(e) => Some(e),
            FontError::FaceError(e) => Some(e),
            FontError::Woff2Error(e) => Some(e),
            FontError::Type1Error(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for FontError {
    fn from(e: std::io::Error) -> Self {
        FontError::IoError(e)
    }
}

impl From<ttf_parser::FaceParsingError> for FontError {
    fn from(e: ttf_parser::FaceParsingError) -> Self {
        FontError::FaceError(e)
    }
}

impl From<Woff2Error> for FontError {
    fn from(e: Woff2Error) -> Self {
        FontError::Woff2Error(e)
    }
}

impl From<Type1Error> for FontError {
    fn from(e: Type1Error) -> Self {
        FontError::Type1Error(e)
    }
}

/// Advisory message about a file that produced no results.
///
/// None of these stop a search; they are reported next to the results.
#[derive(Debug)]
pub enum Diagnostic {
    /// Recognized format that is never decoded.
    Unreadable { path: PathBuf },
    /// Name-only font where no glyph name matched the code point.
    Undetermined { path: PathBuf },
    /// Decodable format whose bytes turned out to be malformed.
    DecodeFailure { path: PathBuf, error: FontError },
}

impl Diagnostic {
    pub fn path(&self) -> &Path {
        match self {
            Diagnostic::Unreadable { path }
            | Diagnostic::Undetermined { path }
            | Diagnostic::DecodeFailure { path, .. } => path,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Diagnostic::Unreadable { path } => {
                write!(f, "Skipping unreadable {}", path.display())
            }
            Diagnostic::Undetermined { path } => {
                write!(f, "Unable to determine support in {}", path.display())
            }
            Diagnostic::DecodeFailure { path, error } => {
                write!(f, "Failed to decode {}: {}", path.display(), error)
            }
        }
    }
}

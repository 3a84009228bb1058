//! Error types for tilecov core.

use std::path::PathBuf;
use std::{error::Error, fmt, io};

/// Error type for tilecov core operations.
#[derive(Debug)]
pub enum TilecovError {
    /// An underlying I/O error.
    Io(io::Error),
    /// JSON that is syntactically invalid or does not fit the declared shape.
    MalformedJson {
        /// File, shape or field the content came from.
        origin: String,
        /// Line and column of the offending content, when known.
        location: Option<(usize, usize)>,
        /// Parser message.
        message: String,
    },
    /// A resource file handed to a record store does not exist.
    ResourceNotFound(PathBuf),
    /// A required directory does not exist.
    DirectoryNotFound(PathBuf),
    /// A tileset directory has no `tileset.txt`.
    MetadataNotFound(PathBuf),
    /// A tileset's metadata does not name its tile config file.
    MissingConfigPath {
        /// Tileset name from the metadata.
        tileset: String,
    },
    /// The tile config file named by a tileset's metadata does not exist.
    ConfigFileNotFound {
        /// Tileset name from the metadata.
        tileset: String,
        /// Resolved path of the tile config file.
        path: PathBuf,
    },
    /// A record store was executed before its configuration was complete.
    BuilderMisconfigured(&'static str),
    /// A field was declared both list-like and nested on the same shape.
    ConflictingFieldDeclaration {
        /// Shape owning the field.
        shape: &'static str,
        /// JSON key of the field.
        field: &'static str,
    },
    /// Decoding a tile config file produced no value.
    NullConfigObject(PathBuf),
    /// A nested field was present but decoded to no value.
    MissingNestedValue {
        /// JSON key of the field.
        field: &'static str,
        /// Shape owning the field.
        shape: &'static str,
    },
    /// A `looks_like` chain loops back onto itself.
    CoverageResolution {
        /// Primary id of the record whose chain was resolved.
        id: String,
        /// Ids visited before the loop was detected, in order.
        chain: Vec<String>,
    },
    /// A configuration property is missing or invalid.
    InvalidConfig {
        /// Property key.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

impl TilecovError {
    /// Build a [`TilecovError::MalformedJson`] from a `serde_json` error.
    pub fn malformed(origin: impl Into<String>, error: &serde_json::Error) -> Self {
        let location = (error.line() > 0).then(|| (error.line(), error.column()));
        Self::MalformedJson {
            origin: origin.into(),
            location,
            message: error.to_string(),
        }
    }

    /// Prefix the origin of a decoding error with the file or string it came from.
    pub(crate) fn within(self, outer: &str) -> Self {
        match self {
            Self::MalformedJson {
                origin,
                location,
                message,
            } => Self::MalformedJson {
                origin: format!("{outer}: {origin}"),
                location,
                message,
            },
            other => other,
        }
    }
}

impl fmt::Display for TilecovError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::MalformedJson {
                origin,
                location: Some((line, column)),
                message,
            } => write!(f, "malformed json in {origin} at {line}:{column}: {message}"),
            Self::MalformedJson {
                origin,
                location: None,
                message,
            } => write!(f, "malformed json in {origin}: {message}"),
            Self::ResourceNotFound(path) => write!(f, "resource not found: {}", path.display()),
            Self::DirectoryNotFound(path) => {
                write!(f, "directory does not exist: {}", path.display())
            }
            Self::MetadataNotFound(path) => {
                write!(f, "tileset.txt not found in directory: {}", path.display())
            }
            Self::MissingConfigPath { tileset } => {
                write!(f, "path to config file was not specified for tileset: {tileset}")
            }
            Self::ConfigFileNotFound { tileset, path } => write!(
                f,
                "unable to find config file for tileset {tileset}: {}",
                path.display()
            ),
            Self::BuilderMisconfigured(what) => write!(f, "record store misconfigured: {what}"),
            Self::ConflictingFieldDeclaration { shape, field } => write!(
                f,
                "field '{field}' of {shape} is declared both list-like and nested"
            ),
            Self::NullConfigObject(path) => {
                write!(f, "tile config decoded to null: {}", path.display())
            }
            Self::MissingNestedValue { field, shape } => write!(
                f,
                "unable to decode expected JSON property '{field}' of {shape}"
            ),
            Self::CoverageResolution { id, chain } => write!(
                f,
                "looks_like chain of '{id}' does not terminate: {}",
                chain.join(" -> ")
            ),
            Self::InvalidConfig { key, message } => write!(f, "config property {key}: {message}"),
        }
    }
}

impl Error for TilecovError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TilecovError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Convenience result type for tilecov core.
pub type Result<T> = std::result::Result<T, TilecovError>;

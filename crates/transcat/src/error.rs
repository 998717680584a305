//! Error types for catalog loading.
//!
//! Lookup never fails: a miss is an ordinary `None` that the translator turns
//! into the source text. Only building and loading catalogs produce errors,
//! and every one of them is recoverable by omitting the offending catalog.

use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, I18nError>;

/// Errors from catalog parsing and loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// A catalog resource was structurally invalid.
    Parse {
        /// Resource the error came from (file name or catalog id).
        origin: String,
        /// 1-based line of the offending construct, when known.
        line: Option<usize>,
        /// Human-readable description.
        message: String,
    },
    /// A catalog resource could not be read.
    Io {
        /// Path or identifier that failed.
        path: String,
        /// Underlying I/O error, rendered.
        message: String,
    },
    /// No reader is registered for the resource's format.
    UnknownFormat(String),
    /// A locale tag was malformed.
    InvalidLocale(String),
    /// A JSON catalog document failed to deserialize.
    Json(String),
}

impl I18nError {
    /// Build a parse error without line information.
    pub fn parse(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            line: None,
            message: message.into(),
        }
    }

    /// Build a parse error pinned to a line.
    pub fn parse_at(origin: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.into(),
            line: Some(line),
            message: message.into(),
        }
    }

    /// Whether this error came from a malformed resource (as opposed to I/O).
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Json(_))
    }
}

impl fmt::Display for I18nError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse {
                origin,
                line: Some(line),
                message,
            } => write!(f, "parse error in {origin} at line {line}: {message}"),
            Self::Parse {
                origin,
                line: None,
                message,
            } => write!(f, "parse error in {origin}: {message}"),
            Self::Io { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::UnknownFormat(what) => write!(f, "unknown catalog format: {what}"),
            Self::InvalidLocale(l) => write!(f, "invalid locale: {l}"),
            Self::Json(msg) => write!(f, "invalid catalog document: {msg}"),
        }
    }
}

impl std::error::Error for I18nError {}

impl From<serde_json::Error> for I18nError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

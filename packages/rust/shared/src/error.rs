//! The one error type shared by every docbinder crate.
//!
//! A build either produces the whole site or fails with one of these. Only
//! `Query` and `Validation` abort on content problems; recoverable oddities in
//! the markup are logged, not raised. The binary reports them through
//! `color-eyre`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DocbinderError {
    /// `docbinder.toml` could not be read as a config, or holds a bad value.
    #[error("config error: {message}")]
    Config { message: String },

    /// The content source failed or reported errors. No pages are emitted.
    #[error("content query failed: {message}")]
    Query { message: String },

    /// A CSS selector or a piece of markup could not be handled.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Reading or writing `path` failed.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Output would be inconsistent: colliding routes, a stale manifest,
    /// a checksum that no longer matches.
    #[error("validation error: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, DocbinderError>;

impl DocbinderError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Attach the offending path to an I/O failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

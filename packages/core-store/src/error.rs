//! Error types for the core layer.

use std::path::PathBuf;

use crate::path::{NodePath, PathError};

/// Errors raised by node operations.
///
/// Transport failures are carried as `Transport` and are never retried here.
/// `NotFound` is the one domain condition: a strict operation required a
/// node that is absent.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Path validation error.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// The node does not exist.
    #[error("node '{path}' does not exist")]
    NotFound { path: NodePath },

    /// Backend or network failure reported by a transport.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The transport does not implement an optional capability.
    #[error("operation '{operation}' is not supported by this transport")]
    Unsupported { operation: &'static str },

    /// Local file access failed.
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }

    pub fn not_found(path: &NodePath) -> Self {
        Error::NotFound { path: path.clone() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

//! Error types for mapping operations.

use automap_model::AssignError;
use thiserror::Error;

/// Errors surfaced by a mapping call.
///
/// Absent operands, unknown configuration names and overrides whose types
/// do not match the mapped pair are not errors; they are no-ops.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MapError {
    /// A source value cannot be stored in the same-named destination field.
    #[error("Type mismatch at '{path}': cannot assign {found} to {expected}")]
    TypeMismatch {
        /// Dotted path of the destination field.
        path: String,
        /// Declared type of the destination field.
        expected: String,
        /// Declared type of the source field.
        found: String,
    },

    /// A destination field rejected the write for another reason.
    #[error("Cannot write '{path}': {source}")]
    Assign {
        path: String,
        #[source]
        source: AssignError,
    },

    /// Record recursion went deeper than the configured bound.
    #[error("Nesting depth limit of {limit} exceeded at '{path}'")]
    DepthLimitExceeded { path: String, limit: usize },

    /// An override function returned an error.
    #[error("Override #{index} of configuration '{config}' failed: {source}")]
    Override {
        config: String,
        /// Registration index of the entry within its configuration.
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl MapError {
    /// Get the field path associated with this error, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::Assign { path, .. }
            | Self::DepthLimitExceeded { path, .. } => Some(path),
            Self::Override { .. } => None,
        }
    }

    /// Get the configuration name associated with this error, if any.
    pub fn config(&self) -> Option<&str> {
        match self {
            Self::Override { config, .. } => Some(config),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

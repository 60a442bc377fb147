//! Error types for the pod mutation pipeline

use thiserror::Error;

/// Main error type for pod mutation
///
/// Every variant is scoped to a single admission request. Nothing is retried
/// inside the crate and no partial patch is ever returned alongside an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A mutation rule could not reason about the pod it was given
    #[error("mutation '{mutation}' failed: {message}")]
    Rule {
        /// Short name of the failing rule
        mutation: &'static str,
        /// Human-readable failure reason
        message: String,
    },

    /// The pod or the patch could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The computed patch does not transform the original into the mutated pod
    #[error("patch computation error: {0}")]
    Diff(String),

    /// Configuration could not be loaded or parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a rule failure for the named mutation
    pub fn rule(mutation: &'static str, msg: impl Into<String>) -> Self {
        Self::Rule {
            mutation,
            message: msg.into(),
        }
    }

    /// Create a patch computation error with the given message
    pub fn diff(msg: impl Into<String>) -> Self {
        Self::Diff(msg.into())
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

//! Error types for credledger.
//!
//! The engine uses a single taxonomy so callers can pattern-match on the
//! condition (not found, conflict, unsupported, ...) instead of inspecting
//! message strings. Recoverable lookup misses and unexpected I/O failures
//! are distinct variants; the outer command layer maps them to user-facing
//! messages and exit codes.

use thiserror::Error;

/// Error produced by a capability plugin (verify or token retrieval).
///
/// Plugins report failures with whatever error type suits them; the engine
/// carries it as a boxed source on [`CredentialError::Verification`] or
/// [`CredentialError::TokenRetrieval`].
pub type CapabilityError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for credential registry, store, and lifecycle operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A credential spec was registered with a missing required field.
    #[error("credential spec '{spec}' is missing required field '{field}'")]
    InvalidSpec { spec: String, field: &'static str },

    /// A credential key did not resolve to any registered spec.
    #[error("{message}")]
    UnknownCredential { message: String },

    /// The key names a registered spec but no record has been imported.
    #[error(
        "credential '{key}' is not stored; try:\n\n  credentials import {key} --src /path/to/credential/file"
    )]
    NotStored { key: String },

    /// The replace flag disagreed with the presence of an existing record.
    #[error("{message}")]
    Conflict { message: String },

    /// The spec declares a kind the import pipeline does not know.
    #[error("do not know how to handle credential kind '{kind}' on import")]
    UnsupportedKind { kind: String },

    /// The verify capability rejected the credential.
    #[error("verification failed for credential '{key}': {source}")]
    Verification {
        key: String,
        #[source]
        source: CapabilityError,
    },

    /// The token-retrieval capability failed.
    #[error("token retrieval failed for credential '{key}': {source}")]
    TokenRetrieval {
        key: String,
        #[source]
        source: CapabilityError,
    },

    /// `get_token` was called for a credential kind that has no token.
    #[error("credential '{name}' does not provide an authorization token")]
    NotTokenKind { name: String },

    /// The spec supplies no token-retrieval capability.
    #[error("credential '{name}' does not support token retrieval")]
    TokenUnsupported { name: String },

    /// Configuration directory not available.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,

    /// Internal lock poisoning error.
    #[error("internal lock error: {message}")]
    Lock { message: String },

    /// I/O error reading or writing credential files or the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document serialization/deserialization error.
    #[error("document error: {0}")]
    Document(#[from] serde_yaml::Error),
}

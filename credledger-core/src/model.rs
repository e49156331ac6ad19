//! Domain model types for credledger.
//!
//! This module defines the core types used throughout the engine:
//! - [`CredentialKind`] - Kind of credential (SSH key pair, auth token)
//! - [`CredentialStatus`] - Verification lifecycle state of a record
//! - [`CredentialRecord`] - Persisted entry for one configured credential
//! - [`RecordSet`] - The full key-to-record mapping held by a store
//! - [`CredentialDetail`] - Merged spec + record view for consumers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Kind of credential a spec describes.
///
/// The two known kinds serialize to the document strings `"ssh"` and
/// `"token"`. Anything else read from a plugin or document is preserved in
/// [`CredentialKind::Other`] so the import pipeline can reject it explicitly
/// rather than failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    /// An SSH key pair: private key plus a sibling `.pub` public key.
    #[serde(rename = "ssh")]
    SshKeyPair,

    /// A single-file API/authorization token.
    #[serde(rename = "token")]
    AuthToken,

    /// An unrecognized kind string.
    #[serde(untagged)]
    Other(String),
}

impl CredentialKind {
    /// Get the kind as its document string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SshKeyPair => "ssh",
            Self::AuthToken => "token",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verification lifecycle state of a credential record.
///
/// Serialized forms match the persisted document format exactly.
///
/// [`SetButExpired`](CredentialStatus::SetButExpired) is part of the
/// document format and accepted on load, but no transition in this engine
/// assigns it; time-based expiry is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
    /// The credential has never been imported.
    #[serde(rename = "not set")]
    NotSet,

    /// Imported but not yet checked against the service.
    #[serde(rename = "set but untested")]
    SetButUntested,

    /// Imported and accepted by the verify capability.
    #[serde(rename = "set and ready")]
    SetAndVerified,

    /// Imported but rejected by the verify capability.
    #[serde(rename = "set invalid")]
    SetButInvalid,

    /// Imported but past its useful life.
    #[serde(rename = "set but expired")]
    SetButExpired,
}

impl CredentialStatus {
    /// Get the status as its document string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSet => "not set",
            Self::SetButUntested => "set but untested",
            Self::SetAndVerified => "set and ready",
            Self::SetButInvalid => "set invalid",
            Self::SetButExpired => "set but expired",
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted entry for one configured credential.
///
/// The credential key is the [`RecordSet`] map key, not a field, so a record
/// can never disagree with the key it is stored under. Display fields
/// (`name`, `description`) belong to the registered spec and have no
/// representation here, which is what keeps them out of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Backing files, in order. Index 0 is the primary credential; for SSH
    /// key pairs index 1 is the public key. Ordering is meaningful.
    pub files: Vec<PathBuf>,

    /// Current verification status.
    pub status: CredentialStatus,
}

impl CredentialRecord {
    /// Create a freshly-imported record.
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            status: CredentialStatus::SetButUntested,
        }
    }
}

/// The full record mapping held by a store.
///
/// A `BTreeMap` keeps document output deterministically ordered.
pub type RecordSet = BTreeMap<String, CredentialRecord>;

/// Merged view of a registered spec and its stored record.
///
/// This is what external consumers (the CLI layer) see: display fields from
/// the spec, storage fields from the record, and never a capability value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialDetail {
    /// Credential key.
    pub key: String,

    /// Human-readable name from the spec.
    pub name: String,

    /// Description from the spec.
    pub description: String,

    /// Credential kind from the spec.
    pub kind: CredentialKind,

    /// Verification status from the record.
    pub status: CredentialStatus,

    /// Backing files from the record.
    pub files: Vec<PathBuf>,
}

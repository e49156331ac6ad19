//! Credential spec registration and lookup.
//!
//! This module provides:
//! - [`VerifyCredential`] / [`RetrieveToken`] - capability traits supplied
//!   by plugins per credential type
//! - [`Capabilities`] - the capability set carried by a spec
//! - [`CredentialSpec`] - registered, static description of a credential type
//! - [`CredentialRegistry`] - process-wide, append-only spec registry
//!
//! Specs are registered once at process start and never removed. The
//! registry is shared by reference (`Arc`) between the store, the import
//! pipeline, and the token resolver.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::{CapabilityError, CredentialError};
use crate::model::CredentialKind;
use crate::token::Secret;

/// Capability that checks a credential against the service it
/// authenticates to.
///
/// Implementations may perform network I/O; invocations are uniformly
/// awaited whether or not the underlying check is asynchronous. An `Err`
/// return means the service rejected the credential.
#[async_trait]
pub trait VerifyCredential: Send + Sync {
    /// Verify the credential backed by `files`.
    ///
    /// `files` is the record's file list in storage order (index 0 is the
    /// primary credential).
    async fn verify(&self, files: &[PathBuf]) -> Result<(), CapabilityError>;
}

/// Capability that extracts an authorization token from a credential's
/// backing files.
///
/// Only meaningful for [`CredentialKind::AuthToken`] specs.
#[async_trait]
pub trait RetrieveToken: Send + Sync {
    /// Resolve the token value from the record's backing files.
    async fn get_token(&self, files: &[PathBuf]) -> Result<Secret, CapabilityError>;
}

/// The capability set carried by a registered spec.
#[derive(Clone)]
pub struct Capabilities {
    /// Required: checks the credential against its service.
    pub verify: Arc<dyn VerifyCredential>,

    /// Optional: extracts a token; only meaningful for auth-token specs.
    pub get_token: Option<Arc<dyn RetrieveToken>>,
}

impl Capabilities {
    /// Capability set with a verify capability only.
    pub fn verify_only(verify: Arc<dyn VerifyCredential>) -> Self {
        Self {
            verify,
            get_token: None,
        }
    }

    /// Capability set with both verify and token retrieval.
    pub fn with_token(verify: Arc<dyn VerifyCredential>, get_token: Arc<dyn RetrieveToken>) -> Self {
        Self {
            verify,
            get_token: Some(get_token),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("verify", &true)
            .field("get_token", &self.get_token.is_some())
            .finish()
    }
}

/// Registered, static description of a credential type.
///
/// Immutable once added to the registry. The verify capability is required
/// by construction; registration additionally validates that `key` and
/// `name` are non-empty.
#[derive(Debug, Clone)]
pub struct CredentialSpec {
    /// Unique identifier, e.g. `"gitHubSSH"`.
    pub key: String,

    /// Human-readable name.
    pub name: String,

    /// What the credential is used for.
    pub description: String,

    /// Kind of credential.
    pub kind: CredentialKind,

    /// Plugin-supplied capabilities.
    pub capabilities: Capabilities,
}

impl CredentialSpec {
    /// Name to show in messages: the display name, falling back to the key.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            if self.key.is_empty() { "UNKNOWN" } else { &self.key }
        } else {
            &self.name
        }
    }
}

/// Summary of a registered spec with capability fields reduced to boolean
/// presence flags, safe to hand to generic consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportedCredential {
    /// Credential key.
    pub key: String,

    /// Human-readable name.
    pub name: String,

    /// Description.
    pub description: String,

    /// Credential kind.
    pub kind: CredentialKind,

    /// Whether a verify capability is registered (always true for valid specs).
    pub verify: bool,

    /// Whether a token-retrieval capability is registered.
    pub get_token: bool,
}

/// Process-wide, append-only registry of credential specs.
///
/// # Thread Safety
///
/// Uses interior mutability via `RwLock` and is shared across components
/// via `Arc`. Specs are only ever appended.
#[derive(Default)]
pub struct CredentialRegistry {
    specs: RwLock<Vec<CredentialSpec>>,
}

impl CredentialRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            specs: RwLock::new(Vec::new()),
        }
    }

    /// Register a credential spec.
    ///
    /// Fails with [`CredentialError::InvalidSpec`] if `key` or `name` is
    /// empty; the kind and verify capability are guaranteed by the type.
    /// Duplicate keys are appended without a guard — lookups return the
    /// first registration.
    pub fn register(&self, spec: CredentialSpec) -> Result<(), CredentialError> {
        for (field, value) in [("key", &spec.key), ("name", &spec.name)] {
            if value.is_empty() {
                return Err(CredentialError::InvalidSpec {
                    spec: spec.display_name().to_string(),
                    field,
                });
            }
        }

        let mut specs = self.specs.write().map_err(|e| CredentialError::Lock {
            message: format!("write lock poisoned: {}", e),
        })?;

        if specs.iter().any(|s| s.key == spec.key) {
            tracing::warn!(key = %spec.key, "duplicate credential spec registration");
        }

        specs.push(spec);
        Ok(())
    }

    /// Get a spec by key.
    ///
    /// Returns `None` if no spec with that key is registered.
    pub fn get(&self, key: &str) -> Option<CredentialSpec> {
        let specs = self.specs.read().ok()?;
        specs.iter().find(|s| s.key == key).cloned()
    }

    /// Get a spec by key, failing with a caller-supplied message when absent.
    ///
    /// The message template receives the key, so each call site can explain
    /// the miss in its own terms.
    pub fn get_required(
        &self,
        key: &str,
        msg: impl FnOnce(&str) -> String,
    ) -> Result<CredentialSpec, CredentialError> {
        self.get(key)
            .ok_or_else(|| CredentialError::UnknownCredential { message: msg(key) })
    }

    /// Check whether a key names a registered spec.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// List all registered specs with capabilities reduced to presence flags.
    pub fn list_supported(&self) -> Vec<SupportedCredential> {
        let specs = match self.specs.read() {
            Ok(specs) => specs,
            Err(_) => return Vec::new(),
        };

        specs
            .iter()
            .map(|s| SupportedCredential {
                key: s.key.clone(),
                name: s.name.clone(),
                description: s.description.clone(),
                kind: s.kind.clone(),
                verify: true,
                get_token: s.capabilities.get_token.is_some(),
            })
            .collect()
    }

    /// Number of registered specs.
    pub fn len(&self) -> usize {
        self.specs.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRegistry")
            .field("specs", &self.len())
            .finish()
    }
}

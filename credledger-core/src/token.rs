//! Token resolution.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for resolved token values that prevents
//!   accidental logging
//! - [`TokenResolver`] - Invokes a record's token-retrieval capability

use serde::{Deserialize, Serialize};

use crate::error::CredentialError;
use crate::model::CredentialKind;
use crate::store::CredentialStore;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value.
#[derive(Clone, Serialize, Deserialize)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Resolves authorization tokens through a spec's token-retrieval
/// capability.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    store: CredentialStore,
}

impl TokenResolver {
    /// Create a resolver over the given store.
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Resolve the authorization token for a stored credential.
    ///
    /// Fails with [`CredentialError::NotTokenKind`] for specs that are not
    /// auth tokens and [`CredentialError::TokenUnsupported`] when the spec
    /// carries no token-retrieval capability. The capability is invoked
    /// with the record's file list and awaited.
    pub async fn get_token(&self, key: &str) -> Result<Secret, CredentialError> {
        let spec = self.store.registry().get_required(key, |key| {
            format!(
                "'{}' is not a valid credential. Perhaps there is a missing plugin?",
                key
            )
        })?;

        let records = self.store.load().await?;
        let record = records
            .get(key)
            .ok_or_else(|| CredentialError::NotStored {
                key: key.to_string(),
            })?;

        if spec.kind != CredentialKind::AuthToken {
            return Err(CredentialError::NotTokenKind {
                name: spec.display_name().to_string(),
            });
        }

        let get_token = spec.capabilities.get_token.as_ref().ok_or_else(|| {
            CredentialError::TokenUnsupported {
                name: spec.display_name().to_string(),
            }
        })?;

        get_token
            .get_token(&record.files)
            .await
            .map_err(|source| CredentialError::TokenRetrieval {
                key: key.to_string(),
                source,
            })
    }
}

//! Credential verification.
//!
//! The [`VerificationEngine`] invokes each record's verify capability and
//! updates its status. Capability invocations are uniformly awaited; they
//! may perform network I/O.

use crate::error::CredentialError;
use crate::model::CredentialStatus;
use crate::store::CredentialStore;

/// Options for a verification pass.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Keys to verify; `None` targets every stored record.
    pub keys: Option<Vec<String>>,

    /// Re-run verification for records that are already verified.
    pub re_verify: bool,

    /// Stop and re-raise on the first failure instead of collecting keys.
    pub throw_on_error: bool,
}

/// Runs verify capabilities against stored credentials.
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    store: CredentialStore,
}

impl VerificationEngine {
    /// Create an engine over the given store.
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Verify stored credentials and update their statuses.
    ///
    /// The target set is `options.keys` when given, otherwise all stored
    /// records. A key is skipped when its status is
    /// [`NotSet`](CredentialStatus::NotSet), or when it is already
    /// [`SetAndVerified`](CredentialStatus::SetAndVerified) and
    /// `options.re_verify` is false. Each attempted key performs exactly
    /// one verify invocation; re-verification requires an explicit call
    /// with `re_verify` set.
    ///
    /// Returns the keys whose verification failed (their status becomes
    /// [`SetButInvalid`](CredentialStatus::SetButInvalid)); skipped keys
    /// are not reported either way. With `options.throw_on_error`, the
    /// first failure is re-raised immediately and the document is left
    /// untouched — that property is what lets the import pipeline roll
    /// back by reloading. A completed pass writes the updated statuses
    /// through to the document.
    pub async fn verify_creds(
        &self,
        options: VerifyOptions,
    ) -> Result<Vec<String>, CredentialError> {
        let records = self.store.load().await?;

        let targets: Vec<String> = match options.keys {
            Some(keys) => keys,
            None => records.keys().cloned().collect(),
        };

        let mut failed = Vec::new();

        for key in targets {
            let record = records.get(&key).ok_or_else(|| CredentialError::NotStored {
                key: key.clone(),
            })?;

            if record.status == CredentialStatus::NotSet {
                continue;
            }
            if record.status == CredentialStatus::SetAndVerified && !options.re_verify {
                continue;
            }

            // Defensive: the store's own validation makes a miss here
            // unlikely, but documents can outlive their plugins.
            let spec = self.store.registry().get_required(&key, |key| {
                format!(
                    "Unknown credential '{}' found in store while attempting to verify credentials.",
                    key
                )
            })?;

            match spec.capabilities.verify.verify(&record.files).await {
                Ok(()) => {
                    self.store
                        .set_status(&key, CredentialStatus::SetAndVerified)
                        .await?;
                    tracing::debug!(key = %key, "credential verified");
                }
                Err(source) => {
                    self.store
                        .set_status(&key, CredentialStatus::SetButInvalid)
                        .await?;
                    tracing::warn!(key = %key, error = %source, "credential failed verification");

                    if options.throw_on_error {
                        return Err(CredentialError::Verification { key, source });
                    }
                    failed.push(key);
                }
            }
        }

        self.store.persist().await?;
        Ok(failed)
    }
}

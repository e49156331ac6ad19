//! Credential record persistence.
//!
//! This module provides disk-backed storage for credential records using a
//! YAML document, fronted by a shared process-wide cache.
//!
//! # Storage Location
//!
//! Records are stored at `<config dir>/credledger/credentials/db.yaml`
//! (e.g. `~/.config/credledger/credentials/db.yaml` on Linux), overridable
//! via the `CREDLEDGER_DB_PATH` environment variable.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use credledger_core::{CredentialRegistry, CredentialStore, DocumentCache};
//!
//! let registry = Arc::new(CredentialRegistry::new());
//! let cache = Arc::new(DocumentCache::new());
//! let store = CredentialStore::from_env(cache, registry)?;
//! let details = store.list().await?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CredentialError;
use crate::model::{CredentialDetail, CredentialRecord, CredentialStatus, RecordSet};
use crate::registry::CredentialRegistry;

/// Environment variable naming an absolute override path for the document.
pub const DB_PATH_ENV: &str = "CREDLEDGER_DB_PATH";

/// Well-known cache key under which the loaded record set is shared.
pub const RECORDS_CACHE_KEY: &str = "credledger/records";

/// Relative path segment for the document under the config directory.
const CREDS_PATH_STEM: &str = "credentials";

const DB_FILE_NAME: &str = "db.yaml";

/// Disk-backed credential record store.
///
/// Loads and persists the record set to a YAML document, keeping the shared
/// [`DocumentCache`](crate::cache::DocumentCache) in sync so repeated loads
/// within a process are consistent. Every successful mutating operation on
/// the engine writes through to disk.
///
/// Cloning a store is cheap; clones share the cache and registry.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    /// Path to the YAML document.
    path: PathBuf,

    /// Shared record-set cache.
    cache: Arc<crate::cache::DocumentCache>,

    /// Shared spec registry, used to validate and enrich records.
    registry: Arc<CredentialRegistry>,
}

impl CredentialStore {
    /// Create a store backed by a specific document path.
    pub fn new(
        path: impl Into<PathBuf>,
        cache: Arc<crate::cache::DocumentCache>,
        registry: Arc<CredentialRegistry>,
    ) -> Self {
        Self {
            path: path.into(),
            cache,
            registry,
        }
    }

    /// Create a store at the default location, honoring `CREDLEDGER_DB_PATH`.
    pub fn from_env(
        cache: Arc<crate::cache::DocumentCache>,
        registry: Arc<CredentialRegistry>,
    ) -> Result<Self, CredentialError> {
        let path = match std::env::var_os(DB_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_path()?,
        };
        Ok(Self::new(path, cache, registry))
    }

    /// Get the default document path under the platform config directory.
    pub fn default_path() -> Result<PathBuf, CredentialError> {
        let dirs = directories::ProjectDirs::from("dev", "credledger", "credledger")
            .ok_or(CredentialError::ConfigDirUnavailable)?;

        Ok(dirs.config_dir().join(CREDS_PATH_STEM).join(DB_FILE_NAME))
    }

    /// Get the document path for this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the registry this store validates records against.
    pub fn registry(&self) -> &Arc<CredentialRegistry> {
        &self.registry
    }

    /// Load the record set.
    ///
    /// Returns the cached set if the shared cache already holds one;
    /// otherwise reads the document, treating a missing file as an empty
    /// store, and populates the cache. Any other read or parse failure
    /// propagates.
    pub async fn load(&self) -> Result<RecordSet, CredentialError> {
        if let Some(records) = self.cache.get(RECORDS_CACHE_KEY)? {
            return Ok(records);
        }
        self.reload().await
    }

    /// Re-read the record set from disk, bypassing the cache.
    ///
    /// This is the rollback primitive: after a failed import the in-memory
    /// state is replaced wholesale with the last persisted document.
    pub async fn reload(&self) -> Result<RecordSet, CredentialError> {
        let records = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_yaml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no credential document, starting empty");
                RecordSet::new()
            }
            Err(e) => return Err(e.into()),
        };

        self.cache.put(RECORDS_CACHE_KEY, records.clone())?;
        Ok(records)
    }

    /// Serialize the current record set to the document path.
    ///
    /// Full overwrite; parent directories are created as needed. The record
    /// type carries no spec display fields, so nothing needs stripping on
    /// the way out.
    pub async fn persist(&self) -> Result<(), CredentialError> {
        let records = self.load().await?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_yaml::to_string(&records)?;
        tokio::fs::write(&self.path, contents).await?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "persisted credential document");

        Ok(())
    }

    /// Get the merged spec + record view for a credential.
    ///
    /// Fails with [`CredentialError::UnknownCredential`] if `key` names no
    /// registered spec, and [`CredentialError::NotStored`] (with an import
    /// hint) if the credential has not been imported. Capability values
    /// never appear in the result.
    pub async fn detail(&self, key: &str) -> Result<CredentialDetail, CredentialError> {
        let spec = self.registry.get_required(key, |key| {
            format!(
                "'{}' is not a valid credential. Perhaps there is a missing plugin?",
                key
            )
        })?;

        let records = self.load().await?;
        let record = records
            .get(key)
            .ok_or_else(|| CredentialError::NotStored {
                key: key.to_string(),
            })?;

        Ok(Self::merge(key, &spec, record))
    }

    /// Get the detail view for every stored credential.
    pub async fn list(&self) -> Result<Vec<CredentialDetail>, CredentialError> {
        let records = self.load().await?;

        let mut details = Vec::with_capacity(records.len());
        for key in records.keys() {
            details.push(self.detail(key).await?);
        }
        Ok(details)
    }

    /// Merge a spec's display fields with a record's storage fields.
    ///
    /// Status defaults to [`CredentialStatus::NotSet`] only in the sense
    /// that the record's status always overrides it; a record present in
    /// the store always carries its own status.
    fn merge(
        key: &str,
        spec: &crate::registry::CredentialSpec,
        record: &CredentialRecord,
    ) -> CredentialDetail {
        CredentialDetail {
            key: key.to_string(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            kind: spec.kind.clone(),
            status: record.status,
            files: record.files.clone(),
        }
    }

    /// Insert or replace a record in the in-memory set.
    ///
    /// Callers are responsible for the subsequent write-through.
    pub(crate) async fn insert_record(
        &self,
        key: &str,
        record: CredentialRecord,
    ) -> Result<(), CredentialError> {
        let mut records = self.load().await?;
        records.insert(key.to_string(), record);
        self.cache.put(RECORDS_CACHE_KEY, records)
    }

    /// Update the status of an existing record in the in-memory set.
    pub(crate) async fn set_status(
        &self,
        key: &str,
        status: CredentialStatus,
    ) -> Result<(), CredentialError> {
        let mut records = self.load().await?;
        let record = records
            .get_mut(key)
            .ok_or_else(|| CredentialError::NotStored {
                key: key.to_string(),
            })?;
        record.status = status;
        self.cache.put(RECORDS_CACHE_KEY, records)
    }
}

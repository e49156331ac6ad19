//! Credential import.
//!
//! The [`ImportPipeline`] materializes credential files, creates or
//! replaces a record, optionally runs verification, and persists the
//! document atomically — a failed verification rolls the store back to the
//! last persisted state.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::CredentialError;
use crate::model::{CredentialKind, CredentialRecord};
use crate::store::CredentialStore;
use crate::verify::{VerificationEngine, VerifyOptions};

/// Options for an import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Copy the credential files into this directory. When omitted the
    /// source files are referenced in place.
    pub dest_path: Option<PathBuf>,

    /// Replace an existing record. Exactly one of create/replace is legal
    /// per call: importing an existing key without `replace`, or a missing
    /// key with it, is a conflict.
    pub replace: bool,

    /// Skip the verification pass that normally follows import.
    pub no_verify: bool,
}

/// Imports credential data into the store.
///
/// Import is all-or-nothing when verification is requested: either the
/// record is both written and verified, or the store is rolled back to the
/// last persisted document and the verification error re-raised.
#[derive(Debug, Clone)]
pub struct ImportPipeline {
    store: CredentialStore,
    engine: VerificationEngine,
}

impl ImportPipeline {
    /// Create a pipeline over the given store and verification engine.
    pub fn new(store: CredentialStore, engine: VerificationEngine) -> Self {
        Self { store, engine }
    }

    /// Import the credential at `src_path` under the registered key `key`.
    ///
    /// For SSH key pairs the public key is expected at the sibling path
    /// `src_path` + `.pub`. With a `dest_path` the files are copied into it
    /// (created recursively; copies are exclusive-create unless
    /// `options.replace`); without one the source paths are referenced
    /// directly. The new record starts as
    /// [`SetButUntested`](crate::model::CredentialStatus::SetButUntested)
    /// and, unless `options.no_verify`, is immediately verified.
    pub async fn import(
        &self,
        key: &str,
        src_path: &Path,
        options: ImportOptions,
    ) -> Result<(), CredentialError> {
        let spec = self.store.registry().get_required(key, |key| {
            format!("Cannot import unknown credential type '{}'.", key)
        })?;

        let records = self.store.load().await?;
        let exists = records.contains_key(key);
        if exists && !options.replace {
            return Err(CredentialError::Conflict {
                message: format!(
                    "Credential '{}' already exists; set 'replace' to true to update the entry.",
                    key
                ),
            });
        }
        if !exists && options.replace {
            return Err(CredentialError::Conflict {
                message: format!(
                    "Credential '{}' does not exist; import without 'replace' to create it.",
                    key
                ),
            });
        }

        if let CredentialKind::Other(kind) = &spec.kind {
            return Err(CredentialError::UnsupportedKind { kind: kind.clone() });
        }

        let files = self
            .materialize(key, &spec.kind, src_path, &options)
            .await?;

        self.store
            .insert_record(key, CredentialRecord::new(files))
            .await?;

        if options.no_verify {
            self.store.persist().await?;
        } else {
            let verify = VerifyOptions {
                keys: Some(vec![key.to_string()]),
                re_verify: false,
                throw_on_error: true,
            };
            // A completed pass persists the document; the failure path
            // returns before any write, so reloading discards the import.
            if let Err(e) = self.engine.verify_creds(verify).await {
                tracing::warn!(key = %key, "import verification failed, rolling back");
                self.store.reload().await?;
                return Err(e);
            }
        }

        tracing::info!(key = %key, "credential imported");
        Ok(())
    }

    /// Produce the record's file list, copying into `dest_path` when given.
    ///
    /// A `dest_path` equal to the source file's parent directory is treated
    /// as a reference-in-place import rather than a self-copy.
    async fn materialize(
        &self,
        key: &str,
        kind: &CredentialKind,
        src_path: &Path,
        options: &ImportOptions,
    ) -> Result<Vec<PathBuf>, CredentialError> {
        let dest = options
            .dest_path
            .as_deref()
            .filter(|dest| Some(*dest) != src_path.parent());

        let mut files = Vec::new();

        match dest {
            Some(dest) => {
                tokio::fs::create_dir_all(dest).await?;
                match kind {
                    CredentialKind::SshKeyPair => {
                        let priv_key = dest.join(key);
                        let pub_key = dest.join(format!("{}.pub", key));
                        copy_file(src_path, &priv_key, options.replace).await?;
                        copy_file(&pub_sibling(src_path), &pub_key, options.replace).await?;
                        files.push(priv_key);
                        files.push(pub_key);
                    }
                    CredentialKind::AuthToken => {
                        let token = dest.join(key);
                        copy_file(src_path, &token, options.replace).await?;
                        files.push(token);
                    }
                    CredentialKind::Other(_) => unreachable!("rejected before materialization"),
                }
            }
            None => {
                files.push(src_path.to_path_buf());
                if *kind == CredentialKind::SshKeyPair {
                    files.push(pub_sibling(src_path));
                }
            }
        }

        Ok(files)
    }
}

/// The public-key sibling of a private key path: `src_path` + `.pub`.
fn pub_sibling(src_path: &Path) -> PathBuf {
    let mut path = src_path.as_os_str().to_os_string();
    path.push(".pub");
    PathBuf::from(path)
}

/// Copy `src` to `dest`, exclusive-create unless `replace` permits
/// overwriting.
async fn copy_file(src: &Path, dest: &Path, replace: bool) -> Result<(), CredentialError> {
    let contents = tokio::fs::read(src).await?;

    let mut open = tokio::fs::OpenOptions::new();
    open.write(true);
    if replace {
        open.create(true).truncate(true);
    } else {
        open.create_new(true);
    }

    let mut file = open.open(dest).await?;
    file.write_all(&contents).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DocumentCache;
    use crate::error::CapabilityError;
    use crate::model::CredentialStatus;
    use crate::registry::{Capabilities, CredentialRegistry, CredentialSpec, VerifyCredential};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct AlwaysOk;

    #[async_trait]
    impl VerifyCredential for AlwaysOk {
        async fn verify(&self, _files: &[PathBuf]) -> Result<(), CapabilityError> {
            Ok(())
        }
    }

    fn spec(key: &str, kind: CredentialKind) -> CredentialSpec {
        CredentialSpec {
            key: key.to_string(),
            name: format!("{} credential", key),
            description: "test".to_string(),
            kind,
            capabilities: Capabilities::verify_only(Arc::new(AlwaysOk)),
        }
    }

    fn pipeline(registry: Arc<CredentialRegistry>) -> (ImportPipeline, CredentialStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(
            temp_dir.path().join("db.yaml"),
            Arc::new(DocumentCache::new()),
            registry,
        );
        let engine = VerificationEngine::new(store.clone());
        (ImportPipeline::new(store.clone(), engine), store, temp_dir)
    }

    async fn write_token(dir: &Path) -> PathBuf {
        let path = dir.join("api-token");
        tokio::fs::write(&path, "abc123").await.unwrap();
        path
    }

    async fn write_key_pair(dir: &Path) -> PathBuf {
        let path = dir.join("id_ed25519");
        tokio::fs::write(&path, "private").await.unwrap();
        tokio::fs::write(pub_sibling(&path), "public").await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_unknown_type_rejected() {
        let (pipeline, _store, temp) = pipeline(Arc::new(CredentialRegistry::new()));
        let src = write_token(temp.path()).await;

        let err = pipeline
            .import("nope", &src, ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::UnknownCredential { .. }));
        assert!(err.to_string().contains("Cannot import"));
    }

    #[tokio::test]
    async fn test_unsupported_kind_rejected() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("weird", CredentialKind::Other("pgp".to_string())))
            .unwrap();
        let (pipeline, _store, temp) = pipeline(registry);
        let src = write_token(temp.path()).await;

        let err = pipeline
            .import("weird", &src, ImportOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::UnsupportedKind { .. }));
    }

    #[tokio::test]
    async fn test_token_referenced_in_place() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubAPI", CredentialKind::AuthToken))
            .unwrap();
        let (pipeline, store, temp) = pipeline(registry);
        let src = write_token(temp.path()).await;

        pipeline
            .import(
                "gitHubAPI",
                &src,
                ImportOptions {
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = store.detail("gitHubAPI").await.unwrap();
        assert_eq!(detail.status, CredentialStatus::SetButUntested);
        assert_eq!(detail.files, vec![src]);
    }

    #[tokio::test]
    async fn test_ssh_pair_referenced_in_place() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubSSH", CredentialKind::SshKeyPair))
            .unwrap();
        let (pipeline, store, temp) = pipeline(registry);
        let src = write_key_pair(temp.path()).await;

        pipeline
            .import(
                "gitHubSSH",
                &src,
                ImportOptions {
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = store.detail("gitHubSSH").await.unwrap();
        assert_eq!(detail.files, vec![src.clone(), pub_sibling(&src)]);
    }

    #[tokio::test]
    async fn test_ssh_pair_copied_to_dest() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubSSH", CredentialKind::SshKeyPair))
            .unwrap();
        let (pipeline, store, temp) = pipeline(registry);
        let src = write_key_pair(temp.path()).await;
        let dest = temp.path().join("central");

        pipeline
            .import(
                "gitHubSSH",
                &src,
                ImportOptions {
                    dest_path: Some(dest.clone()),
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = store.detail("gitHubSSH").await.unwrap();
        assert_eq!(
            detail.files,
            vec![dest.join("gitHubSSH"), dest.join("gitHubSSH.pub")]
        );
        assert_eq!(
            tokio::fs::read_to_string(dest.join("gitHubSSH")).await.unwrap(),
            "private"
        );
        assert_eq!(
            tokio::fs::read_to_string(dest.join("gitHubSSH.pub")).await.unwrap(),
            "public"
        );
    }

    #[tokio::test]
    async fn test_dest_equal_to_source_dir_references_in_place() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubAPI", CredentialKind::AuthToken))
            .unwrap();
        let (pipeline, store, temp) = pipeline(registry);
        let src = write_token(temp.path()).await;

        pipeline
            .import(
                "gitHubAPI",
                &src,
                ImportOptions {
                    dest_path: Some(temp.path().to_path_buf()),
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = store.detail("gitHubAPI").await.unwrap();
        assert_eq!(detail.files, vec![src]);
    }

    #[tokio::test]
    async fn test_copy_is_exclusive_without_replace() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubAPI", CredentialKind::AuthToken))
            .unwrap();
        let (pipeline, _store, temp) = pipeline(registry);
        let src = write_token(temp.path()).await;

        let dest = temp.path().join("central");
        tokio::fs::create_dir_all(&dest).await.unwrap();
        tokio::fs::write(dest.join("gitHubAPI"), "occupied")
            .await
            .unwrap();

        let err = pipeline
            .import(
                "gitHubAPI",
                &src,
                ImportOptions {
                    dest_path: Some(dest.clone()),
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::Io(_)));
        assert_eq!(
            tokio::fs::read_to_string(dest.join("gitHubAPI")).await.unwrap(),
            "occupied"
        );
    }

    #[tokio::test]
    async fn test_existing_record_without_replace_conflicts() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubAPI", CredentialKind::AuthToken))
            .unwrap();
        let (pipeline, store, temp) = pipeline(registry);
        let src = write_token(temp.path()).await;

        pipeline
            .import(
                "gitHubAPI",
                &src,
                ImportOptions {
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let other = temp.path().join("other-token");
        tokio::fs::write(&other, "xyz789").await.unwrap();

        let err = pipeline
            .import(
                "gitHubAPI",
                &other,
                ImportOptions {
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::Conflict { .. }));
        assert!(err.to_string().contains("already exists"));

        // The original record is untouched.
        let detail = store.detail("gitHubAPI").await.unwrap();
        assert_eq!(detail.files[0], src);
    }

    #[tokio::test]
    async fn test_replace_missing_record_conflicts() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubAPI", CredentialKind::AuthToken))
            .unwrap();
        let (pipeline, _store, temp) = pipeline(registry);
        let src = write_token(temp.path()).await;

        let err = pipeline
            .import(
                "gitHubAPI",
                &src,
                ImportOptions {
                    replace: true,
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CredentialError::Conflict { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_replace_resets_files_and_status() {
        let registry = Arc::new(CredentialRegistry::new());
        registry
            .register(spec("gitHubAPI", CredentialKind::AuthToken))
            .unwrap();
        let (pipeline, store, temp) = pipeline(registry);

        let src = write_token(temp.path()).await;
        pipeline
            .import("gitHubAPI", &src, ImportOptions::default())
            .await
            .unwrap();
        assert_eq!(
            store.detail("gitHubAPI").await.unwrap().status,
            CredentialStatus::SetAndVerified
        );

        let other = temp.path().join("other-token");
        tokio::fs::write(&other, "xyz789").await.unwrap();
        pipeline
            .import(
                "gitHubAPI",
                &other,
                ImportOptions {
                    replace: true,
                    no_verify: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let detail = store.detail("gitHubAPI").await.unwrap();
        assert_eq!(detail.files, vec![other]);
        assert_eq!(detail.status, CredentialStatus::SetButUntested);
    }
}

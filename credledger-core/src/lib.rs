//! # credledger Core
//!
//! Core library for the credledger credential registry: tracks which named
//! credentials (SSH key pairs, API tokens) a host has configured, where
//! their backing files live, and whether they have been verified against
//! the service they authenticate to.
//!
//! This crate provides:
//! - A process-wide registry of credential specs supplied by plugins
//! - A disk-backed record store with a shared in-process cache
//! - An import pipeline with all-or-nothing verification and rollback
//! - A verification engine and token resolver driving plugin capabilities
//!
//! Verification and token extraction themselves are plugin concerns: each
//! registered spec carries a [`VerifyCredential`] capability and,
//! optionally, a [`RetrieveToken`] capability. The outer command layer maps
//! the [`CredentialError`] taxonomy to user-facing messages.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use credledger_core::{
//!     CredentialRegistry, CredentialStore, DocumentCache, ImportOptions,
//!     ImportPipeline, VerificationEngine,
//! };
//!
//! let registry = Arc::new(CredentialRegistry::new());
//! registry.register(github_ssh_spec())?;
//!
//! let cache = Arc::new(DocumentCache::new());
//! let store = CredentialStore::from_env(cache, registry)?;
//! let engine = VerificationEngine::new(store.clone());
//! let importer = ImportPipeline::new(store.clone(), engine);
//!
//! importer
//!     .import("gitHubSSH", "/home/user/.ssh/id_ed25519".as_ref(), ImportOptions::default())
//!     .await?;
//! let detail = store.detail("gitHubSSH").await?;
//! ```

pub mod cache;
pub mod error;
pub mod import;
pub mod model;
pub mod registry;
pub mod store;
pub mod token;
pub mod verify;

// Re-export commonly used types at crate root
pub use model::{
    CredentialDetail,
    CredentialKind,
    CredentialRecord,
    CredentialStatus,
    RecordSet,
};

pub use error::{
    CapabilityError,
    CredentialError,
};

pub use registry::{
    Capabilities,
    CredentialRegistry,
    CredentialSpec,
    RetrieveToken,
    SupportedCredential,
    VerifyCredential,
};

pub use cache::DocumentCache;

pub use store::{
    CredentialStore,
    DB_PATH_ENV,
    RECORDS_CACHE_KEY,
};

pub use import::{
    ImportOptions,
    ImportPipeline,
};

pub use verify::{
    VerificationEngine,
    VerifyOptions,
};

pub use token::{
    Secret,
    TokenResolver,
};

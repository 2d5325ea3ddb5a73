#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Blob storage for saved comparisons.
//!
//! A saved comparison (a "revision") is a folder of the PDFs that were
//! compared. The store is organised as a folder hierarchy over a flat key
//! space:
//!
//! - A folder id is its key prefix, ending in `/` (`RPT_Revisiones/march/`).
//! - A folder exists when its marker object `<prefix>.folder` exists. The
//!   marker's timestamp is the folder's creation time.
//! - A file id is its full key (`RPT_Revisiones/march/rpt.pdf`).
//!
//! Two backends implement [`BlobStore`]: [`r2::R2BlobStore`] (Cloudflare R2
//! through the S3 API) and [`memory::MemoryBlobStore`]. The store is
//! optional; [`ConfiguredStore::from_env_or_memory`] falls back to memory
//! when R2 credentials are missing.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `CLOUDFLARE_ACCOUNT_ID` | Yes | Cloudflare account ID (builds the R2 endpoint) |
//! | `R2_ACCESS_KEY_ID` | Yes | S3-compatible access key for R2 |
//! | `R2_SECRET_ACCESS_KEY` | Yes | S3-compatible secret key for R2 |
//! | `ROSTER_DIFF_BUCKET` | No | Bucket name, defaults to `roster-diff-revisions` |

pub mod memory;
pub mod r2;
pub mod revisions;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::memory::MemoryBlobStore;
use crate::r2::R2BlobStore;

/// Name of the marker object that makes a prefix a folder.
pub const FOLDER_MARKER: &str = ".folder";

/// MIME type of roster documents.
pub const PDF_MIME: &str = "application/pdf";

/// Errors that can occur during blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// S3 `GetObject` failed.
    #[error("Failed to download s3://{bucket}/{key}: {source}")]
    Download {
        bucket: String,
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `PutObject` failed.
    #[error("Failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `DeleteObject` failed.
    #[error("Failed to delete s3://{bucket}/{key}: {source}")]
    Delete {
        bucket: String,
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `ListObjectsV2` failed.
    #[error("Failed to list s3://{bucket}/{prefix}: {source}")]
    List {
        bucket: String,
        prefix: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The requested object does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Names may not contain `/` or be empty.
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// A stored revision holds too few documents to compare.
    #[error("Revision '{name}' has {found} document(s), at least 2 are needed")]
    InsufficientFiles { name: String, found: usize },
}

/// A folder listed by [`BlobStore::list_folders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
    pub created_time: DateTime<Utc>,
}

/// A file listed by [`BlobStore::list_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
}

/// Folder/file storage keyed by a name hierarchy.
pub trait BlobStore: Send + Sync {
    /// Returns the id of folder `name` under `parent` (the root when
    /// `None`), creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or `name` is invalid.
    fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Lists the direct subfolders of `parent` (the root when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn list_folders(
        &self,
        parent: Option<&str>,
    ) -> impl Future<Output = Result<Vec<FolderEntry>, StoreError>> + Send;

    /// Lists the files directly inside `folder`, optionally only those of
    /// MIME type `mime`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn list_files(
        &self,
        folder: &str,
        mime: Option<&str>,
    ) -> impl Future<Output = Result<Vec<FileEntry>, StoreError>> + Send;

    /// Stores `bytes` as file `name` inside `folder` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or `name` is invalid.
    fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        folder: &str,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Fetches the contents of a file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids, or a backend error.
    fn download(&self, file_id: &str) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;

    /// Deletes a folder and everything inside it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn delete(&self, folder_id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Guesses a MIME type from a file name's extension.
#[must_use]
pub fn mime_for_name(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.contains('/') || name == FOLDER_MARKER {
        return Err(StoreError::InvalidName(name.to_owned()));
    }
    Ok(())
}

/// Folder id (key prefix) for `name` under `parent`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidName`] for empty names or names containing
/// `/`.
pub fn folder_id(name: &str, parent: Option<&str>) -> Result<String, StoreError> {
    validate_name(name)?;
    Ok(format!("{}{name}/", parent.unwrap_or_default()))
}

/// File id (key) for `name` inside `folder`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidName`] for empty names or names containing
/// `/`.
pub fn file_id(name: &str, folder: &str) -> Result<String, StoreError> {
    validate_name(name)?;
    Ok(format!("{folder}{name}"))
}

/// Key of the marker object of a folder.
#[must_use]
pub fn marker_key(folder_id: &str) -> String {
    format!("{folder_id}{FOLDER_MARKER}")
}

/// If `key` is the marker of a direct subfolder of `parent`, returns the
/// subfolder's name.
#[must_use]
pub fn child_folder_name<'a>(parent: &str, key: &'a str) -> Option<&'a str> {
    let rest = key.strip_prefix(parent)?;
    let name = rest.strip_suffix(FOLDER_MARKER)?.strip_suffix('/')?;
    (!name.is_empty() && !name.contains('/')).then_some(name)
}

/// If `key` is a file directly inside `folder`, returns its name.
#[must_use]
pub fn direct_file_name<'a>(folder: &str, key: &'a str) -> Option<&'a str> {
    let name = key.strip_prefix(folder)?;
    (!name.is_empty() && !name.contains('/') && name != FOLDER_MARKER).then_some(name)
}

/// The store selected at startup.
pub enum ConfiguredStore {
    R2(R2BlobStore),
    Memory(MemoryBlobStore),
}

impl ConfiguredStore {
    /// Uses R2 when its environment variables are set, otherwise an empty
    /// in-memory store that lives as long as the process.
    #[must_use]
    pub fn from_env_or_memory() -> Self {
        match R2BlobStore::from_env() {
            Ok(store) => {
                log::info!("Using R2 bucket {}", store.bucket());
                Self::R2(store)
            }
            Err(e) => {
                log::warn!("Blob store unavailable ({e}), revisions will not persist");
                Self::Memory(MemoryBlobStore::new())
            }
        }
    }

    /// Whether revisions survive the process.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::R2(_))
    }
}

impl BlobStore for ConfiguredStore {
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, StoreError> {
        match self {
            Self::R2(store) => store.create_folder(name, parent).await,
            Self::Memory(store) => store.create_folder(name, parent).await,
        }
    }

    async fn list_folders(&self, parent: Option<&str>) -> Result<Vec<FolderEntry>, StoreError> {
        match self {
            Self::R2(store) => store.list_folders(parent).await,
            Self::Memory(store) => store.list_folders(parent).await,
        }
    }

    async fn list_files(
        &self,
        folder: &str,
        mime: Option<&str>,
    ) -> Result<Vec<FileEntry>, StoreError> {
        match self {
            Self::R2(store) => store.list_files(folder, mime).await,
            Self::Memory(store) => store.list_files(folder, mime).await,
        }
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>, folder: &str) -> Result<String, StoreError> {
        match self {
            Self::R2(store) => store.upload(name, bytes, folder).await,
            Self::Memory(store) => store.upload(name, bytes, folder).await,
        }
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        match self {
            Self::R2(store) => store.download(file_id).await,
            Self::Memory(store) => store.download(file_id).await,
        }
    }

    async fn delete(&self, folder_id: &str) -> Result<(), StoreError> {
        match self {
            Self::R2(store) => store.delete(folder_id).await,
            Self::Memory(store) => store.delete(folder_id).await,
        }
    }
}

//! Saved comparisons ("revisions").
//!
//! Each revision is a folder under [`ROOT_FOLDER`] holding the documents
//! (PDF or plain text) that were compared. Loading a revision downloads them again so the
//! comparison can be rebuilt.

use roster_diff_snapshot::progress::ProgressCallback;
use roster_diff_snapshot::upload::InputDocument;

use crate::{BlobStore, FolderEntry, StoreError};

/// Top-level folder that holds every revision.
pub const ROOT_FOLDER: &str = "RPT_Revisiones";

async fn find_root<S: BlobStore>(store: &S) -> Result<Option<FolderEntry>, StoreError> {
    Ok(store
        .list_folders(None)
        .await?
        .into_iter()
        .find(|folder| folder.name == ROOT_FOLDER))
}

async fn find_revision<S: BlobStore>(store: &S, name: &str) -> Result<FolderEntry, StoreError> {
    let not_found = || StoreError::NotFound(format!("{ROOT_FOLDER}/{name}"));
    let root = find_root(store).await?.ok_or_else(not_found)?;
    store
        .list_folders(Some(&root.id))
        .await?
        .into_iter()
        .find(|folder| folder.name == name)
        .ok_or_else(not_found)
}

/// Uploads `documents` into revision `name`, creating the folders as
/// needed, and returns the revision's folder id. Saving under an existing
/// name adds to that revision. `progress` advances once per upload.
///
/// # Errors
///
/// Returns the first [`StoreError`] raised by the store.
pub async fn save_revision<S: BlobStore>(
    store: &S,
    name: &str,
    documents: &[InputDocument],
    progress: &dyn ProgressCallback,
) -> Result<String, StoreError> {
    let root = store.create_folder(ROOT_FOLDER, None).await?;
    let folder = store.create_folder(name, Some(&root)).await?;

    progress.begin(documents.len() as u64);
    for document in documents {
        progress.document(&document.name);
        store
            .upload(&document.name, document.bytes.clone(), &folder)
            .await?;
        progress.advance();
    }

    log::info!("Saved revision '{name}' with {} documents", documents.len());
    Ok(folder)
}

/// Lists revisions, newest first. Empty when nothing was ever saved.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be listed.
pub async fn list_revisions<S: BlobStore>(store: &S) -> Result<Vec<FolderEntry>, StoreError> {
    let Some(root) = find_root(store).await? else {
        return Ok(Vec::new());
    };
    let mut revisions = store.list_folders(Some(&root.id)).await?;
    revisions.sort_by(|a, b| b.created_time.cmp(&a.created_time));
    Ok(revisions)
}

/// Downloads every document of revision `name`, whatever its type.
/// `progress` advances once per download.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for unknown revisions and
/// [`StoreError::InsufficientFiles`] when fewer than two documents are
/// stored.
pub async fn load_revision<S: BlobStore>(
    store: &S,
    name: &str,
    progress: &dyn ProgressCallback,
) -> Result<Vec<InputDocument>, StoreError> {
    let folder = find_revision(store, name).await?;
    let files = store.list_files(&folder.id, None).await?;
    if files.len() < 2 {
        return Err(StoreError::InsufficientFiles {
            name: name.to_owned(),
            found: files.len(),
        });
    }

    progress.begin(files.len() as u64);
    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        progress.document(&file.name);
        let bytes = store.download(&file.id).await?;
        documents.push(InputDocument::new(file.name, bytes));
        progress.advance();
    }

    log::info!("Loaded revision '{name}' ({} documents)", documents.len());
    Ok(documents)
}

/// Deletes revision `name` and its documents.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for unknown revisions, or a backend
/// error.
pub async fn delete_revision<S: BlobStore>(store: &S, name: &str) -> Result<(), StoreError> {
    let folder = find_revision(store, name).await?;
    store.delete(&folder.id).await?;
    log::info!("Deleted revision '{name}'");
    Ok(())
}

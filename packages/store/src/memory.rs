//! In-memory [`BlobStore`] used when R2 is not configured, and in tests.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::{
    BlobStore, FileEntry, FolderEntry, StoreError, child_folder_name, direct_file_name, file_id,
    folder_id, marker_key, mime_for_name,
};

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: &'static str,
    created: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    last_created: Option<DateTime<Utc>>,
}

impl State {
    /// Current time, strictly after every timestamp handed out before.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created = match self.last_created {
            Some(last) if now <= last => last + TimeDelta::microseconds(1),
            _ => now,
        };
        self.last_created = Some(created);
        created
    }

    fn insert(&mut self, key: String, bytes: Vec<u8>, content_type: &'static str) {
        let created = self.tick();
        self.objects.insert(
            key,
            StoredObject {
                bytes,
                content_type,
                created,
            },
        );
    }
}

/// Keeps every object in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    state: Mutex<State>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, StoreError> {
        let id = folder_id(name, parent)?;
        let marker = marker_key(&id);
        let mut state = self.state.lock().await;
        if !state.objects.contains_key(&marker) {
            log::debug!("Creating folder {id}");
            state.insert(marker, Vec::new(), "application/octet-stream");
        }
        Ok(id)
    }

    async fn list_folders(&self, parent: Option<&str>) -> Result<Vec<FolderEntry>, StoreError> {
        let parent = parent.unwrap_or_default();
        let state = self.state.lock().await;
        Ok(state
            .objects
            .iter()
            .filter_map(|(key, object)| {
                child_folder_name(parent, key).map(|name| FolderEntry {
                    id: format!("{parent}{name}/"),
                    name: name.to_owned(),
                    created_time: object.created,
                })
            })
            .collect())
    }

    async fn list_files(
        &self,
        folder: &str,
        mime: Option<&str>,
    ) -> Result<Vec<FileEntry>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .objects
            .iter()
            .filter(|(_, object)| mime.is_none_or(|mime| object.content_type == mime))
            .filter_map(|(key, _)| {
                direct_file_name(folder, key).map(|name| FileEntry {
                    id: key.clone(),
                    name: name.to_owned(),
                })
            })
            .collect())
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>, folder: &str) -> Result<String, StoreError> {
        let id = file_id(name, folder)?;
        let mut state = self.state.lock().await;
        if !state.objects.contains_key(&marker_key(folder)) {
            return Err(StoreError::NotFound(folder.to_owned()));
        }
        state.insert(id.clone(), bytes, mime_for_name(name));
        Ok(id)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        let state = self.state.lock().await;
        state
            .objects
            .get(file_id)
            .map(|object| object.bytes.clone())
            .ok_or_else(|| StoreError::NotFound(file_id.to_owned()))
    }

    async fn delete(&self, folder_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let before = state.objects.len();
        state.objects.retain(|key, _| !key.starts_with(folder_id));
        log::debug!(
            "Deleted {} objects under {folder_id}",
            before - state.objects.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PDF_MIME;

    #[tokio::test]
    async fn create_folder_is_get_or_create() {
        let store = MemoryBlobStore::new();
        let first = store.create_folder("root", None).await.unwrap();
        let created = store.list_folders(None).await.unwrap()[0].created_time;

        let second = store.create_folder("root", None).await.unwrap();

        assert_eq!(first, second);
        let folders = store.list_folders(None).await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].created_time, created);
    }

    #[tokio::test]
    async fn folders_listed_per_parent() {
        let store = MemoryBlobStore::new();
        let root = store.create_folder("root", None).await.unwrap();
        store.create_folder("a", Some(&root)).await.unwrap();
        store.create_folder("b", Some(&root)).await.unwrap();

        let top: Vec<String> = store
            .list_folders(None)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        let children = store.list_folders(Some(&root)).await.unwrap();

        assert_eq!(top, vec!["root"]);
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].id, "root/a/");
        assert!(children[0].created_time < children[1].created_time);
    }

    #[tokio::test]
    async fn files_filtered_by_mime() {
        let store = MemoryBlobStore::new();
        let folder = store.create_folder("docs", None).await.unwrap();
        store.upload("a.pdf", b"%PDF-a".to_vec(), &folder).await.unwrap();
        store.upload("notes.txt", b"x".to_vec(), &folder).await.unwrap();

        let pdfs = store.list_files(&folder, Some(PDF_MIME)).await.unwrap();
        let all = store.list_files(&folder, None).await.unwrap();

        assert_eq!(pdfs, vec![FileEntry {
            id: "docs/a.pdf".to_owned(),
            name: "a.pdf".to_owned(),
        }]);
        assert_eq!(all.len(), 2);
        assert_eq!(store.download(&pdfs[0].id).await.unwrap(), b"%PDF-a");
    }

    #[tokio::test]
    async fn upload_requires_existing_folder() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.upload("a.pdf", vec![1], "missing/").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_folder_and_contents() {
        let store = MemoryBlobStore::new();
        let root = store.create_folder("root", None).await.unwrap();
        let a = store.create_folder("a", Some(&root)).await.unwrap();
        let b = store.create_folder("b", Some(&root)).await.unwrap();
        let file = store.upload("x.pdf", vec![1], &a).await.unwrap();
        store.upload("y.pdf", vec![2], &b).await.unwrap();

        store.delete(&a).await.unwrap();

        assert!(matches!(
            store.download(&file).await,
            Err(StoreError::NotFound(_))
        ));
        let remaining = store.list_folders(Some(&root)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "b");
        assert_eq!(store.list_files(&b, None).await.unwrap().len(), 1);
    }
}

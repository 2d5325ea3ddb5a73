//! Cloudflare R2 backend over the S3 API.

use aws_config::Region;
use aws_sdk_s3::config::{Credentials, StalledStreamProtectionConfig};
use chrono::{DateTime, Utc};

use crate::{
    BlobStore, FOLDER_MARKER, FileEntry, FolderEntry, StoreError, child_folder_name,
    direct_file_name, file_id, folder_id, marker_key, mime_for_name,
};

/// Bucket used when `ROSTER_DIFF_BUCKET` is not set.
pub const DEFAULT_BUCKET: &str = "roster-diff-revisions";

/// Listed object metadata.
struct ObjectMeta {
    key: String,
    last_modified: Option<DateTime<Utc>>,
}

/// Revision storage in an R2 bucket.
pub struct R2BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl R2BlobStore {
    /// Creates a new R2 store from environment variables.
    ///
    /// Reads `CLOUDFLARE_ACCOUNT_ID`, `R2_ACCESS_KEY_ID`, and
    /// `R2_SECRET_ACCESS_KEY` from the environment, and optionally
    /// `ROSTER_DIFF_BUCKET`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingEnv`] if any required variable is unset.
    pub fn from_env() -> Result<Self, StoreError> {
        let account_id = require_env("CLOUDFLARE_ACCOUNT_ID")?;
        let access_key = require_env("R2_ACCESS_KEY_ID")?;
        let secret_key = require_env("R2_SECRET_ACCESS_KEY")?;
        let bucket =
            std::env::var("ROSTER_DIFF_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string());

        let endpoint = format!("https://{account_id}.r2.cloudflarestorage.com");
        let creds = Credentials::new(&access_key, &secret_key, None, None, "r2-env");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(&endpoint)
            .region(Region::new("auto"))
            .credentials_provider(creds)
            .force_path_style(true)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket,
        })
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        #[allow(clippy::cast_precision_loss)] // display-only KB value
        let kb = bytes.len() as f64 / 1024.0;
        log::info!("Pushing s3://{}/{key} ({kb:.1} KB)", self.bucket);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StoreError::Upload {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(aws_sdk_s3::operation::head_object::HeadObjectError::is_not_found)
                {
                    return Ok(false);
                }
                Err(StoreError::Download {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    /// Lists every object under a prefix, following continuation tokens.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StoreError> {
        log::debug!("Listing s3://{}/{prefix}*", self.bucket);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(|e| StoreError::List {
                bucket: self.bucket.clone(),
                prefix: prefix.to_string(),
                source: Box::new(e),
            })?;

            for obj in output.contents() {
                if let Some(key) = obj.key() {
                    objects.push(ObjectMeta {
                        key: key.to_string(),
                        last_modified: obj
                            .last_modified()
                            .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
                    });
                }
            }

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        log::debug!("  found {} objects", objects.len());
        Ok(objects)
    }

    async fn delete_key(&self, key: &str) -> Result<(), StoreError> {
        log::info!("Deleting s3://{}/{key}", self.bucket);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::Delete {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        Ok(())
    }
}

impl BlobStore for R2BlobStore {
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, StoreError> {
        let id = folder_id(name, parent)?;
        let marker = marker_key(&id);
        if !self.exists(&marker).await? {
            self.put(&marker, Vec::new(), "application/octet-stream")
                .await?;
        }
        Ok(id)
    }

    async fn list_folders(&self, parent: Option<&str>) -> Result<Vec<FolderEntry>, StoreError> {
        let parent = parent.unwrap_or_default();
        let objects = self.list_objects(parent).await?;

        Ok(objects
            .iter()
            .filter_map(|object| {
                let name = child_folder_name(parent, &object.key)?;
                Some(FolderEntry {
                    id: format!("{parent}{name}/"),
                    name: name.to_owned(),
                    created_time: object.last_modified.unwrap_or(DateTime::UNIX_EPOCH),
                })
            })
            .collect())
    }

    async fn list_files(
        &self,
        folder: &str,
        mime: Option<&str>,
    ) -> Result<Vec<FileEntry>, StoreError> {
        let objects = self.list_objects(folder).await?;

        Ok(objects
            .iter()
            .filter_map(|object| {
                let name = direct_file_name(folder, &object.key)?;
                mime.is_none_or(|mime| mime_for_name(name) == mime)
                    .then(|| FileEntry {
                        id: object.key.clone(),
                        name: name.to_owned(),
                    })
            })
            .collect())
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>, folder: &str) -> Result<String, StoreError> {
        let id = file_id(name, folder)?;
        self.put(&id, bytes, mime_for_name(name)).await?;
        log::info!("  uploaded {id}");
        Ok(id)
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        log::info!("Pulling s3://{}/{file_id}", self.bucket);

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(file_id)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(aws_sdk_s3::operation::get_object::GetObjectError::is_no_such_key)
                {
                    return StoreError::NotFound(file_id.to_string());
                }
                StoreError::Download {
                    bucket: self.bucket.clone(),
                    key: file_id.to_string(),
                    source: Box::new(e),
                }
            })?;

        let bytes = output.body.collect().await.map_err(|e| StoreError::Download {
            bucket: self.bucket.clone(),
            key: file_id.to_string(),
            source: Box::new(e),
        })?;

        Ok(bytes.into_bytes().to_vec())
    }

    async fn delete(&self, folder_id: &str) -> Result<(), StoreError> {
        let objects = self.list_objects(folder_id).await?;
        // Marker last, so an interrupted delete still lists the folder.
        let (markers, contents): (Vec<&ObjectMeta>, Vec<&ObjectMeta>) = objects
            .iter()
            .partition(|object| object.key.ends_with(FOLDER_MARKER));

        for object in contents.into_iter().chain(markers) {
            self.delete_key(&object.key).await?;
        }
        Ok(())
    }
}

/// Reads a required environment variable.
fn require_env(name: &str) -> Result<String, StoreError> {
    std::env::var(name).map_err(|_| StoreError::MissingEnv {
        name: name.to_string(),
    })
}

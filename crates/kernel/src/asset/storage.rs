//! Asset storage backends.
//!
//! Provides the upload trait and implementations for storing images locally
//! or in S3.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::StoredAsset;

/// Object store used for offer pictures and avatars.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `data` inside `folder` and return where it now lives.
    async fn upload(&self, folder: &str, filename: &str, data: &[u8]) -> Result<StoredAsset>;

    /// Release every asset stored under `folder`.
    ///
    /// Releasing a folder that holds nothing is not an error.
    async fn delete_folder(&self, folder: &str) -> Result<()>;

    /// Get the storage scheme (e.g., "local", "s3").
    fn scheme(&self) -> &'static str;
}

/// Local filesystem storage.
pub struct LocalAssetStore {
    /// Base path for file storage.
    base_path: PathBuf,
    /// Base URL for public file access.
    base_url: String,
}

impl LocalAssetStore {
    /// Create a new local asset store.
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    /// Resolve a folder below the base path.
    ///
    /// Rejects paths containing `..` or absolute components to prevent
    /// directory traversal.
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        for component in Path::new(relative).components() {
            if !matches!(component, Component::Normal(_)) {
                anyhow::bail!("invalid component in asset path: {relative}");
            }
        }
        Ok(self.base_path.join(relative))
    }

    /// Get the public URL for an asset id.
    pub fn public_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), id)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn upload(&self, folder: &str, filename: &str, data: &[u8]) -> Result<StoredAsset> {
        let id = asset_id(folder, filename);
        let path = self.resolve(&id)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create asset directories")?;
        }

        let mut file = fs::File::create(&path)
            .await
            .context("failed to create asset file")?;
        file.write_all(data)
            .await
            .context("failed to write asset file")?;
        file.flush().await.context("failed to flush asset file")?;

        debug!(id = %id, path = ?path, size = data.len(), "asset written");

        Ok(StoredAsset {
            url: self.public_url(&id),
            id,
        })
    }

    async fn delete_folder(&self, folder: &str) -> Result<()> {
        let path = self.resolve(folder)?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_dir_all(&path)
                .await
                .context("failed to delete asset folder")?;
            debug!(folder = %folder, "asset folder deleted");
        } else {
            warn!(folder = %folder, "asset folder not found for deletion");
        }

        Ok(())
    }

    fn scheme(&self) -> &'static str {
        "local"
    }
}

impl std::fmt::Debug for LocalAssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAssetStore")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// S3-compatible object storage.
#[cfg(feature = "s3")]
pub struct S3AssetStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    /// Optional prefix for all keys.
    prefix: Option<String>,
    /// Base URL for public access (e.g., CloudFront distribution).
    base_url: String,
}

#[cfg(feature = "s3")]
impl S3AssetStore {
    /// Create a new S3 asset store.
    ///
    /// Uses the default AWS credential chain (env vars, config file, instance profile).
    pub async fn new(
        bucket: impl Into<String>,
        prefix: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let config = aws_config::load_from_env().await;
        let client = aws_sdk_s3::Client::new(&config);

        Ok(Self {
            client,
            bucket: bucket.into(),
            prefix,
            base_url: base_url.into(),
        })
    }

    /// Create with a custom endpoint (for S3-compatible services like MinIO).
    pub async fn with_endpoint(
        endpoint_url: &str,
        bucket: impl Into<String>,
        prefix: Option<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let config = aws_config::from_env()
            .endpoint_url(endpoint_url)
            .load()
            .await;
        let client = aws_sdk_s3::Client::new(&config);

        Ok(Self {
            client,
            bucket: bucket.into(),
            prefix,
            base_url: base_url.into(),
        })
    }

    fn key(&self, id: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), id),
            None => id.to_string(),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait]
impl AssetStore for S3AssetStore {
    async fn upload(&self, folder: &str, filename: &str, data: &[u8]) -> Result<StoredAsset> {
        let id = asset_id(folder, filename);
        let key = self.key(&id);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(aws_sdk_s3::primitives::ByteStream::from(data.to_vec()))
            .send()
            .await
            .context("failed to upload to S3")?;

        debug!(id = %id, key = %key, size = data.len(), "asset written to S3");

        Ok(StoredAsset {
            url: format!("{}/{}", self.base_url.trim_end_matches('/'), key),
            id,
        })
    }

    async fn delete_folder(&self, folder: &str) -> Result<()> {
        let prefix = format!("{}/", self.key(folder.trim_end_matches('/')));
        let mut continuation: Option<String> = None;
        let mut deleted = 0usize;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .context("failed to list S3 objects")?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                self.client
                    .delete_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .send()
                    .await
                    .context("failed to delete from S3")?;
                deleted += 1;
            }

            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        debug!(folder = %folder, deleted, "asset folder deleted from S3");
        Ok(())
    }

    fn scheme(&self) -> &'static str {
        "s3"
    }
}

#[cfg(feature = "s3")]
impl std::fmt::Debug for S3AssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3AssetStore")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Build the relative id of a new asset inside `folder`.
///
/// Every call yields a distinct id, so an upload never replaces an asset
/// already stored under the same filename.
fn asset_id(folder: &str, filename: &str) -> String {
    format!(
        "{}/{}_{}",
        folder.trim_matches('/'),
        uuid::Uuid::now_v7().simple(),
        sanitize_filename(filename)
    )
}

/// Sanitize a filename for safe storage.
pub(crate) fn sanitize_filename(filename: &str) -> String {
    // Get just the filename part (no path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let cleaned: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(200)
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

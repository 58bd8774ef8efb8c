//! Image asset handling.
//!
//! Offer pictures and user avatars live in an external object store. The
//! kernel only ever talks to it through [`AssetStore`]: upload bytes into a
//! folder, get back a [`StoredAsset`] descriptor, and release a folder when
//! the owning record goes away.

pub mod image;
pub mod storage;

pub use image::{ALLOWED_IMAGE_TYPES, ImageUpload, MAX_IMAGE_SIZE};
pub use storage::{AssetStore, LocalAssetStore};

#[cfg(feature = "s3")]
pub use storage::S3AssetStore;

use serde::{Deserialize, Serialize};

/// Descriptor returned by the asset store for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
    /// Public URL the asset is served from.
    pub url: String,
    /// Store-specific identifier (object key or relative path).
    pub id: String,
}

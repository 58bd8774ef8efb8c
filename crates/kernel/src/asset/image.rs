//! Uploaded image validation.

use crate::catalog::FieldViolation;

/// Maximum image size (10 MB).
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Image MIME types accepted for offer pictures and avatars.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// An image received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Check size and sniffed content type.
    ///
    /// The MIME type is detected from the magic bytes, never from the
    /// client-supplied filename or content type header.
    pub fn validate(&self, field: &'static str) -> Result<&'static str, FieldViolation> {
        if self.data.is_empty() {
            return Err(FieldViolation::new(field, "image is empty"));
        }

        if self.data.len() > MAX_IMAGE_SIZE {
            return Err(FieldViolation::new(
                field,
                format!(
                    "image too large: {} bytes (max {MAX_IMAGE_SIZE} bytes)",
                    self.data.len()
                ),
            ));
        }

        let mime = infer::get(&self.data)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");

        ALLOWED_IMAGE_TYPES
            .iter()
            .find(|allowed| **allowed == mime)
            .copied()
            .ok_or_else(|| FieldViolation::new(field, format!("image type not allowed: {mime}")))
    }
}

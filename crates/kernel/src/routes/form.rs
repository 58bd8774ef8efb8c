//! Multipart form reading shared by offer and account routes.

use std::collections::HashMap;

use axum::extract::Multipart;
use tracing::warn;

use crate::asset::ImageUpload;
use crate::error::{AppError, AppResult};

/// A multipart form split into text fields and image files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, ImageUpload>,
}

impl MultipartForm {
    /// Drain a multipart body.
    ///
    /// Parts carrying a filename are kept as files, everything else as text.
    /// Repeated names keep the first occurrence.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read multipart field");
                    return Err(AppError::BadRequest("malformed multipart body".to_string()));
                }
            };

            let name = field.name().unwrap_or_default().to_string();
            if name.is_empty() {
                continue;
            }

            match field.file_name().map(ToString::to_string) {
                Some(filename) => {
                    let data = field.bytes().await.map_err(|e| {
                        warn!(error = %e, field = %name, "failed to read upload data");
                        AppError::BadRequest("failed to read file data".to_string())
                    })?;
                    form.files
                        .entry(name)
                        .or_insert_with(|| ImageUpload::new(filename, data.to_vec()));
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        warn!(error = %e, field = %name, "failed to read form field");
                        AppError::BadRequest(format!("field {name} is not valid text"))
                    })?;
                    form.fields.entry(name).or_insert(text);
                }
            }
        }

        Ok(form)
    }

    /// A text field, with empty values treated as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }

    /// A text field exactly as sent.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Take an uploaded file out of the form.
    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        self.files.remove(name)
    }

    #[cfg(test)]
    pub(crate) fn with_fields(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }
}

//! Adapter for the hosted media service that stores article cover images.

use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use tracing::error;

/// Image payload accepted from the submission form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Error returned when the media host rejects or never receives an upload.
#[derive(Debug)]
pub struct UploadError {
    message: String,
}

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "image upload failed: {}", self.message)
    }
}

impl std::error::Error for UploadError {}

/// Anything able to store an image and hand back its public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError>;
}

/// Unsigned multipart uploads against a Cloudinary-style endpoint.
#[derive(Clone)]
pub struct CloudinaryHost {
    http: Client,
    endpoint: String,
    upload_preset: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

impl CloudinaryHost {
    pub fn new(endpoint: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            upload_preset: upload_preset.into(),
        }
    }

    fn build_form(&self, image: ImageUpload) -> Result<Form, UploadError> {
        let mut file_name = sanitize_filename::sanitize(&image.file_name);
        if file_name.is_empty() {
            file_name = "cover".to_string();
        }

        let part = Part::bytes(image.bytes)
            .file_name(file_name)
            .mime_str(&image.content_type)
            .map_err(|err| UploadError::new(format!("invalid content type: {err}")))?;

        Ok(Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone()))
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError> {
        let form = self.build_form(image)?;

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                error!(?err, "media host request failed");
                UploadError::new("media host unreachable")
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "media host rejected upload");
            return Err(UploadError::new(format!("media host returned {status}")));
        }

        let payload: UploadResponse = response.json().await.map_err(|err| {
            error!(?err, "failed to decode media host response");
            UploadError::new("unreadable media host response")
        })?;

        payload
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| UploadError::new("media host response has no secure_url"))
    }
}

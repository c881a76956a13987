//! Profile image upload collaborators
//!
//! An [`UploadService`] takes a local file and returns the public URL it is
//! served from. Registration uses it for the avatar and cover image.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A successfully stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
}

#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Result<UploadedFile>;
}

// ============================================================================
// Remote upload over HTTP
// ============================================================================

/// Response shape of image hosting APIs. `secure_url` wins when both are set.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

impl UploadResponse {
    fn into_url(self) -> Option<String> {
        self.secure_url
            .or(self.url)
            .filter(|url| !url.trim().is_empty())
    }
}

/// Uploads files as `multipart/form-data` to a remote endpoint
pub struct HttpUploadService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    upload_preset: Option<String>,
}

impl HttpUploadService {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        upload_preset: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            upload_preset,
        })
    }
}

#[async_trait]
impl UploadService for HttpUploadService {
    async fn upload(&self, local_path: &Path) -> Result<UploadedFile> {
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());

        log::debug!(
            "[upload] Uploading {} ({} bytes) to {}",
            file_name,
            bytes.len(),
            self.endpoint
        );

        let mut form = multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name(file_name));
        if let Some(preset) = &self.upload_preset {
            form = form.text("upload_preset", preset.clone());
        }

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            log::warn!("[upload] Upload rejected with {}: {}", status, text);
            return Err(Error::upload(format!("Upload failed with status {}", status)));
        }

        let body: UploadResponse = response.json().await?;
        let url = body
            .into_url()
            .ok_or_else(|| Error::upload("Upload response did not contain a URL"))?;

        Ok(UploadedFile { url })
    }
}

// ============================================================================
// Local directory
// ============================================================================

/// Copies files into a directory that is served under `public_base_url`
pub struct LocalUploadService {
    root: PathBuf,
    public_base_url: String,
}

impl LocalUploadService {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl UploadService for LocalUploadService {
    async fn upload(&self, local_path: &Path) -> Result<UploadedFile> {
        if !tokio::fs::try_exists(local_path).await? {
            return Err(Error::upload(format!(
                "Source file does not exist: {}",
                local_path.display()
            )));
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let file_name = match local_path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_lowercase()),
            None => Uuid::new_v4().to_string(),
        };
        tokio::fs::copy(local_path, self.root.join(&file_name)).await?;

        log::debug!("[upload] Stored {} as {}", local_path.display(), file_name);

        Ok(UploadedFile {
            url: format!("{}/{}", self.public_base_url.trim_end_matches('/'), file_name),
        })
    }
}

//! Cloudinary upload client: local file in, secure URL out

use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::services::media::MediaKind;

#[derive(Clone)]
pub struct CloudinaryClient {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    http: Client,
}

impl CloudinaryClient {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            http: Client::new(),
        }
    }

    /// Upload a local file, returning its delivery URL. Videos go through
    /// the `video` resource type so Cloudinary transcodes them.
    pub async fn upload(&self, path: &str, kind: MediaKind) -> Result<String, UploadError> {
        let data = tokio::fs::read(path).await.map_err(UploadError::Io)?;

        let resource_type = match kind {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        };
        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/{}/upload",
            self.cloud_name, resource_type
        );

        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&timestamp);

        let file_name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", Part::bytes(data).file_name(file_name));

        let resp = self.http.post(&url).multipart(form).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(UploadError::Api(format!("Status {}: {}", status, text)));
        }

        let uploaded: UploadResponse = serde_json::from_str(&text)
            .map_err(|e| UploadError::Api(format!("unexpected response: {} - body: {}", e, text)))?;
        Ok(uploaded.secure_url)
    }

    /// Signed uploads hash the sorted parameter string plus the API
    /// secret. Only `timestamp` participates here.
    fn sign(&self, timestamp: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("timestamp={}{}", timestamp, self.api_secret).as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug)]
pub enum UploadError {
    Http(reqwest::Error),
    Api(String),
    Io(std::io::Error),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::Http(e)
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::Http(e) => write!(f, "HTTP error: {}", e),
            UploadError::Api(s) => write!(f, "Cloudinary API error: {}", s),
            UploadError::Io(e) => write!(f, "file error: {}", e),
        }
    }
}

impl std::error::Error for UploadError {}

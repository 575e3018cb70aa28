use crate::domain::model::RemovalJob;
use crate::domain::ports::BackgroundRemover;
use crate::utils::error::{ClearcutError, Result};
use crate::utils::fs::{ensure_parent_dir, write_atomically};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// `/remove-background` 的回應格式
#[derive(Debug, Deserialize)]
struct RemovalResponse {
    // 錯誤回應可能只有 `error`
    #[serde(default)]
    success: bool,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// 透過 HTTP 後端去背：上傳原圖，再從 `/download/<filename>` 取回結果
#[derive(Debug, Clone)]
pub struct HttpRemover {
    base_url: Url,
    client: Client,
}

impl HttpRemover {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_client(endpoint, Client::new())
    }

    pub fn with_client(endpoint: &str, client: Client) -> Result<Self> {
        validate_url("remover.endpoint", endpoint)?;
        let base_url = Url::parse(endpoint).map_err(|e| ClearcutError::InvalidConfigValueError {
            field: "remover.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClearcutError::InvalidConfigValueError {
                field: "remover.endpoint".to_string(),
                value: self.base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn upload(&self, input: &Path) -> Result<String> {
        let data = tokio::fs::read(input)
            .await
            .map_err(|e| ClearcutError::io(input, e))?;
        let file_name = input
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.png")
            .to_string();
        let mime = image::ImageFormat::from_path(input)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");

        tracing::debug!("Uploading {} ({} bytes)", file_name, data.len());
        let part = Part::bytes(data).file_name(file_name).mime_str(mime)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint(&["remove-background"])?)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed: std::result::Result<RemovalResponse, serde_json::Error> =
            serde_json::from_str(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| format!("backend returned {}", status));
            return Err(ClearcutError::remover(message));
        }

        let response = parsed?;
        if !response.success {
            return Err(ClearcutError::remover(
                response
                    .error
                    .unwrap_or_else(|| "backend reported failure without a message".to_string()),
            ));
        }

        response
            .filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ClearcutError::remover("backend response is missing the filename"))
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.endpoint(&["download", filename])?)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl BackgroundRemover for HttpRemover {
    async fn remove_background(&self, job: &RemovalJob) -> Result<PathBuf> {
        // 後端不處理解析度，縮放交給匯出步驟
        let filename = self.upload(&job.input).await?;
        tracing::debug!("Backend produced {}", filename);

        let data = self.download(&filename).await?;
        ensure_parent_dir(&job.output)?;
        write_atomically(&job.output, &data)?;

        tracing::debug!("Saved {} bytes to {}", data.len(), job.output.display());
        Ok(job.output.clone())
    }

    async fn health_check(&self) -> bool {
        let url = match self.endpoint(&["health"]) {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_segments_under_base_path() {
        let remover = HttpRemover::new("http://localhost:5000/api").unwrap();
        assert_eq!(
            remover.endpoint(&["remove-background"]).unwrap().as_str(),
            "http://localhost:5000/api/remove-background"
        );

        let remover = HttpRemover::new("http://localhost:5000/api/").unwrap();
        assert_eq!(
            remover.endpoint(&["download", "processed a.png"]).unwrap().as_str(),
            "http://localhost:5000/api/download/processed%20a.png"
        );
    }

    #[test]
    fn test_error_body_without_success_flag_parses() {
        let response: RemovalResponse =
            serde_json::from_str(r#"{"error": "CUDA out of memory"}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("CUDA out of memory"));
        assert!(response.filename.is_none());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        assert!(HttpRemover::new("ftp://localhost/api").is_err());
        assert!(HttpRemover::new("").is_err());
    }
}

//! HTTP client for the transcription backend.
//!
//! Uploads recorded audio as multipart form data and requests AI summaries
//! with a JSON body. Non-success responses surface as typed errors carrying
//! the HTTP status and response text.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::Summary;

/// Errors from the transcription backend boundary
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Backend returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to read audio file: {0}")]
    Io(#[from] std::io::Error),
}

/// Successful transcription response
#[derive(Debug, Clone, Deserialize)]
pub struct Transcript {
    pub transcript: String,
}

/// Remote transcription and summarization calls consumed by the notes core.
#[async_trait]
pub trait TranscribeApi: Send + Sync {
    /// Upload recorded audio, returning its transcript
    async fn upload(&self, audio_uri: &str) -> Result<Transcript, ApiError>;

    /// Request an AI summary for a transcript
    async fn summarize(&self, transcript: &str) -> Result<Summary, ApiError>;
}

/// Transcription backend client
pub struct BackendClient {
    /// Backend base URL
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

impl BackendClient {
    /// Create a client for the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the resolved configuration
    pub fn from_config() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::backend_url()?))
    }

    /// Build endpoint URL
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Convert a non-success response into an `ApiError::Http`
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TranscribeApi for BackendClient {
    async fn upload(&self, audio_uri: &str) -> Result<Transcript, ApiError> {
        debug!("Uploading audio for transcription: {}", audio_uri);

        // Audio refs are local file paths, possibly carrying a file:// scheme
        let path = audio_uri.strip_prefix("file://").unwrap_or(audio_uri);
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "recording.m4a".to_string());

        let file_bytes = tokio::fs::read(path).await?;

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("audio/m4a")
            .map_err(ApiError::Transport)?;
        let form = Form::new().part("audio", file_part);

        let response = self
            .client
            .post(self.endpoint("transcribe"))
            .multipart(form)
            .send()
            .await?;

        let transcript: Transcript = Self::check_status(response).await?.json().await?;

        debug!(
            "Transcription succeeded ({} chars)",
            transcript.transcript.len()
        );

        Ok(transcript)
    }

    async fn summarize(&self, transcript: &str) -> Result<Summary, ApiError> {
        debug!("Requesting AI summary ({} chars)", transcript.len());

        let response = self
            .client
            .post(self.endpoint("summarize"))
            .json(&serde_json::json!({ "transcript": transcript }))
            .send()
            .await?;

        let summary: Summary = Self::check_status(response).await?.json().await?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let client = BackendClient::new("http://localhost:3000");
        assert_eq!(
            client.endpoint("transcribe"),
            "http://localhost:3000/transcribe"
        );

        // Trailing slash on the base URL does not double up
        let client = BackendClient::new("http://localhost:3000/");
        assert_eq!(
            client.endpoint("summarize"),
            "http://localhost:3000/summarize"
        );
    }

    #[test]
    fn test_summary_response_parsing() {
        let raw = r#"{
            "summary": "A short recap",
            "keyPoints": ["first", "second"],
            "titleSuggestion": "Recap"
        }"#;

        let summary: Summary = serde_json::from_str(raw).unwrap();
        assert_eq!(summary.summary, "A short recap");
        assert_eq!(summary.key_points.len(), 2);
        assert_eq!(summary.title_suggestion.as_deref(), Some("Recap"));

        // titleSuggestion and keyPoints are optional on the wire
        let minimal: Summary = serde_json::from_str(r#"{"summary": "x"}"#).unwrap();
        assert!(minimal.key_points.is_empty());
        assert!(minimal.title_suggestion.is_none());
    }
}

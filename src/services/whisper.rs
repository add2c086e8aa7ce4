// src/services/whisper.rs
//! Whisper-compatible speech-to-text client
//!
//! Posts the raw audio as a multipart upload to a Whisper-style
//! `/v1/audio/transcriptions` endpoint and returns the plain transcript text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::SpeechConfig;
use crate::error::TranscriptionError;
use crate::services::traits::SpeechToTextService;

/// Whisper HTTP API client
pub struct WhisperApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperApiClient {
    /// Create a new client from the speech service configuration
    pub fn new(config: &SpeechConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    fn file_name_for(mime_type: &str) -> &'static str {
        match mime_type.split(';').next().unwrap_or("").trim() {
            "audio/wav" | "audio/x-wav" => "entry.wav",
            "audio/mpeg" => "entry.mp3",
            "audio/mp4" | "audio/x-m4a" => "entry.m4a",
            "audio/ogg" => "entry.ogg",
            _ => "entry.webm",
        }
    }
}

#[async_trait]
impl SpeechToTextService for WhisperApiClient {
    async fn transcribe(
        &self,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<String, TranscriptionError> {
        let part = Part::bytes(audio.to_vec())
            .file_name(Self::file_name_for(mime_type))
            .mime_str(mime_type)
            .map_err(|e| TranscriptionError::UnsupportedFormat(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::UnsupportedFormat(format!(
                "{}: {}",
                status, body
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::Unavailable(format!(
                "{}: {}",
                status, body
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Unavailable(format!("malformed response: {}", e)))?;

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_mime_type() {
        assert_eq!(WhisperApiClient::file_name_for("audio/wav"), "entry.wav");
        assert_eq!(
            WhisperApiClient::file_name_for("audio/webm;codecs=opus"),
            "entry.webm"
        );
        assert_eq!(WhisperApiClient::file_name_for("audio/mpeg"), "entry.mp3");
    }
}

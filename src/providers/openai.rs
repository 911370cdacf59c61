//! `OpenAI`-compatible capability provider
//!
//! Whisper for transcription, chat completions for translation and the
//! speech endpoint for synthesis. Any server exposing the same routes under
//! the configured base URL works.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::CapabilityProvider;
use crate::config::ProviderConfig;
use crate::{Error, Result};

/// `OpenAI` API client implementing all three capabilities
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    stt_model: String,
    translation_model: String,
    tts_model: String,
    tts_speed: f32,
}

impl OpenAiProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.api_key.expose_secret().is_empty() {
            return Err(Error::Config("provider API key required".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(config.api_key.expose_secret().to_owned()),
            stt_model: config.stt_model.clone(),
            translation_model: config.translation_model.clone(),
            tts_model: config.tts_model.clone(),
            tts_speed: config.tts_speed,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    /// Get MIME type for an uploaded file extension
    fn mime_for_extension(extension: &str) -> &'static str {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" | "mpeg" | "mpga" => "audio/mpeg",
            "m4a" | "mp4" => "audio/mp4",
            "wav" => "audio/wav",
            "ogg" | "oga" => "audio/ogg",
            "flac" => "audio/flac",
            _ => "audio/webm",
        }
    }

    /// Turn a non-success response into an error carrying status and body
    async fn check(response: reqwest::Response, api: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, api, "provider API error");
        Err(Error::Provider(format!("{api} API error {status}: {body}")))
    }

    /// Check the response and decode its JSON body
    async fn decode<T: DeserializeOwned>(response: reqwest::Response, api: &str) -> Result<T> {
        let body = Self::check(response, api).await?.text().await?;
        parse_body(&body).inspect_err(|e| {
            tracing::error!(error = %e, api, "malformed provider response");
        })
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl CapabilityProvider for OpenAiProvider {
    async fn transcribe(&self, audio: &Path, language_hint: &str) -> Result<String> {
        let file = tokio::fs::File::open(audio).await?;
        let length = file.metadata().await?.len();
        let file_name = audio
            .file_name()
            .map_or_else(|| "audio.webm".to_string(), |n| n.to_string_lossy().into_owned());
        let mime = Self::mime_for_extension(
            audio.extension().and_then(|e| e.to_str()).unwrap_or_default(),
        );

        tracing::debug!(bytes = length, file_name = %file_name, language_hint, "starting transcription");

        let part = Part::stream_with_length(Body::from(file), length)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| Error::Provider(format!("invalid MIME type: {e}")))?;

        let form = Form::new()
            .text("model", self.stt_model.clone())
            .text("language", language_hint.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await?;

        let result: TranscriptionResponse = Self::decode(response, "transcription").await?;

        Ok(result.text)
    }

    async fn chat_complete(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.translation_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.url("chat/completions"))
            .header("Authorization", self.bearer())
            .json(&request)
            .send()
            .await?;

        let result: ChatCompletionResponse = Self::decode(response, "chat completion").await?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Provider("chat completion returned no content".to_string()))
    }

    async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.tts_model,
            input: text,
            voice,
            speed: self.tts_speed,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(self.url("audio/speech"))
            .header("Authorization", self.bearer())
            .json(&request)
            .send()
            .await?;

        let audio = Self::check(response, "speech").await?.bytes().await?;
        Ok(audio.to_vec())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'a str,
}

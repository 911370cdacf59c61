//! Ingestion endpoint: `POST /interpret`

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::language::LanguageCode;
use crate::pipeline::{Interpretation, Submission};
use crate::relay::ParticipantSlot;

/// Interpretation returned to the submitting participant
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretResponse {
    pub transcript: String,
    pub interpreted_text: String,
    /// `null` when the transcript was empty and nothing was synthesized
    pub audio_base64: Option<String>,
}

impl From<Interpretation> for InterpretResponse {
    fn from(result: Interpretation) -> Self {
        Self {
            transcript: result.transcript,
            interpreted_text: result.translated_text,
            audio_base64: result.audio.map(|audio| STANDARD.encode(audio)),
        }
    }
}

/// Raw multipart fields, before validation
#[derive(Debug, Default)]
struct InterpretForm {
    audio: Option<(String, Bytes)>,
    source_lang: Option<String>,
    target_lang: Option<String>,
    mode: Option<String>,
}

impl InterpretForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            match name.as_str() {
                "audio" => {
                    if form.audio.is_some() {
                        return Err(ApiError::bad_request("expected a single audio file"));
                    }
                    // A part without a filename is a plain text field, not a file
                    let Some(file_name) = field.file_name().map(str::to_owned) else {
                        return Err(ApiError::bad_request("missing audio file"));
                    };
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                    form.audio = Some((file_name, data));
                }
                "sourceLang" | "targetLang" | "mode" => {
                    let entry = match name.as_str() {
                        "sourceLang" => &mut form.source_lang,
                        "targetLang" => &mut form.target_lang,
                        _ => &mut form.mode,
                    };
                    if entry.is_some() {
                        return Err(ApiError::bad_request(format!("expected a single {name} field")));
                    }
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
                    *entry = Some(value);
                }
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Check fields in a fixed order so the first problem is reported
    fn validate(self) -> Result<Submission, ApiError> {
        let (file_name, audio) = self
            .audio
            .filter(|(_, data)| !data.is_empty())
            .ok_or_else(|| ApiError::bad_request("missing audio file"))?;

        let source_lang = required(self.source_lang, "sourceLang")?;
        let target_lang = required(self.target_lang, "targetLang")?;
        let source = source_lang.parse::<LanguageCode>()?;
        let target = target_lang.parse::<LanguageCode>()?;

        let sender = required(self.mode, "mode")?.parse::<ParticipantSlot>()?;

        Ok(Submission {
            audio: audio.to_vec(),
            file_name: Some(file_name),
            source,
            target,
            sender,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing {field}")))
}

/// Transcribe, translate and synthesize an utterance, relaying it to the
/// other participant
///
/// Expects `multipart/form-data` with an `audio` file plus `sourceLang`,
/// `targetLang` and `mode` (`A` or `B`) fields.
pub async fn interpret(
    State(state): State<Arc<ApiState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InterpretResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::new(e.status(), e.body_text()))?;

    let submission = InterpretForm::read(&mut multipart).await?.validate()?;
    let result = state.interpreter.ingest(submission).await?;

    Ok(Json(result.into()))
}

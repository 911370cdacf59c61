//! Delivery endpoint: `GET /stream/{mode}`

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::relay::{ParticipantSlot, Utterance};

/// Next pending utterance for a slot; every field is `null` when none is waiting
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub audio_base64: Option<String>,
    pub text: Option<String>,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: Option<i64>,
}

impl From<Utterance> for StreamResponse {
    fn from(utterance: Utterance) -> Self {
        Self {
            audio_base64: Some(STANDARD.encode(utterance.audio())),
            timestamp: Some(utterance.created_at().timestamp_millis()),
            text: Some(utterance.text().to_string()),
        }
    }
}

/// Take the oldest utterance waiting for `mode`
///
/// Not a pure read: each successful poll removes the item it returns.
pub async fn poll(
    State(state): State<Arc<ApiState>>,
    Path(mode): Path<String>,
) -> Result<Json<StreamResponse>, ApiError> {
    let slot = mode.parse::<ParticipantSlot>()?;

    let response = state
        .relay
        .dequeue(slot)
        .map(StreamResponse::from)
        .unwrap_or_default();

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_serializes_nulls() {
        let json = serde_json::to_value(StreamResponse::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "audioBase64": null, "text": null, "timestamp": null })
        );
    }

    #[test]
    fn utterance_fields_are_carried_over() {
        let utterance = Utterance::new(b"audio".to_vec(), "bonjour".to_string());
        let millis = utterance.created_at().timestamp_millis();

        let response = StreamResponse::from(utterance);
        assert_eq!(response.audio_base64.as_deref(), Some("YXVkaW8="));
        assert_eq!(response.text.as_deref(), Some("bonjour"));
        assert_eq!(response.timestamp, Some(millis));
    }
}

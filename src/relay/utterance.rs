//! Relay payload

use chrono::{DateTime, Utc};

/// One interpreted message waiting for delivery
///
/// Immutable once built. The timestamp is informational only; delivery order
/// is queue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    audio: Vec<u8>,
    text: String,
    created_at: DateTime<Utc>,
}

impl Utterance {
    /// Build an utterance stamped with the current time
    #[must_use]
    pub fn new(audio: Vec<u8>, text: String) -> Self {
        Self {
            audio,
            text,
            created_at: Utc::now(),
        }
    }

    /// Synthesized speech in the recipient's language
    #[must_use]
    pub fn audio(&self) -> &[u8] {
        &self.audio
    }

    /// Translated text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//! Capability providers for speech-to-text, translation and text-to-speech
//!
//! The gateway treats these as opaque remote dependencies. Anything that can
//! transcribe, chat-complete and synthesize can back the interpreter.

mod openai;

pub use openai::OpenAiProvider;

use std::path::Path;

use async_trait::async_trait;

use crate::Result;

/// External speech and language capabilities
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Transcribe the audio file at `audio`
    ///
    /// `language_hint` is an ISO 639-1 code such as `"en"`.
    ///
    /// # Errors
    ///
    /// Returns error if the provider rejects the request or is unreachable
    async fn transcribe(&self, audio: &Path, language_hint: &str) -> Result<String>;

    /// Run a single-turn chat completion and return the reply text
    ///
    /// # Errors
    ///
    /// Returns error if the provider rejects the request or is unreachable
    async fn chat_complete(&self, prompt: &str) -> Result<String>;

    /// Synthesize `text` with the given voice, returning encoded audio
    ///
    /// # Errors
    ///
    /// Returns error if the provider rejects the request or is unreachable
    async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<Vec<u8>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Build the chat prompt asking for a translation into `target_language`
#[must_use]
pub fn translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following text into {target_language}. \
         Reply with only the translation, without quotes or commentary.\n\n{text}"
    )
}

//! Ingestion pipeline: transcribe, translate, synthesize, relay
//!
//! Stages run strictly in sequence since each consumes the previous result.
//! Every provider call runs under a deadline. The staged upload is owned by
//! the running `ingest` future, so it is removed on success, on any stage
//! failure, and when the future is dropped because the client went away.

mod staging;

pub use staging::StagedAudio;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PipelineConfig;
use crate::language::LanguageCode;
use crate::providers::{CapabilityProvider, translation_prompt};
use crate::relay::{ParticipantSlot, SessionRelay, Utterance};
use crate::voice::resolve_voice;
use crate::{Error, Result};

/// A validated submission from one participant
#[derive(Debug, Clone)]
pub struct Submission {
    /// Encoded audio as uploaded
    pub audio: Vec<u8>,
    /// Client-supplied file name, used only for its extension
    pub file_name: Option<String>,
    /// Language spoken in `audio`
    pub source: LanguageCode,
    /// Language the other participant should hear
    pub target: LanguageCode,
    /// Who submitted it
    pub sender: ParticipantSlot,
}

/// Result returned synchronously to the submitting participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub transcript: String,
    pub translated_text: String,
    /// Synthesized speech; `None` when nothing intelligible was heard
    pub audio: Option<Vec<u8>>,
    /// Slot the utterance was queued for, if any
    pub delivered_to: Option<ParticipantSlot>,
}

impl Interpretation {
    fn silent(transcript: String) -> Self {
        Self {
            transcript,
            translated_text: String::new(),
            audio: None,
            delivered_to: None,
        }
    }
}

/// Drives submissions through the capability provider into the relay
pub struct Interpreter {
    provider: Arc<dyn CapabilityProvider>,
    relay: Arc<SessionRelay>,
    config: PipelineConfig,
}

impl Interpreter {
    #[must_use]
    pub fn new(
        provider: Arc<dyn CapabilityProvider>,
        relay: Arc<SessionRelay>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            provider,
            relay,
            config,
        }
    }

    /// The relay interpreted utterances are delivered to
    #[must_use]
    pub const fn relay(&self) -> &Arc<SessionRelay> {
        &self.relay
    }

    /// Interpret one submission and queue the result for the other participant
    ///
    /// An empty transcript ends the pipeline early: nothing is translated,
    /// synthesized or queued.
    ///
    /// # Errors
    ///
    /// Returns a stage error (`Transcription`, `Translation`, `Synthesis`),
    /// `Timeout` if a stage exceeds its deadline, or `Io` if the upload
    /// cannot be staged. Nothing is queued on error.
    pub async fn ingest(&self, submission: Submission) -> Result<Interpretation> {
        let Submission {
            audio,
            file_name,
            source,
            target,
            sender,
        } = submission;

        tracing::info!(
            sender = %sender,
            source = %source,
            target = %target,
            bytes = audio.len(),
            provider = self.provider.name(),
            "interpreting submission"
        );

        let staged =
            StagedAudio::write(&self.config.staging_dir, file_name.as_deref(), &audio).await?;
        drop(audio);

        let transcript = self
            .stage(
                "transcription",
                self.provider.transcribe(staged.path(), source.primary_subtag()),
                Error::Transcription,
            )
            .await?;

        // Upload is no longer needed once transcribed
        if let Err(e) = staged.remove() {
            tracing::warn!(error = %e, "failed to remove staged upload");
        }

        let transcript = transcript.trim().to_string();
        tracing::debug!(transcript = %transcript, "transcribed");

        if transcript.is_empty() {
            tracing::info!(sender = %sender, "empty transcript, nothing to relay");
            return Ok(Interpretation::silent(transcript));
        }

        let prompt = translation_prompt(&transcript, target.display_name());
        let translated_text = self
            .stage(
                "translation",
                self.provider.chat_complete(&prompt),
                Error::Translation,
            )
            .await?
            .trim()
            .to_string();
        tracing::debug!(translated = %translated_text, "translated");

        let voice = resolve_voice(target.as_str());
        let speech = self
            .stage(
                "synthesis",
                self.provider.synthesize_speech(&translated_text, voice),
                Error::Synthesis,
            )
            .await?;

        let recipient = self.relay.deliver(
            sender,
            Utterance::new(speech.clone(), translated_text.clone()),
        );
        tracing::info!(
            sender = %sender,
            recipient = %recipient,
            voice,
            audio_bytes = speech.len(),
            "utterance relayed"
        );

        Ok(Interpretation {
            transcript,
            translated_text,
            audio: Some(speech),
            delivered_to: Some(recipient),
        })
    }

    /// Run one provider call under the stage deadline
    async fn stage<T>(
        &self,
        stage: &'static str,
        call: impl Future<Output = Result<T>>,
        wrap: fn(String) -> Error,
    ) -> Result<T> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.config.stage_timeout, call).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(Ok(value)) => {
                tracing::debug!(stage, elapsed_ms, "stage complete");
                Ok(value)
            }
            Ok(Err(e)) => {
                tracing::error!(stage, elapsed_ms, error = %e, "stage failed");
                Err(wrap(e.to_string()))
            }
            Err(_) => {
                tracing::error!(stage, elapsed_ms, "stage timed out");
                Err(Error::Timeout {
                    stage,
                    secs: duration_secs(self.config.stage_timeout),
                })
            }
        }
    }
}

fn duration_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct ScriptedProvider {
        transcript: String,
        fail_stage: Option<&'static str>,
        hang_stage: Option<&'static str>,
        calls: Mutex<Vec<String>>,
        seen_upload: Mutex<Option<PathBuf>>,
    }

    impl ScriptedProvider {
        fn saying(transcript: &str) -> Self {
            Self {
                transcript: transcript.to_string(),
                ..Self::default()
            }
        }

        async fn step(&self, stage: &'static str, call: String) -> crate::Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.hang_stage == Some(stage) {
                std::future::pending::<()>().await;
            }
            if self.fail_stage == Some(stage) {
                return Err(Error::Provider(format!("{stage} exploded")));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CapabilityProvider for ScriptedProvider {
        async fn transcribe(&self, audio: &Path, language_hint: &str) -> crate::Result<String> {
            assert!(audio.exists(), "upload must be staged before transcription");
            *self.seen_upload.lock().unwrap() = Some(audio.to_path_buf());
            self.step("transcription", format!("transcribe:{language_hint}"))
                .await?;
            Ok(self.transcript.clone())
        }

        async fn chat_complete(&self, prompt: &str) -> crate::Result<String> {
            self.step("translation", format!("chat:{prompt}")).await?;
            Ok(format!("  [fr] {}  ", self.transcript))
        }

        async fn synthesize_speech(&self, text: &str, voice: &str) -> crate::Result<Vec<u8>> {
            self.step("synthesis", format!("speak:{voice}")).await?;
            Ok(format!("mp3:{text}").into_bytes())
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct Harness {
        provider: Arc<ScriptedProvider>,
        relay: Arc<SessionRelay>,
        interpreter: Interpreter,
        staging: tempfile::TempDir,
    }

    fn harness(provider: ScriptedProvider, timeout: Duration) -> Harness {
        let provider = Arc::new(provider);
        let relay = Arc::new(SessionRelay::new());
        let staging = tempfile::tempdir().unwrap();
        let interpreter = Interpreter::new(
            provider.clone(),
            relay.clone(),
            PipelineConfig {
                stage_timeout: timeout,
                staging_dir: staging.path().to_path_buf(),
            },
        );
        Harness {
            provider,
            relay,
            interpreter,
            staging,
        }
    }

    fn submission(sender: ParticipantSlot) -> Submission {
        Submission {
            audio: b"RIFF....WAVE".to_vec(),
            file_name: Some("clip.wav".to_string()),
            source: LanguageCode::EnUs,
            target: LanguageCode::FrFr,
            sender,
        }
    }

    fn staging_is_empty(h: &Harness) -> bool {
        std::fs::read_dir(h.staging.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn full_pipeline_relays_to_other_slot() {
        let h = harness(ScriptedProvider::saying("Hello there"), Duration::from_secs(5));

        let result = h.interpreter.ingest(submission(ParticipantSlot::A)).await.unwrap();

        assert_eq!(result.transcript, "Hello there");
        assert_eq!(result.translated_text, "[fr] Hello there");
        assert_eq!(result.audio.as_deref(), Some(&b"mp3:[fr] Hello there"[..]));
        assert_eq!(result.delivered_to, Some(ParticipantSlot::B));

        assert!(h.relay.dequeue(ParticipantSlot::A).is_none());
        let delivered = h.relay.dequeue(ParticipantSlot::B).unwrap();
        assert_eq!(delivered.text(), "[fr] Hello there");
        assert_eq!(delivered.audio(), b"mp3:[fr] Hello there");
        assert!(staging_is_empty(&h));
    }

    #[tokio::test]
    async fn stages_receive_hint_prompt_and_voice() {
        let h = harness(ScriptedProvider::saying("Good night"), Duration::from_secs(5));

        h.interpreter.ingest(submission(ParticipantSlot::B)).await.unwrap();

        let calls = h.provider.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], "transcribe:en");
        assert!(calls[1].contains("French (France)"));
        assert!(calls[1].ends_with("Good night"));
        assert_eq!(calls[2], "speak:nova");
        assert_eq!(h.relay.pending(ParticipantSlot::A), 1);
    }

    #[tokio::test]
    async fn upload_keeps_its_extension() {
        let h = harness(ScriptedProvider::saying("hi"), Duration::from_secs(5));

        h.interpreter.ingest(submission(ParticipantSlot::A)).await.unwrap();

        let seen = h.provider.seen_upload.lock().unwrap().clone().unwrap();
        assert_eq!(seen.extension().unwrap(), "wav");
        assert!(!seen.exists());
    }

    #[tokio::test]
    async fn empty_transcript_short_circuits() {
        let h = harness(ScriptedProvider::saying("   "), Duration::from_secs(5));

        let result = h.interpreter.ingest(submission(ParticipantSlot::A)).await.unwrap();

        assert_eq!(result.transcript, "");
        assert_eq!(result.translated_text, "");
        assert!(result.audio.is_none());
        assert!(result.delivered_to.is_none());
        assert_eq!(h.provider.calls(), ["transcribe:en"]);
        assert_eq!(h.relay.pending_counts().b, 0);
        assert!(staging_is_empty(&h));
    }

    #[tokio::test]
    async fn stage_failures_map_to_stage_errors_and_clean_up() {
        for stage in ["transcription", "translation", "synthesis"] {
            let h = harness(
                ScriptedProvider {
                    transcript: "hello".to_string(),
                    fail_stage: Some(stage),
                    ..ScriptedProvider::default()
                },
                Duration::from_secs(5),
            );

            let err = h.interpreter.ingest(submission(ParticipantSlot::A)).await.unwrap_err();

            let expected = match stage {
                "transcription" => matches!(err, Error::Transcription(_)),
                "translation" => matches!(err, Error::Translation(_)),
                _ => matches!(err, Error::Synthesis(_)),
            };
            assert!(expected, "{stage}: unexpected error {err}");
            assert_eq!(h.relay.pending_counts().a, 0, "{stage}");
            assert_eq!(h.relay.pending_counts().b, 0, "{stage}");
            assert!(staging_is_empty(&h), "{stage}: staged upload left behind");
        }
    }

    #[tokio::test]
    async fn hung_stage_times_out() {
        let h = harness(
            ScriptedProvider {
                transcript: "hello".to_string(),
                hang_stage: Some("synthesis"),
                ..ScriptedProvider::default()
            },
            Duration::from_millis(50),
        );

        let err = h.interpreter.ingest(submission(ParticipantSlot::A)).await.unwrap_err();

        assert!(matches!(err, Error::Timeout { stage: "synthesis", .. }));
        assert_eq!(h.relay.pending(ParticipantSlot::B), 0);
        assert!(staging_is_empty(&h));
    }

    #[tokio::test]
    async fn dropped_request_removes_staged_upload() {
        let h = harness(
            ScriptedProvider {
                transcript: "hello".to_string(),
                hang_stage: Some("transcription"),
                ..ScriptedProvider::default()
            },
            Duration::from_secs(60),
        );

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            h.interpreter.ingest(submission(ParticipantSlot::A)),
        )
        .await;

        assert!(outcome.is_err(), "ingest should still be pending");
        let seen = h.provider.seen_upload.lock().unwrap().clone().unwrap();
        assert!(!seen.exists());
        assert!(staging_is_empty(&h));
        assert_eq!(h.relay.pending(ParticipantSlot::B), 0);
    }

    #[test]
    fn deadline_rounds_up_to_whole_seconds() {
        assert_eq!(duration_secs(Duration::from_secs(60)), 60);
        assert_eq!(duration_secs(Duration::from_millis(50)), 1);
        assert_eq!(duration_secs(Duration::from_millis(1500)), 2);
    }
}

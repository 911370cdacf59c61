//! Shared test utilities

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, header};
use parley_gateway::config::PipelineConfig;
use parley_gateway::{ApiServerBuilder, CapabilityProvider, Error, Interpreter, SessionRelay};
use tempfile::TempDir;
use tokio::sync::Notify;

const BOUNDARY: &str = "parley-test-boundary";

/// Uploads whose content starts with this wait for [`FakeProvider::release`]
pub const GATED_PREFIX: &str = "gated:";

/// Capability provider that "hears" the uploaded bytes as UTF-8 text
///
/// Translation prefixes the text with `translated:` and synthesis returns
/// `voice|text` as the audio bytes.
#[derive(Default)]
pub struct FakeProvider {
    pub fail_synthesis: bool,
    pub calls: AtomicUsize,
    /// Signalled when a gated transcription starts waiting
    pub gated_entered: Notify,
    /// Lets a gated transcription finish
    pub release: Notify,
}

impl FakeProvider {
    pub fn failing_synthesis() -> Self {
        Self {
            fail_synthesis: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityProvider for FakeProvider {
    async fn transcribe(&self, audio: &Path, _language_hint: &str) -> parley_gateway::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let heard = String::from_utf8(tokio::fs::read(audio).await?)
            .map_err(|e| Error::Provider(e.to_string()))?;

        if let Some(rest) = heard.strip_prefix(GATED_PREFIX) {
            self.gated_entered.notify_one();
            self.release.notified().await;
            return Ok(rest.to_string());
        }
        Ok(heard)
    }

    async fn chat_complete(&self, prompt: &str) -> parley_gateway::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = prompt.rsplit("\n\n").next().unwrap_or_default();
        Ok(format!("translated:{text}"))
    }

    async fn synthesize_speech(&self, text: &str, voice: &str) -> parley_gateway::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_synthesis {
            return Err(Error::Provider("synthesis unavailable".to_string()));
        }
        Ok(format!("{voice}|{text}").into_bytes())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// A router wired to a fake provider, with handles for inspection
pub struct TestApp {
    pub router: axum::Router,
    pub provider: Arc<FakeProvider>,
    pub relay: Arc<SessionRelay>,
    pub staging: TempDir,
}

impl TestApp {
    pub fn new(provider: FakeProvider) -> Self {
        Self::with(provider, |builder| builder)
    }

    pub fn with(
        provider: FakeProvider,
        configure: impl FnOnce(ApiServerBuilder) -> ApiServerBuilder,
    ) -> Self {
        let provider = Arc::new(provider);
        let relay = Arc::new(SessionRelay::new());
        let staging = tempfile::tempdir().expect("failed to create staging dir");

        let interpreter = Arc::new(Interpreter::new(
            provider.clone(),
            relay.clone(),
            PipelineConfig {
                stage_timeout: Duration::from_secs(5),
                staging_dir: staging.path().to_path_buf(),
            },
        ));

        let server = configure(ApiServerBuilder::new(interpreter, 0)).build();

        Self {
            router: server.router(),
            provider,
            relay,
            staging,
        }
    }

    pub fn staging_is_empty(&self) -> bool {
        std::fs::read_dir(self.staging.path())
            .expect("staging dir readable")
            .next()
            .is_none()
    }
}

/// One part of a multipart form
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Build a `POST /interpret` request from form parts
pub fn interpret_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: audio/webm\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/interpret")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}

/// A complete, valid submission
pub fn submission(mode: &str, spoken: &str) -> Request<Body> {
    interpret_request(&[
        Part::File("audio", "clip.webm", spoken.as_bytes()),
        Part::Text("sourceLang", "en-US"),
        Part::Text("targetLang", "fr-FR"),
        Part::Text("mode", mode),
    ])
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Read a response body as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&body).expect("JSON body")
}

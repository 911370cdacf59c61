//! Parley Gateway - two-party speech-to-speech interpretation relay
//!
//! Participant A speaks, participant B hears it in their language, and the
//! other way round:
//! - Ingestion: transcribe, translate and synthesize a submitted utterance
//! - Relay: queue the result for the other participant
//! - Delivery: participants poll their own queue
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP API (axum)                    │
//! │   POST /interpret   │   GET /stream/{mode}   │  /    │
//! └──────────┬──────────┴───────────▲────────────────────┘
//!            │                      │
//! ┌──────────▼──────────┐  ┌────────┴────────────────────┐
//! │     Interpreter     │  │        SessionRelay          │
//! │ STT → LLM → TTS ────┼─►│  queue A   │   queue B       │
//! └──────────┬──────────┘  └─────────────────────────────┘
//!            │
//! ┌──────────▼──────────────────────────────────────────┐
//! │          Capability provider (OpenAI API)            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod providers;
pub mod relay;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::Config;
pub use error::{Error, Result};
pub use language::LanguageCode;
pub use pipeline::{Interpretation, Interpreter, Submission};
pub use providers::{CapabilityProvider, OpenAiProvider};
pub use relay::{ParticipantSlot, RelayConfig, SessionRelay, Utterance};
pub use voice::{DEFAULT_VOICE, resolve_voice};

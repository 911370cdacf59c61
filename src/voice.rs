//! Synthesis voice selection per target language

use crate::language::normalize_tag;

/// Voice used when a language has no entry in [`VOICE_TABLE`]
pub const DEFAULT_VOICE: &str = "alloy";

/// Language tag to provider voice identifier
///
/// Languages missing here are still supported for interpretation; they are
/// spoken with [`DEFAULT_VOICE`].
pub const VOICE_TABLE: &[(&str, &str)] = &[
    ("en-US", "alloy"),
    ("en-GB", "fable"),
    ("fr-FR", "nova"),
    ("es-ES", "shimmer"),
    ("de-DE", "onyx"),
    ("it-IT", "echo"),
    ("pt-BR", "shimmer"),
];

/// Resolve the synthesis voice for a language tag
///
/// Total over all inputs: unknown tags and supported-but-unmapped tags both
/// resolve to [`DEFAULT_VOICE`].
#[must_use]
pub fn resolve_voice(lang: &str) -> &'static str {
    let tag = normalize_tag(lang);
    VOICE_TABLE
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(&tag))
        .map_or(DEFAULT_VOICE, |&(_, voice)| voice)
}

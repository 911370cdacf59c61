//! Supported spoken languages
//!
//! The set is compiled in. Tags are BCP-47-like (`fr-FR`); parsing accepts
//! any letter case and `_` as a separator.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::Error;

/// A spoken language variant the gateway can interpret from or into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageCode {
    EnUs,
    EnGb,
    FrFr,
    EsEs,
    DeDe,
    ItIt,
    PtBr,
    JaJp,
    KoKr,
    ZhCn,
    HiIn,
    ArSa,
    RuRu,
}

impl LanguageCode {
    /// Every supported language, in display order
    pub const ALL: [Self; 13] = [
        Self::EnUs,
        Self::EnGb,
        Self::FrFr,
        Self::EsEs,
        Self::DeDe,
        Self::ItIt,
        Self::PtBr,
        Self::JaJp,
        Self::KoKr,
        Self::ZhCn,
        Self::HiIn,
        Self::ArSa,
        Self::RuRu,
    ];

    /// Canonical tag, e.g. `en-US`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::FrFr => "fr-FR",
            Self::EsEs => "es-ES",
            Self::DeDe => "de-DE",
            Self::ItIt => "it-IT",
            Self::PtBr => "pt-BR",
            Self::JaJp => "ja-JP",
            Self::KoKr => "ko-KR",
            Self::ZhCn => "zh-CN",
            Self::HiIn => "hi-IN",
            Self::ArSa => "ar-SA",
            Self::RuRu => "ru-RU",
        }
    }

    /// ISO 639-1 language part, used as the transcription hint
    #[must_use]
    pub fn primary_subtag(self) -> &'static str {
        let tag = self.as_str();
        tag.split_once('-').map_or(tag, |(primary, _)| primary)
    }

    /// Human readable name used when asking for a translation
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::EnUs => "English (United States)",
            Self::EnGb => "English (United Kingdom)",
            Self::FrFr => "French (France)",
            Self::EsEs => "Spanish (Spain)",
            Self::DeDe => "German (Germany)",
            Self::ItIt => "Italian (Italy)",
            Self::PtBr => "Portuguese (Brazil)",
            Self::JaJp => "Japanese (Japan)",
            Self::KoKr => "Korean (South Korea)",
            Self::ZhCn => "Chinese (Mainland China)",
            Self::HiIn => "Hindi (India)",
            Self::ArSa => "Arabic (Saudi Arabia)",
            Self::RuRu => "Russian (Russia)",
        }
    }

    /// Look up a tag, returning `None` when it is not in the supported set
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized = normalize_tag(tag);
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(&normalized))
    }
}

/// Trim a tag and unify separators so table lookups are forgiving
pub(crate) fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-")
}

impl FromStr for LanguageCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::validation(format!("unsupported language: {s}")))
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LanguageCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

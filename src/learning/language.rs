//! Display languages
//!
//! Lessons are always generated in English. Other languages are produced by
//! translating the raw lesson, never by generating in that language.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gateway::ContentGenerator;

/// Supported display languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English, the generation language
    #[default]
    #[serde(rename = "en")]
    English,
    /// Bengali
    #[serde(rename = "bn")]
    Bengali,
}

impl Language {
    /// ISO 639-1 code sent to the gateway
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Bengali => "bn",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Bengali => "বাংলা",
        }
    }

    /// Whether this is the generation language (no translation needed)
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Parse from code or name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "eng" | "english" => Some(Self::English),
            "bn" | "ben" | "bengali" | "bangla" | "বাংলা" => Some(Self::Bengali),
            _ => None,
        }
    }

    pub fn all() -> &'static [Language] {
        &[Self::English, Self::Bengali]
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown language: {}. Options: en, bn", s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Learner-facing display settings shared by the content pipeline and the quiz
///
/// Owned by the [`super::Navigator`], which pushes changes to the components that
/// render language-dependent text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayContext {
    language: Language,
}

impl DisplayContext {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Change the display language. Returns `true` if it changed.
    pub fn set_language(&mut self, language: Language) -> bool {
        let changed = self.language != language;
        self.language = language;
        changed
    }
}

/// Translate `text`, falling back to the original on failure or for the default
/// language
pub async fn translate_or_keep(
    generator: &dyn ContentGenerator,
    text: &str,
    language: Language,
) -> String {
    if language.is_default() || text.trim().is_empty() {
        return text.to_string();
    }

    match generator.translate(text, language).await {
        Ok(translated) => translated,
        Err(e) => {
            tracing::warn!("Translation to {} failed, keeping original: {}", language.code(), e);
            text.to_string()
        }
    }
}

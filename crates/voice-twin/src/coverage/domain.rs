use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Communication settings a user can collect samples for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationContext {
    Email,
    Chat,
    Documents,
    Social,
    Presentations,
}

impl CommunicationContext {
    pub const fn label(self) -> &'static str {
        match self {
            CommunicationContext::Email => "Email",
            CommunicationContext::Chat => "Chat",
            CommunicationContext::Documents => "Documents",
            CommunicationContext::Social => "Social",
            CommunicationContext::Presentations => "Presentations",
        }
    }
}

/// Questionnaire answers the matrix is derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleQuestionnaire {
    pub primary_language: String,
    #[serde(default)]
    pub additional_languages: Vec<String>,
    #[serde(default)]
    pub contexts: Vec<CommunicationContext>,
    #[serde(default)]
    pub audiences: Vec<String>,
}

impl StyleQuestionnaire {
    /// Primary plus additional languages, first occurrence wins.
    pub fn languages(&self) -> Vec<String> {
        let mut languages = vec![self.primary_language.clone()];
        for extra in &self.additional_languages {
            if !languages
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extra))
            {
                languages.push(extra.clone());
            }
        }
        languages
    }
}

/// User-submitted writing sample, from a form or an audio transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingSample {
    pub language: String,
    pub sample_type: String,
    /// Free-text description of who the sample was written for.
    #[serde(default)]
    pub audience: String,
    pub word_count: u32,
    #[serde(default)]
    pub is_transcript: bool,
    pub created_at: DateTime<Utc>,
}

/// Fixed sample-type to context lookup. Unrecognized types match no
/// section rather than guessing.
pub fn implied_context(sample_type: &str) -> Option<CommunicationContext> {
    let normalized = sample_type.trim().to_ascii_lowercase();
    const TABLE: &[(&str, CommunicationContext)] = &[
        ("email", CommunicationContext::Email),
        ("chat", CommunicationContext::Chat),
        ("slack", CommunicationContext::Chat),
        ("message", CommunicationContext::Chat),
        ("text", CommunicationContext::Chat),
        ("document", CommunicationContext::Documents),
        ("report", CommunicationContext::Documents),
        ("memo", CommunicationContext::Documents),
        ("letter", CommunicationContext::Documents),
        ("social", CommunicationContext::Social),
        ("post", CommunicationContext::Social),
        ("tweet", CommunicationContext::Social),
        ("presentation", CommunicationContext::Presentations),
        ("speech", CommunicationContext::Presentations),
        ("talk", CommunicationContext::Presentations),
        ("transcript", CommunicationContext::Presentations),
        ("meeting", CommunicationContext::Presentations),
    ];

    TABLE
        .iter()
        .find(|(keyword, _)| normalized.contains(keyword))
        .map(|(_, context)| *context)
}

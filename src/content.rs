//! FAQ content records: source text, per-language overrides and translation status.

use crate::error::ValidationError;
use crate::i18n::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A translatable field of a FAQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Question,
    Answer,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Question, Field::Answer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Question => "question",
            Field::Answer => "answer",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source-language text of a FAQ. Both fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFields {
    pub question: String,
    pub answer: String,
}

impl SourceFields {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Question => &self.question,
            Field::Answer => &self.answer,
        }
    }

    /// Whitespace-only text counts as missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.question.trim().is_empty() {
            return Err(ValidationError::MissingField("Question"));
        }
        if self.answer.trim().is_empty() {
            return Err(ValidationError::MissingField("Answer"));
        }
        Ok(())
    }
}

/// How the last concluded translation attempt for a language ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

/// Status entry recorded per language after each concluded translation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationStatus {
    #[serde(rename = "status")]
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslationStatus {
    pub fn success() -> Self {
        Self {
            outcome: Outcome::Success,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            outcome: Outcome::Failed,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Translation status keyed by language code.
pub type StatusMap = BTreeMap<String, TranslationStatus>;

/// Stored translations keyed by language code, then field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overrides(BTreeMap<String, BTreeMap<Field, String>>);

impl Overrides {
    pub fn get(&self, field: Field, language: Language) -> Option<&str> {
        self.0
            .get(language.code())
            .and_then(|fields| fields.get(&field))
            .map(String::as_str)
    }

    pub fn set(&mut self, field: Field, language: Language, value: impl Into<String>) {
        self.0
            .entry(language.code().to_string())
            .or_default()
            .insert(field, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}

/// A FAQ as held by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: i64,
    pub source: SourceFields,
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(default)]
    pub translation_status: StatusMap,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentRecord {
    /// A freshly created record: source text only, active.
    pub fn new(id: i64, source: SourceFields) -> Self {
        let now = Utc::now();
        Self {
            id,
            source,
            overrides: Overrides::default(),
            translation_status: StatusMap::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stored translation for `(field, language)`, ignoring empty entries.
    pub fn override_for(&self, field: Field, language: Language) -> Option<&str> {
        self.overrides
            .get(field, language)
            .filter(|value| !value.is_empty())
    }

    pub fn status_for(&self, language: Language) -> Option<&TranslationStatus> {
        self.translation_status.get(language.code())
    }

    /// Per target language, whether a translated question is stored.
    pub fn translations_available(&self) -> BTreeMap<String, bool> {
        Language::translation_targets()
            .into_iter()
            .map(|lang| {
                (
                    lang.code().to_string(),
                    self.override_for(Field::Question, lang).is_some(),
                )
            })
            .collect()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

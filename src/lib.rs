//! Four-level progressive hints for cryptic crossword clues.
//!
//! The deterministic pipeline runs author detection, technique
//! classification, structural extraction and assembly. An optional LLM call
//! sits in front of it and falls back to the deterministic path on any
//! failure.

pub mod assembler;
pub mod author;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod generator;
pub mod lexicon;
pub mod llm;
pub mod prompt;
pub mod text;
pub mod usage;
#[cfg(feature = "web")]
pub mod web;

pub use assembler::{assemble, assemble_with_answer};
pub use author::{AuthorStyle, ParseAuthorError, detect_author};
pub use classifier::{MatchTier, TechniqueMatch, classify};
pub use config::LlmConfig;
pub use extractor::extract;
pub use generator::{GeneratedHints, HintGenerator, HintSource};
pub use lexicon::Technique;
pub use llm::{LlmError, LlmGenerator};
pub use usage::{RateTable, UsageRecord, UsageStats, UsageTracker};

use serde::{Deserialize, Serialize};

/// Column limits the review store applies per level.
pub const STORAGE_LIMITS: [usize; 4] = [1000, 1000, 2000, 5000];

/// Exactly four hints, from definition-only to full explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hints([String; 4]);

impl Hints {
    pub fn new(hint1: String, hint2: String, hint3: String, hint4: String) -> Self {
        Self([hint1, hint2, hint3, hint4])
    }

    /// Hint at `level`, counted from one. Anything outside 1..=4 is `None`.
    pub fn level(&self, level: usize) -> Option<&str> {
        level
            .checked_sub(1)
            .and_then(|idx| self.0.get(idx))
            .map(String::as_str)
    }

    pub fn as_array(&self) -> &[String; 4] {
        &self.0
    }

    pub fn into_array(self) -> [String; 4] {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Clips each level to [`STORAGE_LIMITS`] characters.
    pub fn truncated_for_storage(&self) -> Self {
        let mut levels = self.0.clone();
        for (hint, limit) in levels.iter_mut().zip(STORAGE_LIMITS) {
            if let Some((idx, _)) = hint.char_indices().nth(limit) {
                hint.truncate(idx);
            }
        }
        Self(levels)
    }

    pub(crate) fn levels_mut(&mut self) -> &mut [String; 4] {
        &mut self.0
    }
}

impl From<[String; 4]> for Hints {
    fn from(levels: [String; 4]) -> Self {
        Self(levels)
    }
}

/// Everything known about one clue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub author: AuthorStyle,
}

impl HintRequest {
    pub fn new<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paragraphs: paragraphs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_definitions<I, S>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definitions = definitions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_clue(mut self, clue_text: impl Into<String>) -> Self {
        self.clue_text = Some(clue_text.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn with_author(mut self, author: AuthorStyle) -> Self {
        self.author = author;
        self
    }

    /// True when no paragraph carries any text.
    pub fn is_unexplained(&self) -> bool {
        self.paragraphs.iter().all(|p| p.trim().is_empty())
    }

    pub(crate) fn answer(&self) -> Option<&str> {
        self.answer
            .as_deref()
            .map(str::trim)
            .filter(|answer| !answer.is_empty())
    }

    pub(crate) fn clue_text(&self) -> Option<&str> {
        self.clue_text
            .as_deref()
            .map(str::trim)
            .filter(|clue| !clue.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hints {
        Hints::new(
            "one".to_string(),
            "two".to_string(),
            "three".to_string(),
            "four".to_string(),
        )
    }

    #[test]
    fn levels_are_one_based() {
        let hints = sample();
        assert_eq!(hints.level(1), Some("one"));
        assert_eq!(hints.level(4), Some("four"));
        assert_eq!(hints.level(0), None);
        assert_eq!(hints.level(5), None);
    }

    #[test]
    fn serializes_as_plain_array() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"["one","two","three","four"]"#);
        let back: Hints = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
        assert!(serde_json::from_str::<Hints>(r#"["a","b","c"]"#).is_err());
    }

    #[test]
    fn storage_truncation_is_char_safe() {
        let long = "é".repeat(6000);
        let hints = Hints::from([long.clone(), long.clone(), long.clone(), long]);
        let clipped = hints.truncated_for_storage();
        let lengths: Vec<usize> = clipped.iter().map(|h| h.chars().count()).collect();
        assert_eq!(lengths, vec![1000, 1000, 2000, 5000]);
        assert_eq!(sample().truncated_for_storage(), sample());
    }

    #[test]
    fn request_defaults_from_sparse_json() {
        let request: HintRequest =
            serde_json::from_str(r#"{"paragraphs": ["GO + AT"], "author": "petero"}"#).unwrap();
        assert_eq!(request.author, AuthorStyle::PeterO);
        assert!(request.definitions.is_empty());
        assert!(request.answer.is_none());
        assert!(!request.is_unexplained());
        assert!(HintRequest::new(["  ", ""]).is_unexplained());
    }

    #[test]
    fn blank_answer_is_ignored() {
        let request = HintRequest::new(["x"]).with_answer("  ");
        assert_eq!(request.answer(), None);
        let request = HintRequest::new(["x"]).with_answer(" Goat ");
        assert_eq!(request.answer(), Some("Goat"));
    }
}

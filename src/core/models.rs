//! Core data models for the identify-then-translate pipeline

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::core::errors::{Result, ServiceError};

fn model_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([a-z]{2})-([a-z]{2})$").expect("model pattern compiles"))
}

fn language_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z]{2}$").expect("language pattern compiles"))
}

/// Whether `code` is a two-letter lowercase language code
pub fn is_language_code(code: &str) -> bool {
    language_pattern().is_match(code)
}

/// A validated `source-target` language pair, e.g. `fr-en`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelId {
    source: String,
    target: String,
}

impl ModelId {
    /// Parse a model string; only `^[a-z]{2}-[a-z]{2}$` is accepted
    pub fn parse(code: &str) -> Result<Self> {
        let captures = model_pattern()
            .captures(code)
            .ok_or_else(|| ServiceError::MalformedModelCode {
                code: code.to_string(),
            })?;

        Ok(Self {
            source: captures[1].to_string(),
            target: captures[2].to_string(),
        })
    }

    /// Build the wire form `"<source>-<target>"` without validating it.
    ///
    /// The translate service is the one that validates what it receives.
    pub fn compose(source: &str, target: &str) -> String {
        format!("{}-{}", source, target)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl FromStr for ModelId {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// One candidate language proposed by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageCandidate {
    pub language: String,
    pub confidence: f64,
}

/// Provider answer to an identify call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentificationResult {
    #[serde(default)]
    pub languages: Vec<LanguageCandidate>,
}

impl IdentificationResult {
    /// Highest-confidence candidate. Ties go to the first one seen.
    pub fn best(&self) -> Result<&LanguageCandidate> {
        let mut candidates = self.languages.iter();
        let first = candidates.next().ok_or(ServiceError::EmptyIdentification)?;

        Ok(candidates.fold(first, |best, candidate| {
            if candidate.confidence > best.confidence {
                candidate
            } else {
                best
            }
        }))
    }
}

/// How provider translation segments collapse into one output string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentPolicy {
    /// Keep only the final segment
    #[default]
    Last,
    /// Join every segment with a single space
    Join,
}

impl fmt::Display for SegmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentPolicy::Last => write!(f, "last"),
            SegmentPolicy::Join => write!(f, "join"),
        }
    }
}

/// One translated segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSegment {
    pub translation: String,
}

/// Provider answer to a translate call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationResult {
    #[serde(default)]
    pub translations: Vec<TranslationSegment>,
    #[serde(default)]
    pub word_count: Option<u64>,
    #[serde(default)]
    pub character_count: Option<u64>,
}

impl TranslationResult {
    /// Collapse the segments according to `policy`
    pub fn collapse(&self, policy: SegmentPolicy) -> Result<String> {
        if self.translations.is_empty() {
            return Err(ServiceError::InvalidResponse {
                message: "No translation segments in response".to_string(),
            });
        }

        let output = match policy {
            SegmentPolicy::Last => self
                .translations
                .last()
                .map(|s| s.translation.clone())
                .unwrap_or_default(),
            SegmentPolicy::Join => self
                .translations
                .iter()
                .map(|s| s.translation.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        };

        Ok(output)
    }
}

/// Messages shown on the translate page, built fresh for each response
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    entries: Vec<String>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message; later pushes display first
    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    pub fn most_recent_first(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().rev().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(language: &str, confidence: f64) -> LanguageCandidate {
        LanguageCandidate {
            language: language.to_string(),
            confidence,
        }
    }

    fn segments(texts: &[&str]) -> TranslationResult {
        TranslationResult {
            translations: texts
                .iter()
                .map(|t| TranslationSegment {
                    translation: t.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_model_parse_extracts_pair() {
        for (code, source, target) in [("fr-en", "fr", "en"), ("en-es", "en", "es"), ("zh-de", "zh", "de")] {
            let model = ModelId::parse(code).unwrap();
            assert_eq!(model.source(), source);
            assert_eq!(model.target(), target);
            assert_eq!(model.to_string(), code);
        }
    }

    #[test]
    fn test_model_parse_rejects_malformed() {
        for code in ["", "fr", "fr-", "fr-enx", "fre-en", "FR-EN", "fr_en", "zh-TW-en", " fr-en"] {
            match ModelId::parse(code) {
                Err(ServiceError::MalformedModelCode { code: c }) => assert_eq!(c, code),
                other => panic!("expected MalformedModelCode for {:?}, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_compose() {
        assert_eq!(ModelId::compose("fr", "en"), "fr-en");
        assert_eq!("de-en".parse::<ModelId>().unwrap().source(), "de");
    }

    #[test]
    fn test_language_code() {
        assert!(is_language_code("en"));
        assert!(!is_language_code("eng"));
        assert!(!is_language_code("EN"));
    }

    #[test]
    fn test_best_picks_highest_confidence() {
        let result = IdentificationResult {
            languages: vec![candidate("en", 0.1), candidate("fr", 0.85), candidate("it", 0.05)],
        };
        assert_eq!(result.best().unwrap().language, "fr");
    }

    #[test]
    fn test_best_tie_goes_to_first_seen() {
        let result = IdentificationResult {
            languages: vec![candidate("es", 0.4), candidate("pt", 0.4), candidate("gl", 0.2)],
        };
        assert_eq!(result.best().unwrap().language, "es");
    }

    #[test]
    fn test_best_with_zero_confidence_keeps_first() {
        let result = IdentificationResult {
            languages: vec![candidate("af", 0.0), candidate("nl", 0.0)],
        };
        assert_eq!(result.best().unwrap().language, "af");
    }

    #[test]
    fn test_best_empty_is_error() {
        let result = IdentificationResult::default();
        assert!(matches!(result.best(), Err(ServiceError::EmptyIdentification)));
    }

    #[test]
    fn test_collapse_last_segment() {
        let result = segments(&["Hola", "Hola mundo"]);
        assert_eq!(result.collapse(SegmentPolicy::Last).unwrap(), "Hola mundo");
    }

    #[test]
    fn test_collapse_join_segments() {
        let result = segments(&["Hola", "Hola mundo"]);
        assert_eq!(result.collapse(SegmentPolicy::Join).unwrap(), "Hola Hola mundo");
    }

    #[test]
    fn test_collapse_empty_is_invalid_response() {
        let result = segments(&[]);
        assert!(matches!(
            result.collapse(SegmentPolicy::Last),
            Err(ServiceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_chat_history_order() {
        let mut history = ChatHistory::new();
        history.push("Hello world");
        history.push("# Bonjour le monde");

        let shown: Vec<&str> = history.most_recent_first().collect();
        assert_eq!(shown, vec!["# Bonjour le monde", "Hello world"]);
    }

    #[test]
    fn test_provider_payload_decoding() {
        let identify: IdentificationResult = serde_json::from_str(
            r#"{"languages":[{"language":"fr","confidence":0.98},{"language":"en","confidence":0.01}]}"#,
        )
        .unwrap();
        assert_eq!(identify.best().unwrap().language, "fr");

        let translate: TranslationResult = serde_json::from_str(
            r#"{"translations":[{"translation":"Hello world"}],"word_count":3,"character_count":16}"#,
        )
        .unwrap();
        assert_eq!(translate.word_count, Some(3));
        assert_eq!(translate.collapse(SegmentPolicy::Last).unwrap(), "Hello world");
    }
}

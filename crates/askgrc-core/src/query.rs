//! Query preprocessing: cleaning, keyword extraction and coarse intent
//! classification. Everything downstream (lexical search, rerank boosts,
//! cache keys) operates on the cleaned form produced here.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Coarse question intent, decided by ordered keyword checks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Definition,
    Procedure,
    Explanation,
    Temporal,
    Location,
    Compliance,
    Risk,
    #[default]
    General,
}

/// A question after preprocessing. Immutable once produced; the embedding
/// is attached by the engine via [`ProcessedQuery::with_embedding`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedQuery {
    pub original: String,
    pub cleaned: String,
    /// Deduplicated, stop-word-filtered tokens in first-occurrence order.
    pub keywords: Vec<String>,
    pub intent: QueryIntent,
    pub embedding: Vec<f32>,
}

impl ProcessedQuery {
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "has", "had", "was", "our",
    "out", "its", "this", "that", "from", "they", "will", "have", "been", "were", "each", "their",
    "would", "there", "about", "could", "should", "which", "what", "when", "where", "who", "how",
    "why", "does", "with", "into", "than", "then", "them",
];

// Ordered: first matching pattern group wins.
const DEFINITION_PATTERNS: &[&str] = &["what is", "what are", "define", "definition", "meaning of"];
const PROCEDURE_PATTERNS: &[&str] = &["how to", "how do", "how can", "steps", "procedure", "process for"];
const EXPLANATION_PATTERNS: &[&str] = &["why", "explain", "how does", "how is"];
const TEMPORAL_PATTERNS: &[&str] = &["when", "how often", "deadline", "frequency", "schedule"];
const LOCATION_PATTERNS: &[&str] = &["where"];
const COMPLIANCE_PATTERNS: &[&str] =
    &["comply", "compliance", "requirement", "required", "mandatory", "regulation", "control"];
const RISK_PATTERNS: &[&str] = &["risk", "threat", "vulnerability", "impact", "likelihood"];

/// Normalize a raw question and derive keywords and intent.
///
/// Fails with `Validation` when nothing is left after cleaning.
pub fn prepare(question: &str) -> Result<ProcessedQuery> {
    let cleaned = clean(question);
    if cleaned.is_empty() {
        return Err(EngineError::Validation("question is empty".to_string()));
    }
    let keywords = extract_keywords(&cleaned);
    let intent = classify_intent(&cleaned);
    Ok(ProcessedQuery {
        original: question.to_string(),
        cleaned,
        keywords,
        intent,
        embedding: Vec::new(),
    })
}

/// Trim, lowercase, strip punctuation to whitespace, collapse whitespace.
fn clean(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_keywords(cleaned: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();
    for token in cleaned.split_whitespace() {
        if token.len() <= 2 || STOP_WORDS.contains(&token) {
            continue;
        }
        if seen.insert(token.to_string()) {
            keywords.push(token.to_string());
        }
    }
    keywords
}

fn classify_intent(cleaned: &str) -> QueryIntent {
    let groups: &[(&[&str], QueryIntent)] = &[
        (DEFINITION_PATTERNS, QueryIntent::Definition),
        (PROCEDURE_PATTERNS, QueryIntent::Procedure),
        (EXPLANATION_PATTERNS, QueryIntent::Explanation),
        (TEMPORAL_PATTERNS, QueryIntent::Temporal),
        (LOCATION_PATTERNS, QueryIntent::Location),
        (COMPLIANCE_PATTERNS, QueryIntent::Compliance),
        (RISK_PATTERNS, QueryIntent::Risk),
    ];
    for (patterns, intent) in groups {
        if patterns.iter().any(|p| cleaned.contains(p)) {
            return *intent;
        }
    }
    QueryIntent::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(clean("  What,   is -- MFA?!  "), "what is mfa");
    }

    #[test]
    fn empty_after_cleaning_is_rejected() {
        assert!(prepare("  ?!... ").is_err());
        assert!(prepare("").is_err());
    }

    #[test]
    fn keywords_drop_short_tokens_and_stop_words() {
        let q = prepare("What is the access control policy for the access review?").unwrap();
        assert_eq!(q.keywords, vec!["access", "control", "policy", "review"]);
    }

    #[test]
    fn keyword_order_preserves_first_occurrence() {
        let q = prepare("policy review policy audit").unwrap();
        assert_eq!(q.keywords, vec!["policy", "review", "audit"]);
    }

    #[test]
    fn intent_first_match_wins() {
        // "what is" (definition) appears before "risk" would match.
        assert_eq!(prepare("What is the risk appetite?").unwrap().intent, QueryIntent::Definition);
        assert_eq!(prepare("how to rotate credentials").unwrap().intent, QueryIntent::Procedure);
        assert_eq!(prepare("deadline for the annual audit").unwrap().intent, QueryIntent::Temporal);
        assert_eq!(
            prepare("mandatory encryption settings").unwrap().intent,
            QueryIntent::Compliance
        );
        assert_eq!(prepare("likelihood of data loss").unwrap().intent, QueryIntent::Risk);
        assert_eq!(prepare("tell me something").unwrap().intent, QueryIntent::General);
    }
}

//! Human-readable reasons for a suggestion.
//!
//! Reasons come from words both profiles use, plus a shared connection
//! preference. The list is never empty.

use std::collections::BTreeSet;

use crate::domain::models::Profile;

/// Shown when nothing else survives.
pub const FALLBACK_REASON: &str = "Complementary interests worth exploring";

const MAX_OVERLAP_REASONS: usize = 3;
const MIN_TOKEN_CHARS: usize = 5;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "enjoy",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "like", "love", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "out", "over", "own", "really", "same", "she", "should", "so",
    "some", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "thing", "things", "this", "those", "through", "to", "too", "under", "until", "up", "very",
    "want", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "you", "your", "yours",
];

/// Lowercase, strip punctuation, split on whitespace, drop stopwords.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn interest_text(profile: &Profile) -> String {
    format!("{} {}", profile.niche_interest, profile.project)
}

/// Tokens longer than four characters present in both texts, in lexicographic order.
fn shared_tokens(a: &str, b: &str) -> Vec<String> {
    let left = tokenize(a);
    let right = tokenize(b);
    left.intersection(&right)
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .cloned()
        .collect()
}

pub fn generate_reasons(source: &Profile, candidate: Option<&Profile>) -> Vec<String> {
    let Some(candidate) = candidate else {
        return vec![FALLBACK_REASON.to_string()];
    };

    let mut reasons: Vec<String> = shared_tokens(&interest_text(source), &interest_text(candidate))
        .into_iter()
        .map(|t| format!("Shared interest: {t}"))
        .collect();

    if let (Some(a), Some(b)) = (source.rabbit_hole.as_deref(), candidate.rabbit_hole.as_deref()) {
        reasons.extend(shared_tokens(a, b).into_iter().map(|t| format!("Shared rabbit hole: {t}")));
    }
    reasons.truncate(MAX_OVERLAP_REASONS);

    if source.connection_type == candidate.connection_type {
        reasons.push(format!("Both looking for {}", source.connection_type));
    }

    if reasons.is_empty() {
        reasons.push(FALLBACK_REASON.to_string());
    }
    reasons
}

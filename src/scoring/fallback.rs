//! Deterministic keyword fallback.
//!
//! When the LLM evidence pipeline is unusable, pseudo-signals are derived
//! from the vacancy text: stop-word-filtered terms ranked by frequency, with
//! a case-insensitive containment check standing in for evidence mapping.
//! The pseudo-signals then flow through the identical composite formula, so
//! the fallback stays bounded and shaped like the scored path.

use super::{score, EvidenceItem, GateFlags, MatchScore, SignalType, FALLBACK_KEYWORD_V1};

/// Number of ranked vacancy terms turned into pseudo-signals.
const KEYWORD_COUNT: usize = 12;
/// Minimum token length considered a keyword.
const MIN_TOKEN_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "your", "our", "are", "will", "have", "has", "this",
    "that", "from", "into", "their", "they", "them", "who", "what", "when", "where", "how",
    "can", "all", "any", "not", "but", "more", "than", "its", "also", "was", "were", "been",
    "being", "other", "such", "about", "over", "under", "work", "working", "team", "role",
    "job", "candidate", "experience", "years", "year", "ability", "strong", "skills", "must",
    "should", "would", "could", "per", "plus", "etc", "including", "required", "preferred",
    "knowledge", "join", "across", "within", "using", "well", "each", "both", "may", "new",
];

/// Rank vacancy terms by frequency, most frequent first.
///
/// Tokenization is lowercase alphanumeric runs; ties break alphabetically so
/// the ranking is stable across runs.
pub fn ranked_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .filter(|t| !STOP_WORDS.contains(t))
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
    {
        *counts.entry(token.to_string()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(t, _)| t).collect()
}

/// Strength derived from how often a term appears in the resume text.
fn containment_strength(term: &str, resume_lower: &str) -> (bool, f64) {
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = resume_lower[start..].find(term) {
        count += 1;
        start += pos + term.len();
    }
    if count == 0 {
        (false, 0.0)
    } else {
        (true, (0.5 + 0.1 * count as f64).min(0.9))
    }
}

/// Build pseudo-signals from the vacancy description.
///
/// The top-ranked terms take the heavier signal types: ranks 0–3 are core,
/// 4–7 must-have, the rest nice-to-have. No responsibility signals are
/// synthesized; that group scores neutral.
pub fn keyword_evidence(
    vacancy_text: &str,
    base_resume: &str,
    tailored_resume: &str,
) -> Vec<EvidenceItem> {
    let base_lower = base_resume.to_lowercase();
    let tailored_lower = tailored_resume.to_lowercase();

    ranked_keywords(vacancy_text, KEYWORD_COUNT)
        .into_iter()
        .enumerate()
        .map(|(rank, term)| {
            let signal_type = match rank {
                0..=3 => SignalType::Core,
                4..=7 => SignalType::MustHave,
                _ => SignalType::NiceToHave,
            };
            let (present_before, strength_before) = containment_strength(&term, &base_lower);
            let (present_after, strength_after) = containment_strength(&term, &tailored_lower);
            EvidenceItem {
                signal_type,
                name: term,
                strength_before,
                strength_after,
                present_before,
                present_after,
                evidence_before: vec![],
                evidence_after: vec![],
            }
        })
        .collect()
}

/// Full fallback path: derive pseudo-signals and run the shared composite.
pub fn score_match_fallback(
    vacancy_text: &str,
    base_resume: &str,
    tailored_resume: &str,
) -> MatchScore {
    let items = keyword_evidence(vacancy_text, base_resume, tailored_resume);
    tracing::info!(
        signals = items.len(),
        "Scoring via keyword fallback instead of LLM evidence"
    );
    score(
        base_resume,
        tailored_resume,
        &items,
        GateFlags::default(),
        FALLBACK_KEYWORD_V1,
    )
}

//! Human-quality component.
//!
//! Scored purely from resume text, independent of any vacancy signal. Starts
//! at 82 and subtracts penalties for clichéd phrasing, inflated vocabulary,
//! monotonous sentence openers, and excessive length.

/// Phrases that read as resume boilerplate.
const CLICHES: &[&str] = &[
    "results-driven",
    "results driven",
    "team player",
    "go-getter",
    "detail-oriented",
    "detail oriented",
    "self-starter",
    "think outside the box",
    "proven track record",
    "hard worker",
    "fast-paced environment",
    "synergy",
    "dynamic professional",
    "passionate about",
];

const BASE_SCORE: f64 = 82.0;
const CLICHE_PENALTY: f64 = 2.0;
const CLICHE_PENALTY_CAP: f64 = 16.0;
const WORD_LENGTH_PENALTY: f64 = 3.0;
const WORD_LENGTH_THRESHOLD: f64 = 7.0;
const LINE_START_PENALTY: f64 = 5.0;
const LINE_START_UNIQUE_RATIO: f64 = 0.5;
const LENGTH_PENALTY_CAP: f64 = 8.0;
const LENGTH_FREE_CHARS: usize = 5_000;

/// Score resume prose quality in [0, 100].
///
/// Deterministic: the same text always yields the same score.
pub fn human_quality(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let mut score = BASE_SCORE;

    score -= cliche_penalty(&lower);

    if average_word_length(&lower) > WORD_LENGTH_THRESHOLD {
        score -= WORD_LENGTH_PENALTY;
    }

    if line_start_unique_ratio(&lower) < LINE_START_UNIQUE_RATIO {
        score -= LINE_START_PENALTY;
    }

    score -= length_penalty(text);

    score.clamp(0.0, 100.0)
}

/// −2 per clichéd-phrase occurrence, capped at −16.
fn cliche_penalty(lower: &str) -> f64 {
    let occurrences: usize = CLICHES.iter().map(|c| count_occurrences(lower, c)).sum();
    (occurrences as f64 * CLICHE_PENALTY).min(CLICHE_PENALTY_CAP)
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        start += pos + needle.len();
    }
    count
}

fn average_word_length(lower: &str) -> f64 {
    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let letters: usize = words
        .iter()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).count())
        .sum();
    letters as f64 / words.len() as f64
}

/// Fraction of non-empty lines whose first word is unique across the text.
fn line_start_unique_ratio(lower: &str) -> f64 {
    let starts: Vec<&str> = lower
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    if starts.is_empty() {
        return 1.0;
    }
    let mut unique: Vec<&str> = starts.clone();
    unique.sort_unstable();
    unique.dedup();
    unique.len() as f64 / starts.len() as f64
}

/// Up to −8 for text beyond the free-length allowance, one point per extra
/// thousand characters.
fn length_penalty(text: &str) -> f64 {
    let over = text.chars().count().saturating_sub(LENGTH_FREE_CHARS);
    ((over as f64) / 1_000.0).min(LENGTH_PENALTY_CAP)
}

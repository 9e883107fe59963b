//! Best-effort repair of truncated JSON.
//!
//! A provider hitting its output-token cap truncates mid-object. The repair
//! routine progressively trims the tail of the malformed payload (bounded to
//! ~20% of its length), re-closes any open strings, braces, and brackets
//! with an explicit stack-based scanner, and re-parses after each trim.

use serde_json::Value;

/// Fraction of the payload the repair loop may discard from the tail.
const MAX_TRIM_FRACTION: f64 = 0.2;
/// Number of trim steps attempted across the allowed range.
const TRIM_STEPS: usize = 32;

/// Attempt to recover a JSON value from a truncated payload.
///
/// Returns `None` when no prefix within the trim budget parses.
pub fn repair_truncated_json(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let floor = raw.len() - ((raw.len() as f64) * MAX_TRIM_FRACTION) as usize;
    let step = ((raw.len() - floor) / TRIM_STEPS).max(1);

    let mut end = raw.len();
    while end >= floor.max(1) {
        let end_at_boundary = prev_char_boundary(raw, end);
        let candidate = close_delimiters(&raw[..end_at_boundary]);
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            if value.is_object() || value.is_array() {
                return Some(value);
            }
        }
        if end_at_boundary <= floor.max(1) {
            break;
        }
        end = end_at_boundary.saturating_sub(step);
    }
    None
}

fn prev_char_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Close whatever the prefix left open: an unterminated string, then every
/// unclosed brace/bracket in reverse open order. A dangling comma or colon
/// is patched so the closers parse.
fn close_delimiters(prefix: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in prefix.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut repaired = String::with_capacity(prefix.len() + stack.len() + 8);
    repaired.push_str(prefix);

    if in_string {
        // A trailing backslash would escape our closing quote.
        if escaped {
            repaired.pop();
        }
        repaired.push('"');
    }

    let trimmed_len = repaired.trim_end().len();
    repaired.truncate(trimmed_len);
    match repaired.chars().last() {
        Some(',') => {
            repaired.pop();
        }
        Some(':') => repaired.push_str(" null"),
        _ => {}
    }

    for closer in stack.into_iter().rev() {
        repaired.push(closer);
    }
    repaired
}

//! JSON payload extraction from raw model output.
//!
//! Models wrap JSON unpredictably: fenced code blocks, prose around a bare
//! object, or a clean payload. The extractor tries, in order, fenced-block
//! capture, first balanced-object capture, then falls back to the whole
//! trimmed response.

/// Extract the most plausible JSON payload from raw response text.
pub fn extract_json_payload(raw: &str) -> &str {
    if let Some(fenced) = fenced_block(raw) {
        return fenced;
    }
    if let Some(object) = first_balanced_object(raw) {
        return object;
    }
    if let Some(tail) = unclosed_fence_tail(raw) {
        return tail;
    }
    raw.trim()
}

/// Capture the body of the first fenced code block (```json ... ``` or a
/// bare ``` fence).
fn fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_fence = &raw[open + 3..];
    // Skip an optional language tag up to the end of the fence line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    let captured = body[..close].trim();
    if captured.is_empty() {
        None
    } else {
        Some(captured)
    }
}

/// Capture the body after a fence opener that never closes.
///
/// A response truncated by an output-token cap loses its closing fence along
/// with the object's tail; stripping the opener here leaves the truncated
/// JSON itself for the repair pass.
fn unclosed_fence_tail(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_fence = &raw[open + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = after_fence[body_start..].trim();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

/// Capture the first `{ ... }` span with balanced braces, honoring strings
/// and escapes.
fn first_balanced_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

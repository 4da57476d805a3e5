use serde::de::DeserializeOwned;

use crate::error::{AiError, Result};

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code blocks from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Pull the JSON object out of free-form model output.
///
/// Accepts a bare object, an object inside a code fence, or an object embedded
/// in prose (everything between the first `{` and the last `}`).
pub fn extract_json(text: &str) -> Result<&str> {
    let trimmed = strip_code_blocks(text);
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Ok(trimmed);
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&trimmed[start..=end]),
        _ => Err(AiError::Unparseable(
            truncate_to_char_boundary(trimmed, 200).to_string(),
        )),
    }
}

/// Tolerant decode: strict parse first, then the recovered JSON substring.
pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    if let Ok(value) = serde_json::from_str(text.trim()) {
        return Ok(value);
    }
    let candidate = extract_json(text)?;
    serde_json::from_str(candidate).map_err(|e| AiError::Unparseable(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        ok: bool,
    }

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn test_truncate_within_bounds() {
        let text = "Hello";
        assert_eq!(truncate_to_char_boundary(text, 100), "Hello");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }

    #[test]
    fn extract_json_finds_object_inside_prose() {
        let text = "Sure! Here you go: {\"ok\": true} Let me know.";
        assert_eq!(extract_json(text).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn extract_json_rejects_text_without_braces() {
        let err = extract_json("no json here").unwrap_err();
        assert!(matches!(err, AiError::Unparseable(_)));
    }

    #[test]
    fn extract_json_rejects_reversed_braces() {
        assert!(extract_json("} then {").is_err());
    }

    #[test]
    fn decode_json_strict_path() {
        let v: Verdict = decode_json("{\"ok\": false}").unwrap();
        assert_eq!(v, Verdict { ok: false });
    }

    #[test]
    fn decode_json_recovers_fenced_object() {
        let v: Verdict = decode_json("```json\n{\"ok\": true}\n```").unwrap();
        assert_eq!(v, Verdict { ok: true });
    }

    #[test]
    fn decode_json_wrong_shape_is_unparseable() {
        let err = decode_json::<Verdict>("answer: {\"nope\": 1}").unwrap_err();
        assert!(matches!(err, AiError::Unparseable(_)));
    }
}

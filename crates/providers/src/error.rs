//! Best-effort extraction of a human-readable message from API failures.
//!
//! Gemini error bodies are JSON with an `error.message` field, but they
//! reach us embedded in larger error strings. The chain is: embedded JSON
//! `error.message` if present, otherwise the raw text.

use serde_json::Value;

/// Pull a readable message out of an error string that may contain an
/// embedded JSON error body.
pub fn extract_error_message(raw: &str) -> String {
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&raw[start..=end]) {
                if let Some(message) = value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                {
                    return message.to_string();
                }
            }
        }
    }
    raw.to_string()
}

/// Format an error for display as a transcript entry.
pub fn format_ai_error(err: &anyhow::Error) -> String {
    format_error_text(&err.to_string())
}

/// Same as [`format_ai_error`] but for messages already carried as text
/// (mid-stream `StreamChunk::Error` payloads).
pub fn format_error_text(raw: &str) -> String {
    format!("Error: {}", extract_error_message(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(extract_error_message("connection refused"), "connection refused");
    }

    #[test]
    fn test_embedded_json_error_message() {
        let raw = "gemini error: 400 Bad Request\n\
                   {\"error\":{\"code\":400,\"message\":\"API key not valid\",\"status\":\"INVALID_ARGUMENT\"}}";
        assert_eq!(extract_error_message(raw), "API key not valid");
    }

    #[test]
    fn test_json_without_error_message_falls_back() {
        let raw = "status 500 {\"detail\":\"boom\"}";
        assert_eq!(extract_error_message(raw), raw);
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let raw = "oops {not json";
        assert_eq!(extract_error_message(raw), raw);
    }

    #[test]
    fn test_format_ai_error_prefix() {
        let err = anyhow!("timed out");
        assert_eq!(format_ai_error(&err), "Error: timed out");
    }
}

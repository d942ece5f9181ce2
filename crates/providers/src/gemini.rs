//! Gemini client: one non-streaming call (profile analysis) and one
//! streaming call driving the panel transcript.
//!
//! Streaming contract: if the request fails *before* any chunk is received
//! (client construction, HTTP status), `generate_stream` returns `Err(...)`.
//! Once streaming has started, problems are surfaced as
//! `StreamChunk::Error` and the method returns `Ok(())`; normal exhaustion
//! sends `StreamChunk::Done`.

use anyhow::{anyhow, Result};
use base64::Engine;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use shared::chat::{ConversationTurn, StreamChunk};
use shared::media::MediaFetcher;
use shared::settings::GeminiModel;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Raised synchronously, before any network call.
pub const MISSING_KEY_MESSAGE: &str =
    "Gemini API key is not configured in assistant settings.";

/// Framing text prepended to every streaming request, ahead of the
/// configured system instruction.
const STRATEGY_PREAMBLE: &str = "Sales context and your core instruction:\n";
const STRATEGY_TASK: &str = "\n\nYour task: analyze this chat, identify the \
    client's key needs or objections, and suggest options for the optimal \
    next message. If you see media (voice, video), analyze its content.";
const HISTORY_HEADER: &str = "\n\nChat history:\n";

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

/// A single content part: exactly one of `text` or `inline_data` is set.
#[derive(Debug, Clone, Serialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(GeminiInlineData {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            }),
        }
    }
}

/// Extract display text from a response or stream-chunk body.
///
/// The decode is deliberately tolerant: a top-level `text` string first,
/// then the first `candidates[0].content.parts[0]` entry. If the part's
/// `text` is unexpectedly structured, it is serialized and returned anyway
/// so the caller always receives visible output.
fn extract_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
        return Some(text.to_string());
    }

    let part = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?;

    match part.get("text") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            warn!("gemini returned a structured value instead of text: {}", other);
            Some(other.to_string())
        }
        None => None,
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    pub(crate) api_key: String,
    pub(crate) model: GeminiModel,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: GeminiModel) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!(MISSING_KEY_MESSAGE));
        }
        Ok(Self {
            http: SHARED_HTTP.clone(),
            api_key: api_key.to_string(),
            model,
        })
    }

    pub fn model(&self) -> GeminiModel {
        self.model
    }

    /// One-shot generation from a single prompt string.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE,
            self.model.as_str(),
            self.api_key
        );
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart::text(prompt)],
            }],
        };
        let resp = self.http.post(url).json(&req).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let body: Value = resp.json().await?;
        Ok(extract_text(&body).unwrap_or_default())
    }

    /// Streaming generation over a rendered conversation history.
    ///
    /// Builds the part list (instruction preamble, per-turn labelled text
    /// with inline media resolved through `fetcher`), opens the SSE call
    /// and forwards every extracted fragment as `StreamChunk::Text`.
    pub async fn generate_stream(
        &self,
        system_instruction: &str,
        turns: &[ConversationTurn],
        fetcher: &dyn MediaFetcher,
        tx: UnboundedSender<StreamChunk>,
    ) -> Result<()> {
        let parts = build_request_parts(system_instruction, turns, fetcher).await;
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            API_BASE,
            self.model.as_str(),
            self.api_key
        );
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts,
            }],
        };
        let resp = self.http.post(url).json(&req).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let mut parser = crate::sse::SseParser::new();
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    let _ = tx.send(StreamChunk::Error(format!("stream read error: {}", e)));
                    return Ok(());
                }
            };
            for payload in parser.feed(&bytes) {
                match serde_json::from_str::<Value>(&payload) {
                    Ok(value) => {
                        if let Some(text) = extract_text(&value) {
                            if !text.is_empty() {
                                let _ = tx.send(StreamChunk::Text(text));
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(StreamChunk::Error(format!(
                            "Failed to parse stream chunk: {}",
                            e
                        )));
                        return Ok(());
                    }
                }
            }
        }

        let _ = tx.send(StreamChunk::Done);
        Ok(())
    }
}

/// Render the system instruction and conversation history into the part
/// list of a streaming request.
///
/// Each turn contributes a `<Label>: <text>` fragment, its resolved inline
/// media (if any) and a separator. A failed media fetch degrades to a
/// placeholder text fragment; the rest of the request is still built.
async fn build_request_parts(
    system_instruction: &str,
    turns: &[ConversationTurn],
    fetcher: &dyn MediaFetcher,
) -> Vec<GeminiPart> {
    let mut parts = Vec::with_capacity(turns.len() * 2 + 2);
    parts.push(GeminiPart::text(format!(
        "{}{}{}",
        STRATEGY_PREAMBLE, system_instruction, STRATEGY_TASK
    )));
    parts.push(GeminiPart::text(HISTORY_HEADER));

    for turn in turns {
        parts.push(GeminiPart::text(format!(
            "{}: {}",
            turn.speaker.label(),
            turn.text
        )));
        if let Some(media) = &turn.media {
            match fetcher.fetch(&media.handle, &media.mime_type).await {
                Ok(bytes) => {
                    parts.push(GeminiPart::inline_data(&media.mime_type, &bytes));
                }
                Err(e) => {
                    warn!("failed to load media {} for analysis: {}", media.handle, e);
                    parts.push(GeminiPart::text(format!(
                        "[Failed to load media: {}]",
                        media.handle
                    )));
                }
            }
        }
        parts.push(GeminiPart::text("\n"));
    }

    parts
}

async fn status_error(resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let detail: String = body.chars().take(800).collect();
    if detail.trim().is_empty() {
        anyhow!("gemini error: {}", status)
    } else {
        anyhow!("gemini error: {}\n{}", status, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use shared::chat::{MediaKind, MediaRef, Speaker};
    use shared::media::MediaError;

    struct FixedFetcher {
        bytes: Option<Vec<u8>>,
    }

    #[async_trait]
    impl MediaFetcher for FixedFetcher {
        async fn fetch(&self, handle: &str, _mime_type: &str) -> Result<Vec<u8>, MediaError> {
            match &self.bytes {
                Some(bytes) => Ok(bytes.clone()),
                None => Err(MediaError::NotFound {
                    handle: handle.to_string(),
                }),
            }
        }
    }

    fn voice_turn(text: &str) -> ConversationTurn {
        ConversationTurn {
            speaker: Speaker::Other,
            text: text.to_string(),
            media: Some(MediaRef {
                handle: "document42".to_string(),
                mime_type: "audio/ogg".to_string(),
                kind: MediaKind::Voice,
            }),
        }
    }

    #[test]
    fn test_missing_key_fails_before_any_network_call() {
        let err = GeminiClient::new("", GeminiModel::Flash25).unwrap_err();
        assert_eq!(err.to_string(), MISSING_KEY_MESSAGE);
    }

    #[test]
    fn test_extract_text_top_level_field() {
        let value = json!({"text": "hello"});
        assert_eq!(extract_text(&value).as_deref(), Some("hello"));
    }

    #[test]
    fn test_extract_text_nested_candidate_path() {
        let value = json!({
            "candidates": [{"content": {"parts": [{"text": "fragment"}]}}]
        });
        assert_eq!(extract_text(&value).as_deref(), Some("fragment"));
    }

    #[test]
    fn test_extract_text_structured_value_is_serialized() {
        let value = json!({
            "candidates": [{"content": {"parts": [{"text": {"odd": true}}]}}]
        });
        let out = extract_text(&value).unwrap();
        assert!(out.contains("odd"));
    }

    #[test]
    fn test_extract_text_absent() {
        assert_eq!(extract_text(&json!({"candidates": []})), None);
    }

    #[tokio::test]
    async fn test_build_parts_inlines_fetched_media() {
        let fetcher = FixedFetcher {
            bytes: Some(vec![1, 2, 3]),
        };
        let parts = build_request_parts("sys", &[voice_turn("hi")], &fetcher).await;

        // preamble, header, turn text, inline media, separator
        assert_eq!(parts.len(), 5);
        assert!(parts[0].text.as_deref().unwrap().contains("sys"));
        assert_eq!(parts[2].text.as_deref(), Some("User: hi"));
        let inline = parts[3].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "audio/ogg");
        assert_eq!(inline.data, base64::engine::general_purpose::STANDARD.encode([1, 2, 3]));
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_placeholder() {
        let fetcher = FixedFetcher { bytes: None };
        let turns = vec![
            voice_turn("first"),
            ConversationTurn {
                speaker: Speaker::Me,
                text: "second".to_string(),
                media: None,
            },
        ];
        let parts = build_request_parts("sys", &turns, &fetcher).await;

        // Every turn still contributes its text part.
        let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        assert!(texts.contains(&"User: first"));
        assert!(texts.contains(&"Me: second"));
        assert!(texts.iter().any(|t| t.contains("[Failed to load media: document42]")));
        assert!(parts.iter().all(|p| p.inline_data.is_none()));
    }
}

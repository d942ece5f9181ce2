//! Conversation types shared between the panel and the provider client.

use serde::{Deserialize, Serialize};

/// Who produced a message in the source conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    /// The account owner (outgoing messages).
    Me,
    /// The other party.
    Other,
}

impl Speaker {
    /// Label used when rendering the history into request text.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Me => "Me",
            Speaker::Other => "User",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Voice,
    Video,
    Photo,
}

/// An attachment to be resolved and inlined into a request: an opaque
/// handle understood by the application's media subsystem plus a MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub handle: String,
    pub mime_type: String,
    pub kind: MediaKind,
}

/// One logical message in the projected conversation history.
/// At most one media attachment per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub media: Option<MediaRef>,
}

// ── Source message log (inbound collaborator, read-only) ─────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceContent {
    pub id: i64,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoContent {
    pub id: i64,
    pub mime_type: Option<String>,
    pub is_round: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoContent {
    pub id: i64,
}

/// A raw message record from the application's message log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMessage {
    pub id: i64,
    pub is_outgoing: bool,
    /// Unix timestamp in seconds.
    pub date: i64,
    #[serde(default)]
    pub is_service: bool,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<VoiceContent>,
    #[serde(default)]
    pub photo: Option<PhotoContent>,
    #[serde(default)]
    pub video: Option<VideoContent>,
    #[serde(default)]
    pub transcription_id: Option<String>,
}

// ── Transcript (displayed panel messages) ────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptRole {
    User,
    Assistant,
}

/// One displayed panel message. Created when a request starts and mutated
/// by appending streamed fragments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: u64,
    pub role: TranscriptRole,
    pub text: String,
    pub is_streaming: bool,
}

/// One unit of a streaming generation response.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    Text(String),
    Done,
    Error(String),
}

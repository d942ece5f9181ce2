//! Panel controller: owns the displayed transcript and drives analysis
//! and send requests through the streaming client.
//!
//! One controller exists per panel. Requests run to completion inside the
//! calling task (`&mut self`), so at most one stream mutates the
//! transcript at a time; the `loading` flag additionally drops
//! mini-analysis and send triggers that arrive while a request is active.

use crate::prompt;
use anyhow::Result;
use providers::client::ClientSlot;
use providers::error::{format_ai_error, format_error_text};
use shared::chat::{
    ConversationTurn, MediaKind, Speaker, StreamChunk, TranscriptEntry, TranscriptRole,
};
use shared::media::MediaFetcher;
use shared::settings::{AssistantSettings, GeminiModel};
use std::collections::HashSet;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

const PROFILE_ANALYSIS_PROMPT: &str = "Act as an expert psychologist and sales \
    specialist. Analyze the user's profile data (name, bio, public details) \
    and write a brief portrait of the contact: likely interests, communication \
    style and the best way to approach them.\n\nProfile data:\n";

pub struct PanelController {
    settings: AssistantSettings,
    transcript: Vec<TranscriptEntry>,
    /// Monotonic id source; never reset, so ids stay unique across
    /// conversation switches.
    next_entry_id: u64,
    loading: bool,
    has_auto_analyzed: bool,
    observed_len: usize,
    conversation: Option<String>,
    enabled_chats: HashSet<String>,
    panel_open: bool,
    client: ClientSlot,
}

impl PanelController {
    pub fn new(settings: AssistantSettings) -> Self {
        Self {
            settings,
            transcript: Vec::new(),
            next_entry_id: 0,
            loading: false,
            has_auto_analyzed: false,
            observed_len: 0,
            conversation: None,
            enabled_chats: HashSet::new(),
            panel_open: false,
            client: ClientSlot::new(),
        }
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// Replace settings wholesale (the save action). The client slot picks
    /// up a changed credential or model on the next request.
    pub fn apply_settings(&mut self, settings: AssistantSettings) {
        self.settings = settings;
        self.settings.normalize();
    }

    pub fn select_model(&mut self, model: GeminiModel) {
        self.settings.model = model;
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // ── Panel visibility ─────────────────────────────────────────────

    /// Enabling the panel for a chat also opens it; disabling leaves the
    /// open flag alone.
    pub fn toggle_for_chat(&mut self, chat_id: &str, enabled: bool) {
        if enabled {
            self.enabled_chats.insert(chat_id.to_string());
            self.panel_open = true;
        } else {
            self.enabled_chats.remove(chat_id);
        }
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    pub fn is_open_for(&self, chat_id: &str) -> bool {
        self.panel_open && self.enabled_chats.contains(chat_id)
    }

    // ── Conversation lifecycle ───────────────────────────────────────

    /// Switch to another conversation: the transcript is cleared and the
    /// next observation runs auto-analysis again.
    pub fn set_conversation(&mut self, chat_id: Option<String>) {
        self.conversation = chat_id;
        self.transcript.clear();
        self.has_auto_analyzed = false;
        self.observed_len = 0;
    }

    pub fn conversation(&self) -> Option<&str> {
        self.conversation.as_deref()
    }

    /// React to the current projected history.
    ///
    /// The first observation with a credential configured runs one
    /// auto-analysis seeding the transcript. Afterwards, growth of the
    /// history whose newest turn is from the other party triggers one
    /// mini-analysis of that turn.
    pub async fn observe(
        &mut self,
        history: &[ConversationTurn],
        dossier: &str,
        fetcher: &dyn MediaFetcher,
    ) {
        if self.settings.api_key.is_empty() {
            self.observed_len = history.len();
            return;
        }

        if !self.has_auto_analyzed {
            self.has_auto_analyzed = true;
            self.observed_len = history.len();
            if history.is_empty() {
                return;
            }
            self.transcript.clear();
            let entry_idx = self.push_entry(TranscriptRole::Assistant, String::new(), true);
            let system = prompt::auto_analysis_prompt(&self.settings, dossier);
            self.run_stream(entry_idx, system, history.to_vec(), fetcher)
                .await;
            return;
        }

        let grew = history.len() > self.observed_len;
        self.observed_len = history.len();
        if grew {
            if let Some(last) = history.last().cloned() {
                if last.speaker == Speaker::Other {
                    self.mini_analysis(last, dossier, fetcher).await;
                }
            }
        }
    }

    /// One-shot mini-analysis of a single incoming turn, using the text or
    /// photo prompt variant. Does not touch the projected history.
    async fn mini_analysis(
        &mut self,
        turn: ConversationTurn,
        dossier: &str,
        fetcher: &dyn MediaFetcher,
    ) {
        if self.loading {
            return;
        }

        let is_photo = turn
            .media
            .as_ref()
            .map(|m| m.kind == MediaKind::Photo)
            .unwrap_or(false);
        let prompt_text = if is_photo {
            prompt::mini_photo_prompt(&self.settings, &turn.text)
        } else {
            prompt::mini_text_prompt(&self.settings, &turn.text)
        };
        let system = prompt::main_prompt(&self.settings, dossier);

        let request_turn = ConversationTurn {
            speaker: Speaker::Other,
            text: prompt_text,
            media: turn.media,
        };

        let entry_idx = self.push_entry(TranscriptRole::Assistant, String::new(), true);
        self.run_stream(entry_idx, system, vec![request_turn], fetcher)
            .await;
    }

    /// Handle user-submitted text: append a user entry and a streaming
    /// assistant entry driven from the full history plus the new message.
    pub async fn send(
        &mut self,
        text: &str,
        history: &[ConversationTurn],
        dossier: &str,
        fetcher: &dyn MediaFetcher,
    ) {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.loading {
            return;
        }

        self.push_entry(TranscriptRole::User, trimmed.to_string(), false);
        let entry_idx = self.push_entry(TranscriptRole::Assistant, String::new(), true);

        let system = prompt::main_prompt(&self.settings, dossier);
        let mut turns = history.to_vec();
        // The typed message joins the rendered history under the `User:`
        // label, like any other incoming turn.
        turns.push(ConversationTurn {
            speaker: Speaker::Other,
            text: trimmed.to_string(),
            media: None,
        });

        self.run_stream(entry_idx, system, turns, fetcher).await;
    }

    /// One-shot, non-streaming portrait of the conversation partner from
    /// serialized profile data.
    pub async fn analyze_profile(&mut self, profile_data: &str) -> Result<String> {
        let client = self
            .client
            .get(&self.settings.api_key, self.settings.model)?
            .clone();
        client
            .generate(&format!("{}{}", PROFILE_ANALYSIS_PROMPT, profile_data))
            .await
    }

    // ── Internals ────────────────────────────────────────────────────

    fn push_entry(&mut self, role: TranscriptRole, text: String, is_streaming: bool) -> usize {
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        self.transcript.push(TranscriptEntry {
            id,
            role,
            text,
            is_streaming,
        });
        self.transcript.len() - 1
    }

    /// Drive one streaming request into the given transcript entry.
    ///
    /// Fragments append to the entry text as they arrive; any failure is
    /// formatted once and appended, and the streaming flag is always
    /// cleared on the way out.
    async fn run_stream(
        &mut self,
        entry_idx: usize,
        system_instruction: String,
        turns: Vec<ConversationTurn>,
        fetcher: &dyn MediaFetcher,
    ) {
        self.loading = true;

        let result = match self.client.get(&self.settings.api_key, self.settings.model) {
            Ok(client) => {
                let client = client.clone();
                let (tx, rx) = unbounded_channel();
                let entry = &mut self.transcript[entry_idx];
                let (result, ()) = tokio::join!(
                    client.generate_stream(&system_instruction, &turns, fetcher, tx),
                    collect_stream(entry, rx)
                );
                result
            }
            Err(e) => Err(e),
        };

        let entry = &mut self.transcript[entry_idx];
        if let Err(e) = result {
            append_error(entry, &format_ai_error(&e));
        }
        entry.is_streaming = false;
        self.loading = false;
    }
}

/// Append stream chunks to the entry until the stream ends or errors.
async fn collect_stream(entry: &mut TranscriptEntry, mut rx: UnboundedReceiver<StreamChunk>) {
    while let Some(chunk) = rx.recv().await {
        match chunk {
            StreamChunk::Text(fragment) => entry.text.push_str(&fragment),
            StreamChunk::Done => break,
            StreamChunk::Error(message) => {
                append_error(entry, &format_error_text(&message));
                break;
            }
        }
    }
}

/// Accumulated fragments stay visible; the error string follows them.
fn append_error(entry: &mut TranscriptEntry, formatted: &str) {
    if !entry.text.is_empty() {
        entry.text.push('\n');
    }
    entry.text.push_str(formatted);
}

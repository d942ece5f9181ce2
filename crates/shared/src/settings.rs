//! Assistant settings: credential, model selection, prompt templates and
//! media caps. Persisted as JSON by `panel::store` and replaced wholesale
//! on save.

use serde::{Deserialize, Serialize};

/// Google Gemini API supports at most 10 inline media files per kind.
pub const MAX_MEDIA_CAP: u8 = 10;

/// The generation models the panel can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeminiModel {
    #[serde(rename = "gemini-2.5-flash")]
    Flash25,
    #[serde(rename = "gemini-2.5-flash-lite")]
    Flash25Lite,
    #[serde(rename = "gemini-2.5-pro")]
    Pro25,
    #[serde(rename = "gemini-2.5-pro-lite")]
    Pro25Lite,
    #[serde(rename = "gemini-2.0-flash")]
    Flash20,
    #[serde(rename = "gemini-2.0-flash-lite")]
    Flash20Lite,
    #[serde(rename = "gemini-3-flash-preview")]
    Flash3Preview,
}

impl GeminiModel {
    pub fn all() -> &'static [GeminiModel] {
        &[
            GeminiModel::Flash25,
            GeminiModel::Flash25Lite,
            GeminiModel::Pro25,
            GeminiModel::Pro25Lite,
            GeminiModel::Flash20,
            GeminiModel::Flash20Lite,
            GeminiModel::Flash3Preview,
        ]
    }

    /// Model identifier as used in API paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeminiModel::Flash25 => "gemini-2.5-flash",
            GeminiModel::Flash25Lite => "gemini-2.5-flash-lite",
            GeminiModel::Pro25 => "gemini-2.5-pro",
            GeminiModel::Pro25Lite => "gemini-2.5-pro-lite",
            GeminiModel::Flash20 => "gemini-2.0-flash",
            GeminiModel::Flash20Lite => "gemini-2.0-flash-lite",
            GeminiModel::Flash3Preview => "gemini-3-flash-preview",
        }
    }

    /// Human-readable name for pickers.
    pub fn display_name(&self) -> &'static str {
        match self {
            GeminiModel::Flash25 => "Gemini 2.5 Flash",
            GeminiModel::Flash25Lite => "Gemini 2.5 Flash Lite",
            GeminiModel::Pro25 => "Gemini 2.5 Pro",
            GeminiModel::Pro25Lite => "Gemini 2.5 Pro Lite",
            GeminiModel::Flash20 => "Gemini 2.0 Flash",
            GeminiModel::Flash20Lite => "Gemini 2.0 Flash Lite",
            GeminiModel::Flash3Preview => "Gemini 3 Flash Preview",
        }
    }
}

impl Default for GeminiModel {
    fn default() -> Self {
        GeminiModel::Flash25
    }
}

fn default_enabled_models() -> Vec<GeminiModel> {
    vec![
        GeminiModel::Flash25,
        GeminiModel::Flash25Lite,
        GeminiModel::Flash3Preview,
    ]
}

fn default_media_cap() -> u8 {
    5
}

fn default_prompt_main() -> String {
    "You are a professional AI assistant embedded in a messenger. \
     Answer as briefly as possible, to the point, without filler.\n\n\
     CONTACT DETAILS:\n{user_dossier}\n\n\
     INSTRUCTION AND CONTEXT:\n{sales_context}"
        .to_string()
}

fn default_prompt_auto_analysis() -> String {
    "Analyze this chat and give a very short summary (2-3 sentences) \
     and recommendations in markdown.\n\n\
     USER DOSSIER:\n{user_dossier}\n\n{sales_context}"
        .to_string()
}

fn default_prompt_mini_text() -> String {
    "The contact just wrote a new message:\n\"{text}\"\n\n\
     Give an instant, very short analysis or an idea for a reply \
     (1-2 sentences max). No fluff."
        .to_string()
}

fn default_prompt_mini_photo() -> String {
    "The contact just sent a photo.{caption}\n\n\
     Give an instant, very short analysis of the photo for a reply \
     (1-2 sentences max). No fluff."
        .to_string()
}

/// Panel settings, mutated only through an explicit save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSettings {
    /// Gemini API key. Empty means "not configured".
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: GeminiModel,
    /// Free-text sales context inserted into prompt templates.
    #[serde(default)]
    pub sales_context: String,
    /// Models offered in the quick switcher. Never empty.
    #[serde(default = "default_enabled_models")]
    pub enabled_models: Vec<GeminiModel>,
    /// Most-recent round videos kept as inline media in the projected history.
    #[serde(default = "default_media_cap")]
    pub max_videos: u8,
    /// Most-recent voice messages kept as inline media.
    #[serde(default = "default_media_cap")]
    pub max_voices: u8,
    #[serde(default = "default_prompt_main")]
    pub prompt_main: String,
    #[serde(default = "default_prompt_auto_analysis")]
    pub prompt_auto_analysis: String,
    #[serde(default = "default_prompt_mini_text")]
    pub prompt_mini_text: String,
    #[serde(default = "default_prompt_mini_photo")]
    pub prompt_mini_photo: String,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: GeminiModel::default(),
            sales_context: String::new(),
            enabled_models: default_enabled_models(),
            max_videos: default_media_cap(),
            max_voices: default_media_cap(),
            prompt_main: default_prompt_main(),
            prompt_auto_analysis: default_prompt_auto_analysis(),
            prompt_mini_text: default_prompt_mini_text(),
            prompt_mini_photo: default_prompt_mini_photo(),
        }
    }
}

impl AssistantSettings {
    /// Toggle a model in the enabled set. Removing the last enabled model
    /// is a no-op so the quick switcher is never empty.
    pub fn toggle_model(&mut self, model: GeminiModel) {
        if let Some(pos) = self.enabled_models.iter().position(|m| *m == model) {
            if self.enabled_models.len() > 1 {
                self.enabled_models.remove(pos);
            }
        } else {
            self.enabled_models.push(model);
        }
    }

    pub fn is_model_enabled(&self, model: GeminiModel) -> bool {
        self.enabled_models.contains(&model)
    }

    /// Repair invariants after deserializing external state: a non-empty
    /// enabled set and caps within the API limit.
    pub fn normalize(&mut self) {
        if self.enabled_models.is_empty() {
            self.enabled_models = default_enabled_models();
        }
        self.max_videos = self.max_videos.min(MAX_MEDIA_CAP);
        self.max_voices = self.max_voices.min(MAX_MEDIA_CAP);
    }
}

//! Settings persistence: one JSON file, replaced wholesale on save.
//!
//! Missing or unreadable state falls back to defaults so the panel always
//! starts with a usable configuration.

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use shared::settings::AssistantSettings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const SETTINGS_FILE: &str = "assistant_settings.json";

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store under the platform config directory.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "chat-copilot")
            .ok_or_else(|| anyhow!("could not determine config directory"))?;
        Ok(Self {
            path: dirs.config_dir().join(SETTINGS_FILE),
        })
    }

    /// Store at an explicit path (tests, embedding apps with their own
    /// state directory).
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, applying defaults when the file is absent or does
    /// not parse, and repairing invariants either way.
    pub fn load(&self) -> AssistantSettings {
        let mut settings = match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<AssistantSettings>(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("settings file unreadable, using defaults: {}", e);
                    AssistantSettings::default()
                }
            },
            Err(_) => AssistantSettings::default(),
        };
        settings.normalize();
        settings
    }

    /// Replace the persisted settings wholesale.
    pub fn save(&self, settings: &AssistantSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

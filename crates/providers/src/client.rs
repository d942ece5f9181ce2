//! Credential-keyed client slot.
//!
//! The panel holds one of these for its own lifetime: the client is built
//! lazily on first use and rebuilt whenever the credential or model it was
//! built with changes. Replacement is a plain assignment on the owning
//! side, not a shared singleton.

use crate::gemini::GeminiClient;
use anyhow::Result;
use shared::settings::GeminiModel;

#[derive(Default)]
pub struct ClientSlot {
    api_key: String,
    model: Option<GeminiModel>,
    client: Option<GeminiClient>,
}

impl ClientSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a client for the given credential and model, constructing
    /// or replacing the cached one as needed.
    pub fn get(&mut self, api_key: &str, model: GeminiModel) -> Result<&GeminiClient> {
        let stale =
            self.client.is_none() || self.api_key != api_key || self.model != Some(model);
        if stale {
            self.client = Some(GeminiClient::new(api_key, model)?);
            self.api_key = api_key.to_string();
            self.model = Some(model);
        }
        Ok(self.client.as_ref().expect("client slot populated"))
    }
}

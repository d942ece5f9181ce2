//! Chat-assistant side panel core: projects the active conversation into
//! a capped history, composes prompts from templates, and drives streaming
//! analysis requests into a displayed transcript.

pub mod controller;
pub mod dossier;
pub mod history;
pub mod markdown;
pub mod prompt;
pub mod store;

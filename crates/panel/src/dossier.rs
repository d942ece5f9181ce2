//! User dossier text built from the other party's profile, inserted into
//! prompt templates via the `{user_dossier}` placeholder.

use serde::{Deserialize, Serialize};

pub const NO_PROFILE_DATA: &str = "No data about the user.";

/// Public profile fields of the conversation partner, as exposed by the
/// embedding application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

/// Render the dossier lines. `None` yields the fixed fallback line.
pub fn build_dossier(profile: Option<&PeerProfile>) -> String {
    let profile = match profile {
        Some(profile) => profile,
        None => return NO_PROFILE_DATA.to_string(),
    };

    let mut dossier = format!("Name: {} {}\n", profile.first_name, profile.last_name);
    if let Some(username) = profile.username.as_deref().filter(|u| !u.is_empty()) {
        dossier.push_str(&format!("Username: @{}\n", username));
    }
    if let Some(bio) = profile.bio.as_deref().filter(|b| !b.is_empty()) {
        dossier.push_str(&format!("Bio: {}\n", bio));
    }
    if profile.is_premium {
        dossier.push_str("Premium account: yes\n");
    }
    dossier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_profile_uses_fallback() {
        assert_eq!(build_dossier(None), NO_PROFILE_DATA);
    }

    #[test]
    fn test_full_profile() {
        let profile = PeerProfile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: Some("ada".to_string()),
            bio: Some("Analyst".to_string()),
            is_premium: true,
        };
        let dossier = build_dossier(Some(&profile));
        assert!(dossier.contains("Name: Ada Lovelace"));
        assert!(dossier.contains("Username: @ada"));
        assert!(dossier.contains("Bio: Analyst"));
        assert!(dossier.contains("Premium account: yes"));
    }

    #[test]
    fn test_empty_optional_fields_are_skipped() {
        let profile = PeerProfile {
            first_name: "Ada".to_string(),
            ..Default::default()
        };
        let dossier = build_dossier(Some(&profile));
        assert!(!dossier.contains("Username"));
        assert!(!dossier.contains("Bio"));
        assert!(!dossier.contains("Premium"));
    }
}

//! Prompt composition: pure `{name}` substitution over the configured
//! templates. Values are inserted literally; there is no escaping and no
//! recursive expansion.

use shared::settings::AssistantSettings;

/// Replace each `{name}` occurrence with its value. Placeholders absent
/// from the template leave it unchanged.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in values {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}

/// Main system instruction: platform persona plus dossier and sales context.
pub fn main_prompt(settings: &AssistantSettings, dossier: &str) -> String {
    render_template(
        &settings.prompt_main,
        &[
            ("user_dossier", dossier),
            ("sales_context", &settings.sales_context),
        ],
    )
}

/// Instruction for the one-time analysis run when a conversation is opened.
pub fn auto_analysis_prompt(settings: &AssistantSettings, dossier: &str) -> String {
    render_template(
        &settings.prompt_auto_analysis,
        &[
            ("user_dossier", dossier),
            ("sales_context", &settings.sales_context),
        ],
    )
}

/// Per-message mini-analysis for a plain text message.
pub fn mini_text_prompt(settings: &AssistantSettings, text: &str) -> String {
    render_template(&settings.prompt_mini_text, &[("text", text)])
}

/// Per-message mini-analysis for a photo. The caption slot renders as
/// ` With caption: "<text>"` when the message carried text, empty otherwise.
pub fn mini_photo_prompt(settings: &AssistantSettings, caption: &str) -> String {
    let caption_fragment = if caption.is_empty() {
        String::new()
    } else {
        format!(" With caption: \"{}\"", caption)
    };
    render_template(&settings.prompt_mini_photo, &[("caption", &caption_fragment)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_named_placeholders() {
        let out = render_template("a {x} and {y}", &[("x", "1"), ("y", "2")]);
        assert_eq!(out, "a 1 and 2");
    }

    #[test]
    fn test_absent_placeholder_leaves_template_unchanged() {
        let template = "no slots here";
        assert_eq!(render_template(template, &[("x", "1")]), template);
    }

    #[test]
    fn test_value_containing_braces_is_inserted_literally() {
        let out = render_template("{x}", &[("x", "{y}")]);
        assert_eq!(out, "{y}");
    }

    #[test]
    fn test_main_prompt_fills_dossier_and_context() {
        let mut settings = AssistantSettings::default();
        settings.sales_context = "sell boats".to_string();
        let out = main_prompt(&settings, "Name: Ada");
        assert!(out.contains("Name: Ada"));
        assert!(out.contains("sell boats"));
        assert!(!out.contains("{user_dossier}"));
        assert!(!out.contains("{sales_context}"));
    }

    #[test]
    fn test_mini_photo_prompt_with_and_without_caption() {
        let settings = AssistantSettings::default();
        let with = mini_photo_prompt(&settings, "look at this");
        assert!(with.contains(" With caption: \"look at this\""));

        let without = mini_photo_prompt(&settings, "");
        assert!(!without.contains("With caption"));
        assert!(!without.contains("{caption}"));
    }

    #[test]
    fn test_mini_text_prompt_embeds_message() {
        let settings = AssistantSettings::default();
        let out = mini_text_prompt(&settings, "how much?");
        assert!(out.contains("how much?"));
    }
}

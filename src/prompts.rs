//! Instruction template for the Lessons Learned summary.
//!
//! The whole request is one user message: the instruction, the slide text
//! verbatim, and an example of the colon-header / hyphen-bullet layout that
//! [`crate::pipeline::sections::parse_sections`] understands. Keeping the
//! template here lets tests inspect it without a provider.
//!
//! Callers can override it via [`crate::config::GenerationConfig::prompt`];
//! an override must contain [`TEXT_PLACEHOLDER`].

/// Marker replaced with the extracted slide text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Section names the model is asked to produce, in document order.
pub const REQUIRED_SECTIONS: [&str; 4] = [
    "Title",
    "Event Summary",
    "Contributing Factors",
    "Lessons Learned",
];

/// Default instruction template.
pub const DEFAULT_PROMPT: &str = r#"From the following incident investigation presentation text, create a concise Serious Event Lessons Learned document containing ONLY:

- Brief, clear title/headline
- Event Summary (brief, readable paragraph)
- Clearly listed contributing factors
- Clearly listed lessons learned

DO NOT INCLUDE sensitive operational details or any unnecessary internal information.

Here is the presentation text:
{text}

Format:
Title:
Event Summary:
Contributing Factors:
- factor 1
- factor 2
Lessons Learned:
- lesson 1
- lesson 2"#;

/// Embed `text` into `template` (or [`DEFAULT_PROMPT`] when `None`).
///
/// Only the first placeholder is substituted, so slide text that happens to
/// contain `{text}` is passed through untouched.
pub fn build_prompt(template: Option<&str>, text: &str) -> String {
    let template = template.unwrap_or(DEFAULT_PROMPT);
    template.replacen(TEXT_PLACEHOLDER, text, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_names_every_section() {
        for name in REQUIRED_SECTIONS {
            assert!(
                DEFAULT_PROMPT.contains(&format!("{name}:")),
                "missing header {name}"
            );
        }
    }

    #[test]
    fn default_prompt_excludes_sensitive_detail() {
        assert!(DEFAULT_PROMPT.contains("DO NOT INCLUDE sensitive operational details"));
    }

    #[test]
    fn build_prompt_embeds_text_verbatim() {
        let text = "Slide 1: Pump P-101 tripped\nRoot cause: seal failure\n";
        let prompt = build_prompt(None, text);
        assert!(prompt.contains(text));
        assert!(!prompt.contains(TEXT_PLACEHOLDER));
    }

    #[test]
    fn build_prompt_uses_custom_template() {
        let prompt = build_prompt(Some("Summarise:\n{text}\nEnd"), "abc");
        assert_eq!(prompt, "Summarise:\nabc\nEnd");
    }

    #[test]
    fn build_prompt_leaves_placeholder_inside_text_alone() {
        let prompt = build_prompt(Some("<{text}>"), "literal {text}");
        assert_eq!(prompt, "<literal {text}>");
    }
}

//! Silent control directives carried over the chat channel.
//!
//! A directive is plain text with a well-known prefix. Both sides treat it
//! as an instruction to the agent, never as conversation: the sender does
//! not render it, and the receiver must drop it before it reaches the
//! transcript.

pub const LANGUAGE_DIRECTIVE_PREFIX: &str = "From now on only respond in";

pub fn is_directive(text: &str) -> bool {
    text.starts_with(LANGUAGE_DIRECTIVE_PREFIX)
}

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("fa", "فارسی"),
    ("ar", "العربية"),
    ("fr", "Français"),
];

pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Format the outbound language-change directive for a language code.
/// Returns `None` for codes the UI does not offer.
pub fn language_directive(code: &str) -> Option<String> {
    language_name(code).map(|name| format!("{LANGUAGE_DIRECTIVE_PREFIX} {name} language"))
}

//! Post-processing of generated replies into display markup.
//!
//! The markup is a small HTML subset: `<ul>`, `<li>`, `<p>` and `<strong>`.
//! Only `*` is recognised as a bullet marker and as an emphasis delimiter;
//! other conventions pass through untouched.

use regex::Regex;
use std::sync::OnceLock;

/// Shown when the service answers without a usable candidate
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process that.";

/// Shown when the request itself fails
pub const ERROR_REPLY: &str = "Error processing request.";

pub const DEFAULT_PERSONA: &str = "SwiftAid bot";

/// Self-introductions the provider uses that are replaced by the persona
const SELF_IDENTIFICATIONS: &[&str] = &["I am a large language model, trained by Google."];

/// Asking for this (any case) disables list formatting
const PARAGRAPH_REQUEST: &str = "i want it as a para";

fn emphasis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*(.*?)\*").expect("valid emphasis regex"))
}

pub fn apply_persona(reply: &str, persona: &str) -> String {
    let replacement = format!("I'm {}", persona);
    SELF_IDENTIFICATIONS
        .iter()
        .fold(reply.to_string(), |acc, phrase| acc.replace(phrase, &replacement))
}

pub fn wants_paragraph(input: &str) -> bool {
    input.to_lowercase().contains(PARAGRAPH_REQUEST)
}

/// Bullet lines become list items, everything else a paragraph.
/// Blank lines become empty paragraphs, so an empty reply still renders.
fn format_lines(reply: &str) -> String {
    let body: String = reply
        .split('\n')
        .map(|line| match line.strip_prefix('*') {
            Some(rest) => format!("<li>{}</li>", rest.trim()),
            None => format!("<p>{}</p>", line.trim()),
        })
        .collect();
    format!("<ul>{}</ul>", body)
}

pub fn embolden(markup: &str) -> String {
    emphasis_re()
        .replace_all(markup, "<strong>$1</strong>")
        .into_owned()
}

/// Full pipeline: persona substitution, layout, then emphasis.
pub fn format_reply(input: &str, reply: &str, persona: &str) -> String {
    let reply = escape(&apply_persona(reply, persona));
    let laid_out = if wants_paragraph(input) {
        format!("<p>{}</p>", reply)
    } else {
        format_lines(&reply)
    };
    embolden(&laid_out)
}

/// Escape markup-significant characters in untrusted service text
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

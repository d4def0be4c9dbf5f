//! Minimal HTML rendering for the front-end pages

use crate::core::models::ChatHistory;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const TRANSLATE_TEMPLATE: &str = include_str!("../../templates/translate.html");

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub(crate) fn index_page(title: &str) -> String {
    INDEX_TEMPLATE.replace("{{title}}", &escape_html(title))
}

/// Translate page listing `history` most recent first
pub(crate) fn translate_page(title: &str, history: &ChatHistory) -> String {
    let messages = history
        .most_recent_first()
        .map(|message| format!("    <li>{}</li>", escape_html(message)))
        .collect::<Vec<_>>()
        .join("\n");

    TRANSLATE_TEMPLATE
        .replace("{{title}}", &escape_html(title))
        .replace("{{messages}}", &messages)
}

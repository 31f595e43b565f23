//! Marks the words of the latest question inside retrieved snippets.
//!
//! Keywords are applied one after another in query order, over the output of
//! the previous pass. A keyword contained in an earlier one (or repeated in the
//! query) therefore wraps text that is already wrapped, producing nested
//! markers. That nesting is kept as observable behavior.

use regex::{Captures, RegexBuilder};
use tracing::warn;

/// Words ignored even when longer than three characters.
pub const STOP_WORDS: &[&str] = &[
    "como", "cómo", "para", "donde", "dónde", "cuando", "cuándo", "porque", "cuál", "cual",
    "este", "esta", "esto", "estos", "estas",
];

const STRIPPED_PUNCTUATION: &[char] = &['¿', '?', '.', '¡', '!', ',', ';', ':'];
const MIN_KEYWORD_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    pub open: &'a str,
    pub close: &'a str,
}

pub const HTML_MARKER: Marker<'static> = Marker {
    open: "<span class=\"highlight\">",
    close: "</span>",
};

pub fn extract_keywords(query: &str) -> Vec<String> {
    let normalized: String = query
        .to_lowercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    normalized
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

pub fn highlight(text: &str, keywords: &[String], marker: Marker<'_>) -> String {
    let mut highlighted = text.to_string();
    for keyword in keywords {
        let pattern = match RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern,
            Err(err) => {
                warn!(keyword = %keyword, error = %err, "skipping keyword that does not compile");
                continue;
            }
        };
        highlighted = pattern
            .replace_all(&highlighted, |caps: &Captures<'_>| {
                format!("{}{}{}", marker.open, &caps[0], marker.close)
            })
            .into_owned();
    }
    highlighted
}

/// Highlights `text` with the keywords of `query`.
pub fn highlight_for_query(text: &str, query: &str, marker: Marker<'_>) -> String {
    highlight(text, &extract_keywords(query), marker)
}

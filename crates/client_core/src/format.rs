//! Minimal markdown for assistant answers: bold, italic and line breaks.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use shared::domain::{Role, Turn};

use crate::highlight::Marker;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern must compile"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern must compile"));

/// Output markup for each supported markdown construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle<'a> {
    pub bold: Marker<'a>,
    pub italic: Marker<'a>,
    pub paragraph_break: &'a str,
    pub line_break: &'a str,
}

pub const HTML_STYLE: TextStyle<'static> = TextStyle {
    bold: Marker {
        open: "<strong>",
        close: "</strong>",
    },
    italic: Marker {
        open: "<em>",
        close: "</em>",
    },
    paragraph_break: "<br><br>",
    line_break: "<br>",
};

/// Bold runs before italic so `*x*` never matches inside `**x**`.
pub fn format_bot_text_with(text: &str, style: TextStyle<'_>) -> String {
    let text = BOLD.replace_all(text, wrap(style.bold));
    let text = ITALIC.replace_all(&text, wrap(style.italic));
    text.replace("\n\n", style.paragraph_break)
        .replace('\n', style.line_break)
}

fn wrap<'m>(marker: Marker<'m>) -> impl Fn(&Captures<'_>) -> String + 'm {
    move |caps: &Captures<'_>| format!("{}{}{}", marker.open, &caps[1], marker.close)
}

pub fn format_bot_text(text: &str) -> String {
    format_bot_text_with(text, HTML_STYLE)
}

pub fn render_turn_html(turn: &Turn) -> String {
    match turn.role {
        Role::User => turn.text.clone(),
        Role::Assistant => format_bot_text(&turn.text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_then_italic() {
        assert_eq!(format_bot_text("**Sí**"), "<strong>Sí</strong>");
        assert_eq!(
            format_bot_text("**negrita** y *cursiva*"),
            "<strong>negrita</strong> y <em>cursiva</em>"
        );
    }

    #[test]
    fn paragraph_and_line_breaks() {
        assert_eq!(format_bot_text("uno\n\ndos\ntres"), "uno<br><br>dos<br>tres");
    }

    #[test]
    fn emphasis_does_not_span_lines() {
        assert_eq!(format_bot_text("*a\nb*"), "*a<br>b*");
    }

    #[test]
    fn custom_style_keeps_plain_breaks() {
        let style = TextStyle {
            bold: Marker {
                open: "[b]",
                close: "[/b]",
            },
            italic: Marker {
                open: "[i]",
                close: "[/i]",
            },
            paragraph_break: "\n\n",
            line_break: "\n",
        };
        assert_eq!(
            format_bot_text_with("**Sí**\n\n*ok*\nfin", style),
            "[b]Sí[/b]\n\n[i]ok[/i]\nfin"
        );
    }

    #[test]
    fn user_turns_are_not_formatted() {
        assert_eq!(render_turn_html(&Turn::user("**hola**")), "**hola**");
        assert_eq!(
            render_turn_html(&Turn::assistant("**hola**")),
            "<strong>hola</strong>"
        );
    }
}

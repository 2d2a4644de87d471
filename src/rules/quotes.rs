use super::{Rule, finding};
use crate::config::QuoteStyle;
use crate::diagnostic::Diagnostic;
use crate::prose::{Paragraph, Prose};

/// Enforces one quotation style.
pub struct Quotes {
    style: QuoteStyle,
}

impl Quotes {
    pub fn new(style: QuoteStyle) -> Self {
        Self { style }
    }

    /// The replacement for `ch` at `offset`, when it is in the wrong style.
    fn preferred(&self, paragraph: &Paragraph, offset: usize, ch: char) -> Option<&'static str> {
        let text = paragraph.text();
        let before = text[..offset].chars().next_back();
        let after = text[offset + ch.len_utf8()..].chars().next();
        let inside_word = before.is_some_and(char::is_alphanumeric)
            && after.is_some_and(char::is_alphanumeric);
        let opening = before.is_none_or(|c| c.is_whitespace() || "([{".contains(c));

        match (self.style, ch) {
            (QuoteStyle::Straight, '\u{201C}' | '\u{201D}') => Some("\""),
            (QuoteStyle::Straight, '\u{2018}') => Some("'"),
            (QuoteStyle::Straight, '\u{2019}') if !inside_word => Some("'"),
            (QuoteStyle::Smart, '"') => Some(if opening { "\u{201C}" } else { "\u{201D}" }),
            (QuoteStyle::Smart, '\'') if inside_word => Some("\u{2019}"),
            (QuoteStyle::Smart, '\'') => Some(if opening { "\u{2018}" } else { "\u{2019}" }),
            _ => None,
        }
    }
}

impl Rule for Quotes {
    fn id(&self) -> &'static str {
        "quotes"
    }

    fn source(&self) -> &'static str {
        "typography"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        for paragraph in prose.paragraphs() {
            for (offset, ch) in paragraph.text().char_indices() {
                if let Some(expected) = self.preferred(paragraph, offset, ch) {
                    found.push(finding(
                        self,
                        paragraph,
                        offset..offset + ch.len_utf8(),
                        format!("Expected `{expected}`, not `{ch}`"),
                    ));
                }
            }
        }
        found
    }
}

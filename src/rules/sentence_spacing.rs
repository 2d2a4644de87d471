use super::{Rule, finding};
use crate::diagnostic::Diagnostic;
use crate::prose::Prose;
use regex::Regex;
use std::sync::LazyLock;

/// Sentence end (with an optional closing quote or bracket) and the run of
/// two or more spaces after it. Line breaks are layout, not spacing.
static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?]["'\u{201D}\u{2019})\]]?([ \t\u{A0}]{2,})\S"#).expect("valid pattern")
});

/// Expects a single space between sentences.
pub struct SentenceSpacing;

impl Rule for SentenceSpacing {
    fn id(&self) -> &'static str {
        "sentence-spacing"
    }

    fn source(&self) -> &'static str {
        "typography"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        prose
            .paragraphs()
            .iter()
            .flat_map(|paragraph| {
                PATTERN
                    .captures_iter(paragraph.text())
                    .filter_map(|caps| caps.get(1))
                    .map(move |spaces| {
                        finding(
                            self,
                            paragraph,
                            spaces.range(),
                            format!(
                                "Expected 1 space between sentences, not {}",
                                spaces.as_str().chars().count()
                            ),
                        )
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::check_text;

    #[test]
    fn flags_double_space() {
        let found = check_text(&SentenceSpacing, "<p>One.  Two.</p>");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].actual, "  ");
        assert_eq!(found[0].reason, "Expected 1 space between sentences, not 2");
        assert_eq!(found[0].position.map(|p| p.line), Some(1));
    }

    #[test]
    fn after_closing_quote() {
        let found = check_text(&SentenceSpacing, "<p>He said \"stop.\"   Then left.</p>");
        assert_eq!(found.len(), 1);
        assert!(found[0].reason.ends_with("not 3"));
    }

    #[test]
    fn single_spaces_and_line_breaks_pass() {
        assert!(check_text(&SentenceSpacing, "<p>One. Two!\n  Three?</p>").is_empty());
    }

    #[test]
    fn trailing_spaces_pass() {
        assert!(check_text(&SentenceSpacing, "<p>The end.   </p>").is_empty());
    }
}

use super::{Rule, finding, phrase_regex};
use crate::diagnostic::Diagnostic;
use crate::prose::Prose;
use regex::Regex;
use std::sync::LazyLock;

const PRESUMPTUOUS: &[&str] = &[
    "simply",
    "just",
    "easy",
    "easily",
    "obviously",
    "clearly",
    "of course",
    "basically",
    "merely",
    "everyone knows",
];

static PATTERN: LazyLock<Regex> = LazyLock::new(|| phrase_regex(PRESUMPTUOUS.iter().copied()));

/// Flags words that assume the reader already finds something easy.
pub struct Assuming;

impl Rule for Assuming {
    fn id(&self) -> &'static str {
        "assuming"
    }

    fn source(&self) -> &'static str {
        "style"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        prose
            .paragraphs()
            .iter()
            .flat_map(|paragraph| {
                PATTERN.find_iter(paragraph.text()).map(move |m| {
                    finding(
                        self,
                        paragraph,
                        m.range(),
                        format!("Reconsider using `{}`, it may not be obvious to everyone", m.as_str()),
                    )
                })
            })
            .collect()
    }
}

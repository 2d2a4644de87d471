use super::{Rule, finding};
use crate::diagnostic::Diagnostic;
use crate::prose::Prose;
use regex::Regex;
use std::sync::LazyLock;

/// Acronyms and the words their last letter already stands for.
const ACRONYMS: &[(&str, &[&str])] = &[
    ("ATM", &["machine"]),
    ("CPU", &["unit"]),
    ("GUI", &["interface"]),
    ("HIV", &["virus"]),
    ("HTML", &["language"]),
    ("ISBN", &["number"]),
    ("LCD", &["display"]),
    ("NIC", &["card"]),
    ("PDF", &["format"]),
    ("PIN", &["number"]),
    ("RAM", &["memory"]),
    ("SIM", &["card"]),
    ("UPC", &["code"]),
    ("URL", &["locator"]),
    ("VIN", &["number"]),
];

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = ACRONYMS
        .iter()
        .map(|(acronym, expansions)| format!("{acronym}\\s+(?i:{})", expansions.join("|")))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("acronym list must compile")
});

/// Flags acronyms followed by a word they already contain ("ATM machine").
pub struct RedundantAcronyms;

impl Rule for RedundantAcronyms {
    fn id(&self) -> &'static str {
        "redundant-acronyms"
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
                    let acronym = m.as_str().split_whitespace().next().unwrap_or_default();
                    finding(
                        self,
                        paragraph,
                        m.range(),
                        format!("Replace `{}` with `{acronym}`", m.as_str()),
                    )
                })
            })
            .collect()
    }
}

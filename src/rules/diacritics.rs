use super::{Rule, finding, phrase_regex};
use crate::diagnostic::Diagnostic;
use crate::prose::Prose;
use regex::Regex;
use std::sync::LazyLock;

/// Loanwords written without their accents, and the accented spelling.
const LOANWORDS: &[(&str, &str)] = &[
    ("a la carte", "à la carte"),
    ("a la mode", "à la mode"),
    ("cafe", "café"),
    ("cafes", "cafés"),
    ("cliche", "cliché"),
    ("cliches", "clichés"),
    ("creme brulee", "crème brûlée"),
    ("deja vu", "déjà vu"),
    ("entree", "entrée"),
    ("entrees", "entrées"),
    ("facade", "façade"),
    ("fiance", "fiancé"),
    ("fiancee", "fiancée"),
    ("naive", "naïve"),
    ("naivete", "naïveté"),
    ("protege", "protégé"),
    ("puree", "purée"),
    ("soiree", "soirée"),
    ("touche", "touché"),
    ("vis a vis", "vis-à-vis"),
];

static PATTERN: LazyLock<Regex> =
    LazyLock::new(|| phrase_regex(LOANWORDS.iter().map(|(plain, _)| *plain)));

/// Suggests the accented spelling of common loanwords.
pub struct Diacritics;

fn accented(matched: &str) -> Option<&'static str> {
    let key = matched
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    LOANWORDS
        .iter()
        .find(|(plain, _)| *plain == key)
        .map(|(_, accented)| *accented)
}

impl Rule for Diacritics {
    fn id(&self) -> &'static str {
        "diacritics"
    }

    fn source(&self) -> &'static str {
        "typography"
    }

    fn check(&self, prose: &Prose) -> Vec<Diagnostic> {
        prose
            .paragraphs()
            .iter()
            .flat_map(|paragraph| {
                PATTERN.find_iter(paragraph.text()).filter_map(move |m| {
                    let suggestion = accented(m.as_str())?;
                    Some(finding(
                        self,
                        paragraph,
                        m.range(),
                        format!("Replace `{}` with `{suggestion}`", m.as_str()),
                    ))
                })
            })
            .collect()
    }
}

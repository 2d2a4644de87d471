//! The prose rule chain.
//!
//! Each rule is an independent, pure unit: it reads the [`Prose`] view of a
//! filtered document and returns its findings. Rules never see each other's
//! output, so the chain could run them in any order; it runs them in
//! registration order only so reports read the same on every build.
//!
//! The chain is assembled once at startup ([`RuleChain::builtin`]) and shared
//! read-only by every document, across threads.
//!
//! | Order | Rule | Source | Finds |
//! |-------|------|--------|-------|
//! | 1 | `assuming` | style | presumptuous words like "simply", "just" |
//! | 2 | `diacritics` | typography | "cafe" instead of "café" |
//! | 3 | `equality` | inclusive | biased or insensitive phrasing |
//! | 4 | `indefinite-article` | grammar | "a apple", "an banana" |
//! | 5 | `redundant-acronyms` | style | "ATM machine" |
//! | 6 | `passive` | style | "was eaten" |
//! | 7 | `repeated-words` | grammar | "the the" |
//! | 8 | `sentence-spacing` | typography | two spaces after a full stop |
//! | 9 | `quotes` | typography | quotes not in the preferred style |

mod assuming;
mod diacritics;
mod equality;
mod indefinite_article;
mod passive;
mod quotes;
mod redundant_acronyms;
mod repeated_words;
mod sentence_spacing;

pub use assuming::Assuming;
pub use diacritics::Diacritics;
pub use equality::Equality;
pub use indefinite_article::IndefiniteArticle;
pub use passive::Passive;
pub use quotes::Quotes;
pub use redundant_acronyms::RedundantAcronyms;
pub use repeated_words::RepeatedWords;
pub use sentence_spacing::SentenceSpacing;

use crate::config::LintConfig;
use crate::diagnostic::{Diagnostic, Severity};
use crate::prose::{Paragraph, Prose};
use crate::tree::Node;
use regex::Regex;
use std::ops::Range;

/// Ids of the built-in rules, in registration order.
pub const BUILTIN_RULE_IDS: &[&str] = &[
    "assuming",
    "diacritics",
    "equality",
    "indefinite-article",
    "redundant-acronyms",
    "passive",
    "repeated-words",
    "sentence-spacing",
    "quotes",
];

/// A prose rule.
pub trait Rule: Send + Sync {
    /// Stable identifier, reported as `ruleId`.
    fn id(&self) -> &'static str;

    /// Namespace of the rule family.
    fn source(&self) -> &'static str;

    /// Findings for one document. Rules report [`Severity::Warning`]; the
    /// chain escalates configured rules to fatal.
    fn check(&self, prose: &Prose) -> Vec<Diagnostic>;
}

struct Registered {
    rule: Box<dyn Rule>,
    severity: Severity,
}

/// Ordered, immutable set of rules.
#[derive(Default)]
pub struct RuleChain {
    rules: Vec<Registered>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule whose findings are reported at (at least) `severity`.
    pub fn register(mut self, rule: Box<dyn Rule>, severity: Severity) -> Self {
        self.rules.push(Registered { rule, severity });
        self
    }

    /// The built-in rules minus disabled ones, with fatal escalations applied.
    pub fn builtin(config: &LintConfig) -> Self {
        let candidates: Vec<Box<dyn Rule>> = vec![
            Box::new(Assuming),
            Box::new(Diacritics),
            Box::new(Equality),
            Box::new(IndefiniteArticle),
            Box::new(RedundantAcronyms),
            Box::new(Passive),
            Box::new(RepeatedWords),
            Box::new(SentenceSpacing),
            Box::new(Quotes::new(config.quote_style)),
        ];

        candidates
            .into_iter()
            .filter(|rule| !config.disabled_rules.iter().any(|id| id == rule.id()))
            .fold(Self::new(), |chain, rule| {
                let severity = if config.fatal_rules.iter().any(|id| id == rule.id()) {
                    Severity::Fatal
                } else {
                    Severity::Warning
                };
                chain.register(rule, severity)
            })
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over a filtered tree: one sequence per rule, in
    /// registration order.
    pub fn run(&self, filtered: &Node) -> Vec<Vec<Diagnostic>> {
        let prose = Prose::from_tree(filtered);
        self.rules
            .iter()
            .map(|entry| {
                entry
                    .rule
                    .check(&prose)
                    .into_iter()
                    .map(|d| d.escalate(entry.severity))
                    .collect()
            })
            .collect()
    }
}

/// A warning from `rule` covering `span` of `paragraph`.
fn finding(
    rule: &dyn Rule,
    paragraph: &Paragraph,
    span: Range<usize>,
    reason: impl Into<String>,
) -> Diagnostic {
    Diagnostic::warning(
        rule.source(),
        rule.id(),
        reason,
        &paragraph.text()[span.clone()],
    )
    .with_position(paragraph.position_at(span.start))
}

/// Case-insensitive, word-bounded alternation of `phrases`. Spaces in a
/// phrase match any run of whitespace.
fn phrase_regex<'a>(phrases: impl IntoIterator<Item = &'a str>) -> Regex {
    let alternation = phrases
        .into_iter()
        .map(|p| regex::escape(p).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("phrase list must compile")
}

#[cfg(test)]
pub(crate) fn check_text(rule: &dyn Rule, html: &str) -> Vec<Diagnostic> {
    let tree = crate::tree::parse(html).unwrap();
    rule.check(&Prose::from_tree(&tree))
}

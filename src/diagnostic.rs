//! Findings produced by the rule chain and the parser.
//!
//! A [`Diagnostic`] is one finding. [`Diagnostics`] is everything found in
//! one document, flattened in rule registration order; it answers the gate
//! question ([`Diagnostics::has_fatal`]) and nothing else. Printing happens
//! at the boundary through a [`Reporter`], never inside the collector.

use crate::tree::{ParseError, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Namespace and id of the diagnostic emitted for unparseable documents.
pub const PARSER_SOURCE: &str = "parser";
pub const UNPARSEABLE_RULE_ID: &str = "unparseable";
pub const UNPARSEABLE_REASON: &str = "unparseable document";

/// Characters of source shown for a parse failure.
const EXCERPT_LEN: usize = 40;

/// Whether a finding blocks publication.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; never changes the build outcome.
    #[default]
    Warning,
    /// Blocks the document from being published.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Namespace of the rule family (`grammar`, `style`, `parser`, ...).
    pub source: String,
    /// Stable rule identifier within the namespace.
    pub rule_id: String,
    pub severity: Severity,
    /// Human-readable explanation.
    pub reason: String,
    /// The offending excerpt.
    pub actual: String,
    /// Location in the original document, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Diagnostic {
    pub fn new(
        source: &str,
        rule_id: &str,
        severity: Severity,
        reason: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            source: source.to_string(),
            rule_id: rule_id.to_string(),
            severity,
            reason: reason.into(),
            actual: actual.into(),
            position: None,
        }
    }

    pub fn warning(
        source: &str,
        rule_id: &str,
        reason: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(source, rule_id, Severity::Warning, reason, actual)
    }

    pub fn fatal(
        source: &str,
        rule_id: &str,
        reason: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(source, rule_id, Severity::Fatal, reason, actual)
    }

    /// The single fatal finding for a document the parser rejected.
    pub fn parse_failure(error: &ParseError, content: &str) -> Self {
        let position = error.position();
        Self::fatal(
            PARSER_SOURCE,
            UNPARSEABLE_RULE_ID,
            UNPARSEABLE_REASON,
            excerpt_at(content, position),
        )
        .with_position(Some(position))
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    /// Raise (never lower) the severity.
    pub fn escalate(mut self, severity: Severity) -> Self {
        self.severity = self.severity.max(severity);
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// The last [`EXCERPT_LEN`] characters of the last non-blank line at or
/// before `position`.
fn excerpt_at(content: &str, position: Position) -> String {
    let line = content
        .lines()
        .take(position.line)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or_default();
    let skip = line.chars().count().saturating_sub(EXCERPT_LEN);
    line.chars().skip(skip).collect()
}

/// All diagnostics for one document, in rule registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Flatten per-rule sequences, keeping their order.
    pub fn collect<I, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = Diagnostic>,
    {
        Self(sequences.into_iter().flatten().collect())
    }

    /// Whether any finding blocks publication.
    pub fn has_fatal(&self) -> bool {
        self.0.iter().any(Diagnostic::is_fatal)
    }

    pub fn fatal_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_fatal()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_warning()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Operator-facing sink for a document's findings.
///
/// Called once per document with its complete set, so output from documents
/// linted in parallel never interleaves within a document.
pub trait Reporter: Sync {
    fn report(&self, input_path: &Path, diagnostics: &Diagnostics);
}

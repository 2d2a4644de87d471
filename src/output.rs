//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Diagnostics (stderr, one block per document)
//!
//! ```text
//! WARN: grammar(repeated-words) src/posts/a.html:3 Expected `the` once, not 2 times "the the"
//! WARN: style(passive) src/posts/a.html:5 Don't use the passive voice "was eaten"
//! FATAL: parser(unparseable) src/broken.html:9 unparseable document "<div class=\"open"
//! ```
//!
//! `WARN` is yellow, `FATAL` red, the path cyan. Colors are dropped when
//! disabled or when stderr is not a terminal.
//!
//! ## Lint summary (stdout)
//!
//! ```text
//! Linted 12 documents (3 other files skipped)
//!     4 warnings, 1 fatal
//! Blocked
//!     src/broken.html (1 fatal)
//! ```
//!
//! ## Publish summary (stdout)
//!
//! ```text
//! Published 12 documents, copied 3 files → dist
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper or [`Reporter`] impl that does the
//! writing. Format functions are pure: no I/O, no side effects.

use crate::diagnostic::{Diagnostic, Diagnostics, Reporter, Severity};
use crate::site::{LintReport, PublishReport};
use colored::Colorize;
use std::io::Write;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn severity_label(severity: Severity, colored: bool) -> String {
    let label = match severity {
        Severity::Warning => "WARN",
        Severity::Fatal => "FATAL",
    };
    if !colored {
        return label.to_string();
    }
    match severity {
        Severity::Warning => label.yellow().bold().to_string(),
        Severity::Fatal => label.red().bold().to_string(),
    }
}

/// Format one diagnostic as a single report line.
///
/// ```text
/// WARN: grammar(repeated-words) posts/a.md:3 Expected `the` once, not 2 times "the the"
/// ```
pub fn format_diagnostic(input_path: &Path, diagnostic: &Diagnostic, colored: bool) -> String {
    let location = match diagnostic.position {
        Some(position) => format!("{}:{position}", input_path.display()),
        None => input_path.display().to_string(),
    };
    let location = if colored {
        location.cyan().to_string()
    } else {
        location
    };
    format!(
        "{}: {}({}) {} {} {:?}",
        severity_label(diagnostic.severity, colored),
        diagnostic.source,
        diagnostic.rule_id,
        location,
        diagnostic.reason,
        diagnostic.actual
    )
}

/// Format every diagnostic of one document, in order.
pub fn format_document_report(
    input_path: &Path,
    diagnostics: &Diagnostics,
    colored: bool,
) -> Vec<String> {
    diagnostics
        .iter()
        .map(|d| format_diagnostic(input_path, d, colored))
        .collect()
}

/// Writes each document's diagnostics to stderr as one uninterrupted block.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    colored: bool,
}

impl ConsoleReporter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, input_path: &Path, diagnostics: &Diagnostics) {
        let block = format_document_report(input_path, diagnostics, self.colored).join("\n");
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible to do if stderr is gone.
        let _ = writeln!(stderr, "{block}");
    }
}

/// Format the totals of a lint run, and which documents were blocked.
pub fn format_lint_summary(report: &LintReport) -> Vec<String> {
    let mut lines = Vec::new();

    let mut header = format!("Linted {}", plural(report.documents.len(), "document"));
    if report.skipped > 0 {
        header.push_str(&format!(" ({} skipped)", plural(report.skipped, "other file")));
    }
    lines.push(header);
    lines.push(format!(
        "{}{}, {} fatal",
        indent(1),
        plural(report.warning_count(), "warning"),
        report.fatal_count()
    ));

    if report.is_blocked() {
        lines.push("Blocked".to_string());
        for document in report.blocked() {
            lines.push(format!(
                "{}{} ({} fatal)",
                indent(1),
                document.input_path.display(),
                document.diagnostics.fatal_count()
            ));
        }
    }
    if report.stopped_early {
        lines.push("Stopped at the first blocked document (processing.fail_fast)".to_string());
    }
    lines
}

pub fn print_lint_summary(report: &LintReport) {
    for line in format_lint_summary(report) {
        println!("{}", line);
    }
}

/// Format what a publish step wrote.
pub fn format_publish_summary(report: &PublishReport, output: &Path) -> Vec<String> {
    vec![format!(
        "Published {}, copied {} → {}",
        plural(report.minified, "document"),
        plural(report.copied, "file"),
        output.display()
    )]
}

pub fn print_publish_summary(report: &PublishReport, output: &Path) {
    for line in format_publish_summary(report, output) {
        println!("{}", line);
    }
}

/// JSON array of `{ input_path, diagnostics }`, one entry per linted document.
pub fn format_json_report(report: &LintReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&report.documents)
}

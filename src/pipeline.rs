//! Per-document orchestration: the lint gate and the minifying transform.
//!
//! The two entry points are independent. The build driver calls both for
//! every emitted document, in either order, possibly on different threads:
//!
//! ```text
//!                  ┌──────────┐   ┌────────┐   ┌───────┐   ┌─────────┐   ┌──────┐
//! lint(content) →  │  parse   │ → │ filter │ → │ rules │ → │ collect │ → │ gate │ → Ok / LintError
//!                  └──────────┘   └────────┘   └───────┘   └─────────┘   └──────┘
//!                       │ (ParseError → one fatal diagnostic)   │
//!                       │                                   Reporter
//!                  ┌──────────┐   ┌────────────────┐
//! transform(...) → │  parse   │ → │ serialize(min) │ → published string
//!                  └──────────┘   └────────────────┘
//! ```
//!
//! Only output paths with a configured document extension are touched;
//! everything else passes through with no diagnostics.

use crate::config::GateConfig;
use crate::diagnostic::{Diagnostic, Diagnostics, Reporter};
use crate::filter::ElementFilter;
use crate::rules::RuleChain;
use crate::serialize::serialize;
use crate::tree::parse;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LintError {
    #[error("There are fatal linter errors in {} (see above)", .path.display())]
    Fatal { path: PathBuf, count: usize },
}

/// Outcome of [`Pipeline::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub diagnostics: Diagnostics,
    pub transformed_content: String,
}

/// The configured filter, rule chain and document extensions.
///
/// Built once at startup and shared by reference; it holds no per-document
/// state.
pub struct Pipeline {
    filter: ElementFilter,
    rules: RuleChain,
    extensions: Vec<String>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

impl Pipeline {
    pub fn new(filter: ElementFilter, rules: RuleChain, extensions: Vec<String>) -> Self {
        Self {
            filter,
            rules,
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(
            ElementFilter::new(&config.lint.exclude_tags),
            RuleChain::builtin(&config.lint),
            config.documents.extensions.clone(),
        )
    }

    pub fn rules(&self) -> &RuleChain {
        &self.rules
    }

    /// Whether `output_path` names a hypertext document.
    pub fn handles(&self, output_path: &Path) -> bool {
        output_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Parse, filter, run every rule and collect, without reporting or gating.
    ///
    /// A document that fails to parse yields exactly one fatal diagnostic and
    /// no rule runs.
    pub fn analyze(&self, content: &str) -> Diagnostics {
        match parse(content) {
            Ok(tree) => Diagnostics::collect(self.rules.run(&self.filter.apply(&tree))),
            Err(err) => {
                log::debug!("parse failed: {err}");
                Diagnostics::collect([vec![Diagnostic::parse_failure(&err, content)]])
            }
        }
    }

    /// Analyze one document and report its findings, without gating.
    pub fn check(
        &self,
        content: &str,
        input_path: &Path,
        output_path: &Path,
        reporter: &dyn Reporter,
    ) -> Diagnostics {
        if !self.handles(output_path) {
            log::debug!("skipping lint for {}", output_path.display());
            return Diagnostics::default();
        }

        let diagnostics = self.analyze(content);
        if !diagnostics.is_empty() {
            reporter.report(input_path, &diagnostics);
        }
        diagnostics
    }

    /// Lint one document: report every finding, then fail iff any is fatal.
    pub fn lint(
        &self,
        content: &str,
        input_path: &Path,
        output_path: &Path,
        reporter: &dyn Reporter,
    ) -> Result<Diagnostics, LintError> {
        let diagnostics = self.check(content, input_path, output_path, reporter);
        if diagnostics.has_fatal() {
            return Err(LintError::Fatal {
                path: input_path.to_path_buf(),
                count: diagnostics.fatal_count(),
            });
        }
        Ok(diagnostics)
    }

    /// Minify one document for publication.
    ///
    /// Non-document paths, and documents that do not parse, come back
    /// unchanged.
    pub fn transform(&self, content: &str, output_path: &Path) -> String {
        if !self.handles(output_path) {
            return content.to_string();
        }
        match parse(content) {
            Ok(tree) => serialize(&tree, true),
            Err(err) => {
                log::warn!(
                    "{}: not minified, {err}",
                    output_path.display()
                );
                content.to_string()
            }
        }
    }

    /// Lint, and if the document passes, transform it.
    pub fn process(
        &self,
        content: &str,
        input_path: &Path,
        output_path: &Path,
        reporter: &dyn Reporter,
    ) -> Result<PipelineResult, LintError> {
        let diagnostics = self.lint(content, input_path, output_path, reporter)?;
        Ok(PipelineResult {
            diagnostics,
            transformed_content: self.transform(content, output_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LintConfig;
    use crate::diagnostic::{PARSER_SOURCE, UNPARSEABLE_RULE_ID};
    use crate::test_helpers::{RecordingReporter, find_by_rule};

    fn html_path() -> &'static Path {
        Path::new("_site/index.html")
    }

    #[test]
    fn handles_configured_extensions() {
        let pipeline = Pipeline::default();
        assert!(pipeline.handles(Path::new("out/a.html")));
        assert!(pipeline.handles(Path::new("out/A.HTML")));
        assert!(!pipeline.handles(Path::new("out/feed.xml")));
        assert!(!pipeline.handles(Path::new("out/README")));

        let mut config = GateConfig::default();
        config.documents.extensions = vec![".htm".to_string()];
        let pipeline = Pipeline::from_config(&config);
        assert!(pipeline.handles(Path::new("page.htm")));
        assert!(!pipeline.handles(Path::new("page.html")));
    }

    #[test]
    fn lint_reports_warnings_and_passes() {
        let reporter = RecordingReporter::default();
        let result = Pipeline::default().lint(
            "<p>It was the the best.</p>",
            Path::new("src/index.md"),
            html_path(),
            &reporter,
        );

        let diagnostics = result.unwrap();
        assert_eq!(find_by_rule(&diagnostics, "repeated-words").len(), 1);

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, Path::new("src/index.md"));
        assert_eq!(reports[0].1, diagnostics);
    }

    #[test]
    fn clean_documents_report_nothing() {
        let reporter = RecordingReporter::default();
        let result = Pipeline::default().lint("<p>All good.</p>", html_path(), html_path(), &reporter);
        assert!(result.unwrap().is_empty());
        assert!(reporter.reports().is_empty());
    }

    #[test]
    fn unparseable_document_is_fatal() {
        let reporter = RecordingReporter::default();
        let result = Pipeline::default().lint(
            "<p>The the <div class=\"broken",
            Path::new("src/post.md"),
            html_path(),
            &reporter,
        );

        match result {
            Err(LintError::Fatal { path, count }) => {
                assert_eq!(path, Path::new("src/post.md"));
                assert_eq!(count, 1);
            }
            other => panic!("expected fatal lint error, got {other:?}"),
        }

        let reports = reporter.reports();
        let reported = &reports[0].1;
        assert_eq!(reported.len(), 1);
        let only = &reported.as_slice()[0];
        assert!(only.is_fatal());
        assert_eq!(only.source, PARSER_SOURCE);
        assert_eq!(only.rule_id, UNPARSEABLE_RULE_ID);
    }

    #[test]
    fn fatal_error_message_names_the_input() {
        let err = LintError::Fatal {
            path: PathBuf::from("posts/a.md"),
            count: 2,
        };
        assert_eq!(err.to_string(), "There are fatal linter errors in posts/a.md (see above)");
    }

    #[test]
    fn elevated_rule_blocks_after_reporting_everything() {
        let config = GateConfig {
            lint: LintConfig {
                fatal_rules: vec!["passive".to_string()],
                ..LintConfig::default()
            },
            ..GateConfig::default()
        };
        let reporter = RecordingReporter::default();
        let result = Pipeline::from_config(&config).lint(
            "<p>Simply put, the cake was eaten.</p>",
            html_path(),
            html_path(),
            &reporter,
        );

        assert!(matches!(result, Err(LintError::Fatal { count: 1, .. })));
        let reported = &reporter.reports()[0].1;
        assert_eq!(reported.len(), 2);
        assert_eq!(reported.warning_count(), 1);
    }

    #[test]
    fn excluded_code_is_not_linted() {
        let reporter = RecordingReporter::default();
        let result = Pipeline::default().lint(
            "<pre><code>The cake was eaten by the dog.</code></pre>",
            html_path(),
            html_path(),
            &reporter,
        );
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn non_document_paths_pass_through() {
        let reporter = RecordingReporter::default();
        let pipeline = Pipeline::default();
        let content = "{\"text\": \"the the <div class=\\\"broken\"}";
        let path = Path::new("_site/data.json");

        assert!(pipeline.lint(content, path, path, &reporter).unwrap().is_empty());
        assert!(reporter.reports().is_empty());
        assert_eq!(pipeline.transform(content, path), content);
    }

    #[test]
    fn transform_minifies() {
        let out = Pipeline::default().transform("<p>Hello   world</p>\n", html_path());
        assert_eq!(out, "<p>Hello world</p>");
    }

    #[test]
    fn transform_keeps_unparseable_content() {
        let content = "<p>broken <!-- comment";
        assert_eq!(Pipeline::default().transform(content, html_path()), content);
    }

    #[test]
    fn transform_is_independent_of_lint_findings() {
        let out = Pipeline::default().transform("<p>the   the</p>", html_path());
        assert_eq!(out, "<p>the the</p>");
    }

    #[test]
    fn process_lints_then_transforms() {
        let reporter = RecordingReporter::default();
        let result = Pipeline::default()
            .process("<p>Run  it. <!-- x --></p>", html_path(), html_path(), &reporter)
            .unwrap();
        assert_eq!(result.transformed_content, "<p>Run it.</p>");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn analyze_runs_rules_in_registration_order() {
        let diagnostics = Pipeline::default().analyze("<p>The cake was eaten. Simply the the end.</p>");
        let rule_ids: Vec<_> = diagnostics.iter().map(|d| d.rule_id.as_str()).collect();
        assert_eq!(rule_ids, vec!["assuming", "passive", "repeated-words"]);
    }

    #[test]
    fn pipeline_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}

//! Whole-site build: config on disk, lint gate, publication.

use prosegate::config;
use prosegate::diagnostic::{Diagnostics, Reporter};
use prosegate::pipeline::Pipeline;
use prosegate::output;
use prosegate::site;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Quiet;

impl Reporter for Quiet {
    fn report(&self, _: &Path, _: &Diagnostics) {}
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn site_with_passive_voice() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("_site");
    write(&source, "index.html", "<p>Welcome   home.</p>\n");
    write(&source, "posts/cake.html", "<p>The cake was eaten.</p>\n");
    write(&source, "style.css", "p  {  margin: 0  }\n");
    tmp
}

#[test]
fn warnings_do_not_block_publication() {
    let tmp = site_with_passive_voice();
    let source = tmp.path().join("_site");
    let output = tmp.path().join("dist");
    let gate = config::load_config(&tmp.path().join("prosegate.toml")).unwrap();
    let pipeline = Pipeline::from_config(&gate);

    let build = site::build_site(&pipeline, &source, &output, &gate.processing, &Quiet).unwrap();

    assert_eq!(build.lint.warning_count(), 1);
    let published = build.published.unwrap();
    assert_eq!((published.minified, published.copied), (2, 1));
    assert_eq!(
        fs::read_to_string(output.join("index.html")).unwrap(),
        "<p>Welcome home.</p>"
    );
    assert_eq!(
        fs::read_to_string(output.join("style.css")).unwrap(),
        "p  {  margin: 0  }\n"
    );
}

#[test]
fn fatal_rule_blocks_the_whole_build() {
    let tmp = site_with_passive_voice();
    let source = tmp.path().join("_site");
    let output = tmp.path().join("dist");
    let config_path = tmp.path().join("prosegate.toml");
    fs::write(&config_path, "[lint]\nfatal_rules = [\"passive\"]\n").unwrap();
    let gate = config::load_config(&config_path).unwrap();
    let pipeline = Pipeline::from_config(&gate);

    let build = site::build_site(&pipeline, &source, &output, &gate.processing, &Quiet).unwrap();

    assert!(build.published.is_none());
    let blocked: Vec<_> = build.lint.blocked().map(|d| d.input_path.clone()).collect();
    assert_eq!(blocked, vec![source.join("posts/cake.html")]);
    let summary = output::format_lint_summary(&build.lint);
    assert!(summary.iter().any(|line| line.contains("cake.html")), "{summary:?}");
    assert!(!output.exists());
}

#[test]
fn fail_fast_stops_at_first_blocked_document() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("_site");
    write(&source, "a.html", "<p>Fine.</p>");
    write(&source, "b.html", "<p>Broken <!-- comment</p>");
    write(&source, "c.html", "<p>Never read.</p>");
    let config_path = tmp.path().join("prosegate.toml");
    fs::write(&config_path, "[processing]\nfail_fast = true\n").unwrap();
    let gate = config::load_config(&config_path).unwrap();
    let pipeline = Pipeline::from_config(&gate);

    let report = site::lint_site(
        &pipeline,
        &source,
        &tmp.path().join("dist"),
        &gate.processing,
        &Quiet,
    )
    .unwrap();

    assert_eq!(report.documents.len(), 2);
    assert!(report.stopped_early);
    assert_eq!(report.blocked_count(), 1);
    assert_eq!(report.fatal_count(), 1);
}

#[test]
fn previous_output_inside_source_is_not_linted() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("_site");
    write(&source, "index.html", "<p>Fresh page.</p>");
    write(&source, "dist/index.html", "<p>Stale the the page.</p>");
    let gate = config::load_config(&tmp.path().join("prosegate.toml")).unwrap();
    let pipeline = Pipeline::from_config(&gate);

    let build = site::build_site(
        &pipeline,
        &source,
        &source.join("dist"),
        &gate.processing,
        &Quiet,
    )
    .unwrap();

    assert_eq!(build.lint.documents.len(), 1);
    assert_eq!(build.lint.warning_count(), 0);
    assert_eq!(build.published.unwrap().minified, 1);
}

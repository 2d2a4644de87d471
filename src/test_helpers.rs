//! Shared test utilities for the prosegate test suite.
//!
//! Provides a recording [`Reporter`], diagnostic lookups, and site fixtures
//! on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let reporter = RecordingReporter::default();
//! let report = lint_site(&Pipeline::default(), tmp.path(), &tmp.path().join("dist"), &config, &reporter).unwrap();
//!
//! let reported = reporter.diagnostics_for("index.html");
//! assert_eq!(find_by_rule(&reported, "repeated-words").len(), 1);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use crate::diagnostic::{Diagnostic, Diagnostics, Reporter};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `(relative path, content)` pairs under `root`, creating directories.
pub fn write_site(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

// =========================================================================
// Reporting
// =========================================================================

/// Reporter that keeps every report for later assertions.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(PathBuf, Diagnostics)>>,
}

impl RecordingReporter {
    /// All reports so far, in the order they arrived.
    pub fn reports(&self) -> Vec<(PathBuf, Diagnostics)> {
        self.reports.lock().unwrap().clone()
    }

    /// Diagnostics reported for the input path ending in `suffix`.
    ///
    /// Panics when nothing was reported for it.
    pub fn diagnostics_for(&self, suffix: &str) -> Diagnostics {
        self.reports()
            .into_iter()
            .find(|(path, _)| path.ends_with(suffix))
            .map(|(_, diagnostics)| diagnostics)
            .unwrap_or_else(|| panic!("nothing reported for {suffix}"))
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, input_path: &Path, diagnostics: &Diagnostics) {
        self.reports
            .lock()
            .unwrap()
            .push((input_path.to_path_buf(), diagnostics.clone()));
    }
}

// =========================================================================
// Lookups
// =========================================================================

/// Diagnostics with the given rule id, in order.
pub fn find_by_rule<'a>(diagnostics: &'a Diagnostics, rule_id: &str) -> Vec<&'a Diagnostic> {
    diagnostics.iter().filter(|d| d.rule_id == rule_id).collect()
}

/// Rule ids of all diagnostics, in order.
pub fn rule_ids(diagnostics: &Diagnostics) -> Vec<&str> {
    diagnostics.iter().map(|d| d.rule_id.as_str()).collect()
}

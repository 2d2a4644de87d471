//! Build driver: run the pipeline over a directory of rendered output.
//!
//! ```text
//! source/                      output/
//! ├── index.html   ── lint ──▶ ├── index.html   (minified)
//! ├── posts/                   ├── posts/
//! │   └── a.html   ── lint ──▶ │   └── a.html   (minified)
//! ├── feed.xml     ────────▶   ├── feed.xml     (copied)
//! └── .cache/      (skipped)   └── ...
//! ```
//!
//! [`build_site`] is a gate: every document is linted first, and nothing is
//! written unless no document was blocked. An output directory nested inside
//! the source is neither linted nor republished.
//!
//! ## Blocked documents
//!
//! Two policies, picked by `processing.fail_fast`:
//!
//! - `false` (default): lint every document in parallel, report all of them,
//!   then fail if any was blocked. One build shows every problem.
//! - `true`: lint in path order, one at a time, and stop at the first blocked
//!   document.

use crate::config::ProcessingConfig;
use crate::diagnostic::{Diagnostics, Reporter};
use crate::pipeline::Pipeline;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{count} document(s) blocked by fatal lint errors, nothing was published")]
    Blocked { count: usize },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SiteError + '_ {
    move |source| SiteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Lint outcome for one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub input_path: PathBuf,
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    pub blocked: bool,
}

/// Lint outcome for a whole tree.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    /// Linted documents, in path order.
    pub documents: Vec<DocumentReport>,
    /// Files that are not documents and were not linted.
    pub skipped: usize,
    /// Set when fail-fast stopped before every document was linted.
    pub stopped_early: bool,
}

impl LintReport {
    pub fn blocked(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| d.blocked)
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked().count()
    }

    pub fn is_blocked(&self) -> bool {
        self.documents.iter().any(|d| d.blocked)
    }

    pub fn warning_count(&self) -> usize {
        self.documents.iter().map(|d| d.diagnostics.warning_count()).sum()
    }

    pub fn fatal_count(&self) -> usize {
        self.documents.iter().map(|d| d.diagnostics.fatal_count()).sum()
    }
}

/// Outcome of [`build_site`]. `published` is `None` when the lint gate
/// blocked the build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub lint: LintReport,
    pub published: Option<PublishReport>,
}

/// What [`transform_site`] wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Documents minified into the output tree.
    pub minified: usize,
    /// Other files copied unchanged.
    pub copied: usize,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Every file under `source`, sorted by path, skipping hidden entries and
/// anything under `exclude`.
pub fn collect_files(source: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>, SiteError> {
    // Compared canonically so `dist` and `./dist` name the same directory.
    let exclude = exclude.and_then(|path| fs::canonicalize(path).ok());
    let is_excluded = |entry: &DirEntry| {
        entry.file_type().is_dir()
            && exclude
                .as_deref()
                .is_some_and(|ex| fs::canonicalize(entry.path()).is_ok_and(|p| p == ex))
    };
    let mut files = Vec::new();
    let walker = WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e) && !is_excluded(e));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn lint_document(
    pipeline: &Pipeline,
    path: &Path,
    source: &Path,
    reporter: &dyn Reporter,
) -> Result<DocumentReport, SiteError> {
    let started = Instant::now();
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    let output_path = relative(path, source);
    let diagnostics = pipeline.check(&content, path, output_path, reporter);
    let blocked = diagnostics.has_fatal();
    log::debug!(
        "linted {} in {:?}: {} finding(s)",
        output_path.display(),
        started.elapsed(),
        diagnostics.len()
    );
    Ok(DocumentReport {
        input_path: path.to_path_buf(),
        diagnostics,
        blocked,
    })
}

/// Lint every document under `source` and report each one. Files under
/// `output` are skipped.
pub fn lint_site(
    pipeline: &Pipeline,
    source: &Path,
    output: &Path,
    processing: &ProcessingConfig,
    reporter: &dyn Reporter,
) -> Result<LintReport, SiteError> {
    let files = collect_files(source, Some(output))?;
    let (documents, others): (Vec<PathBuf>, Vec<PathBuf>) = files
        .into_iter()
        .partition(|p| pipeline.handles(relative(p, source)));

    let mut report = LintReport {
        skipped: others.len(),
        ..LintReport::default()
    };

    if processing.fail_fast {
        for path in &documents {
            let document = lint_document(pipeline, path, source, reporter)?;
            let blocked = document.blocked;
            report.documents.push(document);
            if blocked {
                report.stopped_early = report.documents.len() < documents.len();
                break;
            }
        }
    } else {
        report.documents = documents
            .par_iter()
            .map(|path| lint_document(pipeline, path, source, reporter))
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(report)
}

/// Write every file under `source` into `output`: documents minified, the
/// rest copied.
pub fn transform_site(
    pipeline: &Pipeline,
    source: &Path,
    output: &Path,
) -> Result<PublishReport, SiteError> {
    let files = collect_files(source, Some(output))?;

    let minified = files
        .par_iter()
        .map(|path| -> Result<bool, SiteError> {
            let rel = relative(path, source);
            let dest = output.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            if pipeline.handles(rel) {
                let content = fs::read_to_string(path).map_err(io_error(path))?;
                fs::write(&dest, pipeline.transform(&content, rel)).map_err(io_error(&dest))?;
                Ok(true)
            } else {
                fs::copy(path, &dest).map_err(io_error(path))?;
                Ok(false)
            }
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|minified| *minified)
        .count();

    Ok(PublishReport {
        minified,
        copied: files.len() - minified,
    })
}

/// Lint gate, then publish. Nothing is written when any document is blocked;
/// the lint report comes back either way.
pub fn build_site(
    pipeline: &Pipeline,
    source: &Path,
    output: &Path,
    processing: &ProcessingConfig,
    reporter: &dyn Reporter,
) -> Result<BuildReport, SiteError> {
    let lint = lint_site(pipeline, source, output, processing, reporter)?;
    if lint.is_blocked() {
        log::info!("{} document(s) blocked, skipping publication", lint.blocked_count());
        return Ok(BuildReport {
            lint,
            published: None,
        });
    }
    let published = transform_site(pipeline, source, output)?;
    Ok(BuildReport {
        lint,
        published: Some(published),
    })
}

//! # prosegate
//!
//! A build-time prose lint gate and minifier for rendered static sites. It
//! sits between a site generator and publication: every emitted HTML document
//! is checked for style and grammar problems, and shipped minified only if
//! nothing fatal was found.
//!
//! # Architecture: Two Independent Paths
//!
//! Each document goes through two paths that share nothing but the parser:
//!
//! ```text
//! lint       content → parse → filter → rules → collect → report → gate
//! transform  content → parse → serialize (minified)
//! ```
//!
//! The lint path never changes content and the transform path never looks at
//! findings. That keeps both simple to test and lets the build driver run them
//! in any order, on any thread.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tree`] | Node model and the html5ever-backed parser |
//! | [`filter`] | Rebuilds a tree without excluded subtrees (`pre`, `code`) |
//! | [`prose`] | Flattens a filtered tree into positioned paragraphs and words |
//! | [`rules`] | The `Rule` trait, the nine built-in rules and the ordered `RuleChain` |
//! | [`diagnostic`] | `Severity`, `Diagnostic`, per-document `Diagnostics`, the `Reporter` seam |
//! | [`serialize`] | Tree back to HTML, optionally minified |
//! | [`pipeline`] | Per-document `lint` / `transform` orchestration and the gate |
//! | [`site`] | Walks a rendered site, lints in parallel, publishes |
//! | [`config`] | `prosegate.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting: diagnostic lines, summaries, JSON |
//!
//! # Design Decisions
//!
//! ## Warnings Never Block
//!
//! Every rule reports warnings. Only two things are fatal: a document that
//! does not parse, and findings of rules listed in `lint.fatal_rules`. A
//! document passes iff it has no fatal diagnostic, and all findings are
//! reported before the gate decides, so one build run shows everything.
//!
//! ## Code Is Not Prose
//!
//! `pre` and `code` subtrees are removed before the rules run. The filter
//! builds a new tree instead of editing the parsed one, so the transform path
//! still publishes every byte of the original.
//!
//! ## Rules Are Independent
//!
//! Rules read the same prose view and never see each other's output. The
//! chain is built once at startup and only read afterwards; registration
//! order fixes reporting order and nothing else.

pub mod config;
pub mod diagnostic;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod prose;
pub mod rules;
pub mod serialize;
pub mod site;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;

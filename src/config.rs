//! Gate configuration module.
//!
//! Handles loading, validating, and merging `prosegate.toml`. The stock
//! defaults are the base layer; the user's file overrides any subset of them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [lint]
//! exclude_tags = ["pre", "code"]   # Subtrees never analyzed as prose
//! disabled_rules = []              # Rule ids to skip entirely
//! fatal_rules = []                 # Rule ids whose findings block publication
//! quote_style = "straight"         # "straight" or "smart"
//!
//! [documents]
//! extensions = ["html"]            # Output extensions treated as hypertext
//!
//! [processing]
//! max_processes = 4                # Max parallel workers (omit for auto = CPU cores)
//! fail_fast = false                # Stop at the first blocked document
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want.
//!
//! ```toml
//! [lint]
//! fatal_rules = ["repeated-words"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filter::DEFAULT_EXCLUDED_TAGS;
use crate::rules::BUILTIN_RULE_IDS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "prosegate.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gate configuration loaded from `prosegate.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Rule chain and element filter settings.
    pub lint: LintConfig,
    /// Which output paths are hypertext documents.
    pub documents: DocumentsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl GateConfig {
    /// Validate rule ids and document extensions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, ids) in [
            ("lint.disabled_rules", &self.lint.disabled_rules),
            ("lint.fatal_rules", &self.lint.fatal_rules),
        ] {
            if let Some(unknown) = ids.iter().find(|id| !BUILTIN_RULE_IDS.contains(&id.as_str())) {
                return Err(ConfigError::Validation(format!(
                    "{key}: unknown rule `{unknown}` (known rules: {})",
                    BUILTIN_RULE_IDS.join(", ")
                )));
            }
        }
        if self.documents.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "documents.extensions must not be empty".into(),
            ));
        }
        if self.documents.extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "documents.extensions must not contain empty values".into(),
            ));
        }
        Ok(())
    }
}

/// Preferred quotation marks for the `quotes` rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// `"` and `'`
    #[default]
    Straight,
    /// `“ ”` and `‘ ’`
    Smart,
}

/// Rule chain and element filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Elements removed, with their subtrees, before prose analysis.
    pub exclude_tags: Vec<String>,
    /// Rules that are not registered at all.
    pub disabled_rules: Vec<String>,
    /// Rules whose findings are fatal instead of warnings.
    pub fatal_rules: Vec<String>,
    pub quote_style: QuoteStyle,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            exclude_tags: DEFAULT_EXCLUDED_TAGS.iter().map(|t| t.to_string()).collect(),
            disabled_rules: Vec::new(),
            fatal_rules: Vec::new(),
            quote_style: QuoteStyle::default(),
        }
    }
}

/// Which output paths get linted and minified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Output file extensions (without the dot) treated as hypertext.
    pub extensions: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["html".to_string()],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel lint workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Lint documents one at a time and stop at the first blocked one,
    /// instead of linting everything and failing afterwards.
    pub fail_fast: bool,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GateConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value; `None` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GateConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GateConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config at `path`, falling back to stock defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        log::debug!("no config at {}, using defaults", path.display());
    }
    resolve_config(stock_defaults_value()?, overlay)
}

/// A documented `prosegate.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# prosegate configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Linting
# ---------------------------------------------------------------------------
[lint]
# Elements removed, with everything inside them, before prose analysis.
exclude_tags = ["pre", "code"]

# Rules to skip entirely. Built-in rules:
#   assuming, diacritics, equality, indefinite-article, redundant-acronyms,
#   passive, repeated-words, sentence-spacing, quotes
disabled_rules = []

# Rules whose findings block publication instead of only warning.
fatal_rules = []

# Preferred quotation marks: "straight" or "smart".
quote_style = "straight"

# ---------------------------------------------------------------------------
# Documents
# ---------------------------------------------------------------------------
[documents]
# Output file extensions that are linted and minified. Everything else is
# copied through untouched.
extensions = ["html"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Stop at the first blocked document instead of reporting every document.
fail_fast = false
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GateConfig::default();
        assert_eq!(config.lint.exclude_tags, vec!["pre", "code"]);
        assert!(config.lint.disabled_rules.is_empty());
        assert!(config.lint.fatal_rules.is_empty());
        assert_eq!(config.lint.quote_style, QuoteStyle::Straight);
        assert_eq!(config.documents.extensions, vec!["html"]);
        assert!(!config.processing.fail_fast);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[lint]
fatal_rules = ["passive"]
"#;
        let config: GateConfig = toml::from_str(toml).unwrap();
        // Overridden value
        assert_eq!(config.lint.fatal_rules, vec!["passive"]);
        // Default values preserved
        assert_eq!(config.lint.exclude_tags, vec!["pre", "code"]);
        assert_eq!(config.documents.extensions, vec!["html"]);
    }

    #[test]
    fn parse_quote_style() {
        let config: GateConfig = toml::from_str("[lint]\nquote_style = \"smart\"").unwrap();
        assert_eq!(config.lint.quote_style, QuoteStyle::Smart);
        let result: Result<GateConfig, _> = toml::from_str("[lint]\nquote_style = \"curly\"");
        assert!(result.is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config.documents.extensions, vec!["html"]);
        assert_eq!(config.lint.quote_style, QuoteStyle::Straight);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            r#"
[lint]
exclude_tags = ["pre", "code", "kbd"]
disabled_rules = ["quotes"]

[documents]
extensions = ["html", "htm"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.lint.exclude_tags, vec!["pre", "code", "kbd"]);
        assert_eq!(config.lint.disabled_rules, vec!["quotes"]);
        assert_eq!(config.documents.extensions, vec!["html", "htm"]);
        // Unspecified values should be defaults
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn default_processing_config() {
        let config = ProcessingConfig::default();
        assert_eq!(config.max_processes, None);
        assert!(!config.fail_fast);
    }

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig::default();
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
            ..ProcessingConfig::default()
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn parse_processing_config() {
        let toml = r#"
[processing]
max_processes = 4
fail_fast = true
"#;
        let config: GateConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.processing.max_processes, Some(4));
        assert!(config.processing.fail_fast);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"fail_fast = false"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"fail_fast = true"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("fail_fast").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[lint]
exclude_tags = ["pre", "code"]
quote_style = "straight"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[lint]
quote_style = "smart"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let lint = merged.get("lint").unwrap();
        assert_eq!(lint.get("quote_style").unwrap().as_str(), Some("smart"));
        // exclude_tags preserved from base
        assert_eq!(lint.get("exclude_tags").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str(r#"extensions = ["html"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"extensions = ["htm", "xhtml"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("extensions").unwrap().as_array().unwrap().len(), 2);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[lint]
exclude_tag = ["pre"]
"#;
        let result: Result<GateConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<GateConfig, _> = toml::from_str("[linting]\nfail_fast = true");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[processing]\nfailfast = true\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_unknown_fatal_rule() {
        let mut config = GateConfig::default();
        config.lint.fatal_rules = vec!["spelling".to_string()];
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("lint.fatal_rules"));
        assert!(err.contains("`spelling`"));
    }

    #[test]
    fn validate_unknown_disabled_rule() {
        let mut config = GateConfig::default();
        config.lint.disabled_rules = vec!["passive".to_string(), "pasive".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_empty_extensions() {
        let mut config = GateConfig::default();
        config.documents.extensions.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[documents]\nextensions = []\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // resolve_config / load_raw_config tests
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join("missing.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn resolve_config_with_overlay() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[lint]
disabled_rules = ["equality"]
"#,
        )
        .unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.lint.disabled_rules, vec!["equality"]);
        // Other fields preserved from defaults
        assert_eq!(config.lint.exclude_tags, vec!["pre", "code"]);
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[lint]\nfatal_rules = [\"nope\"]").unwrap();
        let result = resolve_config(base, Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: GateConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.lint.exclude_tags, vec!["pre", "code"]);
        assert_eq!(config.lint.quote_style, QuoteStyle::Straight);
        assert_eq!(config.documents.extensions, vec!["html"]);
        assert_eq!(config.processing.max_processes, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        assert!(content.contains("[lint]"));
        assert!(content.contains("[documents]"));
        assert!(content.contains("[processing]"));
    }

    #[test]
    fn stock_config_lists_every_builtin_rule() {
        let content = stock_config_toml();
        for id in BUILTIN_RULE_IDS {
            assert!(content.contains(id), "stock config does not mention {id}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.get("lint").is_some());
        assert!(val.get("documents").is_some());
        assert!(val.get("processing").is_some());
    }
}

use clap::{Parser, Subcommand, ValueEnum};
use prosegate::config::{self, DEFAULT_CONFIG_FILE};
use prosegate::diagnostic::{Diagnostics, Reporter};
use prosegate::output::{self, ConsoleReporter};
use prosegate::pipeline::Pipeline;
use prosegate::site;
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "prosegate")]
#[command(about = "Prose lint gate and minifier for rendered static sites")]
#[command(long_about = "\
Prose lint gate and minifier for rendered static sites

Point it at the output of your site generator. Every HTML document is parsed,
code blocks are set aside, and the remaining prose is checked by a chain of
style and grammar rules. Warnings are reported; fatal findings (documents
that do not parse, or rules you made fatal) block publication.

Built-in rules:

  assuming             style        \"simply\", \"just\", \"obviously\"
  diacritics           typography   \"cafe\" → \"café\"
  equality             inclusive    \"whitelist\" → \"allowlist\"
  indefinite-article   grammar      \"a apple\" → \"an apple\"
  redundant-acronyms   style        \"ATM machine\" → \"ATM\"
  passive              style        \"was eaten\"
  repeated-words       grammar      \"the the\"
  sentence-spacing     typography   two spaces after a full stop
  quotes               typography   straight vs smart quotes

Run 'prosegate gen-config' to generate a documented prosegate.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults are used when it does not exist)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Rendered site directory
    #[arg(long, default_value = "_site", global = true)]
    source: PathBuf,

    /// Output directory for published files
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log pipeline internals (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Lint every document under the source directory
    Lint {
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
    /// Minify documents into the output directory, copy everything else
    Transform,
    /// Lint gate, then transform; nothing is published if a document is blocked
    Build,
    /// Lint a single file
    Check {
        /// Document to lint
        file: PathBuf,
    },
    /// Print a stock prosegate.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }
    let reporter = ConsoleReporter::new(!cli.no_color);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let gate_config = config::load_config(&cli.config)?;
    init_thread_pool(&gate_config.processing);
    let pipeline = Pipeline::from_config(&gate_config);
    log::debug!("rules: {}", pipeline.rules().ids().join(", "));

    match cli.command {
        Command::Lint { format } => {
            // JSON carries the diagnostics itself, so nothing goes to stderr.
            let sink: &dyn Reporter = match format {
                Format::Json => &NullReporter,
                Format::Text => &reporter,
            };
            let report = site::lint_site(
                &pipeline,
                &cli.source,
                &cli.output,
                &gate_config.processing,
                sink,
            )?;
            match format {
                Format::Json => println!("{}", output::format_json_report(&report)?),
                Format::Text => output::print_lint_summary(&report),
            }
            if report.is_blocked() {
                return Err(site::SiteError::Blocked {
                    count: report.blocked_count(),
                }
                .into());
            }
        }
        Command::Transform => {
            let published = site::transform_site(&pipeline, &cli.source, &cli.output)?;
            output::print_publish_summary(&published, &cli.output);
        }
        Command::Build => {
            println!("==> Linting {}", cli.source.display());
            let build = site::build_site(
                &pipeline,
                &cli.source,
                &cli.output,
                &gate_config.processing,
                &reporter,
            )?;
            output::print_lint_summary(&build.lint);
            let Some(published) = build.published else {
                return Err(site::SiteError::Blocked {
                    count: build.lint.blocked_count(),
                }
                .into());
            };
            output::print_publish_summary(&published, &cli.output);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check { file } => {
            let content = std::fs::read_to_string(&file)?;
            let diagnostics = pipeline.lint(&content, &file, &file, &reporter)?;
            println!(
                "{}: {} warning(s)",
                file.display(),
                diagnostics.warning_count()
            );
        }
        // Printed above, before any config is loaded.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Swallows reports; used when findings are printed as JSON instead.
struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _: &Path, _: &Diagnostics) {}
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

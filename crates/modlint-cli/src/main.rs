//! Modlint CLI
//!
//! Command-line interface for validating game mod files

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use modlint_core::init_tracing;
use std::path::PathBuf;
use tracing::debug;

/// Exit code when validation reported errors
const EXIT_ERRORS: i32 = 1;
/// Exit code when the run itself failed (bad config, unreadable schema)
const EXIT_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(name = "modlint")]
#[command(about = "modlint: schema-driven validator for bracket/semicolon mod files")]
#[command(version = modlint_core::VERSION)]
#[command(
    long_about = "modlint checks game mod files against the object, formula and dynamic-text schemas.\n\
It reports syntax errors, unknown names with suggestions, and type problems, and can apply exact fixes.\n\
\n\
Examples:\n  \
modlint check                     # Check the current directory\n  \
modlint check --write mods/       # Check and apply fixes in mods/\n  \
modlint check --format json a.txt # Machine-readable output\n  \
modlint formula \"abs:x * 2\" --allow-x"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.modlintrc.toml/.modlintrc.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate mod files against the schema
    #[command(alias = "lint")]
    Check {
        /// Files, directories or glob patterns to check
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Directory holding objects.json, formulas.json and dynamic_text.json
        #[arg(long, help = "Schema directory (overrides the config file)")]
        schema_dir: Option<PathBuf>,

        /// Output format
        #[arg(
            short,
            long,
            default_value = "human",
            help = "Output format for diagnostics"
        )]
        format: OutputFormat,

        /// Minimum severity level to report
        #[arg(long, default_value = "info", help = "Minimum severity level to report")]
        min_severity: Severity,

        /// Write fixes to files
        #[arg(long, help = "Apply suggested corrections to the files")]
        write: bool,

        /// Compute fixes without writing them
        #[arg(
            long,
            help = "Show how many fixes would be applied without writing (dry run)",
            conflicts_with = "write"
        )]
        dry_run: bool,
    },

    /// Parse and validate a single formula
    Formula {
        /// Formula text, e.g. "between:1:3:c:STR"
        text: String,

        /// Accept the `x` argument placeholder
        #[arg(long)]
        allow_x: bool,

        /// Directory holding the schema files
        #[arg(long)]
        schema_dir: Option<PathBuf>,
    },

    /// Show version information
    Version {
        /// Show build details
        #[arg(long)]
        detailed: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with code frames
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// GitHub Actions annotations
    Github,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warning,
    /// Show hints, warnings and errors
    Hint,
    /// Show everything, including style info
    Info,
}

impl From<Severity> for modlint_core::Severity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => modlint_core::Severity::Error,
            Severity::Warning => modlint_core::Severity::Warning,
            Severity::Hint => modlint_core::Severity::Hint,
            Severity::Info => modlint_core::Severity::Info,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let use_colors = !cli.no_color && std::env::var_os("NO_COLOR").is_none();
    colored::control::set_override(use_colors);

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "modlint=error",
        1 => "modlint=warn",
        2 => "modlint=info",
        3 => "modlint=debug",
        _ => "modlint=trace",
    };
    if std::env::var_os("RUST_LOG").is_none() {
        unsafe {
            std::env::set_var("RUST_LOG", log_level);
        }
    }
    init_tracing();

    match run_command(cli, use_colors) {
        Ok(false) => {}
        Ok(true) => std::process::exit(EXIT_ERRORS),
        Err(e) => {
            debug!("command failed: {e:?}");
            eprintln!("error: {e:#}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}

/// Run the selected command; `Ok(true)` means errors were reported
fn run_command(cli: Cli, use_colors: bool) -> anyhow::Result<bool> {
    match cli.command {
        Some(Commands::Check {
            paths,
            schema_dir,
            format,
            min_severity,
            write,
            dry_run,
        }) => {
            let paths = if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            };
            commands::check_command(commands::CheckOptions {
                paths,
                config_path: cli.config,
                schema_dir,
                format,
                min_severity: min_severity.into(),
                write,
                dry_run,
                use_colors,
            })
        }

        Some(Commands::Formula {
            text,
            allow_x,
            schema_dir,
        }) => commands::formula_command(&text, allow_x, schema_dir, cli.config),

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("modlint {}", modlint_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
            } else {
                println!("{}", modlint_core::VERSION);
            }
            Ok(false)
        }

        None => {
            // No subcommand provided, show help
            Cli::command().print_help()?;
            Ok(false)
        }
    }
}

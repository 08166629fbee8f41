//! Binary entry point for tabport.
//!
//! This binary provides the CLI for converting and inspecting tabular files.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tabport::config::TabportConfig;
use tabport::observability::{self, LogFormat, LoggingConfig};

use commands::{cmd_convert, cmd_formats, cmd_inspect};

/// Tabport - extension-driven import, export and conversion of tabular files.
#[derive(Parser)]
#[command(name = "tabport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "TABPORT_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Log format: pretty or json.
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a file from one format to another.
    Convert {
        /// Source path, URL, or `clipboard`.
        input: String,

        /// Target path or `clipboard`.
        output: String,

        /// Input format, overriding the source extension.
        #[arg(long)]
        from: Option<String>,

        /// Output format, overriding the target extension.
        #[arg(long)]
        to: Option<String>,

        /// Archive member to read from a zip or tar source.
        #[arg(short, long)]
        member: Option<String>,

        /// Importer option as key=value (repeatable).
        #[arg(short = 'i', long = "in-option", value_name = "KEY=VALUE")]
        in_options: Vec<String>,

        /// Exporter option as key=value (repeatable).
        #[arg(short = 'o', long = "out-option", value_name = "KEY=VALUE")]
        out_options: Vec<String>,
    },

    /// Show the schema, metadata and first rows of a file.
    Inspect {
        /// Source path, URL, or `clipboard`.
        input: String,

        /// Input format, overriding the source extension.
        #[arg(short, long)]
        format: Option<String>,

        /// Archive member to read from a zip or tar source.
        #[arg(short, long)]
        member: Option<String>,

        /// Number of rows to show.
        #[arg(short = 'n', long, default_value = "5")]
        rows: usize,

        /// Importer option as key=value (repeatable).
        #[arg(short = 'i', long = "in-option", value_name = "KEY=VALUE")]
        in_options: Vec<String>,
    },

    /// List known formats and their support.
    Formats,
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let mut settings = config.logging.clone();
    if let Some(format) = cli.log_format {
        settings.format = format;
    }
    if let Err(e) = observability::init(LoggingConfig::from_settings(&settings, cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &TabportConfig) -> tabport::Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            from,
            to,
            member,
            in_options,
            out_options,
        } => cmd_convert(
            config,
            &input,
            &output,
            from,
            to,
            member,
            &in_options,
            &out_options,
        ),

        Commands::Inspect {
            input,
            format,
            member,
            rows,
            in_options,
        } => cmd_inspect(config, &input, format, member, rows, &in_options),

        Commands::Formats => cmd_formats(),
    }
}

/// Loads configuration from an explicit path or the default locations.
fn load_config(path: Option<&std::path::Path>) -> tabport::Result<TabportConfig> {
    match path {
        Some(path) => TabportConfig::load_from_file(path),
        None => Ok(TabportConfig::load_default()),
    }
}

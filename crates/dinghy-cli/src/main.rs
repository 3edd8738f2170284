//! Dinghy CLI
//!
//! Analyze Dockerfiles against best-practice rules and repair them in place.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "dinghy",
    about = "Dockerfile analysis and repair",
    version = dinghy_core::VERSION,
    long_about = "Dinghy parses Dockerfiles together with the shell scripts inside their RUN \
instructions, reports violations of best-practice rules and rewrites the file so that only \
the repaired commands change.

Examples:
  dinghy rules
  dinghy analyze Dockerfile
  dinghy analyze --format json --error-on-violation Dockerfile
  dinghy refactor Dockerfile -o Dockerfile.fixed
  dinghy parse Dockerfile"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv, -vvvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available rules
    Rules {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report rule violations in a Dockerfile
    Analyze {
        #[arg(help = "Dockerfile to analyze")]
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,

        /// Exit with status 1 when any violation is found
        #[arg(long)]
        error_on_violation: bool,
    },

    /// Repair every violation that has a repair and show the diff
    Refactor {
        #[arg(help = "Dockerfile to repair")]
        file: PathBuf,

        /// Write the repaired Dockerfile here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the syntax tree as JSON
    Parse {
        #[arg(help = "Dockerfile to parse")]
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let use_colors = !cli.no_color && std::env::var_os("NO_COLOR").is_none();
    colored::control::set_override(use_colors);

    let log_level = match cli.verbose {
        0 => "dinghy=error",
        1 => "dinghy=warn",
        2 => "dinghy=info",
        3 => "dinghy=debug",
        _ => "dinghy=trace",
    };
    dinghy_core::init_tracing_with(log_level);

    match run_command(cli, use_colors) {
        Ok(code) => code,
        Err(e) => {
            debug!("Command failed: {:?}", e);
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run_command(cli: Cli, use_colors: bool) -> anyhow::Result<ExitCode> {
    let config = cli.config.as_deref();
    match cli.command {
        Commands::Rules { json } => commands::rules_command(json, config),
        Commands::Analyze {
            file,
            format,
            error_on_violation,
        } => commands::analyze_command(&file, format, error_on_violation, config, use_colors),
        Commands::Refactor { file, output } => {
            commands::refactor_command(&file, output.as_deref(), config, use_colors)
        }
        Commands::Parse { file } => commands::parse_command(&file),
    }
}

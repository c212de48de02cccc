mod cmd;
mod output;
mod terminal;

use clap::{ArgAction, Parser};
use pip_update_core::{paths, report::EXIT_FATAL};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pip-update",
    about = "Upgrade every outdated pip package, one at a time, checking dependency consistency before and after",
    version
)]
struct Cli {
    /// Leave these packages alone (repeatable; each use takes one or more names)
    #[arg(long, value_name = "NAME", num_args = 1.., action = ArgAction::Append)]
    skip: Vec<String>,

    /// List what would be upgraded without upgrading anything
    #[arg(long)]
    dry_run: bool,

    /// Upgrade even if installed packages already conflict
    #[arg(long)]
    force: bool,

    /// Also write the full report as JSON to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Never color the output
    #[arg(long)]
    nocolor: bool,

    /// Always color the output, even when not writing to a terminal
    #[arg(long)]
    forcecolor: bool,

    /// Package-manager command (default: auto-detect pip, pip3, python3 -m pip, python -m pip)
    #[arg(long, value_name = "CMD", env = paths::PIP_ENV)]
    pip: Option<String>,

    /// Lines of pip output kept from a failed upgrade
    #[arg(long, value_name = "N")]
    tail_lines: Option<usize>,

    /// Config file (default: ~/.config/pip-update/config.yaml if present)
    #[arg(long, value_name = "PATH", env = paths::CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Print the report as JSON on stdout instead of the table
    #[arg(long, short = 'j')]
    json: bool,

    /// Show a previously saved JSON report and exit with its status
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["skip", "dry_run", "force", "report", "tail_lines"]
    )]
    show_report: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors share the fatal exit code; 2 means "aborted at precheck".
            let _ = e.print();
            std::process::exit(if e.use_stderr() { EXIT_FATAL } else { 0 });
        }
    };

    let default_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.show_report.clone() {
        Some(path) => cmd::show::run(&cli, &path),
        None => cmd::run::run(&cli),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(EXIT_FATAL);
        }
    }
}

use crate::output::print_json;
use crate::terminal::TerminalSink;
use crate::Cli;
use anyhow::Context;
use pip_update_core::{
    gateway::PackageManager,
    metadata::EnvironmentMetadata,
    orchestrator::{Orchestrator, RunOptions},
    pip::{PipCommand, PipGateway},
    report::{JsonReportSink, ReportSink},
};
use tracing::info;

pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = super::load_config(cli)?;
    let presentation = super::presentation(cli, &config);

    // Flag and PIP_UPDATE_PIP beat the config file; detection is the fallback.
    let command = match cli.pip.as_deref().or(config.pip.as_deref()) {
        Some(spec) => PipCommand::parse(spec).context("invalid --pip value")?,
        None => PipCommand::detect().context("could not find pip")?,
    };
    let tail_lines = cli.tail_lines.unwrap_or(config.tail_lines);
    let gateway = PipGateway::new(command, tail_lines);

    let version = gateway.version();
    info!(command = %gateway.command(), version = ?version, "package manager");
    let metadata = EnvironmentMetadata::collect(&gateway.command().to_string(), version);

    let mut skip = config.skip.clone();
    skip.extend(cli.skip.iter().cloned());
    let options = RunOptions {
        skip,
        dry_run: cli.dry_run,
        force: cli.force,
    };

    let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
    if !cli.json {
        sinks.push(Box::new(TerminalSink::stdout(presentation)));
    }
    if let Some(path) = &cli.report {
        sinks.push(Box::new(JsonReportSink::new(path.clone())));
    }

    let report = Orchestrator::new(&gateway, options, metadata)
        .run(&mut sinks)
        .context("upgrade run failed")?;

    if cli.json {
        print_json(&report)?;
    } else if let Some(path) = &cli.report {
        println!("JSON report written to {}", path.display());
    }
    Ok(report.exit_code())
}

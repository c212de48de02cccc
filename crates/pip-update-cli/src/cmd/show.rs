use crate::output::print_json;
use crate::terminal::TerminalSink;
use crate::Cli;
use anyhow::Context;
use pip_update_core::report::{ReportSink, RunReport};
use std::path::Path;

pub fn run(cli: &Cli, path: &Path) -> anyhow::Result<i32> {
    let report = RunReport::load(path)
        .with_context(|| format!("failed to read report {}", path.display()))?;

    if cli.json {
        print_json(&report)?;
    } else {
        let config = super::load_config(cli)?;
        let mut sink = TerminalSink::stdout(super::presentation(cli, &config));
        sink.emit(&report)?;
    }
    Ok(report.exit_code())
}

pub mod run;
pub mod show;

use crate::output::Presentation;
use crate::Cli;
use anyhow::Context;
use pip_update_core::config::Config;

/// Config file values, before flags and environment are layered on top.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let (config, path) = Config::resolve(cli.config.as_deref()).context("failed to load config")?;
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "config loaded");
    }
    Ok(config)
}

pub fn presentation(cli: &Cli, config: &Config) -> Presentation {
    Presentation::resolve(cli.forcecolor, cli.nocolor, config.color)
}

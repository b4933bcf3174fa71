use anyhow::{Context, Result};
use socd_resolver::config::{AppConfig, CONFIG_FILE};
use socd_resolver::logging::init_logging;

fn main() -> Result<()> {
    let config = AppConfig::load_optional(CONFIG_FILE)
        .with_context(|| format!("failed to load {}", CONFIG_FILE))?;
    init_logging(&config.log_level);

    let exit_code = run(&config)?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

#[cfg(windows)]
fn run(config: &AppConfig) -> Result<i32> {
    socd_resolver::lifecycle::run(config).context("SOCD resolver failed to start")
}

#[cfg(not(windows))]
fn run(_config: &AppConfig) -> Result<i32> {
    Err(socd_resolver::StartupError::Unsupported.into())
}

use anyhow::{bail, Context};
use simulation::config::SimConfig;
use simulation::{export, scenarios};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), anyhow::Error> {
    // Logs go to stderr; stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => SimConfig::default(),
    };

    tracing::info!(version = simulation::VERSION, seed = config.stress.seed, "Starting ledger simulation");

    let results = scenarios::run_all(&config)?;
    let report = export::build_report(&config, results);
    println!("{}", export::to_json(&report)?);

    if !report.all_passed {
        let failed: Vec<&str> = report.failed().map(|s| s.name.as_str()).collect();
        bail!("scenarios failed: {}", failed.join(", "));
    }
    Ok(())
}

//! Report export
//!
//! Serializes scenario results, together with the configuration that
//! produced them, to JSON for external consumption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::scenarios::ScenarioResult;

/// Complete output of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub config: SimConfig,
    pub scenarios: Vec<ScenarioResult>,
    pub all_passed: bool,
}

impl SimulationReport {
    pub fn failed(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.scenarios.iter().filter(|s| !s.passed)
    }
}

/// Build a report from finished scenarios.
pub fn build_report(config: &SimConfig, scenarios: Vec<ScenarioResult>) -> SimulationReport {
    let all_passed = scenarios.iter().all(|s| s.passed);
    SimulationReport {
        version: crate::VERSION.to_string(),
        generated_at: Utc::now(),
        config: config.clone(),
        scenarios,
        all_passed,
    }
}

/// Pretty-printed JSON of the report.
pub fn to_json(report: &SimulationReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write the report to a file path.
pub fn write_to_file(report: &SimulationReport, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
    let json = to_json(report)?;
    std::fs::write(path, json)
}

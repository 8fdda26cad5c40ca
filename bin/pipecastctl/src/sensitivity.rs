//! ---
//! pcast_section: "03-external-interfaces"
//! pcast_subsection: "binary"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Command-line front end for PIPECAST scenario assessment and screening."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pipecast_calc_engine::{evaluate_scenario, io, sensitivity::SensitivityResult};

use crate::assess::fmt_usd;

/// Execute the sensitivity command.
pub fn run(command: SensitivityCommand) -> Result<()> {
    command.execute()
}

#[derive(Debug, Args)]
pub struct SensitivityCommand {
    /// Scenario file (JSON or YAML).
    #[arg(long = "scenario", value_name = "FILE")]
    scenario: PathBuf,

    /// Emit the tornado entries as JSON instead of the table.
    #[arg(long = "json", action = clap::ArgAction::SetTrue)]
    json: bool,
}

impl SensitivityCommand {
    pub fn execute(self) -> Result<()> {
        let scenario = io::load_scenario_from_file(&self.scenario)
            .with_context(|| format!("failed to load scenario {}", self.scenario.display()))?;
        let assessment = evaluate_scenario(&scenario)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&assessment.sensitivity)?);
            return Ok(());
        }

        render_tornado(&assessment.sensitivity, assessment.financials.npv_project);
        Ok(())
    }
}

fn render_tornado(sensitivity: &SensitivityResult, base_npv: f64) {
    println!(
        "Tornado around project NPV {} at +/-{:.0}% input swings",
        fmt_usd(base_npv),
        sensitivity.swing * 100.0
    );
    println!(
        "{:<16}  {:>16}  {:>16}  {:>16}",
        "driver", "low", "high", "spread"
    );
    for entry in &sensitivity.entries {
        println!(
            "{:<16}  {:>16}  {:>16}  {:>16}",
            entry.driver.to_string(),
            fmt_usd(entry.low_delta_npv),
            fmt_usd(entry.high_delta_npv),
            fmt_usd(entry.spread)
        );
    }
}

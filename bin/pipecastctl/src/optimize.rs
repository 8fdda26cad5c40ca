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
use pipecast_calc_engine::{
    io,
    optimizer::{optimize_diameter, OptimizationResult},
};

use crate::assess::fmt_usd;

/// Execute the optimize command.
pub fn run(command: OptimizeCommand) -> Result<()> {
    command.execute()
}

#[derive(Debug, Args)]
pub struct OptimizeCommand {
    /// Scenario file (JSON or YAML). Every standard catalogue diameter is
    /// swept regardless of the design diameter in the file.
    #[arg(long = "scenario", value_name = "FILE")]
    scenario: PathBuf,

    /// Emit the full candidate set as JSON instead of the table.
    #[arg(long = "json", action = clap::ArgAction::SetTrue)]
    json: bool,
}

impl OptimizeCommand {
    pub fn execute(self) -> Result<()> {
        let scenario = io::load_scenario_from_file(&self.scenario)
            .with_context(|| format!("failed to load scenario {}", self.scenario.display()))?;
        scenario.validate()?;
        let result = optimize_diameter(
            &scenario.design,
            &scenario.location,
            &scenario.terrain_mix,
            &scenario.terrain_factors,
            &scenario.finance,
        )?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        render_table(&result);
        Ok(())
    }
}

fn render_table(result: &OptimizationResult) {
    println!(
        "{:>9}  {:>8}  {:>8}  {:>16}  {:>16}  {:>8}",
        "dia (in)", "v (m/s)", "stations", "capex", "npv project", "feasible"
    );
    for candidate in &result.candidates {
        println!(
            "{:>9.3}  {:>8.2}  {:>8}  {:>16}  {:>16}  {:>8}{}",
            candidate.diameter_in,
            candidate.engineering.velocity_m_s,
            candidate.engineering.pump_stations,
            fmt_usd(candidate.costs.escalated.total_capex),
            fmt_usd(candidate.financials.npv_project),
            if candidate.feasible { "yes" } else { "no" },
            if candidate.optimal { "  <- selected" } else { "" }
        );
    }
    if result.fallback {
        println!(
            "No candidate satisfied the velocity window; defaulting to {:.3} in.",
            result.selected_diameter_in
        );
    } else {
        println!("Selected diameter: {:.3} in", result.selected_diameter_in);
    }
}

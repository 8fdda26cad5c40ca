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
    io, reports,
    route::{analyze_route, RouteAnalysis},
};

/// Execute the route command.
pub fn run(command: RouteCommand) -> Result<()> {
    command.execute()
}

#[derive(Debug, Args)]
pub struct RouteCommand {
    /// Route scenario file with map points, terrain zones, and existing pipelines.
    #[arg(long = "map", value_name = "FILE")]
    map: PathBuf,

    /// Optional directory receiving route_stats.json.
    #[arg(long = "out", value_name = "DIR")]
    out: Option<PathBuf>,

    /// Emit the analysis as JSON instead of the summary.
    #[arg(long = "json", action = clap::ArgAction::SetTrue)]
    json: bool,
}

impl RouteCommand {
    pub fn execute(self) -> Result<()> {
        let scenario = io::load_route_scenario_from_file(&self.map)
            .with_context(|| format!("failed to load route scenario {}", self.map.display()))?;
        let analysis = analyze_route(&scenario)?;

        if let Some(out) = &self.out {
            reports::export_route_stats(&analysis, scenario.name.clone(), out)?;
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            return Ok(());
        }

        render_analysis(&analysis);
        if let Some(out) = &self.out {
            println!("Route statistics written to {}", out.display());
        }
        Ok(())
    }
}

fn render_analysis(analysis: &RouteAnalysis) {
    println!("Route length: {:.2} mi", analysis.total_length_miles);
    println!("Terrain mix:");
    for (category, share) in &analysis.terrain_mix {
        println!("  {:<16} {:>7.2}%", format!("{category:?}"), share * 100.0);
    }
    println!("Crossings of existing pipelines: {}", analysis.crossings.len());
    for crossing in &analysis.crossings {
        println!(
            "  {} at map ({:.1}, {:.1})",
            crossing.pipeline_name, crossing.location.x, crossing.location.y
        );
    }
    println!(
        "Right-of-way share from crossings: {:.2}%",
        analysis.row_share_from_crossings * 100.0
    );
}

//! ---
//! pcast_section: "03-external-interfaces"
//! pcast_subsection: "binary"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Command-line front end for PIPECAST scenario assessment and screening."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use anyhow::Result;
use clap::{Parser, Subcommand};

mod assess;
mod logging;
mod optimize;
mod route;
mod sensitivity;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "PIPECAST pipeline screening utility",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full engineering, cost, and financial assessment for a scenario.
    Assess(assess::AssessCommand),
    /// Sweep the standard diameter catalogue and rank candidates by project NPV.
    Optimize(optimize::OptimizeCommand),
    /// Rank tornado drivers around the assessed cash flows.
    Sensitivity(sensitivity::SensitivityCommand),
    /// Derive terrain mix and crossing statistics from drawn route geometry.
    Route(route::RouteCommand),
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Assess(cmd) => assess::run(cmd)?,
        Commands::Optimize(cmd) => optimize::run(cmd)?,
        Commands::Sensitivity(cmd) => sensitivity::run(cmd)?,
        Commands::Route(cmd) => route::run(cmd)?,
    }
    Ok(())
}

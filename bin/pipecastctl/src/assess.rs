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
use pipecast_calc_engine::{assess_project_with_options, io, ProjectAssessment};

/// Execute the assess command.
pub fn run(command: AssessCommand) -> Result<()> {
    command.execute()
}

#[derive(Debug, Args)]
pub struct AssessCommand {
    /// Scenario file (JSON or YAML).
    #[arg(long = "scenario", value_name = "FILE")]
    scenario: PathBuf,

    /// Directory receiving the exported report set.
    #[arg(long = "out", value_name = "DIR", default_value = "reports")]
    out: PathBuf,

    /// Print the full assessment as JSON instead of the summary.
    #[arg(long = "json", action = clap::ArgAction::SetTrue)]
    json: bool,
}

impl AssessCommand {
    pub fn execute(self) -> Result<()> {
        let scenario = io::load_scenario_from_file(&self.scenario)
            .with_context(|| format!("failed to load scenario {}", self.scenario.display()))?;
        let assessment = assess_project_with_options(&scenario, Some(&self.out))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            return Ok(());
        }

        render_summary(&assessment);
        println!("Reports written to {}", self.out.display());
        Ok(())
    }
}

fn render_summary(assessment: &ProjectAssessment) {
    let design = &assessment.design;
    let engineering = &assessment.engineering;
    let financials = &assessment.financials;

    println!(
        "Scenario: {}",
        assessment.scenario_name.as_deref().unwrap_or("unnamed")
    );
    println!(
        "Design: {:.3} in OD, {:.1} mi, {:.0} MPa SMYS, {:.2} Mt/yr at capacity factor {:.2}",
        design.diameter_in,
        design.length_miles,
        design.grade_smys_mpa,
        design.design_flow_mt_per_year,
        design.capacity_factor
    );
    println!(
        "Hydraulics: {:.2} m/s ({}), {:.2} psi/mi, {} pump station(s) of {:.0} kW",
        engineering.velocity_m_s,
        if engineering.velocity_in_window {
            "in window"
        } else {
            "outside window"
        },
        engineering.friction_psi_per_mile,
        engineering.pump_stations,
        engineering.pump_power_per_station_kw
    );
    println!(
        "CAPEX: {} escalated ({} before escalation)",
        fmt_usd(assessment.costs.escalated.total_capex),
        fmt_usd(assessment.costs.base_year.total_capex)
    );
    println!(
        "Annual OPEX (first-year basis): {}",
        fmt_usd(assessment.costs.escalated.total_opex)
    );
    println!(
        "NPV: {} project / {} equity",
        fmt_usd(financials.npv_project),
        fmt_usd(financials.npv_equity)
    );
    println!(
        "IRR: {} project / {} equity",
        fmt_percent(financials.irr_project),
        fmt_percent(financials.irr_equity)
    );
    println!(
        "Payback: {} simple / {} discounted",
        fmt_months(financials.payback_months),
        fmt_months(financials.discounted_payback_months)
    );
    println!(
        "Breakeven CO2 price: ${:.2}/t pre-tax, ${:.2}/t post-tax",
        financials.breakeven_price_before_tax, financials.breakeven_price_after_tax
    );
    if let Some(optimization) = &assessment.optimization {
        println!(
            "Optimizer: selected {:.3} in{}",
            optimization.selected_diameter_in,
            if optimization.fallback {
                " (fallback, no feasible candidate)"
            } else {
                ""
            }
        );
    }
}

pub(crate) fn fmt_usd(value: f64) -> String {
    let negative = value < 0.0;
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn fmt_percent(value: Option<f64>) -> String {
    match value {
        Some(rate) => format!("{:.2}%", rate * 100.0),
        None => "n/a".to_string(),
    }
}

fn fmt_months(value: Option<f64>) -> String {
    match value {
        Some(months) => format!("{months:.1} months"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_formatting_groups_thousands() {
        assert_eq!(fmt_usd(85_740_167.48), "$85,740,167");
        assert_eq!(fmt_usd(999.4), "$999");
        assert_eq!(fmt_usd(-1_500.0), "-$1,500");
        assert_eq!(fmt_usd(0.0), "$0");
    }

    #[test]
    fn optional_metrics_render_as_na() {
        assert_eq!(fmt_percent(None), "n/a");
        assert_eq!(fmt_percent(Some(0.2525)), "25.25%");
        assert_eq!(fmt_months(None), "n/a");
        assert_eq!(fmt_months(Some(49.546)), "49.5 months");
    }
}

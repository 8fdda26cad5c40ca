//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use std::{fs, path::Path};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{errors::Result, route::RouteAnalysis, ProjectAssessment};

#[derive(Debug)]
pub struct ReportExporter<'a> {
    assessment: &'a ProjectAssessment,
}

impl<'a> ReportExporter<'a> {
    pub fn new(assessment: &'a ProjectAssessment) -> Self {
        Self { assessment }
    }

    pub fn export_all(&self, output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let timestamp = self.assessment.timestamp.to_rfc3339();
        let name = self.assessment.scenario_name.clone();

        let engineering_report = ReportEnvelope::new(
            &timestamp,
            name.clone(),
            engineering_schema(),
            &self.assessment.engineering,
        );
        let cost_report = ReportEnvelope::new(
            &timestamp,
            name.clone(),
            cost_schema(),
            &self.assessment.costs,
        );
        let financial_report = ReportEnvelope::new(
            &timestamp,
            name.clone(),
            financial_schema(),
            &self.assessment.financials,
        );
        let sensitivity_report = ReportEnvelope::new(
            &timestamp,
            name.clone(),
            sensitivity_schema(),
            &self.assessment.sensitivity,
        );

        write_json(output_dir.join("engineering.json"), &engineering_report)?;
        write_json(output_dir.join("costs.json"), &cost_report)?;
        write_json(output_dir.join("financials.json"), &financial_report)?;
        write_json(output_dir.join("sensitivity.json"), &sensitivity_report)?;

        if let Some(optimization) = &self.assessment.optimization {
            let optimization_report =
                ReportEnvelope::new(&timestamp, name, optimization_schema(), optimization);
            write_json(output_dir.join("optimization.json"), &optimization_report)?;
        }

        info!("Reports exported to {}", output_dir.display());
        Ok(())
    }
}

pub fn export_route_stats(
    analysis: &RouteAnalysis,
    scenario_name: Option<String>,
    output_dir: &Path,
) -> Result<()> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)?;
    }
    let timestamp = Utc::now().to_rfc3339();
    let report = ReportEnvelope::new(&timestamp, scenario_name, route_schema(), analysis);
    write_json(output_dir.join("route_stats.json"), &report)?;
    info!("Route stats exported to {}", output_dir.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct ReportEnvelope<'a, T: Serialize> {
    timestamp: &'a str,
    scenario_name: Option<String>,
    schema: serde_json::Value,
    data: &'a T,
}

impl<'a, T: Serialize> ReportEnvelope<'a, T> {
    fn new(
        timestamp: &'a str,
        scenario_name: Option<String>,
        schema: serde_json::Value,
        data: &'a T,
    ) -> Self {
        Self {
            timestamp,
            scenario_name,
            schema,
            data,
        }
    }
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn engineering_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "EngineeringReport",
        "type": "object",
        "properties": {
            "wall_thickness_in": {"type": "number"},
            "inner_diameter_in": {"type": "number"},
            "inner_diameter_m": {"type": "number"},
            "velocity_m_s": {"type": "number"},
            "reynolds_number": {"type": "number"},
            "friction_factor": {"type": "number"},
            "friction_psi_per_mile": {"type": "number"},
            "elevation_pressure_psi": {"type": "number"},
            "total_pressure_loss_psi": {"type": "number"},
            "max_segment_miles": {"type": "number"},
            "pump_stations": {"type": "integer"},
            "pump_power_per_station_kw": {"type": "number"},
            "pump_power_total_kw": {"type": "number"},
            "velocity_in_window": {"type": "boolean"}
        },
        "required": [
            "wall_thickness_in",
            "inner_diameter_in",
            "velocity_m_s",
            "pump_stations",
            "pump_power_total_kw"
        ],
    })
}

fn cost_schema() -> serde_json::Value {
    let breakdown = json!({
        "type": "object",
        "properties": {
            "material": {"type": "number"},
            "labour": {"type": "number"},
            "right_of_way": {"type": "number"},
            "misc": {"type": "number"},
            "pipeline_subtotal": {"type": "number"},
            "pump_stations": {"type": "number"},
            "surge_tank": {"type": "number"},
            "control_system": {"type": "number"},
            "facilities_subtotal": {"type": "number"},
            "financing": {"type": "number"},
            "total_capex": {"type": "number"},
            "pipeline_opex": {"type": "number"},
            "facility_opex": {"type": "number"},
            "power_opex": {"type": "number"},
            "total_opex": {"type": "number"}
        },
        "required": ["pipeline_subtotal", "facilities_subtotal", "total_capex", "total_opex"]
    });
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CostReport",
        "type": "object",
        "properties": {
            "base_year": breakdown.clone(),
            "escalated": breakdown,
            "terrain_location_factor": {"type": "number"},
            "diameter_factor": {"type": "number"},
            "state_multiplier": {"type": "number"},
            "wall_thickness_factor": {"type": "number"},
            "grade_premium": {"type": "number"},
            "escalation_years": {"type": "number"}
        },
        "required": ["base_year", "escalated"],
    })
}

fn financial_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "FinancialReport",
        "type": "object",
        "properties": {
            "tax_rate": {"type": "number"},
            "wacc": {"type": "number"},
            "total_capex": {"type": "number"},
            "debt_principal": {"type": "number"},
            "equity_investment": {"type": "number"},
            "annual_debt_service": {"type": "number"},
            "average_annual_interest": {"type": "number"},
            "average_annual_principal": {"type": "number"},
            "annual_depreciation": {"type": "number"},
            "years": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "year": {"type": "integer"},
                        "revenue": {"type": "number"},
                        "operating_cost": {"type": "number"},
                        "ebitda": {"type": "number"},
                        "net_income": {"type": "number"},
                        "equity_cash_flow": {"type": "number"},
                        "unlevered_cash_flow": {"type": "number"}
                    },
                    "required": ["year", "revenue", "ebitda"]
                }
            },
            "irr_equity": {"type": ["number", "null"]},
            "irr_project": {"type": ["number", "null"]},
            "npv_project": {"type": "number"},
            "npv_equity": {"type": "number"},
            "payback_months": {"type": ["number", "null"]},
            "discounted_payback_months": {"type": ["number", "null"]},
            "dscr_year_one": {"type": ["number", "null"]},
            "interest_coverage_year_one": {"type": ["number", "null"]},
            "net_debt_to_ebitda": {"type": ["number", "null"]},
            "breakeven_price_before_tax": {"type": "number"},
            "breakeven_price_after_tax": {"type": "number"}
        },
        "required": ["wacc", "npv_project", "npv_equity", "years"],
    })
}

fn sensitivity_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "SensitivityReport",
        "type": "object",
        "properties": {
            "swing": {"type": "number"},
            "entries": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "driver": {"type": "string"},
                        "low_delta_npv": {"type": "number"},
                        "high_delta_npv": {"type": "number"},
                        "spread": {"type": "number"}
                    },
                    "required": ["driver", "low_delta_npv", "high_delta_npv", "spread"]
                }
            }
        },
        "required": ["swing", "entries"],
    })
}

fn optimization_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "OptimizationReport",
        "type": "object",
        "properties": {
            "candidates": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "diameter_in": {"type": "number"},
                        "feasible": {"type": "boolean"},
                        "optimal": {"type": "boolean"}
                    },
                    "required": ["diameter_in", "feasible", "optimal"]
                }
            },
            "selected_diameter_in": {"type": "number"},
            "fallback": {"type": "boolean"}
        },
        "required": ["candidates", "selected_diameter_in", "fallback"],
    })
}

fn route_schema() -> serde_json::Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "RouteStatsReport",
        "type": "object",
        "properties": {
            "total_length_miles": {"type": "number"},
            "terrain_mix": {"type": "object"},
            "crossings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "pipeline_id": {"type": "string", "format": "uuid"},
                        "pipeline_name": {"type": "string"},
                        "location": {"type": "object"}
                    },
                    "required": ["pipeline_id", "pipeline_name", "location"]
                }
            },
            "row_share_from_crossings": {"type": "number"}
        },
        "required": ["total_length_miles", "terrain_mix", "crossings"],
    })
}

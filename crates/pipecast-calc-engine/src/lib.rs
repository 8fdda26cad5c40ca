//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
pub mod api;
pub mod costs;
pub mod errors;
pub mod finance;
pub mod geometry;
pub mod hydraulics;
pub mod io;
pub mod model;
pub mod optimizer;
pub mod reports;
pub mod route;
pub mod sensitivity;

use chrono::{DateTime, Utc};
use model::{DiameterSelection, PipelineDesign, ScenarioInputs};
use tracing::info;

use crate::{
    costs::{estimate_costs, CostResult},
    finance::{project_financials, FinancialResult},
    hydraulics::{size_pipeline, EngineeringResult},
    optimizer::{optimize_diameter, OptimizationResult},
    reports::ReportExporter,
    sensitivity::{analyze_sensitivity, SensitivityResult},
};

pub use errors::{CalcEngineError, Result};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProjectAssessment {
    pub timestamp: DateTime<Utc>,
    pub scenario_name: Option<String>,
    /// Design as assessed; under automatic selection the diameter is the
    /// sweep winner rather than the scenario input.
    pub design: PipelineDesign,
    pub engineering: EngineeringResult,
    pub costs: CostResult,
    pub financials: FinancialResult,
    pub sensitivity: SensitivityResult,
    pub optimization: Option<OptimizationResult>,
}

impl ProjectAssessment {
    pub fn exporter(&self) -> ReportExporter<'_> {
        ReportExporter::new(self)
    }
}

/// Runs the full assessment chain without touching the filesystem.
pub fn evaluate_scenario(scenario: &ScenarioInputs) -> Result<ProjectAssessment> {
    scenario.validate()?;

    let mut design = scenario.design.clone();
    let optimization = match scenario.diameter_selection {
        DiameterSelection::Auto => {
            info!("Sweeping the standard diameter catalogue...");
            let result = optimize_diameter(
                &design,
                &scenario.location,
                &scenario.terrain_mix,
                &scenario.terrain_factors,
                &scenario.finance,
            )?;
            design.diameter_in = result.selected_diameter_in;
            Some(result)
        }
        DiameterSelection::Manual => None,
    };

    info!("Running hydraulic sizing...");
    let engineering = size_pipeline(&design)?;

    info!("Running cost estimation...");
    let costs = estimate_costs(
        &design,
        &engineering,
        &scenario.location,
        &scenario.terrain_mix,
        &scenario.terrain_factors,
        &scenario.finance,
    )?;

    info!("Running financial model...");
    let financials = project_financials(&design, &costs, &scenario.finance)?;
    let sensitivity = analyze_sensitivity(&costs, &financials, &scenario.finance);

    Ok(ProjectAssessment {
        timestamp: Utc::now(),
        scenario_name: scenario.name.clone(),
        design,
        engineering,
        costs,
        financials,
        sensitivity,
        optimization,
    })
}

/// Runs the full assessment and writes reports to the default `reports/` directory.
///
/// For fallible usage, prefer [`assess_project_with_options`].
pub fn assess_project(scenario: &ScenarioInputs) -> ProjectAssessment {
    assess_project_with_options(scenario, None).expect("assessment execution should succeed")
}

/// Runs the assessment with a configurable export directory.
/// When `output_dir` is `None`, the default `reports/` directory at the workspace root is used.
pub fn assess_project_with_options(
    scenario: &ScenarioInputs,
    output_dir: Option<&std::path::Path>,
) -> Result<ProjectAssessment> {
    let assessment = evaluate_scenario(scenario)?;

    let default_dir = std::path::Path::new("reports");
    let output_dir = output_dir.unwrap_or(default_dir);
    assessment.exporter().export_all(output_dir)?;

    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        default_terrain_factors, CostBasis, FinanceSchedule, LocationContext, TerrainCategory,
        TerrainMix, GRADE_X70_MPA,
    };
    use chrono::NaiveDate;

    fn reference_scenario() -> ScenarioInputs {
        let mut mix = TerrainMix::new();
        mix.insert(TerrainCategory::FlatDry, 1.0);
        ScenarioInputs {
            name: Some("permian reference".to_string()),
            design: PipelineDesign {
                diameter_in: 8.625,
                length_miles: 100.0,
                grade_smys_mpa: GRADE_X70_MPA,
                design_pressure_psi: 2100.0,
                pump_inlet_pressure_psi: 1300.0,
                design_flow_mt_per_year: 1.0,
                capacity_factor: 0.9,
                elevation_change_ft: 0.0,
                grade_premium_factor: 0.3,
                labour_weight_sensitivity: 0.25,
            },
            location: LocationContext {
                state: "TX".to_string(),
                cost_basis: CostBasis::Nominal,
            },
            finance: FinanceSchedule {
                construction_start: NaiveDate::from_ymd_opt(2028, 6, 1).unwrap(),
                construction_months: 24,
                operational_life_years: 20,
                debt_fraction: 0.6,
                debt_term_years: 15,
                cost_of_debt: 0.06,
                cost_of_equity: 0.10,
                federal_tax_rate: 0.21,
                state_tax_rate: 0.05,
                taxable_entity: true,
                depreciation_years: 20,
                base_cost_year: 2026,
                inflation_general: 0.02,
                escalation_labor: 0.025,
                escalation_power: 0.02,
                escalation_revenue: 0.015,
                co2_price_per_tonne: 20.0,
                power_price_per_mwh: 65.0,
            },
            terrain_mix: mix,
            terrain_factors: default_terrain_factors(),
            diameter_selection: DiameterSelection::Manual,
        }
    }

    #[test]
    fn manual_assessment_exports_the_report_set() {
        let scenario = reference_scenario();
        let output = tempfile::tempdir().unwrap();

        let assessment =
            assess_project_with_options(&scenario, Some(output.path())).unwrap();

        assert_eq!(assessment.scenario_name.as_deref(), Some("permian reference"));
        assert!(assessment.optimization.is_none());
        assert_eq!(assessment.design.diameter_in, 8.625);
        assert!(assessment.financials.npv_project > 0.0);
        assert_eq!(assessment.sensitivity.entries.len(), 8);

        for name in ["engineering.json", "costs.json", "financials.json", "sensitivity.json"] {
            assert!(output.path().join(name).exists(), "missing {name}");
        }
        assert!(!output.path().join("optimization.json").exists());
    }

    #[test]
    fn auto_selection_replaces_the_scenario_diameter() {
        let mut scenario = reference_scenario();
        scenario.diameter_selection = DiameterSelection::Auto;
        let output = tempfile::tempdir().unwrap();

        let assessment =
            assess_project_with_options(&scenario, Some(output.path())).unwrap();

        assert_eq!(assessment.design.diameter_in, 6.625);
        let optimization = assessment.optimization.as_ref().unwrap();
        assert!(!optimization.fallback);
        assert_eq!(optimization.selected_diameter_in, 6.625);
        // The sweep winner and the assessed design agree on every figure.
        let winner = optimization
            .candidates
            .iter()
            .find(|candidate| candidate.optimal)
            .unwrap();
        assert!(
            (winner.financials.npv_project - assessment.financials.npv_project).abs() < 1e-6
        );
        assert!(output.path().join("optimization.json").exists());
    }

    #[test]
    fn invalid_scenarios_are_rejected_before_any_work() {
        let mut scenario = reference_scenario();
        scenario.design.length_miles = 0.0;
        assert!(evaluate_scenario(&scenario).is_err());
    }
}

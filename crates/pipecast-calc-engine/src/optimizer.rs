//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    costs::{self, CostResult},
    errors::Result,
    finance::{self, FinancialResult},
    hydraulics::{self, EngineeringResult, STANDARD_DIAMETERS_IN},
    model::{FinanceSchedule, LocationContext, PipelineDesign, TerrainFactors, TerrainMix},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiameterCandidate {
    pub diameter_in: f64,
    pub engineering: EngineeringResult,
    pub costs: CostResult,
    pub financials: FinancialResult,
    pub feasible: bool,
    pub optimal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// One candidate per standard diameter, in catalogue order.
    pub candidates: Vec<DiameterCandidate>,
    pub selected_diameter_in: f64,
    /// Set when no candidate keeps the velocity inside the operating window
    /// and the largest diameter is returned instead.
    pub fallback: bool,
}

/// Sweeps the standard diameter catalogue and selects the feasible candidate
/// with the highest project NPV. Velocity feasibility is the only gate; cost
/// and financing differences surface through the NPV ranking.
pub fn optimize_diameter(
    design: &PipelineDesign,
    location: &LocationContext,
    mix: &TerrainMix,
    factors: &TerrainFactors,
    schedule: &FinanceSchedule,
) -> Result<OptimizationResult> {
    let mut candidates = Vec::with_capacity(STANDARD_DIAMETERS_IN.len());
    let mut best: Option<(usize, f64)> = None;

    for &diameter in STANDARD_DIAMETERS_IN.iter() {
        let mut candidate_design = design.clone();
        candidate_design.diameter_in = diameter;

        let engineering = hydraulics::size_pipeline(&candidate_design)?;
        let cost_result =
            costs::estimate_costs(&candidate_design, &engineering, location, mix, factors, schedule)?;
        let financials = finance::project_financials(&candidate_design, &cost_result, schedule)?;

        let feasible = engineering.velocity_in_window;
        if feasible {
            let npv = financials.npv_project;
            if best.map_or(true, |(_, best_npv)| npv > best_npv) {
                best = Some((candidates.len(), npv));
            }
        }
        candidates.push(DiameterCandidate {
            diameter_in: diameter,
            engineering,
            costs: cost_result,
            financials,
            feasible,
            optimal: false,
        });
    }

    let (selected_index, fallback) = match best {
        Some((index, _)) => (index, false),
        None => {
            warn!(
                "no diameter keeps velocity in the operating window; falling back to the largest"
            );
            (candidates.len() - 1, true)
        }
    };
    candidates[selected_index].optimal = true;
    let selected_diameter_in = candidates[selected_index].diameter_in;

    info!(
        "Diameter sweep complete: selected {:.3} in out of {} candidates (fallback: {})",
        selected_diameter_in,
        candidates.len(),
        fallback
    );

    Ok(OptimizationResult {
        candidates,
        selected_diameter_in,
        fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_terrain_factors, CostBasis, TerrainCategory, GRADE_X70_MPA};
    use chrono::NaiveDate;

    fn reference_design() -> PipelineDesign {
        PipelineDesign {
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
        }
    }

    fn reference_schedule() -> FinanceSchedule {
        FinanceSchedule {
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
        }
    }

    fn texas() -> LocationContext {
        LocationContext {
            state: "TX".to_string(),
            cost_basis: CostBasis::Nominal,
        }
    }

    fn flat_mix() -> TerrainMix {
        let mut mix = TerrainMix::new();
        mix.insert(TerrainCategory::FlatDry, 1.0);
        mix
    }

    fn sweep(flow_mt: f64) -> OptimizationResult {
        let mut design = reference_design();
        design.design_flow_mt_per_year = flow_mt;
        optimize_diameter(
            &design,
            &texas(),
            &flat_mix(),
            &default_terrain_factors(),
            &reference_schedule(),
        )
        .unwrap()
    }

    #[test]
    fn one_megatonne_selects_the_smallest_npv_winner() {
        let result = sweep(1.0);
        assert_eq!(result.candidates.len(), STANDARD_DIAMETERS_IN.len());
        assert!(!result.fallback);
        assert_eq!(result.selected_diameter_in, 6.625);

        let feasible: Vec<f64> = result
            .candidates
            .iter()
            .filter(|c| c.feasible)
            .map(|c| c.diameter_in)
            .collect();
        assert_eq!(feasible, vec![6.625, 8.625, 10.75]);

        let winner = result
            .candidates
            .iter()
            .find(|c| c.optimal)
            .expect("one candidate carries the optimal flag");
        assert_eq!(winner.diameter_in, 6.625);
        assert!((winner.financials.npv_project - 81_765_408.449).abs() < 1.0);
        assert_eq!(
            result.candidates.iter().filter(|c| c.optimal).count(),
            1
        );
    }

    #[test]
    fn five_megatonnes_push_the_selection_wider() {
        let result = sweep(5.0);
        assert!(!result.fallback);
        assert_eq!(result.selected_diameter_in, 12.75);

        let winner = &result.candidates[4];
        assert!(winner.optimal);
        assert!((winner.engineering.velocity_m_s - 2.205973).abs() < 1e-5);
        assert_eq!(winner.engineering.pump_stations, 3);
        assert!((winner.financials.npv_project - 644_357_678.496).abs() < 1.0);

        // Everything narrower than 12.75 in runs too fast at 5 Mt/yr.
        for candidate in &result.candidates[..4] {
            assert!(!candidate.feasible);
        }
    }

    #[test]
    fn trickle_flow_falls_back_to_the_largest_diameter() {
        let result = sweep(0.05);
        assert!(result.fallback);
        assert_eq!(result.selected_diameter_in, 36.0);
        assert!(result.candidates.iter().all(|c| !c.feasible));
        assert!(result.candidates.last().unwrap().optimal);
    }

    #[test]
    fn unbuildable_pressure_rating_propagates_as_error() {
        let mut design = reference_design();
        // Above ~50.4 kpsi the Barlow wall consumes the full bore at every
        // catalogue diameter.
        design.design_pressure_psi = 60_000.0;
        let result = optimize_diameter(
            &design,
            &texas(),
            &flat_mix(),
            &default_terrain_factors(),
            &reference_schedule(),
        );
        assert!(result.is_err());
    }
}

//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalcEngineError, Result};
use crate::hydraulics;

pub const GRADE_X52_MPA: f64 = 359.0;
pub const GRADE_X60_MPA: f64 = 414.0;
pub const GRADE_X65_MPA: f64 = 448.0;
pub const GRADE_X70_MPA: f64 = 483.0;
pub const GRADE_X80_MPA: f64 = 552.0;

pub const MAX_OPERATIONAL_LIFE_YEARS: u32 = 30;
pub const TERRAIN_SUM_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInputs {
    #[serde(default)]
    pub name: Option<String>,
    pub design: PipelineDesign,
    pub location: LocationContext,
    pub finance: FinanceSchedule,
    pub terrain_mix: TerrainMix,
    #[serde(default = "default_terrain_factors")]
    pub terrain_factors: TerrainFactors,
    #[serde(default)]
    pub diameter_selection: DiameterSelection,
}

impl ScenarioInputs {
    pub fn validate(&self) -> Result<()> {
        self.design.validate()?;
        validate_terrain(&self.terrain_mix, &self.terrain_factors)?;
        self.finance.validate()
    }
}

/// Whether the assessment pins the scenario's own diameter or follows the
/// optimizer's recommendation. Manual selection skips the sweep entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DiameterSelection {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDesign {
    pub diameter_in: f64,
    pub length_miles: f64,
    pub grade_smys_mpa: f64,
    pub design_pressure_psi: f64,
    pub pump_inlet_pressure_psi: f64,
    pub design_flow_mt_per_year: f64,
    pub capacity_factor: f64,
    #[serde(default)]
    pub elevation_change_ft: f64,
    #[serde(default = "default_grade_premium_factor")]
    pub grade_premium_factor: f64,
    #[serde(default = "default_labour_weight_sensitivity")]
    pub labour_weight_sensitivity: f64,
}

impl PipelineDesign {
    pub fn validate(&self) -> Result<()> {
        if !hydraulics::is_standard_diameter(self.diameter_in) {
            return Err(CalcEngineError::invalid(
                "diameter_in",
                format!(
                    "{} in is not in the standard diameter set",
                    self.diameter_in
                ),
            ));
        }
        if self.length_miles <= 0.0 {
            return Err(CalcEngineError::invalid(
                "length_miles",
                format!("must be positive, got {}", self.length_miles),
            ));
        }
        if self.grade_smys_mpa <= 0.0 {
            return Err(CalcEngineError::invalid(
                "grade_smys_mpa",
                format!("must be positive, got {}", self.grade_smys_mpa),
            ));
        }
        if self.pump_inlet_pressure_psi < 0.0 {
            return Err(CalcEngineError::invalid(
                "pump_inlet_pressure_psi",
                format!("must be non-negative, got {}", self.pump_inlet_pressure_psi),
            ));
        }
        if self.design_pressure_psi <= self.pump_inlet_pressure_psi {
            return Err(CalcEngineError::invalid(
                "design_pressure_psi",
                format!(
                    "must exceed pump inlet pressure ({} <= {})",
                    self.design_pressure_psi, self.pump_inlet_pressure_psi
                ),
            ));
        }
        if self.design_flow_mt_per_year <= 0.0 {
            return Err(CalcEngineError::invalid(
                "design_flow_mt_per_year",
                format!("must be positive, got {}", self.design_flow_mt_per_year),
            ));
        }
        if self.capacity_factor <= 0.0 || self.capacity_factor > 1.0 {
            return Err(CalcEngineError::invalid(
                "capacity_factor",
                format!("must lie in (0, 1], got {}", self.capacity_factor),
            ));
        }
        if self.grade_premium_factor < 0.0 {
            return Err(CalcEngineError::invalid(
                "grade_premium_factor",
                format!("must be non-negative, got {}", self.grade_premium_factor),
            ));
        }
        if !(0.0..=1.0).contains(&self.labour_weight_sensitivity) {
            return Err(CalcEngineError::invalid(
                "labour_weight_sensitivity",
                format!("must lie in [0, 1], got {}", self.labour_weight_sensitivity),
            ));
        }
        Ok(())
    }
}

fn default_grade_premium_factor() -> f64 {
    0.3
}

fn default_labour_weight_sensitivity() -> f64 {
    0.25
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum TerrainCategory {
    FlatDry,
    RollingHills,
    Mountainous,
    MarshWetland,
    River,
    ExistingRow,
    HighPopulation,
    ShallowOffshore,
    DeepOffshore,
}

impl TerrainCategory {
    pub const ALL: [TerrainCategory; 9] = [
        TerrainCategory::FlatDry,
        TerrainCategory::RollingHills,
        TerrainCategory::Mountainous,
        TerrainCategory::MarshWetland,
        TerrainCategory::River,
        TerrainCategory::ExistingRow,
        TerrainCategory::HighPopulation,
        TerrainCategory::ShallowOffshore,
        TerrainCategory::DeepOffshore,
    ];

    pub fn default_factor(self) -> f64 {
        match self {
            TerrainCategory::FlatDry => 1.00,
            TerrainCategory::RollingHills => 1.15,
            TerrainCategory::Mountainous => 1.60,
            TerrainCategory::MarshWetland => 1.40,
            TerrainCategory::River => 1.80,
            TerrainCategory::ExistingRow => 0.85,
            TerrainCategory::HighPopulation => 1.50,
            TerrainCategory::ShallowOffshore => 2.20,
            TerrainCategory::DeepOffshore => 3.00,
        }
    }
}

pub type TerrainMix = BTreeMap<TerrainCategory, f64>;
pub type TerrainFactors = BTreeMap<TerrainCategory, f64>;

pub fn default_terrain_factors() -> TerrainFactors {
    TerrainCategory::ALL
        .iter()
        .map(|&category| (category, category.default_factor()))
        .collect()
}

pub fn validate_terrain(mix: &TerrainMix, factors: &TerrainFactors) -> Result<()> {
    let mut share_sum = 0.0;
    for (category, &share) in mix {
        if !(0.0..=1.0).contains(&share) {
            return Err(CalcEngineError::invalid(
                "terrain_mix",
                format!("share for {category:?} must lie in [0, 1], got {share}"),
            ));
        }
        share_sum += share;
    }
    if (share_sum - 1.0).abs() > TERRAIN_SUM_TOLERANCE {
        return Err(CalcEngineError::invalid(
            "terrain_mix",
            format!("shares must sum to 1.0 +/- {TERRAIN_SUM_TOLERANCE}, got {share_sum}"),
        ));
    }
    for (category, &factor) in factors {
        if factor <= 0.0 {
            return Err(CalcEngineError::invalid(
                "terrain_factors",
                format!("multiplier for {category:?} must be positive, got {factor}"),
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationContext {
    pub state: String,
    #[serde(default)]
    pub cost_basis: CostBasis,
}

/// Published $/mile cost bases at the 8.625 in reference diameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum CostBasis {
    #[default]
    Nominal,
    McCoy,
    Parker,
    Rui,
    Heddle,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnitCosts {
    pub material_per_mile: f64,
    pub labour_per_mile: f64,
    pub right_of_way_per_mile: f64,
    pub misc_per_mile: f64,
}

impl CostBasis {
    pub fn unit_costs(self) -> UnitCosts {
        match self {
            CostBasis::Nominal => UnitCosts {
                material_per_mile: 215_000.0,
                labour_per_mile: 340_000.0,
                right_of_way_per_mile: 55_000.0,
                misc_per_mile: 110_000.0,
            },
            CostBasis::McCoy => UnitCosts {
                material_per_mile: 226_000.0,
                labour_per_mile: 366_000.0,
                right_of_way_per_mile: 48_000.0,
                misc_per_mile: 129_000.0,
            },
            CostBasis::Parker => UnitCosts {
                material_per_mile: 183_000.0,
                labour_per_mile: 391_000.0,
                right_of_way_per_mile: 41_000.0,
                misc_per_mile: 96_000.0,
            },
            CostBasis::Rui => UnitCosts {
                material_per_mile: 241_000.0,
                labour_per_mile: 314_000.0,
                right_of_way_per_mile: 62_000.0,
                misc_per_mile: 121_000.0,
            },
            CostBasis::Heddle => UnitCosts {
                material_per_mile: 198_000.0,
                labour_per_mile: 356_000.0,
                right_of_way_per_mile: 37_000.0,
                misc_per_mile: 104_000.0,
            },
        }
    }
}

impl FromStr for CostBasis {
    type Err = CalcEngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nominal" => Ok(CostBasis::Nominal),
            "mccoy" => Ok(CostBasis::McCoy),
            "parker" => Ok(CostBasis::Parker),
            "rui" => Ok(CostBasis::Rui),
            "heddle" => Ok(CostBasis::Heddle),
            other => Err(CalcEngineError::UnknownCostBasis(other.to_string())),
        }
    }
}

impl fmt::Display for CostBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CostBasis::Nominal => "nominal",
            CostBasis::McCoy => "mccoy",
            CostBasis::Parker => "parker",
            CostBasis::Rui => "rui",
            CostBasis::Heddle => "heddle",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceSchedule {
    pub construction_start: NaiveDate,
    pub construction_months: u32,
    pub operational_life_years: u32,
    pub debt_fraction: f64,
    pub debt_term_years: u32,
    pub cost_of_debt: f64,
    pub cost_of_equity: f64,
    pub federal_tax_rate: f64,
    pub state_tax_rate: f64,
    pub taxable_entity: bool,
    pub depreciation_years: u32,
    pub base_cost_year: i32,
    pub inflation_general: f64,
    pub escalation_labor: f64,
    pub escalation_power: f64,
    pub escalation_revenue: f64,
    pub co2_price_per_tonne: f64,
    pub power_price_per_mwh: f64,
}

impl FinanceSchedule {
    pub fn validate(&self) -> Result<()> {
        if self.construction_months == 0 {
            return Err(CalcEngineError::invalid(
                "construction_months",
                "must be at least 1".to_string(),
            ));
        }
        if self.operational_life_years == 0
            || self.operational_life_years > MAX_OPERATIONAL_LIFE_YEARS
        {
            return Err(CalcEngineError::invalid(
                "operational_life_years",
                format!(
                    "must lie in [1, {MAX_OPERATIONAL_LIFE_YEARS}], got {}",
                    self.operational_life_years
                ),
            ));
        }
        if !(0.0..1.0).contains(&self.debt_fraction) {
            return Err(CalcEngineError::invalid(
                "debt_fraction",
                format!("must lie in [0, 1), got {}", self.debt_fraction),
            ));
        }
        if self.debt_term_years == 0 {
            return Err(CalcEngineError::invalid(
                "debt_term_years",
                "must be at least 1".to_string(),
            ));
        }
        if self.depreciation_years == 0 {
            return Err(CalcEngineError::invalid(
                "depreciation_years",
                "must be at least 1".to_string(),
            ));
        }
        if self.cost_of_debt < 0.0 {
            return Err(CalcEngineError::invalid(
                "cost_of_debt",
                format!("must be non-negative, got {}", self.cost_of_debt),
            ));
        }
        if self.cost_of_equity <= 0.0 {
            return Err(CalcEngineError::invalid(
                "cost_of_equity",
                format!("must be positive, got {}", self.cost_of_equity),
            ));
        }
        if !(0.0..1.0).contains(&self.federal_tax_rate) {
            return Err(CalcEngineError::invalid(
                "federal_tax_rate",
                format!("must lie in [0, 1), got {}", self.federal_tax_rate),
            ));
        }
        if !(0.0..1.0).contains(&self.state_tax_rate) {
            return Err(CalcEngineError::invalid(
                "state_tax_rate",
                format!("must lie in [0, 1), got {}", self.state_tax_rate),
            ));
        }
        for (field, rate) in [
            ("inflation_general", self.inflation_general),
            ("escalation_labor", self.escalation_labor),
            ("escalation_power", self.escalation_power),
            ("escalation_revenue", self.escalation_revenue),
        ] {
            if rate <= -1.0 {
                return Err(CalcEngineError::invalid(
                    field,
                    format!("must exceed -1.0, got {rate}"),
                ));
            }
        }
        if self.co2_price_per_tonne < 0.0 {
            return Err(CalcEngineError::invalid(
                "co2_price_per_tonne",
                format!("must be non-negative, got {}", self.co2_price_per_tonne),
            ));
        }
        if self.power_price_per_mwh < 0.0 {
            return Err(CalcEngineError::invalid(
                "power_price_per_mwh",
                format!("must be non-negative, got {}", self.power_price_per_mwh),
            ));
        }
        let combined_tax = if self.taxable_entity {
            self.federal_tax_rate + self.state_tax_rate * (1.0 - self.federal_tax_rate)
        } else {
            0.0
        };
        let wacc = self.debt_fraction * self.cost_of_debt * (1.0 - combined_tax)
            + (1.0 - self.debt_fraction) * self.cost_of_equity;
        if wacc <= 0.0 {
            return Err(CalcEngineError::invalid(
                "finance",
                format!("weighted average cost of capital must be positive, got {wacc}"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainZone {
    pub id: Uuid,
    pub name: String,
    pub category: TerrainCategory,
    pub polygon: Vec<MapPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingPipeline {
    pub id: Uuid,
    pub name: String,
    pub path: Vec<MapPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteScenario {
    #[serde(default)]
    pub name: Option<String>,
    pub route_points: Vec<MapPoint>,
    #[serde(default)]
    pub terrain_zones: Vec<TerrainZone>,
    #[serde(default)]
    pub existing_pipelines: Vec<ExistingPipeline>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_design() -> PipelineDesign {
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

    fn sample_schedule() -> FinanceSchedule {
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

    #[test]
    fn valid_design_passes() {
        assert!(sample_design().validate().is_ok());
    }

    #[test]
    fn non_standard_diameter_rejected() {
        let mut design = sample_design();
        design.diameter_in = 9.0;
        let err = design.validate().unwrap_err();
        assert!(matches!(
            err,
            CalcEngineError::InvalidInput {
                field: "diameter_in",
                ..
            }
        ));
    }

    #[test]
    fn capacity_factor_bounds_enforced() {
        let mut design = sample_design();
        design.capacity_factor = 0.0;
        assert!(design.validate().is_err());
        design.capacity_factor = 1.2;
        assert!(design.validate().is_err());
        design.capacity_factor = 1.0;
        assert!(design.validate().is_ok());
    }

    #[test]
    fn pressure_ordering_enforced() {
        let mut design = sample_design();
        design.design_pressure_psi = 1300.0;
        assert!(design.validate().is_err());
    }

    #[test]
    fn terrain_mix_must_sum_to_one() {
        let factors = default_terrain_factors();
        let mut mix = TerrainMix::new();
        mix.insert(TerrainCategory::FlatDry, 0.6);
        mix.insert(TerrainCategory::River, 0.3);
        assert!(validate_terrain(&mix, &factors).is_err());
        mix.insert(TerrainCategory::Mountainous, 0.1);
        assert!(validate_terrain(&mix, &factors).is_ok());
    }

    #[test]
    fn terrain_share_out_of_range_rejected() {
        let factors = default_terrain_factors();
        let mut mix = TerrainMix::new();
        mix.insert(TerrainCategory::FlatDry, 1.4);
        mix.insert(TerrainCategory::River, -0.4);
        assert!(validate_terrain(&mix, &factors).is_err());
    }

    #[test]
    fn non_positive_terrain_factor_rejected() {
        let mut factors = default_terrain_factors();
        factors.insert(TerrainCategory::River, 0.0);
        let mut mix = TerrainMix::new();
        mix.insert(TerrainCategory::FlatDry, 1.0);
        assert!(validate_terrain(&mix, &factors).is_err());
    }

    #[test]
    fn schedule_bounds_enforced() {
        let mut schedule = sample_schedule();
        schedule.operational_life_years = 0;
        assert!(schedule.validate().is_err());
        schedule.operational_life_years = MAX_OPERATIONAL_LIFE_YEARS + 1;
        assert!(schedule.validate().is_err());
        schedule.operational_life_years = MAX_OPERATIONAL_LIFE_YEARS;
        assert!(schedule.validate().is_ok());

        schedule = sample_schedule();
        schedule.debt_fraction = 1.0;
        assert!(schedule.validate().is_err());
        schedule.debt_fraction = 0.0;
        assert!(schedule.validate().is_ok());

        schedule = sample_schedule();
        schedule.depreciation_years = 0;
        assert!(schedule.validate().is_err());
    }

    #[test]
    fn cost_basis_parses_case_insensitively() {
        assert_eq!(CostBasis::from_str("McCoy").unwrap(), CostBasis::McCoy);
        assert_eq!(CostBasis::from_str("NOMINAL").unwrap(), CostBasis::Nominal);
        assert!(matches!(
            CostBasis::from_str("fern").unwrap_err(),
            CalcEngineError::UnknownCostBasis(name) if name == "fern"
        ));
    }

    #[test]
    fn default_terrain_factors_cover_every_category() {
        let factors = default_terrain_factors();
        assert_eq!(factors.len(), TerrainCategory::ALL.len());
        assert_eq!(factors[&TerrainCategory::DeepOffshore], 3.00);
        assert_eq!(factors[&TerrainCategory::ExistingRow], 0.85);
    }

    #[test]
    fn scenario_roundtrips_through_json_and_yaml() {
        let mut mix = TerrainMix::new();
        mix.insert(TerrainCategory::FlatDry, 1.0);
        let scenario = ScenarioInputs {
            name: Some("roundtrip".to_string()),
            design: sample_design(),
            location: LocationContext {
                state: "TX".to_string(),
                cost_basis: CostBasis::McCoy,
            },
            finance: sample_schedule(),
            terrain_mix: mix,
            terrain_factors: default_terrain_factors(),
            diameter_selection: DiameterSelection::Manual,
        };

        let json = serde_json::to_string(&scenario).unwrap();
        let from_json: ScenarioInputs = serde_json::from_str(&json).unwrap();
        assert_eq!(from_json.location.cost_basis, CostBasis::McCoy);
        assert_eq!(from_json.diameter_selection, DiameterSelection::Manual);

        let yaml = serde_yaml::to_string(&scenario).unwrap();
        let from_yaml: ScenarioInputs = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(from_yaml.design.diameter_in, 8.625);
        assert_eq!(from_yaml.terrain_mix.len(), 1);
    }

    #[test]
    fn omitted_terrain_factors_fall_back_to_defaults() {
        let json = serde_json::json!({
            "design": {
                "diameter_in": 8.625,
                "length_miles": 100.0,
                "grade_smys_mpa": 483.0,
                "design_pressure_psi": 2100.0,
                "pump_inlet_pressure_psi": 1300.0,
                "design_flow_mt_per_year": 1.0,
                "capacity_factor": 0.9
            },
            "location": { "state": "TX" },
            "finance": serde_json::to_value(sample_schedule()).unwrap(),
            "terrain_mix": { "FlatDry": 1.0 }
        });
        let scenario: ScenarioInputs = serde_json::from_value(json).unwrap();
        assert_eq!(scenario.terrain_factors.len(), TerrainCategory::ALL.len());
        assert_eq!(scenario.diameter_selection, DiameterSelection::Auto);
        assert_eq!(scenario.design.grade_premium_factor, 0.3);
        assert_eq!(scenario.design.labour_weight_sensitivity, 0.25);
        assert!(scenario.validate().is_ok());
    }
}

//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    costs::CostResult,
    finance::FinancialResult,
    model::FinanceSchedule,
};

/// Each driver is swung by this fraction in both directions.
pub const SENSITIVITY_SWING: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityDriver {
    Co2Price,
    FlowRate,
    Capex,
    Opex,
    CostOfEquity,
    DebtFraction,
    PipelineLength,
    PowerPrice,
}

impl fmt::Display for SensitivityDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SensitivityDriver::Co2Price => "CO2 price",
            SensitivityDriver::FlowRate => "Flow rate",
            SensitivityDriver::Capex => "CAPEX",
            SensitivityDriver::Opex => "OPEX",
            SensitivityDriver::CostOfEquity => "Cost of equity",
            SensitivityDriver::DebtFraction => "Debt fraction",
            SensitivityDriver::PipelineLength => "Pipeline length",
            SensitivityDriver::PowerPrice => "Power price",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityEntry {
    pub driver: SensitivityDriver,
    /// Project-NPV delta when the driver swings down.
    pub low_delta_npv: f64,
    /// Project-NPV delta when the driver swings up.
    pub high_delta_npv: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub swing: f64,
    /// Entries ordered by descending spread, tornado style.
    pub entries: Vec<SensitivityEntry>,
}

fn annuity_factor(rate: f64, years: u32) -> f64 {
    (1..=years).map(|t| (1.0 + rate).powi(-(t as i32))).sum()
}

/// First-order tornado around the base case: each driver swings by
/// [`SENSITIVITY_SWING`] and its project-NPV impact is approximated from the
/// year-one flows annuitized over the operating life.
pub fn analyze_sensitivity(
    costs: &CostResult,
    financials: &FinancialResult,
    schedule: &FinanceSchedule,
) -> SensitivityResult {
    if financials.years.len() < 2 {
        warn!("sensitivity needs at least one operating year; returning an empty tornado");
        return SensitivityResult {
            swing: SENSITIVITY_SWING,
            entries: Vec::new(),
        };
    }

    let tax_rate = financials.tax_rate;
    let wacc = financials.wacc;
    let life = schedule.operational_life_years;
    let factor = annuity_factor(wacc, life);
    let post_tax = |x: f64| x * (1.0 - tax_rate) * factor;

    let first = &financials.years[1];
    let revenue = first.revenue;
    let operating_cost = first.operating_cost;
    let power_cost = costs.escalated.power_opex;
    let unlevered = first.unlevered_cash_flow;

    let swing = SENSITIVITY_SWING;
    let mut entries = Vec::with_capacity(8);
    let mut push = |driver, low, high: f64| {
        entries.push(SensitivityEntry {
            driver,
            low_delta_npv: low,
            high_delta_npv: high,
            spread: (high - low).abs(),
        });
    };

    let revenue_swing = post_tax(swing * revenue);
    push(SensitivityDriver::Co2Price, -revenue_swing, revenue_swing);

    // Throughput moves revenue and pumping power together.
    let margin_swing = post_tax(swing * (revenue - power_cost));
    push(SensitivityDriver::FlowRate, -margin_swing, margin_swing);

    let capex_swing = swing * financials.total_capex;
    push(SensitivityDriver::Capex, capex_swing, -capex_swing);

    let opex_swing = post_tax(swing * operating_cost);
    push(SensitivityDriver::Opex, opex_swing, -opex_swing);

    // The equity rate reprices the discount factor itself rather than a cash
    // flow, so the annuity is rebuilt at the shifted WACC.
    let debt_leg = schedule.debt_fraction * schedule.cost_of_debt * (1.0 - tax_rate);
    let equity_weight = 1.0 - schedule.debt_fraction;
    let wacc_low = debt_leg + equity_weight * schedule.cost_of_equity * (1.0 - swing);
    let wacc_high = debt_leg + equity_weight * schedule.cost_of_equity * (1.0 + swing);
    push(
        SensitivityDriver::CostOfEquity,
        unlevered * (annuity_factor(wacc_low, life) - factor),
        unlevered * (annuity_factor(wacc_high, life) - factor),
    );

    let shield_swing = swing * financials.debt_principal * tax_rate;
    push(SensitivityDriver::DebtFraction, -shield_swing, shield_swing);

    let length_swing = swing * costs.escalated.pipeline_subtotal;
    push(SensitivityDriver::PipelineLength, length_swing, -length_swing);

    let power_swing = post_tax(swing * power_cost);
    push(SensitivityDriver::PowerPrice, power_swing, -power_swing);

    entries.sort_by(|a, b| b.spread.total_cmp(&a.spread));

    SensitivityResult { swing, entries }
}

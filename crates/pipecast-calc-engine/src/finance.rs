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
use tracing::info;

use crate::{
    costs::{CostBreakdown, CostResult},
    errors::Result,
    model::{FinanceSchedule, PipelineDesign},
};

pub const IRR_SEED: f64 = 0.10;
pub const IRR_MAX_ITERATIONS: u32 = 100;
pub const IRR_NPV_TOLERANCE: f64 = 1.0e-4;
pub const IRR_RATE_FLOOR: f64 = -0.99;
pub const IRR_RATE_CEILING: f64 = 10.0;
pub const BREAKEVEN_MAX_ITERATIONS: u32 = 50;
/// Breakeven Newton stops once |project NPV| drops below this fraction of
/// total CAPEX.
pub const BREAKEVEN_NPV_TOLERANCE_RATIO: f64 = 1.0e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowYear {
    pub year: u32,
    pub revenue: f64,
    pub operating_cost: f64,
    pub ebitda: f64,
    pub depreciation: f64,
    pub ebit: f64,
    pub interest: f64,
    pub principal: f64,
    pub taxable_income: f64,
    pub tax: f64,
    pub net_income: f64,
    pub equity_cash_flow: f64,
    pub unlevered_cash_flow: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialResult {
    pub tax_rate: f64,
    pub wacc: f64,
    pub total_capex: f64,
    pub debt_principal: f64,
    pub equity_investment: f64,
    pub annual_debt_service: f64,
    pub average_annual_interest: f64,
    pub average_annual_principal: f64,
    pub annual_depreciation: f64,
    /// Year 0 carries the construction outlay; years 1..=life the operating
    /// flows.
    pub years: Vec<CashFlowYear>,
    pub irr_equity: Option<f64>,
    pub irr_project: Option<f64>,
    pub npv_project: f64,
    pub npv_equity: f64,
    pub payback_months: Option<f64>,
    pub discounted_payback_months: Option<f64>,
    pub dscr_year_one: Option<f64>,
    pub interest_coverage_year_one: Option<f64>,
    pub net_debt_to_ebitda: Option<f64>,
    pub breakeven_price_before_tax: f64,
    pub breakeven_price_after_tax: f64,
}

/// Federal rate plus state rate on the federally-taxed remainder; zero for
/// pass-through entities.
pub fn combined_tax_rate(schedule: &FinanceSchedule) -> f64 {
    if schedule.taxable_entity {
        schedule.federal_tax_rate + schedule.state_tax_rate * (1.0 - schedule.federal_tax_rate)
    } else {
        0.0
    }
}

pub fn weighted_average_cost_of_capital(schedule: &FinanceSchedule) -> f64 {
    let tax_rate = combined_tax_rate(schedule);
    schedule.debt_fraction * schedule.cost_of_debt * (1.0 - tax_rate)
        + (1.0 - schedule.debt_fraction) * schedule.cost_of_equity
}

pub fn delivered_tonnes_per_year(design: &PipelineDesign) -> f64 {
    design.design_flow_mt_per_year * 1.0e6 * design.capacity_factor
}

pub fn npv(rate: f64, flows: &[f64]) -> f64 {
    flows
        .iter()
        .enumerate()
        .map(|(t, cash)| cash / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Newton iteration from a fixed seed; `None` when the root is not found
/// within the iteration limit or the derivative vanishes.
pub fn internal_rate_of_return(flows: &[f64]) -> Option<f64> {
    let mut rate = IRR_SEED;
    for _ in 0..IRR_MAX_ITERATIONS {
        let value = npv(rate, flows);
        if value.abs() < IRR_NPV_TOLERANCE {
            return Some(rate);
        }
        let derivative: f64 = flows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(t, cash)| -(t as f64) * cash / (1.0 + rate).powi(t as i32 + 1))
            .sum();
        if derivative == 0.0 {
            return None;
        }
        rate -= value / derivative;
        rate = rate.clamp(IRR_RATE_FLOOR, IRR_RATE_CEILING);
    }
    None
}

fn unlevered_flows(
    tonnes_per_year: f64,
    escalated: &CostBreakdown,
    schedule: &FinanceSchedule,
    tax_rate: f64,
    price_per_tonne: f64,
) -> Vec<f64> {
    let capex = escalated.total_capex;
    let depreciation = capex / schedule.depreciation_years as f64;
    let maintenance_base = escalated.pipeline_opex + escalated.facility_opex;
    let mut flows = Vec::with_capacity(schedule.operational_life_years as usize + 1);
    flows.push(-capex);
    for t in 1..=schedule.operational_life_years {
        let exponent = t as i32 - 1;
        let revenue =
            tonnes_per_year * price_per_tonne * (1.0 + schedule.escalation_revenue).powi(exponent);
        let operating = maintenance_base * (1.0 + schedule.inflation_general).powi(exponent)
            + escalated.power_opex * (1.0 + schedule.escalation_power).powi(exponent);
        let ebitda = revenue - operating;
        let dep = if t <= schedule.depreciation_years {
            depreciation
        } else {
            0.0
        };
        let ebit = ebitda - dep;
        flows.push(ebit * (1.0 - tax_rate) + dep);
    }
    flows
}

fn project_npv_at_price(
    tonnes_per_year: f64,
    escalated: &CostBreakdown,
    schedule: &FinanceSchedule,
    tax_rate: f64,
    wacc: f64,
    price_per_tonne: f64,
) -> f64 {
    npv(
        wacc,
        &unlevered_flows(tonnes_per_year, escalated, schedule, tax_rate, price_per_tonne),
    )
}

/// Builds the levered and unlevered cash-flow model over the operating life
/// and derives returns, paybacks, coverage ratios, and breakeven CO2 prices.
pub fn project_financials(
    design: &PipelineDesign,
    costs: &CostResult,
    schedule: &FinanceSchedule,
) -> Result<FinancialResult> {
    schedule.validate()?;

    let tax_rate = combined_tax_rate(schedule);
    let wacc = weighted_average_cost_of_capital(schedule);
    let escalated = &costs.escalated;
    let capex = escalated.total_capex;
    let debt = capex * schedule.debt_fraction;
    let equity = capex - debt;

    let term = schedule.debt_term_years;
    let rate = schedule.cost_of_debt;
    // Zero-rate or zero-debt schedules carry no interest at all, so the
    // averaged split is only derived for priced debt.
    let (service, average_interest) = if debt > 0.0 && rate > 0.0 {
        let service = debt * rate / (1.0 - (1.0 + rate).powi(-(term as i32)));
        (service, (service * term as f64 - debt) / term as f64)
    } else if debt > 0.0 {
        (debt / term as f64, 0.0)
    } else {
        (0.0, 0.0)
    };
    let average_principal = service - average_interest;
    let depreciation = capex / schedule.depreciation_years as f64;

    let tonnes_per_year = delivered_tonnes_per_year(design);
    let price = schedule.co2_price_per_tonne;
    let maintenance_base = escalated.pipeline_opex + escalated.facility_opex;

    let mut years = Vec::with_capacity(schedule.operational_life_years as usize + 1);
    years.push(CashFlowYear {
        year: 0,
        revenue: 0.0,
        operating_cost: 0.0,
        ebitda: 0.0,
        depreciation: 0.0,
        ebit: 0.0,
        interest: 0.0,
        principal: 0.0,
        taxable_income: 0.0,
        tax: 0.0,
        net_income: 0.0,
        equity_cash_flow: -equity,
        unlevered_cash_flow: -capex,
    });
    for t in 1..=schedule.operational_life_years {
        let exponent = t as i32 - 1;
        let revenue =
            tonnes_per_year * price * (1.0 + schedule.escalation_revenue).powi(exponent);
        let maintenance =
            maintenance_base * (1.0 + schedule.inflation_general).powi(exponent);
        let power = escalated.power_opex * (1.0 + schedule.escalation_power).powi(exponent);
        let operating_cost = maintenance + power;
        let ebitda = revenue - operating_cost;
        let dep = if t <= schedule.depreciation_years {
            depreciation
        } else {
            0.0
        };
        let ebit = ebitda - dep;
        // Straight-line declining interest profile; the closed form keeps the
        // model free of a year-by-year amortization table.
        let (interest, principal) = if t <= term {
            let interest = average_interest * (term - t + 1) as f64 / term as f64;
            (interest, service - interest)
        } else {
            (0.0, 0.0)
        };
        let taxable_income = ebit - interest;
        let tax = (taxable_income * tax_rate).max(0.0);
        let net_income = taxable_income - tax;
        let unlevered_cash_flow = ebit * (1.0 - tax_rate) + dep;
        let equity_cash_flow = net_income + dep - principal;
        years.push(CashFlowYear {
            year: t,
            revenue,
            operating_cost,
            ebitda,
            depreciation: dep,
            ebit,
            interest,
            principal,
            taxable_income,
            tax,
            net_income,
            equity_cash_flow,
            unlevered_cash_flow,
        });
    }

    let equity_flows: Vec<f64> = years.iter().map(|y| y.equity_cash_flow).collect();
    let project_flows: Vec<f64> = years.iter().map(|y| y.unlevered_cash_flow).collect();

    let irr_equity = internal_rate_of_return(&equity_flows);
    let irr_project = internal_rate_of_return(&project_flows);
    let npv_project = npv(wacc, &project_flows);
    let npv_equity = npv(schedule.cost_of_equity, &equity_flows);

    let mut cumulative = 0.0;
    let mut payback_months = None;
    for (t, &value) in equity_flows.iter().enumerate() {
        let previous = cumulative;
        cumulative += value;
        if t > 0 && previous < 0.0 && cumulative >= 0.0 {
            let fraction = if value > 0.0 { -previous / value } else { 0.0 };
            payback_months = Some(((t - 1) as f64 + fraction) * 12.0);
            break;
        }
    }
    let mut cumulative = 0.0;
    let mut discounted_payback_months = None;
    for (t, &value) in equity_flows.iter().enumerate() {
        let discounted = value / (1.0 + schedule.cost_of_equity).powi(t as i32);
        let previous = cumulative;
        cumulative += discounted;
        if t > 0 && previous < 0.0 && cumulative >= 0.0 {
            discounted_payback_months = Some(t as f64 * 12.0);
            break;
        }
    }

    let first = &years[1];
    let dscr_year_one = (service > 0.0).then(|| first.ebitda / service);
    let interest_coverage_year_one =
        (average_interest > 0.0).then(|| first.ebit / average_interest);
    let net_debt_to_ebitda = (first.ebitda > 0.0).then(|| debt / first.ebitda);

    let opex_first = first.operating_cost;
    let breakeven_price_before_tax =
        (opex_first + service + equity * schedule.cost_of_equity) / tonnes_per_year;

    let grossed_return = if schedule.taxable_entity {
        equity * schedule.cost_of_equity / (1.0 - tax_rate)
    } else {
        equity * schedule.cost_of_equity
    };
    let mut breakeven_price = (opex_first + service + grossed_return) / tonnes_per_year;
    for _ in 0..BREAKEVEN_MAX_ITERATIONS {
        let value = project_npv_at_price(
            tonnes_per_year,
            escalated,
            schedule,
            tax_rate,
            wacc,
            breakeven_price,
        );
        if value.abs() < BREAKEVEN_NPV_TOLERANCE_RATIO * capex {
            break;
        }
        let step = (breakeven_price.abs() * 1.0e-6).max(1.0e-6);
        let ahead = project_npv_at_price(
            tonnes_per_year,
            escalated,
            schedule,
            tax_rate,
            wacc,
            breakeven_price + step,
        );
        let slope = (ahead - value) / step;
        if slope <= 0.0 {
            break;
        }
        breakeven_price -= value / slope;
    }

    info!(
        "Financial model complete: project NPV {:.1} M$ over {} operating years",
        npv_project / 1.0e6,
        schedule.operational_life_years
    );

    Ok(FinancialResult {
        tax_rate,
        wacc,
        total_capex: capex,
        debt_principal: debt,
        equity_investment: equity,
        annual_debt_service: service,
        average_annual_interest: average_interest,
        average_annual_principal: average_principal,
        annual_depreciation: depreciation,
        years,
        irr_equity,
        irr_project,
        npv_project,
        npv_equity,
        payback_months,
        discounted_payback_months,
        dscr_year_one,
        interest_coverage_year_one,
        net_debt_to_ebitda,
        breakeven_price_before_tax,
        breakeven_price_after_tax: breakeven_price,
    })
}

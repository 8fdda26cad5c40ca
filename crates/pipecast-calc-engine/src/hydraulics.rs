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
    errors::{CalcEngineError, Result},
    model::PipelineDesign,
};

/// Nominal outside diameters (inches) the optimizer sweeps, smallest first.
pub const STANDARD_DIAMETERS_IN: [f64; 12] = [
    4.5, 6.625, 8.625, 10.75, 12.75, 14.0, 16.0, 18.0, 20.0, 24.0, 30.0, 36.0,
];

pub const MPA_TO_PSI: f64 = 145.037738;
pub const DESIGN_FACTOR: f64 = 0.72;
/// Dense-phase CO2 at typical trunk-line conditions.
pub const CO2_DENSITY_KG_M3: f64 = 950.0;
pub const CO2_VISCOSITY_PA_S: f64 = 6.0e-5;
pub const PIPE_ROUGHNESS_M: f64 = 0.0000457;
pub const IN_TO_M: f64 = 0.0254;
pub const PSI_TO_PA: f64 = 6894.757;
pub const MILE_TO_M: f64 = 1609.344;
pub const ELEVATION_PSI_PER_FT: f64 = 0.347;
pub const PUMP_EFFICIENCY: f64 = 0.75;
pub const SECONDS_PER_YEAR: f64 = 31_536_000.0;
pub const UNBOUNDED_SEGMENT_MILES: f64 = 999.0;
pub const VELOCITY_MIN_M_S: f64 = 0.5;
pub const VELOCITY_MAX_M_S: f64 = 3.0;

const COLEBROOK_ITERATIONS: u32 = 10;
const COLEBROOK_SEED: f64 = 0.02;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineeringResult {
    pub wall_thickness_in: f64,
    pub inner_diameter_in: f64,
    pub inner_diameter_m: f64,
    pub velocity_m_s: f64,
    pub reynolds_number: f64,
    pub friction_factor: f64,
    pub friction_psi_per_mile: f64,
    pub elevation_pressure_psi: f64,
    pub total_pressure_loss_psi: f64,
    pub max_segment_miles: f64,
    pub pump_stations: u32,
    pub pump_power_per_station_kw: f64,
    pub pump_power_total_kw: f64,
    pub velocity_in_window: bool,
}

pub fn is_standard_diameter(diameter_in: f64) -> bool {
    STANDARD_DIAMETERS_IN
        .iter()
        .any(|&standard| (standard - diameter_in).abs() < 1e-6)
}

/// Barlow wall thickness in inches for a given design pressure (psi),
/// outside diameter (inches), and steel grade SMYS (MPa).
pub fn wall_thickness_in(design_pressure_psi: f64, diameter_in: f64, smys_mpa: f64) -> f64 {
    design_pressure_psi * diameter_in / (2.0 * smys_mpa * MPA_TO_PSI * DESIGN_FACTOR)
}

/// Colebrook-White friction factor, solved as exactly ten fixed-point
/// iterations seeded at f = 0.02. The iteration count is part of the
/// output contract; do not replace with a convergence loop.
pub fn colebrook_white(reynolds: f64, relative_roughness: f64) -> f64 {
    let mut f = COLEBROOK_SEED;
    for _ in 0..COLEBROOK_ITERATIONS {
        let argument = relative_roughness / 3.7 + 2.51 / (reynolds * f.sqrt());
        f = (-2.0 * argument.log10()).powi(-2);
    }
    f
}

pub fn size_pipeline(design: &PipelineDesign) -> Result<EngineeringResult> {
    design.validate()?;

    let wall_thickness = wall_thickness_in(
        design.design_pressure_psi,
        design.diameter_in,
        design.grade_smys_mpa,
    );
    let inner_diameter_in = design.diameter_in - 2.0 * wall_thickness;
    if inner_diameter_in <= 0.0 {
        return Err(CalcEngineError::invalid(
            "diameter_in",
            format!(
                "wall thickness {wall_thickness:.3} in leaves no flow area at {} in OD",
                design.diameter_in
            ),
        ));
    }
    let inner_diameter_m = inner_diameter_in * IN_TO_M;

    let mass_flow_kg_s = design.design_flow_mt_per_year * 1.0e9 / SECONDS_PER_YEAR;
    let volumetric_flow_m3_s = mass_flow_kg_s / CO2_DENSITY_KG_M3;
    let flow_area_m2 = std::f64::consts::PI * inner_diameter_m * inner_diameter_m / 4.0;
    let velocity_m_s = volumetric_flow_m3_s / flow_area_m2;

    let reynolds_number = CO2_DENSITY_KG_M3 * velocity_m_s * inner_diameter_m / CO2_VISCOSITY_PA_S;
    let relative_roughness = PIPE_ROUGHNESS_M / inner_diameter_m;
    let friction_factor = colebrook_white(reynolds_number, relative_roughness);

    // Darcy-Weisbach in Pa/m, converted to psi/mile.
    let loss_pa_per_m =
        friction_factor * CO2_DENSITY_KG_M3 * velocity_m_s * velocity_m_s / (2.0 * inner_diameter_m);
    let friction_psi_per_mile = loss_pa_per_m * MILE_TO_M / PSI_TO_PA;

    let elevation_pressure_psi = design.elevation_change_ft * ELEVATION_PSI_PER_FT;
    let total_pressure_loss_psi =
        friction_psi_per_mile * design.length_miles + elevation_pressure_psi;

    let effective_rate = friction_psi_per_mile + elevation_pressure_psi / design.length_miles;
    let available_boost_psi = design.design_pressure_psi - design.pump_inlet_pressure_psi;
    let max_segment_miles = if effective_rate > 0.0 {
        available_boost_psi / effective_rate
    } else {
        warn!(
            effective_rate,
            "non-positive effective loss rate; treating segment length as unbounded"
        );
        UNBOUNDED_SEGMENT_MILES
    };

    let pump_stations = ((design.length_miles / max_segment_miles).ceil() as u32).max(1);
    let boost_pa = available_boost_psi * PSI_TO_PA;
    let pump_power_per_station_kw =
        mass_flow_kg_s * boost_pa / (CO2_DENSITY_KG_M3 * PUMP_EFFICIENCY * 1000.0);
    let pump_power_total_kw = pump_power_per_station_kw * pump_stations as f64;

    let velocity_in_window =
        (VELOCITY_MIN_M_S..=VELOCITY_MAX_M_S).contains(&velocity_m_s);
    if !velocity_in_window {
        warn!(
            velocity_m_s,
            diameter_in = design.diameter_in,
            "velocity outside the {VELOCITY_MIN_M_S}-{VELOCITY_MAX_M_S} m/s window"
        );
    }

    info!(
        "Hydraulic sizing complete: {:.3} in OD, {:.2} m/s, {} pump station(s), {:.0} kW total",
        design.diameter_in, velocity_m_s, pump_stations, pump_power_total_kw
    );

    Ok(EngineeringResult {
        wall_thickness_in: wall_thickness,
        inner_diameter_in,
        inner_diameter_m,
        velocity_m_s,
        reynolds_number,
        friction_factor,
        friction_psi_per_mile,
        elevation_pressure_psi,
        total_pressure_loss_psi,
        max_segment_miles,
        pump_stations,
        pump_power_per_station_kw,
        pump_power_total_kw,
        velocity_in_window,
    })
}

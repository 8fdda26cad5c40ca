//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    errors::{CalcEngineError, Result},
    geometry::{self, Aabb},
    model::{MapPoint, RouteScenario, TerrainCategory, TerrainMix},
};

pub const MILES_PER_PIXEL: f64 = 0.1;
/// Right-of-way mileage credited per deduplicated pipeline crossing.
pub const ROW_MILES_PER_CROSSING: f64 = 0.19;
/// Crossing credit never converts more than this share of the route.
pub const ROW_FRACTION_CAP: f64 = 0.15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCrossing {
    pub pipeline_id: Uuid,
    pub pipeline_name: String,
    pub location: MapPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAnalysis {
    pub total_length_miles: f64,
    /// Normalized terrain shares along the route, crossing credit included.
    pub terrain_mix: TerrainMix,
    pub crossings: Vec<RouteCrossing>,
    /// Share of the route converted to existing right-of-way by crossings.
    pub row_share_from_crossings: f64,
}

/// Classifies a drawn route against zone bounding boxes, counts crossings of
/// existing pipelines, and folds both into a terrain mix ready for costing.
pub fn analyze_route(scenario: &RouteScenario) -> Result<RouteAnalysis> {
    if scenario.route_points.len() < 2 {
        return Err(CalcEngineError::invalid(
            "route_points",
            format!("need at least two points, got {}", scenario.route_points.len()),
        ));
    }
    let route = geometry::to_points(&scenario.route_points);
    let total_pixels = geometry::path_length(&route);
    if total_pixels <= 0.0 {
        return Err(CalcEngineError::invalid(
            "route_points",
            "route has no extent".to_string(),
        ));
    }

    let zone_bounds: Vec<(TerrainCategory, Aabb)> = scenario
        .terrain_zones
        .iter()
        .filter_map(|zone| {
            Aabb::from_points(&geometry::to_points(&zone.polygon))
                .map(|bounds| (zone.category, bounds))
        })
        .collect();

    // Segment midpoints decide the category; the first matching zone wins.
    let mut pixels_by_category: BTreeMap<TerrainCategory, f64> = BTreeMap::new();
    for window in route.windows(2) {
        let length = (window[1] - window[0]).norm();
        if length <= 0.0 {
            continue;
        }
        let midpoint = geometry::midpoint(window[0], window[1]);
        let category = zone_bounds
            .iter()
            .find(|(_, bounds)| bounds.contains(midpoint))
            .map(|(category, _)| *category)
            .unwrap_or(TerrainCategory::FlatDry);
        *pixels_by_category.entry(category).or_insert(0.0) += length;
    }

    let mut crossings = Vec::new();
    let mut seen: BTreeSet<(Uuid, usize)> = BTreeSet::new();
    for pipeline in &scenario.existing_pipelines {
        let path = geometry::to_points(&pipeline.path);
        for (segment_index, segment) in path.windows(2).enumerate() {
            for window in route.windows(2) {
                if !geometry::segments_intersect(window[0], window[1], segment[0], segment[1]) {
                    continue;
                }
                if seen.insert((pipeline.id, segment_index)) {
                    let point = geometry::segment_intersection_point(
                        window[0],
                        window[1],
                        segment[0],
                        segment[1],
                    );
                    crossings.push(RouteCrossing {
                        pipeline_id: pipeline.id,
                        pipeline_name: pipeline.name.clone(),
                        location: MapPoint {
                            x: point.x,
                            y: point.y,
                        },
                    });
                }
            }
        }
    }

    let total_length_miles = total_pixels * MILES_PER_PIXEL;
    let row_miles = (ROW_MILES_PER_CROSSING * crossings.len() as f64)
        .min(ROW_FRACTION_CAP * total_length_miles);
    let row_share = row_miles / total_length_miles;

    let mut terrain_mix: TerrainMix = pixels_by_category
        .into_iter()
        .map(|(category, pixels)| (category, pixels / total_pixels * (1.0 - row_share)))
        .collect();
    if row_share > 0.0 {
        *terrain_mix.entry(TerrainCategory::ExistingRow).or_insert(0.0) += row_share;
    }

    info!(
        "Route analysis complete: {:.1} miles, {} crossings, {} terrain categories",
        total_length_miles,
        crossings.len(),
        terrain_mix.len()
    );

    Ok(RouteAnalysis {
        total_length_miles,
        terrain_mix,
        crossings,
        row_share_from_crossings: row_share,
    })
}

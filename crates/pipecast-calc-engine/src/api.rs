//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use crate::model::{RouteScenario, ScenarioInputs};

#[cfg(feature = "rest-api")]
pub use rest::router;

#[cfg(feature = "rest-api")]
mod rest {
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use std::sync::Arc;

    use crate::{
        errors::CalcEngineError, evaluate_scenario, optimizer::optimize_diameter,
        optimizer::OptimizationResult, route::analyze_route, route::RouteAnalysis,
        sensitivity::SensitivityResult, ProjectAssessment,
    };

    use super::{AssessmentRequest, RouteRequest};

    #[derive(Clone, Default)]
    pub struct CalcEngineState;

    pub fn router() -> Router {
        Router::new()
            .route("/api/calc/assess", post(assess))
            .route("/api/calc/optimize", post(optimize))
            .route("/api/calc/sensitivity", post(sensitivity))
            .route("/api/calc/route", post(route_stats))
            .with_state(Arc::new(CalcEngineState))
    }

    async fn assess(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<AssessmentRequest>,
    ) -> Result<Json<ProjectAssessment>, StatusCode> {
        evaluate_scenario(&payload.scenario).map(Json).map_err(map_err)
    }

    async fn sensitivity(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<AssessmentRequest>,
    ) -> Result<Json<SensitivityResult>, StatusCode> {
        let assessment = evaluate_scenario(&payload.scenario).map_err(map_err)?;
        Ok(Json(assessment.sensitivity))
    }

    async fn optimize(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<AssessmentRequest>,
    ) -> Result<Json<OptimizationResult>, StatusCode> {
        let scenario = &payload.scenario;
        scenario.validate().map_err(map_err)?;
        optimize_diameter(
            &scenario.design,
            &scenario.location,
            &scenario.terrain_mix,
            &scenario.terrain_factors,
            &scenario.finance,
        )
        .map(Json)
        .map_err(map_err)
    }

    async fn route_stats(
        State(_): State<Arc<CalcEngineState>>,
        Json(payload): Json<RouteRequest>,
    ) -> Result<Json<RouteAnalysis>, StatusCode> {
        analyze_route(&payload.scenario).map(Json).map_err(map_err)
    }

    fn map_err(err: CalcEngineError) -> StatusCode {
        match err {
            CalcEngineError::InvalidInput { .. } | CalcEngineError::UnknownCostBasis(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssessmentRequest {
    pub scenario: ScenarioInputs,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RouteRequest {
    pub scenario: RouteScenario,
}

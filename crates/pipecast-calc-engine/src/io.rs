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

use serde::de::DeserializeOwned;

use crate::{
    errors::Result,
    model::{RouteScenario, ScenarioInputs},
};

fn load_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(path)?;
    let document = if data.trim_start().starts_with('{') {
        serde_json::from_str(&data)?
    } else {
        serde_yaml::from_str(&data)?
    };
    Ok(document)
}

/// Loads a scenario document, accepting JSON or YAML by content sniffing.
pub fn load_scenario_from_file(path: impl AsRef<Path>) -> Result<ScenarioInputs> {
    load_document(path)
}

pub fn load_route_scenario_from_file(path: impl AsRef<Path>) -> Result<RouteScenario> {
    load_document(path)
}

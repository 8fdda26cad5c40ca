//! ---
//! pcast_section: "02-pipeline-analytics"
//! pcast_subsection: "module"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Hydraulic sizing and techno-economic analyses for CO2 pipelines."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcEngineError>;

#[derive(Debug, Error)]
pub enum CalcEngineError {
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("unknown cost basis '{0}'")]
    UnknownCostBasis(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("yaml serialization error: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
}

impl CalcEngineError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CalcEngineError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

//! Estimator errors

use thiserror::Error;

use crate::domain::{LaborRole, ProjectType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    #[error("unknown labor role: {}", .0.as_str())]
    UnknownLaborRole(LaborRole),

    #[error("unknown {category} risk factor: {key}")]
    UnknownRiskFactor { category: &'static str, key: String },

    #[error("unknown project type: {0}")]
    UnknownProjectType(ProjectType),
}

impl EstimateError {
    /// Validation errors are the caller's to fix; the rest mean the
    /// reference data is incomplete.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidValue { .. })
    }
}

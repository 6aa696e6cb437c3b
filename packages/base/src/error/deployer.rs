use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("Environment value {name} must be defined")]
    MissingEnv { name: String },

    #[error("Unknown network profile: {name}")]
    UnknownNetwork { name: String },

    #[error("No chain gateway is linked for network {name}")]
    UnsupportedNetwork { name: String },

    #[error("Can't read artifact {path}: {reason}")]
    Artifact { path: String, reason: String },

    #[error("{operation} rejected by chain: {reason}")]
    Gateway { operation: String, reason: String },

    #[error("Step {step} requires {field}, which is not set")]
    UnsetDependency { step: String, field: String },

    #[error("Step {step} reads {field} before any earlier step writes it")]
    PipelineOrder { step: String, field: String },

    #[error("Invalid distribution: {reason}")]
    InvalidDistribution { reason: String },

    #[error("Input closed while waiting at checkpoint: {label}")]
    InputClosed { label: String },
}

impl DeployError {
    pub fn gateway(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Gateway {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

pub type DeployResult<T> = Result<T, DeployError>;

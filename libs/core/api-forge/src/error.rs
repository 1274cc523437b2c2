//! Error types for API Forge

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::{AppError, ErrorCode, ErrorResponse};
use serde_json::json;
use strum::Display;
use thiserror::Error;

/// Result type for API Forge operations
pub type Result<T> = std::result::Result<T, ApiForgeError>;

/// Boxed cause carried by an aggregation failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stage of document assembly at which an aggregation failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AggregationStep {
    /// Querying the registry for services and actions
    ListServices,
    /// Merging a service-level `settings.openapi` fragment
    ServiceFragment,
    /// Reading an action-level fragment and its `$path` field
    ParsePath,
    /// Writing an operation into the `paths` table
    InsertPath,
}

/// Errors that can occur in API Forge
#[derive(Debug, Error)]
pub enum ApiForgeError {
    /// Building the aggregated document failed; nothing was published
    #[error("Schema aggregation failed at {step} ({context}): {source}")]
    Aggregation {
        step: AggregationStep,
        context: String,
        #[source]
        source: BoxError,
    },

    /// A fragment does not have the shape the merge engine expects
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    /// The registry could not be queried
    #[error("Registry error: {0}")]
    Registry(String),

    /// A service manifest or override document could not be parsed
    #[error("Failed to parse {source_name}: {details}")]
    Manifest {
        source_name: String,
        details: String,
    },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiForgeError {
    /// Wraps `source` as the failure of aggregation step `step`.
    pub fn aggregation(
        step: AggregationStep,
        context: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Aggregation {
            step,
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn invalid_fragment(message: impl Into<String>) -> Self {
        Self::InvalidFragment(message.into())
    }

    /// The step at which aggregation failed, if this is an aggregation failure.
    pub fn step(&self) -> Option<AggregationStep> {
        match self {
            Self::Aggregation { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl IntoResponse for ApiForgeError {
    fn into_response(self) -> Response {
        match self {
            ApiForgeError::Aggregation {
                step,
                context,
                source,
            } => {
                tracing::error!(
                    error_code = ErrorCode::SchemaAggregation.code(),
                    step = %step,
                    context = %context,
                    "Schema aggregation failed: {}",
                    source
                );
                ErrorResponse::new(
                    ErrorCode::SchemaAggregation,
                    ErrorCode::SchemaAggregation.default_message(),
                )
                .with_details(json!({
                    "step": step.to_string(),
                    "context": context,
                    "cause": source.to_string(),
                }))
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiForgeError::Io(e) => AppError::Io(e).into_response(),
            ApiForgeError::Serialization(e) => AppError::SerdeJson(e).into_response(),
            ApiForgeError::Registry(msg) => AppError::ServiceUnavailable(msg).into_response(),
            other => AppError::InternalServerError(other.to_string()).into_response(),
        }
    }
}

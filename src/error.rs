//! Error types for the provider.

use thiserror::Error;

use crate::arm::ArmError;
use crate::schema::Diagnostic;

/// Errors returned by provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A management API call failed.
    ///
    /// `context` names the resource and the call that failed.
    #[error("{context}: {source}")]
    Api {
        /// What was being read when the call failed.
        context: String,
        /// The underlying client error.
        #[source]
        source: ArmError,
    },

    /// A value could not be written into the data source's state.
    #[error("setting `{field}`: {reason}")]
    FieldSetting {
        /// The attribute being written.
        field: String,
        /// Why the write was rejected.
        reason: String,
    },

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Get the error message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Api { context, .. } => context,
            Self::FieldSetting { reason, .. } => reason,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::DeadlineExceeded(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
        }
    }

    /// Whether this error reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        let diagnostic = Diagnostic::error(err.to_string());
        match err {
            ProviderError::FieldSetting { field, .. } => diagnostic.with_attribute(field),
            _ => diagnostic,
        }
    }
}

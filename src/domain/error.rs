use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Well-formed error payload returned by the upstream API
    #[error("Upstream error {errcode}: {errmsg}")]
    Upstream {
        errcode: i64,
        errmsg: String,
        payload: serde_json::Value,
    },

    /// Upstream API could not be reached or answered with garbage
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn upstream(errcode: i64, errmsg: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Upstream {
            errcode,
            errmsg: errmsg.into(),
            payload,
        }
    }

    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for failures reported by the upstream service itself
    pub fn is_upstream_application_error(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

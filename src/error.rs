//! Error types for tfcost
//!
//! This module defines the error handling strategy for tfcost. There are two
//! error types: `TfcostError` (main error enum) and `ConfigError` (configuration-specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `TfcostError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling, and maps
//! `TfcostError` to a process exit code through `crate::exit_codes`.
//!
//! ## Per-source outcomes
//!
//! Extraction errors are reported per input source. Some of them are not
//! failures at all: `UnrecognizedResourceType` and `NoResourcesFound` are
//! informational (see `is_informational`) and the pipeline logs and skips them.
//! Everything else aborts the run unless the caller asked to keep going.
//!
//! ## Retry Awareness
//!
//! Errors implement `IsRetryable`. Only the pricing transport (`Pricing`),
//! `Io` and `Retryable` variants are retryable. A rejected query (HTTP 4xx)
//! or a bad price in a response is never retried.

use thiserror::Error;

/// Main error type for tfcost
#[derive(Error, Debug)]
pub enum TfcostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Resource type not recognized: {resource_type}")]
    UnrecognizedResourceType { resource_type: String },

    #[error("Malformed declaration in {source_name}: {address} - {reason}")]
    MalformedDeclaration {
        source_name: String,
        address: String,
        reason: String,
    },

    #[error("No resources found in {source_name}")]
    NoResourcesFound { source_name: String },

    #[error("Failed to read {source_name}: {cause}")]
    SourceUnreadable {
        source_name: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Shape '{shape}' is not a valid {resource_type} shape")]
    InvalidShapeKey {
        resource_type: String,
        shape: String,
    },

    #[error("Failed to serialize pricing query: {0}")]
    QuerySerialization(#[source] serde_json::Error),

    #[error("Query alias collision: '{alias}' is produced by both {first} and {second}")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Invalid price for {shape} (alias {alias}): '{value}'")]
    PriceParse {
        alias: String,
        shape: String,
        value: String,
    },

    #[error("Pricing service error: {message}")]
    Pricing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Pricing service rejected the query (HTTP {status}): {body}")]
    PricingRejected { status: u16, body: String },

    #[error("Retryable error (attempt {attempt}/{max_attempts}): {reason}")]
    Retryable {
        attempt: u32,
        max_attempts: u32,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TfcostError {
    /// Build a `SourceUnreadable` error, keeping the underlying error intact.
    pub fn unreadable(
        source_name: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        TfcostError::SourceUnreadable {
            source_name: source_name.into(),
            cause: cause.into(),
        }
    }

    pub fn malformed(
        source_name: impl Into<String>,
        address: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TfcostError::MalformedDeclaration {
            source_name: source_name.into(),
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Non-fatal per-source outcomes that are logged and skipped.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            TfcostError::UnrecognizedResourceType { .. } | TfcostError::NoResourcesFound { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TfcostError>;

/// Render an error and its causes on one line.
///
/// Several variants already embed their cause in their own message, so a
/// cause whose text is already shown is left out.
pub fn format_error_chain(error: &anyhow::Error) -> String {
    let mut out = error.to_string();
    for cause in error.chain().skip(1) {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
    }
    out
}

/// Trait for determining if an error is retryable
///
/// Used by `RetryPolicy` implementations to determine whether an error
/// should trigger a retry attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for TfcostError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            TfcostError::Retryable { .. } | TfcostError::Pricing { .. } | TfcostError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_unreadable_keeps_io_text() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory");
        let err = TfcostError::unreadable("main.tf", io);
        let msg = err.to_string();
        assert!(msg.contains("main.tf"));
        assert!(msg.ends_with("No such file or directory"));
    }

    #[test]
    fn test_informational_variants() {
        assert!(TfcostError::UnrecognizedResourceType {
            resource_type: "aws_s3_bucket".to_string()
        }
        .is_informational());
        assert!(TfcostError::NoResourcesFound {
            source_name: "variables.tf".to_string()
        }
        .is_informational());
        assert!(!TfcostError::malformed("main.tf", "aws_instance.web", "missing instance_type")
            .is_informational());
    }

    #[test]
    fn test_format_error_chain_shows_each_cause_once() {
        let err: anyhow::Error =
            TfcostError::Config(ConfigError::MissingField("region".to_string())).into();
        assert_eq!(
            format_error_chain(&err),
            "Configuration error: Missing required field: region"
        );

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory");
        let err = anyhow::Error::from(TfcostError::unreadable("main.tf", io))
            .context("Failed to estimate");
        assert_eq!(
            format_error_chain(&err),
            "Failed to estimate: Failed to read main.tf: No such file or directory"
        );
    }

    #[test]
    fn test_format_error_chain_keeps_hidden_causes() {
        let transport = TfcostError::Pricing {
            message: "Request to http://localhost failed".to_string(),
            source: Some(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
        };
        let err: anyhow::Error = TfcostError::Retryable {
            attempt: 3,
            max_attempts: 3,
            reason: transport.to_string(),
            source: Some(Box::new(transport)),
        }
        .into();

        let rendered = format_error_chain(&err);
        assert_eq!(
            rendered,
            "Retryable error (attempt 3/3): Pricing service error: Request to http://localhost failed: connection refused"
        );
        assert_eq!(rendered.matches("Request to").count(), 1);
    }

    #[test]
    fn test_price_parse_not_retryable() {
        let err = TfcostError::PriceParse {
            alias: "m4_large_Shared".to_string(),
            shape: "m4.large,Shared".to_string(),
            value: "abc".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("m4.large,Shared"));
    }
}

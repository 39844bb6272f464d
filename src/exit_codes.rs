//! Exit code standardization for tfcost
//!
//! Provides consistent exit codes for different error types so scripts and
//! CI jobs can tell a bad input from a pricing outage.
//!
//! ## Exit Code Convention
//!
//! - `0` = Success
//! - `1` = User error (invalid input, malformed Terraform, no resources)
//! - `2` = System error (pricing service failure, network error, I/O)
//! - `3` = Configuration error (missing region, config parse error)

use crate::error::TfcostError;

/// Standard exit codes for tfcost
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// User error (invalid input, validation failure)
    pub const USER_ERROR: i32 = 1;
    /// System error (pricing service failure, network error)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration error (missing or invalid config)
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map a TfcostError to an appropriate exit code
pub fn exit_code_for_error(error: &TfcostError) -> i32 {
    use TfcostError::*;
    match error {
        Config(_) => codes::CONFIG_ERROR,

        // Problems with what the user pointed us at
        Validation { .. } => codes::USER_ERROR,
        UnrecognizedResourceType { .. } => codes::USER_ERROR,
        MalformedDeclaration { .. } => codes::USER_ERROR,
        NoResourcesFound { .. } => codes::USER_ERROR,
        SourceUnreadable { .. } => codes::USER_ERROR,
        AliasCollision { .. } => codes::USER_ERROR,
        InvalidShapeKey { .. } => codes::USER_ERROR,

        // Pricing service, network, I/O
        Pricing { .. } => codes::SYSTEM_ERROR,
        PricingRejected { .. } => codes::SYSTEM_ERROR,
        PriceParse { .. } => codes::SYSTEM_ERROR,
        Retryable { .. } => codes::SYSTEM_ERROR,
        Io(_) => codes::SYSTEM_ERROR,
        QuerySerialization(_) => codes::SYSTEM_ERROR,
        Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for an error that reached the CLI boundary.
///
/// Errors that are not a `TfcostError` (argument parsing, rendering) count
/// as user errors.
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<TfcostError>() {
        Some(e) => exit_code_for_error(e),
        None => codes::USER_ERROR,
    }
}

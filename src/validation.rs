//! Input validation utilities
//!
//! Provides validation functions for user inputs so that a bad region or
//! running-hours value is rejected before any file is read or request sent.

use crate::catalog;
use crate::error::{Result, TfcostError};

/// Most hours any month can have (31 * 24)
pub const MAX_RUNNING_HOURS: u32 = 744;

/// Validate an AWS region code against the known region table.
pub fn validate_region(region: &str) -> Result<()> {
    if region.trim().is_empty() {
        return Err(TfcostError::Validation {
            field: "region".to_string(),
            reason: "Region cannot be empty".to_string(),
        });
    }

    if catalog::region_display_name(region).is_none() {
        return Err(TfcostError::Validation {
            field: "region".to_string(),
            reason: format!(
                "Unknown region '{}'. Run `tfcost regions` for the supported list",
                region
            ),
        });
    }

    Ok(())
}

/// Validate running hours per month.
///
/// Must be between 1 and 744 inclusive.
pub fn validate_running_hours(hours: u32) -> Result<()> {
    if hours == 0 || hours > MAX_RUNNING_HOURS {
        return Err(TfcostError::Validation {
            field: "running_hours".to_string(),
            reason: format!(
                "Running hours must be between 1 and {}, got: {}",
                MAX_RUNNING_HOURS, hours
            ),
        });
    }
    Ok(())
}

/// Validate a file glob pattern.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(TfcostError::Validation {
            field: "pattern".to_string(),
            reason: "Glob pattern cannot be empty".to_string(),
        });
    }

    if pattern.contains("..") {
        return Err(TfcostError::Validation {
            field: "pattern".to_string(),
            reason: format!("Glob pattern cannot contain '..': {}", pattern),
        });
    }

    Ok(())
}

/// Validate the dedicated tenancy surcharge.
pub fn validate_surcharge(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(TfcostError::Validation {
            field: "dedicated_surcharge".to_string(),
            reason: format!("Surcharge must be a non-negative amount, got: {}", amount),
        });
    }
    Ok(())
}

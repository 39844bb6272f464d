//! tfcost library
//!
//! Estimates the hourly and monthly on-demand cost of the AWS resources
//! declared in Terraform configuration files or a Terraform plan.
//!
//! The pipeline is staged: declarations are extracted into a
//! [`tally::ResourceTally`], the tally becomes one batched
//! [`query::PricingQuery`], a [`pricing::PricingService`] answers it and
//! [`cost::reduce`] turns the answer into a [`cost::CostBreakdown`].

pub mod catalog;
pub mod config;
pub mod cost;
pub mod error;
pub mod estimate;
pub mod exit_codes;
pub mod extract;
pub mod pricing;
pub mod query;
pub mod report;
pub mod retry;
pub mod shape;
pub mod tally;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use cost::{CostBreakdown, CostOptions};
pub use error::{Result, TfcostError};
pub use estimate::{EstimateRequest, Extraction};
pub use pricing::{GraphQlPricingClient, PricingResponse, PricingService};
pub use shape::{Shape, ShapeKey};
pub use tally::ResourceTally;

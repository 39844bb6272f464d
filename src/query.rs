//! Pricing query builder
//!
//! Turns a tally into one batched GraphQL request. Every (resource type,
//! shape) with a positive count becomes one aliased sub-query, so a single
//! round trip returns prices for all of them:
//!
//! ```text
//! { m4_large_Shared: AmazonEC2(Location:"US East (N. Virginia)", ...) {PricePerUnit Unit Currency} ...}
//! ```

use crate::catalog::{self, ResourceTemplate};
use crate::error::{Result, TfcostError};
use crate::shape::{Shape, ShapeKey};
use crate::tally::ResourceTally;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Wire payload sent to the pricing service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: String,
    pub operation_name: String,
}

/// Which tally entry an alias stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasBinding {
    pub alias: String,
    pub resource_type: String,
    pub shape: ShapeKey,
}

/// A built query and the bindings used to build it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingQuery {
    request: GraphQlRequest,
    bindings: Vec<AliasBinding>,
}

impl PricingQuery {
    pub fn request(&self) -> &GraphQlRequest {
        &self.request
    }

    pub fn bindings(&self) -> &[AliasBinding] {
        &self.bindings
    }

    /// True when there is nothing to ask the pricing service.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Serialize the request as the JSON wire payload.
    pub fn to_payload(&self) -> Result<String> {
        serde_json::to_string(&self.request).map_err(TfcostError::QuerySerialization)
    }
}

/// Build the batched pricing query for a tally in `region`.
///
/// Resource types without a query template and shapes with a zero count
/// contribute nothing. An unknown region code is substituted as an empty
/// location, which the pricing service answers with no quotes.
pub fn build(tally: &ResourceTally, region: &str) -> Result<PricingQuery> {
    let location = catalog::region_display_name(region).unwrap_or_else(|| {
        warn!("Region '{}' has no pricing location name", region);
        ""
    });

    let mut fragments = Vec::new();
    let mut bindings: Vec<AliasBinding> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for resource_type in tally.resource_types() {
        let Some(template) = catalog::template(resource_type) else {
            debug!("No query template for {}, skipping", resource_type);
            continue;
        };

        for (key, count) in tally.shapes(resource_type) {
            if count == 0 {
                continue;
            }
            let shape = Shape::decode(template.kind, key).ok_or_else(|| {
                TfcostError::InvalidShapeKey {
                    resource_type: resource_type.to_string(),
                    shape: key.to_string(),
                }
            })?;

            let alias = key.alias();
            if let Some(&i) = seen.get(&alias) {
                let first = &bindings[i];
                return Err(TfcostError::AliasCollision {
                    alias,
                    first: format!("{} {}", first.resource_type, first.shape),
                    second: format!("{} {}", resource_type, key),
                });
            }

            fragments.push(fragment(template, &alias, location, &shape));
            seen.insert(alias.clone(), bindings.len());
            bindings.push(AliasBinding {
                alias,
                resource_type: resource_type.to_string(),
                shape: key.clone(),
            });
        }
    }

    let query = format!("{{{}}}", fragments.concat());
    debug!("Built pricing query with {} alias(es)", bindings.len());

    Ok(PricingQuery {
        request: GraphQlRequest {
            query,
            ..Default::default()
        },
        bindings,
    })
}

fn fragment(template: &ResourceTemplate, alias: &str, location: &str, shape: &Shape) -> String {
    format!(" {}", template.render(alias, location, &shape.attributes()))
}

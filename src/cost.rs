//! Cost reduction
//!
//! Matches the quotes returned for each alias back to the tally, multiplies
//! by the declared count and sums per resource type. A resource type that
//! runs any dedicated-tenancy instance also pays a flat hourly fee, once,
//! no matter how many dedicated shapes or instances it has.
//!
//! The result is built in one pass and not modified afterwards. Any price
//! that does not parse aborts the whole reduction: no partial totals.

use crate::catalog::{self, DEFAULT_DEDICATED_SURCHARGE};
use crate::error::{Result, TfcostError};
use crate::pricing::{PriceQuote, PricingResponse};
use crate::shape::{Shape, ShapeKey};
use crate::tally::ResourceTally;
use serde::Serialize;
use tracing::{debug, warn};

/// Default running hours per month (365 * 24 / 12)
pub const DEFAULT_RUNNING_HOURS: u32 = 730;

/// Unit the pricing service uses for hourly prices
const HOURLY_UNIT: &str = "Hrs";

/// Knobs for turning prices into costs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostOptions {
    /// Hours per month used to project hourly cost to monthly cost
    pub running_hours: u32,
    /// Flat hourly fee per region when any dedicated instance runs
    pub dedicated_surcharge: f64,
}

impl Default for CostOptions {
    fn default() -> Self {
        Self {
            running_hours: DEFAULT_RUNNING_HOURS,
            dedicated_surcharge: DEFAULT_DEDICATED_SURCHARGE,
        }
    }
}

/// Cost of one shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub shape: ShapeKey,
    pub alias: String,
    pub count: u64,
    /// Hourly price of one instance, if the service returned one
    pub unit_price: Option<f64>,
    pub currency: Option<String>,
    /// `unit_price * count`, zero when unpriced
    pub hourly_cost: f64,
}

impl LineItem {
    pub fn is_priced(&self) -> bool {
        self.unit_price.is_some()
    }
}

/// Flat fee applied to a resource type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surcharge {
    pub reason: String,
    /// Shape that triggered the fee
    pub shape: ShapeKey,
    pub hourly_cost: f64,
}

/// Costs of one resource type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceCost {
    pub resource_type: String,
    pub friendly_name: String,
    pub line_items: Vec<LineItem>,
    pub surcharge: Option<Surcharge>,
    pub hourly_total: f64,
    pub monthly_total: f64,
}

/// Costs of everything in a tally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub resources: Vec<ResourceCost>,
    pub running_hours: u32,
    pub hourly_total: f64,
    pub monthly_total: f64,
}

impl CostBreakdown {
    pub fn resource(&self, resource_type: &str) -> Option<&ResourceCost> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type)
    }

    /// Line items the pricing service had no price for.
    pub fn unpriced(&self) -> impl Iterator<Item = (&ResourceCost, &LineItem)> {
        self.resources.iter().flat_map(|r| {
            r.line_items
                .iter()
                .filter(|item| !item.is_priced())
                .map(move |item| (r, item))
        })
    }
}

/// Reduce a tally and the pricing response into a cost breakdown.
pub fn reduce(
    tally: &ResourceTally,
    response: &PricingResponse,
    options: &CostOptions,
) -> Result<CostBreakdown> {
    let hours = options.running_hours as f64;
    let mut resources = Vec::new();

    for resource_type in tally.resource_types() {
        let kind = catalog::kind_of(resource_type);
        let mut line_items = Vec::new();
        let mut surcharge = None;

        for (key, count) in tally.shapes(resource_type) {
            if count == 0 {
                continue;
            }
            let alias = key.alias();
            let (unit_price, currency) = match select_quote(response.quotes(&alias)) {
                Some(quote) => (
                    Some(parse_price(&alias, key, &quote.price_per_unit)?),
                    Some(quote.currency.clone()),
                ),
                None => {
                    warn!("No price returned for {} {} (alias {})", resource_type, key, alias);
                    (None, None)
                }
            };
            let hourly_cost = unit_price.unwrap_or(0.0) * count as f64;
            debug!("{} {} x{} = {}/h", resource_type, key, count, hourly_cost);

            let dedicated = kind
                .and_then(|k| Shape::decode(k, key))
                .map(|s| s.is_dedicated())
                .unwrap_or(false);
            if dedicated && surcharge.is_none() {
                surcharge = Some(Surcharge {
                    reason: "Dedicated tenancy per-region fee".to_string(),
                    shape: key.clone(),
                    hourly_cost: options.dedicated_surcharge,
                });
            }

            line_items.push(LineItem {
                shape: key.clone(),
                alias,
                count,
                unit_price,
                currency,
                hourly_cost,
            });
        }

        let hourly_total = line_items.iter().map(|i| i.hourly_cost).sum::<f64>()
            + surcharge.as_ref().map(|s| s.hourly_cost).unwrap_or(0.0);

        resources.push(ResourceCost {
            resource_type: resource_type.to_string(),
            friendly_name: catalog::friendly_name(resource_type).to_string(),
            line_items,
            surcharge,
            hourly_total,
            monthly_total: hourly_total * hours,
        });
    }

    let hourly_total: f64 = resources.iter().map(|r| r.hourly_total).sum();
    Ok(CostBreakdown {
        resources,
        running_hours: options.running_hours,
        hourly_total,
        monthly_total: hourly_total * hours,
    })
}

/// First hourly quote, or the first quote when none is hourly.
fn select_quote(quotes: &[PriceQuote]) -> Option<&PriceQuote> {
    quotes
        .iter()
        .find(|q| q.unit == HOURLY_UNIT)
        .or_else(|| quotes.first())
}

fn parse_price(alias: &str, shape: &ShapeKey, value: &str) -> Result<f64> {
    let invalid = || TfcostError::PriceParse {
        alias: alias.to_string(),
        shape: shape.to_string(),
        value: value.to_string(),
    };
    let price: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !price.is_finite() || price < 0.0 {
        return Err(invalid());
    }
    Ok(price)
}

//! Pricing service client
//!
//! The pricing service is a GraphQL endpoint in front of the AWS price list
//! (see https://github.com/Bjorn248/graphql_aws_pricing_api). It answers a
//! batched query with one list of quotes per alias:
//!
//! ```text
//! { "data": { "m4_large_Shared": [ { "PricePerUnit": "0.126", "Unit": "Hrs", "Currency": "USD" } ] } }
//! ```

use crate::error::{Result, TfcostError};
use crate::query::PricingQuery;
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public endpoint of the pricing service
pub const DEFAULT_ENDPOINT: &str =
    "https://fvaexi95f8.execute-api.us-east-1.amazonaws.com/Dev/graphql";

/// Request timeout. The first request after an idle period has to wait for
/// the service to warm up and regularly takes tens of seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 40;

/// One price returned for an alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(rename = "PricePerUnit")]
    pub price_per_unit: String,
    #[serde(rename = "Unit", default)]
    pub unit: String,
    #[serde(rename = "Currency", default)]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// Decoded pricing service response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResponse {
    #[serde(default)]
    pub data: Option<BTreeMap<String, Option<Vec<PriceQuote>>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

impl PricingResponse {
    /// Build a response from alias → quotes pairs.
    pub fn from_quotes<I, S>(quotes: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<PriceQuote>)>,
        S: Into<String>,
    {
        Self {
            data: Some(
                quotes
                    .into_iter()
                    .map(|(alias, q)| (alias.into(), Some(q)))
                    .collect(),
            ),
            errors: Vec::new(),
        }
    }

    /// Quotes returned for an alias; empty when the alias is absent or null.
    pub fn quotes(&self, alias: &str) -> &[PriceQuote] {
        self.data
            .as_ref()
            .and_then(|data| data.get(alias))
            .and_then(|q| q.as_deref())
            .unwrap_or(&[])
    }
}

impl PriceQuote {
    pub fn hourly_usd(price: &str) -> Self {
        Self {
            price_per_unit: price.to_string(),
            unit: "Hrs".to_string(),
            currency: "USD".to_string(),
        }
    }
}

/// Something that can answer a pricing query
#[async_trait]
pub trait PricingService: Send + Sync {
    async fn fetch(&self, query: &PricingQuery) -> Result<PricingResponse>;
}

/// HTTP client for the GraphQL pricing service
pub struct GraphQlPricingClient {
    client: reqwest::Client,
    endpoint: String,
    retry: ExponentialBackoffPolicy,
}

impl GraphQlPricingClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, max_attempts: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TfcostError::Pricing {
                message: "Failed to create HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry: ExponentialBackoffPolicy::new(max_attempts),
        })
    }

    pub fn with_retry(mut self, retry: ExponentialBackoffPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, payload: &str) -> Result<PricingResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| TfcostError::Pricing {
                message: format!("Request to {} failed", self.endpoint),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TfcostError::Pricing {
            message: "Failed to read response body".to_string(),
            source: Some(Box::new(e)),
        })?;

        if status.is_client_error() {
            return Err(TfcostError::PricingRejected {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            return Err(TfcostError::Pricing {
                message: format!("HTTP {}: {}", status.as_u16(), body),
                source: None,
            });
        }

        let decoded: PricingResponse =
            serde_json::from_str(&body).map_err(|e| TfcostError::Pricing {
                message: "Failed to decode response body".to_string(),
                source: Some(Box::new(e)),
            })?;

        for error in &decoded.errors {
            warn!("Pricing service reported: {}", error.message);
        }
        if decoded.data.is_none() && !decoded.errors.is_empty() {
            return Err(TfcostError::PricingRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(decoded)
    }
}

#[async_trait]
impl PricingService for GraphQlPricingClient {
    async fn fetch(&self, query: &PricingQuery) -> Result<PricingResponse> {
        if query.is_empty() {
            debug!("Nothing to price, skipping request");
            return Ok(PricingResponse::default());
        }

        let payload = query.to_payload()?;
        info!(
            "Calling pricing service at {} ({} aliases)",
            self.endpoint,
            query.bindings().len()
        );
        self.retry.execute_with_retry(|| self.post(&payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_response() {
        let body = r#"{
  "data": {
    "r3_xlarge_Shared": [ { "PricePerUnit": "0.371", "Unit": "Hrs", "Currency": "USD" } ],
    "m4_large_Shared": [],
    "t2_nano_Shared": null
  }
}"#;
        let response: PricingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.quotes("r3_xlarge_Shared").len(), 1);
        assert_eq!(response.quotes("r3_xlarge_Shared")[0].price_per_unit, "0.371");
        assert!(response.quotes("m4_large_Shared").is_empty());
        assert!(response.quotes("t2_nano_Shared").is_empty());
        assert!(response.quotes("missing").is_empty());
    }

    #[test]
    fn test_decode_response_without_data() {
        let response: PricingResponse =
            serde_json::from_str(r#"{"errors": [{"message": "boom"}]}"#).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "boom");
        assert!(response.quotes("anything").is_empty());
    }
}

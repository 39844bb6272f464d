//! Tests for the HTTP pricing client against a mock endpoint

use mockito::Matcher;
use std::time::Duration;
use tfcost::catalog::AWS_INSTANCE;
use tfcost::error::TfcostError;
use tfcost::pricing::{GraphQlPricingClient, PricingService};
use tfcost::query::{self, PricingQuery};
use tfcost::retry::ExponentialBackoffPolicy;
use tfcost::shape::{Shape, Tenancy};
use tfcost::tally::ResourceTally;

fn sample_query() -> PricingQuery {
    let mut tally = ResourceTally::new();
    tally.add(AWS_INSTANCE, &Shape::compute("m4.large", Tenancy::Shared).key(), 2);
    query::build(&tally, "us-east-1").unwrap()
}

fn client(url: String, max_attempts: u32) -> GraphQlPricingClient {
    GraphQlPricingClient::new(format!("{}/graphql", url), Duration::from_secs(5), max_attempts)
        .unwrap()
        .with_retry(
            ExponentialBackoffPolicy::new(max_attempts).with_initial_delay(Duration::from_millis(1)),
        )
}

#[tokio::test]
async fn test_fetch_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "variables": "",
            "operationName": ""
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data":{"m4_large_Shared":[{"PricePerUnit":"0.126","Unit":"Hrs","Currency":"USD"}]}}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let response = client(server.url(), 3).fetch(&sample_query()).await.unwrap();
    mock.assert_async().await;

    let quotes = response.quotes("m4_large_Shared");
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].price_per_unit, "0.126");
}

#[tokio::test]
async fn test_fetch_sends_built_query() {
    let query = sample_query();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "query": query.request().query.clone()
        })))
        .with_status(200)
        .with_body(r#"{"data":{}}"#)
        .create_async()
        .await;

    client(server.url(), 1).fetch(&query).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .with_status(502)
        .with_body("Bad Gateway")
        .expect(3)
        .create_async()
        .await;

    let err = client(server.url(), 3).fetch(&sample_query()).await.unwrap_err();
    mock.assert_async().await;

    match err {
        TfcostError::Retryable {
            attempt,
            max_attempts,
            ..
        } => {
            assert_eq!(attempt, 3);
            assert_eq!(max_attempts, 3);
        }
        other => panic!("Expected Retryable, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .with_status(400)
        .with_body(r#"{"errors":[{"message":"Syntax Error"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let err = client(server.url(), 3).fetch(&sample_query()).await.unwrap_err();
    mock.assert_async().await;

    match err {
        TfcostError::PricingRejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Syntax Error"));
        }
        other => panic!("Expected PricingRejected, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_graphql_errors_without_data_are_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"Cannot query field"}]}"#)
        .create_async()
        .await;

    let err = client(server.url(), 1).fetch(&sample_query()).await.unwrap_err();
    assert!(matches!(err, TfcostError::PricingRejected { status: 200, .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_pricing_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let err = client(server.url(), 1).fetch(&sample_query()).await.unwrap_err();
    assert!(err.to_string().contains("decode"), "{}", err);
}

#[tokio::test]
async fn test_empty_query_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .expect(0)
        .create_async()
        .await;

    let empty = query::build(&ResourceTally::new(), "us-east-1").unwrap();
    let response = client(server.url(), 1).fetch(&empty).await.unwrap();
    mock.assert_async().await;
    assert!(response.data.is_none());
}

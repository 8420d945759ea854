//! Black-box tests of the payment API's two endpoints.

mod common;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use serde_json::{json, Value};

use common::TestServer;

fn client() -> Client<hyper_util::client::legacy::connect::HttpConnector, Full<Bytes>> {
    Client::builder(TokioExecutor::new()).build_http()
}

async fn post_json(url: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(url)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("failed to build request");
    let response = client()
        .request(request)
        .await
        .expect("request failed to send");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("response was not valid JSON");
    (status, json)
}

async fn get_json(url: &str) -> (StatusCode, Value) {
    let response = client()
        .get(url.parse().expect("invalid URL"))
        .await
        .expect("request failed to send");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("failed to read response body")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("response was not valid JSON");
    (status, json)
}

#[tokio::test]
async fn create_then_read_payment() {
    let server = TestServer::spawn().await;

    let (status, created) = post_json(
        &format!("{}/payments", server.base_url),
        json!({ "address": testing_support::CUSTOMER_ADDRESS, "amount": "1.5" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().expect("response missing id").to_string();
    assert_eq!(created["amount"], "1.5");
    assert_eq!(created["fee"]["percentage"], 10);

    let (status, fetched) = get_json(&format!("{}/payments/{id}", server.base_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["amount"], "1.5");
}

#[tokio::test]
async fn create_payment_without_priority_defaults_to_medium() {
    let server = TestServer::spawn().await;

    // Omitting `priority` entirely must not be treated as an invalid
    // priority: the request should still succeed, using the default.
    let (status, created) = post_json(
        &format!("{}/payments", server.base_url),
        json!({ "address": testing_support::CUSTOMER_ADDRESS, "amount": "2" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].as_str().is_some());
}

#[tokio::test]
async fn create_payment_rejects_unknown_priority() {
    let server = TestServer::spawn().await;

    let (status, body) = post_json(
        &format!("{}/payments", server.base_url),
        json!({
            "address": testing_support::CUSTOMER_ADDRESS,
            "amount": "2",
            "priority": "urgent",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("priority"));
}

#[tokio::test]
async fn create_payment_rejects_malformed_amount() {
    let server = TestServer::spawn().await;

    let (status, body) = post_json(
        &format!("{}/payments", server.base_url),
        json!({ "address": testing_support::CUSTOMER_ADDRESS, "amount": "not-a-number" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("amount"));
}

#[tokio::test]
async fn get_unknown_payment_is_not_found() {
    let server = TestServer::spawn().await;

    let (status, _) = get_json(&format!(
        "{}/payments/00000000-0000-0000-0000-000000000000",
        server.base_url
    ))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_malformed_id_is_bad_request() {
    let server = TestServer::spawn().await;

    let (status, _) = get_json(&format!("{}/payments/not-a-uuid", server.base_url)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

use axum::http::StatusCode;
use axum::http::header::RETRY_AFTER;
use rstest::rstest;
use serde_json::{Value, json};

use crate::tests::fixtures::app::{DEFAULT_CLIENT, TestApp};

fn typename() -> Value {
    json!({ "query": "{ __typename }" })
}

#[rstest]
#[tokio::test]
async fn rejects_the_thirty_first_operation_in_a_minute() {
    let app = TestApp::spawn().await;
    for attempt in 1..=30 {
        let response = app.graphql(typename(), &[]).await;
        assert!(!response.has_errors(), "attempt {attempt}: {}", response.body);
        assert_eq!(response.data()["__typename"], "Query");
    }

    let response = app.graphql(typename(), &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data(), &json!(null));
    assert_eq!(
        *response.first_error(),
        json!({
            "error": "ThrottlerException: Too Many Requests",
            "message": "ThrottlerException: Too Many Requests",
            "status": "TOO_MANY_REQUESTS",
            "statusCode": 429
        })
    );
    assert!(response.headers.contains_key(RETRY_AFTER));
    assert_eq!(response.headers["x-ratelimit-remaining"], "0");
}

#[rstest]
#[tokio::test]
async fn counts_each_client_separately() {
    let app = TestApp::with_throttle_limit(2).await;
    app.graphql(typename(), &[]).await;
    app.graphql(typename(), &[]).await;
    let limited = app.graphql(typename(), &[]).await;
    assert_eq!(limited.first_error()["statusCode"], 429);

    let other = app.graphql_from("198.51.100.77", typename(), &[]).await;
    assert!(!other.has_errors(), "{}", other.body);
    assert_eq!(other.headers["x-ratelimit-remaining"], "1");
}

#[rstest]
#[tokio::test]
async fn ignores_forged_client_headers_from_an_untrusted_peer() {
    let app = TestApp::spawn().await;
    let mut rejected = 0;
    for n in 1..=40 {
        let forged = format!("10.9.0.{n}");
        let response = app
            .graphql(
                typename(),
                &[("cf-connecting-ip", forged.as_str()), ("x-forwarded-for", forged.as_str())],
            )
            .await;
        if response.has_errors() {
            assert_eq!(response.first_error()["statusCode"], 429);
            rejected += 1;
        }
    }
    assert_eq!(rejected, 10);
}

#[rstest]
#[tokio::test]
async fn keys_clients_by_forwarded_address_behind_a_trusted_proxy() {
    let proxy = "10.0.0.2";
    let app = TestApp::with_config(|config| {
        config.throttle_limit = 1;
        config.trusted_proxies = vec![proxy.parse().unwrap()];
    })
    .await;

    let first = app
        .graphql_from(proxy, typename(), &[("x-forwarded-for", "198.51.100.1")])
        .await;
    assert!(!first.has_errors(), "{}", first.body);
    let again = app
        .graphql_from(proxy, typename(), &[("x-forwarded-for", "198.51.100.1")])
        .await;
    assert_eq!(again.first_error()["statusCode"], 429);

    let second_client = app
        .graphql_from(proxy, typename(), &[("x-forwarded-for", "198.51.100.2")])
        .await;
    assert!(!second_client.has_errors(), "{}", second_client.body);

    let direct = app.graphql_from(DEFAULT_CLIENT, typename(), &[]).await;
    assert!(!direct.has_errors(), "{}", direct.body);
}

#[rstest]
#[tokio::test]
async fn advertises_the_remaining_budget() {
    let app = TestApp::with_throttle_limit(5).await;
    let response = app.graphql(typename(), &[]).await;
    assert_eq!(response.headers["x-ratelimit-limit"], "5");
    assert_eq!(response.headers["x-ratelimit-remaining"], "4");
}

#[rstest]
#[tokio::test]
async fn throttles_before_authentication() {
    let app = TestApp::with_throttle_limit(1).await;
    app.query("{ __typename }", None).await;

    let response = app.query("{ me { id } }", None).await;
    assert_eq!(response.first_error()["status"], "TOO_MANY_REQUESTS");
}

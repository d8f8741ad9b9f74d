use axum::http::StatusCode;
use rstest::rstest;
use serde_json::json;

use crate::tests::fixtures::app::{ADMIN_EMAIL, TestApp};

#[rstest]
#[tokio::test]
async fn rejects_an_anonymous_caller_before_execution() {
    let app = TestApp::spawn().await;
    let response = app.query("{ me { id } }", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data(), &json!(null));
    assert_eq!(
        *response.first_error(),
        json!({
            "error": "Unauthorized",
            "message": "Unauthorized",
            "status": "UNAUTHENTICATED",
            "statusCode": 401
        })
    );
}

#[rstest]
#[tokio::test]
async fn rejects_an_invalid_token() {
    let app = TestApp::spawn().await;
    let response = app.query("{ me { id } }", Some("not-a-jwt")).await;
    assert_eq!(response.first_error()["status"], "UNAUTHENTICATED");
    assert_eq!(response.first_error()["statusCode"], 401);
}

#[rstest]
#[tokio::test]
async fn denied_mutations_leave_no_side_effects() {
    let app = TestApp::spawn().await;
    let (admin_token, _) = app.register("Root", ADMIN_EMAIL).await;
    let (_, victim) = app.register("Eve", "eve@example.com").await;

    let query = format!(r#"mutation {{ deleteUser(id: "{victim}") {{ id }} }}"#);
    let denied = app.query(&query, None).await;
    assert_eq!(denied.first_error()["status"], "UNAUTHENTICATED");

    let lookup = format!(r#"{{ user(id: "{victim}") {{ email }} }}"#);
    let still_there = app.query(&lookup, Some(&admin_token)).await;
    assert_eq!(still_there.data()["user"]["email"], "eve@example.com");
}

#[rstest]
#[tokio::test]
async fn forbids_admin_fields_to_plain_users() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("Max", "max@example.com").await;

    let response = app.query("{ users { totalDocs } }", Some(&token)).await;
    assert_eq!(response.data(), &json!(null));
    assert_eq!(response.first_error()["status"], "FORBIDDEN");
    assert_eq!(response.first_error()["statusCode"], 403);
    assert_eq!(response.first_error()["message"], "Forbidden resource");
}

#[rstest]
#[tokio::test]
async fn forbids_the_whole_operation_when_one_field_is_out_of_reach() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("Max", "max@example.com").await;

    let response = app
        .query("{ me { email } activityLogs { totalDocs } }", Some(&token))
        .await;
    assert_eq!(response.data(), &json!(null));
    assert_eq!(response.first_error()["status"], "FORBIDDEN");
}

#[rstest]
#[tokio::test]
async fn lets_the_bootstrap_admin_list_users() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("Root", ADMIN_EMAIL).await;
    app.register("Max", "max@example.com").await;

    let response = app
        .query("{ users(limit: 10) { totalDocs docs { email role } } }", Some(&token))
        .await;
    assert!(!response.has_errors(), "{}", response.body);
    assert_eq!(response.data()["users"]["totalDocs"], 2);
    let docs = response.data()["users"]["docs"].as_array().unwrap();
    assert!(docs.contains(&json!({"email": ADMIN_EMAIL, "role": "ADMIN"})));
    assert!(docs.contains(&json!({"email": "max@example.com", "role": "USER"})));
}

#[rstest]
#[tokio::test]
async fn keeps_plain_users_out_of_other_accounts() {
    let app = TestApp::spawn().await;
    let (_, first) = app.register("Ann", "ann@example.com").await;
    let (token, _) = app.register("Bo", "bo@example.com").await;

    let query = format!(r#"mutation {{ updateUser(id: "{first}", input: {{name: "Hacked"}}) {{ name }} }}"#);
    let response = app.query(&query, Some(&token)).await;
    assert_eq!(response.first_error()["status"], "FORBIDDEN");
    assert_eq!(response.first_error()["path"], json!(["updateUser"]));
}

#[rstest]
#[tokio::test]
async fn audits_writes_for_the_admin() {
    let app = TestApp::spawn().await;
    let (token, admin_id) = app.register("Root", ADMIN_EMAIL).await;

    let response = app
        .query(
            "{ activityLogs { totalDocs docs { collection action documentId actor } } }",
            Some(&token),
        )
        .await;
    assert!(!response.has_errors(), "{}", response.body);
    assert_eq!(
        response.data()["activityLogs"]["docs"][0],
        json!({
            "collection": "users",
            "action": "CREATE",
            "documentId": admin_id,
            "actor": admin_id
        })
    );
}

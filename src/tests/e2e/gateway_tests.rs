use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use rstest::rstest;
use serde_json::json;

use crate::tests::fixtures::app::{PASSWORD, TestApp};

#[rstest]
#[tokio::test]
async fn answers_hello_world_at_the_root() {
    let app = TestApp::spawn().await;
    let (status, _, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello World!");
}

#[rstest]
#[tokio::test]
async fn serves_a_static_landing_page_instead_of_a_console() {
    let app = TestApp::spawn().await;
    let (status, headers, body) = app.get("/graphql").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/html"));
    assert!(body.contains("/schema.graphql"));
    assert!(!body.to_lowercase().contains("graphiql"));
}

#[rstest]
#[tokio::test]
async fn publishes_a_sorted_schema() {
    let app = TestApp::spawn().await;
    let (status, _, sdl) = app.get("/schema.graphql").await;
    assert_eq!(status, StatusCode::OK);

    let user_fields: Vec<&str> = sdl
        .split("type User {")
        .nth(1)
        .and_then(|rest| rest.split('}').next())
        .expect("User type in SDL")
        .lines()
        .filter_map(|line| line.trim().split(':').next())
        .filter(|name| !name.is_empty())
        .collect();
    let mut sorted = user_fields.clone();
    sorted.sort_unstable();
    assert_eq!(user_fields, sorted);
    assert!(user_fields.contains(&"email"));
    assert!(!user_fields.contains(&"passwordHash"));

    let (_, _, again) = app.get("/schema.graphql").await;
    assert_eq!(sdl, again);
}

#[rstest]
#[tokio::test]
async fn trims_literal_arguments_before_the_resolver_sees_them() {
    let app = TestApp::spawn().await;
    let response = app
        .graphql(
            json!({
                "query": format!(
                    r#"mutation {{ register(input: {{name: "  Bob  ", email: "  bob@example.com ", password: "{PASSWORD}"}}) {{ user {{ name email }} }} }}"#
                )
            }),
            &[],
        )
        .await;
    assert!(!response.has_errors(), "{}", response.body);
    assert_eq!(
        response.data()["register"]["user"],
        json!({"name": "Bob", "email": "bob@example.com"})
    );
}

#[rstest]
#[tokio::test]
async fn trims_variables_before_the_resolver_sees_them() {
    let app = TestApp::spawn().await;
    let (token, id) = app.register("Ann", "ann@example.com").await;
    let response = app
        .graphql(
            json!({
                "query": "mutation ($id: ID!, $name: String) { updateUser(id: $id, input: {name: $name}) { name } }",
                "variables": { "id": id, "name": "\t Ann Lee  " }
            }),
            &[("authorization", format!("Bearer {token}").as_str())],
        )
        .await;
    assert_eq!(response.data()["updateUser"]["name"], "Ann Lee");
}

#[rstest]
#[tokio::test]
async fn formats_a_duplicate_email_as_a_validation_error() {
    let app = TestApp::spawn().await;
    app.register("Ada", "ada@example.com").await;
    let response = app
        .graphql(
            json!({
                "query": "mutation ($input: RegisterInput!) { register(input: $input) { accessToken } }",
                "variables": { "input": { "name": "Ada", "email": "ada@example.com", "password": PASSWORD } }
            }),
            &[],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        *response.first_error(),
        json!({
            "path": ["register"],
            "error": "Error, expected email to be unique.",
            "message": "Error, expected email to be unique.",
            "status": "BAD_USER_INPUT",
            "statusCode": 400
        })
    );
}

#[rstest]
#[tokio::test]
async fn formats_schema_validation_failures_without_a_status_code() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;
    let response = app.query("{ me { id shoeSize } }", Some(&token)).await;
    let error = response.first_error();
    assert_eq!(error["status"], "INTERNAL_SERVER_ERROR");
    assert_eq!(error["statusCode"], json!(null));
    assert_eq!(error["error"], error["message"]);
}

#[rstest]
#[tokio::test]
async fn sets_the_access_token_cookie_and_accepts_it_back() {
    let app = TestApp::spawn().await;
    let response = app
        .graphql(
            json!({
                "query": "mutation ($input: RegisterInput!) { register(input: $input) { accessToken } }",
                "variables": { "input": { "name": "Cy", "email": "cy@example.com", "password": PASSWORD } }
            }),
            &[],
        )
        .await;
    let cookie = response.headers[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let pair = cookie.split(';').next().unwrap().to_string();
    let me = app
        .graphql(json!({ "query": "{ me { email } }" }), &[("cookie", pair.as_str())])
        .await;
    assert_eq!(me.data()["me"]["email"], "cy@example.com");
}

#[rstest]
#[tokio::test]
async fn logs_in_with_registered_credentials() {
    let app = TestApp::spawn().await;
    app.register("Dee", "dee@example.com").await;
    let response = app
        .graphql(
            json!({
                "query": "mutation ($input: LoginInput!) { login(input: $input) { user { email role } } }",
                "variables": { "input": { "email": "dee@example.com", "password": PASSWORD } }
            }),
            &[],
        )
        .await;
    assert_eq!(
        response.data()["login"]["user"],
        json!({"email": "dee@example.com", "role": "USER"})
    );

    let rejected = app
        .graphql(
            json!({
                "query": "mutation ($input: LoginInput!) { login(input: $input) { accessToken } }",
                "variables": { "input": { "email": "dee@example.com", "password": "wrong-pass" } }
            }),
            &[],
        )
        .await;
    assert_eq!(rejected.first_error()["status"], "UNAUTHENTICATED");
    assert_eq!(rejected.first_error()["message"], "Invalid credentials");
}

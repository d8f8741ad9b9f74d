use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tower::ServiceExt;

use crate::shared::infrastructure::connection::Connection;
use crate::shell::bootstrap::server_state;
use crate::shell::config::AppConfig;
use crate::shell::http::router;
use crate::tests::fixtures::connection::{TEST_URI, open_connection};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_CLIENT: &str = "203.0.113.10";
pub const PASSWORD: &str = "s3cret-pass";

pub struct GraphqlResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl GraphqlResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn first_error(&self) -> &Value {
        &self.body["errors"][0]
    }

    pub fn has_errors(&self) -> bool {
        self.body.get("errors").is_some()
    }
}

pub struct TestApp {
    pub router: Router,
    pub connection: Connection,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_throttle_limit(30).await
    }

    pub async fn with_throttle_limit(throttle_limit: u32) -> Self {
        Self::with_config(|config| config.throttle_limit = throttle_limit).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig {
            mongodb_uri: TEST_URI.into(),
            jwt_secret: "test-secret".into(),
            jwt_ttl_minutes: 60,
            host: "127.0.0.1".into(),
            port: 0,
            throttle_ttl: Duration::from_millis(60_000),
            throttle_limit: 30,
            bootstrap_admin_email: Some(ADMIN_EMAIL.into()),
            trusted_proxies: Vec::new(),
        };
        customize(&mut config);
        let connection = open_connection().await;
        let router = router(server_state(&config, &connection));
        Self { router, connection }
    }

    pub async fn get(&self, path: &str) -> (StatusCode, HeaderMap, String) {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("request");
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn graphql(&self, body: Value, headers: &[(&str, &str)]) -> GraphqlResponse {
        self.graphql_from(DEFAULT_CLIENT, body, headers).await
    }

    /// Posts `body` as if it arrived over a socket from `peer`.
    pub async fn graphql_from(
        &self,
        peer: &str,
        body: Value,
        headers: &[(&str, &str)],
    ) -> GraphqlResponse {
        let peer: IpAddr = peer.parse().expect("peer address");
        let mut builder = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header(CONTENT_TYPE, "application/json")
            .extension(ConnectInfo(SocketAddr::new(peer, 40_000)));
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(&body).expect("json")))
            .expect("request");
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        GraphqlResponse {
            status,
            headers,
            body: serde_json::from_slice(&bytes).expect("graphql json body"),
        }
    }

    pub async fn query(&self, query: &str, token: Option<&str>) -> GraphqlResponse {
        let bearer = token.map(|t| format!("Bearer {t}"));
        let headers: Vec<(&str, &str)> = bearer
            .as_deref()
            .map(|value| vec![(AUTHORIZATION.as_str(), value)])
            .unwrap_or_default();
        self.graphql(json!({ "query": query }), &headers).await
    }

    /// Registers a user and returns `(access token, user id)`.
    pub async fn register(&self, name: &str, email: &str) -> (String, String) {
        let response = self
            .graphql(
                json!({
                    "query": "mutation ($input: RegisterInput!) { register(input: $input) { accessToken user { id } } }",
                    "variables": { "input": { "name": name, "email": email, "password": PASSWORD } }
                }),
                &[],
            )
            .await;
        assert!(!response.has_errors(), "register failed: {}", response.body);
        let payload = &response.data()["register"];
        (
            payload["accessToken"].as_str().expect("token").to_string(),
            payload["user"]["id"].as_str().expect("id").to_string(),
        )
    }
}

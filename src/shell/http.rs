use async_graphql::Value as GqlValue;
use async_graphql_axum::GraphQLRequest;
use axum::extract::{FromRequest, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::shared::core::request_context::RequestContext;
use crate::shared::guards::operation::OperationSummary;
use crate::shell::error_format::{FormattedError, format_errors};
use crate::shell::graphql::LANDING_PAGE;
use crate::shell::state::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/graphql", get(landing_page).post(graphql))
        .route("/schema.graphql", get(schema_sdl))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct Envelope {
    data: GqlValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FormattedError>,
}

fn respond(envelope: Envelope, headers: HeaderMap) -> Response {
    let mut response = Json(envelope).into_response();
    response.headers_mut().extend(headers);
    response
}

async fn hello() -> &'static str {
    "Hello World!"
}

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

async fn schema_sdl(State(state): State<ServerState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.sdl.to_string(),
    )
}

/// Context, then guards, then execution (the schema's extensions sanitize arguments).
async fn graphql(State(state): State<ServerState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let mut context = RequestContext::from_parts(&parts, &state.trusted_proxies);
    let request = Request::from_parts(parts, body);

    let extracted = <GraphQLRequest as FromRequest<ServerState>>::from_request(request, &state).await;
    let request = match extracted {
        Ok(request) => request.into_inner(),
        Err(rejection) => return rejection.into_response(),
    };

    let operation = OperationSummary::from_query(&request.query, request.operation_name.as_deref());
    if let Err(reason) = state.guards.run(&mut context, &operation).await {
        let envelope = Envelope {
            data: GqlValue::Null,
            errors: vec![FormattedError::from_app_error(&reason)],
        };
        return respond(envelope, context.take_response_headers());
    }

    let mut headers = context.take_response_headers();
    let response = state.schema.execute(request.data(context)).await;
    if !response.errors.is_empty() {
        tracing::debug!(errors = response.errors.len(), fields = ?operation.fields, "operation returned errors");
    }
    headers.extend(response.http_headers);
    respond(
        Envelope {
            data: response.data,
            errors: format_errors(&response.errors),
        },
        headers,
    )
}

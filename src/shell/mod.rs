// Composition root for the GraphQL gateway.
//
// Responsibilities:
// - Read config from the environment.
// - Open the shared database connection with its plugins.
// - Wire services into the schema and the guard chain into the HTTP handler.
// - Spawn background workers (rate limiter sweeper).

pub mod bootstrap;
pub mod config;
pub mod error_format;
pub mod graphql;
pub mod http;
pub mod state;
pub mod workers;

//! ToolLink HTTP API server.
//!
//! Wires the repository, auth, and policy layers into an axum router.
//! The router is generic over the database engine so integration tests
//! can run against the in-memory engine.

pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod ratelimit;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;

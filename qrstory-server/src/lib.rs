//! HTTP surface for the qrstory backend.
//!
//! Thin axum routes over [`qrstory_service::StoryService`]: the handlers map
//! requests and responses, the service owns the semantics.

pub mod config;
mod error;
pub mod routes;
mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

//! HTTP API over the orchestrator.

mod api;
mod error;
mod handlers;
#[allow(clippy::module_inception)]
mod server;

pub use api::*;
pub use error::ServerError;
pub use handlers::AppState;
pub use server::ApiServer;

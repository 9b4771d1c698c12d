//! router construction split out from `main` so integration tests can bind
//! the real app to an ephemeral port instead of re-deriving its routes.

pub mod error;
pub mod handlers;
pub mod registry;
pub mod relay;

pub use error::RendezvousError;

use axum::routing::get;
use axum::Router;
use handlers::AppState;
use registry::MailboxRegistry;
use std::sync::Arc;

pub fn build_app(registry: Arc<MailboxRegistry>) -> Router {
    let state = AppState { registry };

    Router::new()
        .route("/establish-sender", get(handlers::establish_sender))
        .route("/establish-receiver", get(handlers::establish_receiver))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

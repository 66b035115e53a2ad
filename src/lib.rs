// Library entry point for tests
pub mod api;
pub mod commands;
pub mod config;
pub mod discord;
pub mod verify;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

pub struct AppState {
    /// Verifies inbound webhook signatures. `None` disables verification
    /// (explicit dev mode, see [`config::Config`]).
    pub verifier: Option<verify::Verifier>,
    pub dispatcher: commands::Dispatcher,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/interactions", post(api::interactions::handle_interaction))
        .with_state(state)
}

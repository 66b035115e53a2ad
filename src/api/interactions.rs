//! The interactions webhook endpoint.
//!
//! The body is taken as raw bytes because the signature covers the exact
//! bytes Discord sent; parsing happens only after verification passes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn};

use crate::commands::{DispatchError, DispatchOutcome};
use crate::discord::types::Interaction;
use crate::AppState;

pub async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(
        user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(""),
        version = env!("CARGO_PKG_VERSION"),
        "Received request"
    );

    if let Some(verifier) = &state.verifier {
        if let Err(e) = verifier.verify(&headers, &body) {
            warn!(error = %e, "Failed to verify signature");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!(error = %e, "Failed to parse interaction");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match state.dispatcher.dispatch(interaction).await {
        Ok(DispatchOutcome::Response(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(DispatchOutcome::Accepted) => StatusCode::ACCEPTED.into_response(),
        Err(DispatchError::MissingCommandData) => StatusCode::BAD_REQUEST.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to dispatch interaction");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

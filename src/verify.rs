//! Webhook request verification.
//!
//! Discord signs every interaction webhook with the application's ed25519
//! key over `timestamp || body`. Requests that fail verification must be
//! rejected with 401 or Discord disables the endpoint URL.

use axum::http::HeaderMap;
use ed25519_dalek::{Signature, Verifier as _, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Why a request failed verification. The distinction is for logs only;
/// every variant maps to the same 401 response.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing header {0}")]
    MissingHeader(&'static str),
    #[error("signature is not valid hex")]
    InvalidEncoding,
    #[error("signature verification failed")]
    SignatureMismatch,
}

pub struct Verifier {
    public_key: VerifyingKey,
}

impl Verifier {
    pub fn new(public_key: VerifyingKey) -> Self {
        Self { public_key }
    }

    /// Checks the request signature against `timestamp || body`.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), AuthError> {
        let signature = header_str(headers, SIGNATURE_HEADER)?;
        let timestamp = header_str(headers, TIMESTAMP_HEADER)?;

        let bytes: [u8; 64] = hex::decode(signature)
            .map_err(|_| AuthError::InvalidEncoding)?
            .try_into()
            .map_err(|_| AuthError::InvalidEncoding)?;
        let signature = Signature::from_bytes(&bytes);

        let message = [timestamp.as_bytes(), body].concat();

        self.public_key
            .verify(&message, &signature)
            .map_err(|_| AuthError::SignatureMismatch)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingHeader(name))
}

use anyhow::{Context, Result};
use ed25519_dalek::VerifyingKey;

/// Runtime configuration, read from environment variables.
pub struct Config {
    /// Ed25519 public key Discord signs interaction webhooks with.
    /// `None` means signature verification is disabled; only ever use that
    /// for local development.
    pub public_key: Option<VerifyingKey>,
    /// Bot token for application-authenticated REST calls.
    pub bot_token: String,
    /// Override for the Discord API base URL (used by tests).
    pub api_base_url: Option<String>,
    pub bind_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let public_key = match std::env::var("DISCORD_BOT_PUBLIC_KEY") {
            Ok(hex_key) if !hex_key.is_empty() => Some(parse_public_key(&hex_key)?),
            _ => None,
        };

        let bot_token = std::env::var("DISCORD_BOT_TOKEN")
            .context("DISCORD_BOT_TOKEN environment variable must be set")?;

        let api_base_url = std::env::var("DISCORD_API_BASE_URL").ok();

        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        Ok(Self {
            public_key,
            bot_token,
            api_base_url,
            bind_address,
        })
    }
}

fn parse_public_key(hex_key: &str) -> Result<VerifyingKey> {
    let bytes: [u8; 32] = hex::decode(hex_key)
        .context("DISCORD_BOT_PUBLIC_KEY must be a valid hex string")?
        .try_into()
        .map_err(|_| anyhow::anyhow!("DISCORD_BOT_PUBLIC_KEY must be a 32-byte key"))?;

    VerifyingKey::from_bytes(&bytes).context("DISCORD_BOT_PUBLIC_KEY is not a valid ed25519 key")
}

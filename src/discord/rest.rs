//! Discord REST operations behind a mockable seam.
//!
//! [`DiscordApi`] covers every remote call the service makes. The reqwest
//! implementation treats Discord as an unreliable remote: fixed per-call
//! timeout, non-2xx mapped to a typed error, no automatic retries.

use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::discord::types::{
    Channel, CreateMessage, Interaction, InteractionResponse, Message, User,
};

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("discord returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait DiscordApi: Send + Sync {
    /// Lists all channels of a guild. Fetched fresh per request.
    async fn guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>, ApiError>;

    /// Lists the users who reacted with `emoji` on a message.
    async fn message_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<User>, ApiError>;

    async fn send_message(
        &self,
        channel_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, ApiError>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError>;

    /// Answers the interaction callback. Authorized by the interaction
    /// token, not the bot token.
    async fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ApiError>;

    /// Edits the deferred acknowledgment with the final user-visible text.
    async fn edit_original_response(
        &self,
        application_id: &str,
        token: &str,
        content: &str,
    ) -> Result<(), ApiError>;

    async fn delete_guild_command(
        &self,
        application_id: &str,
        guild_id: &str,
        command_id: &str,
    ) -> Result<(), ApiError>;
}

/// Capability to respond to one specific interaction. Bundles the
/// short-lived interaction token so handlers never touch the long-lived
/// application credential for replies.
#[derive(Clone)]
pub struct InteractionClient {
    api: Arc<dyn DiscordApi>,
    application_id: String,
    interaction_id: String,
    token: String,
}

impl InteractionClient {
    pub fn new(api: Arc<dyn DiscordApi>, interaction: &Interaction) -> Self {
        Self {
            api,
            application_id: interaction.application_id.clone(),
            interaction_id: interaction.id.clone(),
            token: interaction.token.clone(),
        }
    }

    pub async fn ack_deferred_ephemeral(&self) -> Result<(), ApiError> {
        self.api
            .create_interaction_response(
                &self.interaction_id,
                &self.token,
                &InteractionResponse::deferred_ephemeral(),
            )
            .await
    }

    pub async fn edit_original(&self, content: &str) -> Result<(), ApiError> {
        self.api
            .edit_original_response(&self.application_id, &self.token, content)
            .await
    }
}

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl HttpApi {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self::with_base_url(bot_token, DEFAULT_API_BASE)
    }

    pub fn with_base_url(bot_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bot_token: bot_token.into(),
        }
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %body, "Discord API error response");
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DiscordApi for HttpApi {
    async fn guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>, ApiError> {
        let response = self
            .client
            .get(format!("{}/guilds/{}/channels", self.base_url, guild_id))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn message_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<Vec<User>, ApiError> {
        let response = self
            .client
            .get(format!(
                "{}/channels/{}/messages/{}/reactions/{}",
                self.base_url,
                channel_id,
                message_id,
                urlencoding::encode(emoji)
            ))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, ApiError> {
        let response = self
            .client
            .post(format!("{}/channels/{}/messages", self.base_url, channel_id))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .timeout(REQUEST_TIMEOUT)
            .json(message)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .put(format!(
                "{}/channels/{}/messages/{}/reactions/{}/@me",
                self.base_url,
                channel_id,
                message_id,
                urlencoding::encode(emoji)
            ))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!(
                "{}/interactions/{}/{}/callback",
                self.base_url, interaction_id, token
            ))
            .timeout(REQUEST_TIMEOUT)
            .json(response)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn edit_original_response(
        &self,
        application_id: &str,
        token: &str,
        content: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .patch(format!(
                "{}/webhooks/{}/{}/messages/@original",
                self.base_url, application_id, token
            ))
            .timeout(REQUEST_TIMEOUT)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_guild_command(
        &self,
        application_id: &str,
        guild_id: &str,
        command_id: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!(
                "{}/applications/{}/guilds/{}/commands/{}",
                self.base_url, application_id, guild_id, command_id
            ))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

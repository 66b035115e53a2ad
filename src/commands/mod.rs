//! Interaction dispatch.
//!
//! Pings and unknown interaction kinds are answered synchronously. Command
//! interactions are acknowledged immediately with a deferred ephemeral
//! reply (Discord's response window is short), then handed to their handler
//! in a detached task; the handler owns the user-visible outcome via the
//! acknowledgment edit.

pub mod pin;

use std::collections::HashMap;
use std::sync::Arc;

use axum::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::discord::rest::{ApiError, DiscordApi, InteractionClient};
use crate::discord::types::{CommandData, Interaction, InteractionResponse, InteractionType};

const RELEASE_NOTES_URL: &str =
    "https://discord.com/channels/1159611808722726912/1290727059261493358/1298783111265648693";

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        api: Arc<dyn DiscordApi>,
        client: InteractionClient,
        interaction: Interaction,
        data: CommandData,
    ) -> anyhow::Result<()>;
}

/// What the transport should send back for a dispatched interaction.
pub enum DispatchOutcome {
    /// Synchronous response body (ping, unknown kinds).
    Response(InteractionResponse),
    /// Command accepted; the real answer arrives via the acknowledgment
    /// edit, so the transport responds with an empty 202.
    Accepted,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command interaction has no command data")]
    MissingCommandData,
    #[error("initial acknowledgment failed: {0}")]
    Ack(#[source] ApiError),
}

pub struct Dispatcher {
    api: Arc<dyn DiscordApi>,
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn DiscordApi>) -> Self {
        Self {
            api,
            handlers: HashMap::new(),
        }
    }

    pub fn with_message_command(
        mut self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub async fn dispatch(
        &self,
        interaction: Interaction,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!(
            interaction_id = %interaction.id,
            kind = ?interaction.kind,
            "Handling interaction"
        );

        match interaction.kind {
            InteractionType::Ping => Ok(DispatchOutcome::Response(InteractionResponse::pong())),
            InteractionType::ApplicationCommand => self.dispatch_command(interaction).await,
            InteractionType::Other(_) => Ok(DispatchOutcome::Response(
                InteractionResponse::message("Unexpected interaction"),
            )),
        }
    }

    async fn dispatch_command(
        &self,
        interaction: Interaction,
    ) -> Result<DispatchOutcome, DispatchError> {
        // respond ASAP using the interaction's own token; a failure here
        // means the request cannot be answered at all
        let client = InteractionClient::new(self.api.clone(), &interaction);
        client
            .ack_deferred_ephemeral()
            .await
            .map_err(DispatchError::Ack)?;

        let data = interaction
            .data
            .clone()
            .ok_or(DispatchError::MissingCommandData)?;

        match self.handlers.get(&data.name) {
            Some(handler) => {
                let handler = handler.clone();
                let api = self.api.clone();
                // the transport does not wait on the handler; its only
                // observable effects are the acknowledgment edit and logs
                tokio::spawn(async move {
                    let name = data.name.clone();
                    if let Err(e) = handler.handle(api, client, interaction, data).await {
                        error!(error = %e, command = %name, "Command handler failed");
                    }
                });
            }
            None => self.cleanup_stale_command(&client, &interaction, &data).await,
        }

        Ok(DispatchOutcome::Accepted)
    }

    /// The command registration no longer matches a handler. Point the user
    /// at the release notes and drop the stale guild command; both calls
    /// are attempted regardless of the other's outcome.
    async fn cleanup_stale_command(
        &self,
        client: &InteractionClient,
        interaction: &Interaction,
        data: &CommandData,
    ) {
        info!(
            command = %data.name,
            command_id = %data.id,
            guild_id = %interaction.guild_id,
            "Handling stale interaction"
        );

        let content = format!(
            "This command is no longer supported. See the Pinbot Discord for more details: {RELEASE_NOTES_URL}"
        );
        if let Err(e) = client.edit_original(&content).await {
            error!(error = %e, "Could not edit reply for stale command");
        }

        debug!("Removing stale command");
        if let Err(e) = self
            .api
            .delete_guild_command(&interaction.application_id, &interaction.guild_id, &data.id)
            .await
        {
            error!(error = %e, command_id = %data.id, "Could not delete stale command");
        }
    }
}

//! The `Pin` message-context command.
//!
//! Projects the target message into a pin channel: a header embed carrying
//! the original content plus one embed per additional image, with the
//! message's own link-preview embeds preserved. A 📌 reaction placed by the
//! application records "already pinned".

use std::sync::Arc;

use axum::async_trait;
use tracing::{debug, error, info};

use crate::commands::CommandHandler;
use crate::discord::rest::{ApiError, DiscordApi, InteractionClient};
use crate::discord::types::{
    Channel, ChannelType, CommandData, CreateMessage, Embed, EmbedAuthor, EmbedField, EmbedImage,
    Interaction, Message, User,
};

pub const PIN_EMOJI: &str = "📌";
const PIN_MESSAGE_COLOR: u32 = 0xbb0303;

const MSG_TRANSIENT_ERROR: &str = "💩 Temporary error, please retry";
const MSG_ALREADY_PINNED: &str = "🔄 Message already pinned";

pub struct PinHandler;

#[async_trait]
impl CommandHandler for PinHandler {
    async fn handle(
        &self,
        api: Arc<dyn DiscordApi>,
        client: InteractionClient,
        interaction: Interaction,
        data: CommandData,
    ) -> anyhow::Result<()> {
        let Some(mut message) = data.target_message() else {
            anyhow::bail!("target message missing from resolved data");
        };
        // the resolved copy omits the guild id
        message.guild_id = interaction.guild_id.clone();

        debug!(
            guild_id = %interaction.guild_id,
            channel_id = %message.channel_id,
            message_id = %message.id,
            "Starting pin message"
        );

        // API operations are slow, so fan out and run both reads concurrently
        let (pinned, channels) = tokio::join!(
            is_already_pinned(api.as_ref(), &interaction, &message),
            api.guild_channels(&interaction.guild_id),
        );

        let pinned = match pinned {
            Ok(pinned) => pinned,
            Err(e) => {
                error!(error = %e, "Could not check if message is already pinned");
                return reply(&client, MSG_TRANSIENT_ERROR).await;
            }
        };
        let channels = match channels {
            Ok(channels) => channels,
            Err(e) => {
                error!(error = %e, "Could not get guild channels");
                return reply(&client, MSG_TRANSIENT_ERROR).await;
            }
        };

        if pinned {
            return reply(&client, MSG_ALREADY_PINNED).await;
        }

        let Some(source) = channels.iter().find(|c| c.id == message.channel_id) else {
            error!(channel_id = %message.channel_id, "Could not determine source channel");
            return reply(&client, MSG_TRANSIENT_ERROR).await;
        };

        // determine the target pin channel for the message
        let target = resolve_pin_channel(&channels, source);

        // build the rich embed pin message
        let payload = build_pin_message(source, &message, interaction.invoker());

        debug!(target_channel_id = %target.id, "Sending pin message");
        let pin = match api.send_message(&target.id, &payload).await {
            Ok(pin) => pin,
            Err(e) => {
                error!(error = %e, target_channel_id = %target.id, "Could not send pin message");
                return reply(
                    &client,
                    &format!(
                        "🙅 Could not send pin message. Please ensure bot has permission to post in {}",
                        target.mention()
                    ),
                )
                .await;
            }
        };

        // mark the message as done; best effort only
        if let Err(e) = api
            .add_reaction(&message.channel_id, &message.id, PIN_EMOJI)
            .await
        {
            error!(error = %e, message_id = %message.id, "Could not react to message");
        }

        info!(pin_message_id = %pin.id, "Pinned message");

        reply(
            &client,
            &format!(
                "📌 Pinned: {}",
                message_url(&interaction.guild_id, &pin.channel_id, &pin.id)
            ),
        )
        .await
    }
}

async fn reply(client: &InteractionClient, content: &str) -> anyhow::Result<()> {
    client.edit_original(content).await?;
    Ok(())
}

/// True iff the application itself has already placed the pin marker on the
/// message. Reactions from end users or the bot's own user account with the
/// same emoji do not count; only the application id does.
pub async fn is_already_pinned(
    api: &dyn DiscordApi,
    interaction: &Interaction,
    message: &Message,
) -> Result<bool, ApiError> {
    let reactors = api
        .message_reactions(&message.channel_id, &message.id, PIN_EMOJI)
        .await?;

    Ok(reactors.iter().any(|u| u.id == interaction.application_id))
}

/// Picks the pin channel for a source channel, in priority order:
/// `#channel-pins` (a dedicated pin channel), `#pins` (a generic pin
/// channel), then the source channel itself. Matches are exact,
/// case-sensitive, text channels only; on duplicate names the first channel
/// in input order wins.
pub fn resolve_pin_channel<'a>(channels: &'a [Channel], source: &'a Channel) -> &'a Channel {
    let dedicated = format!("{}-pins", source.name);

    if let Some(c) = channels
        .iter()
        .find(|c| c.kind == ChannelType::GuildText && c.name == dedicated)
    {
        return c;
    }

    if let Some(c) = channels
        .iter()
        .find(|c| c.kind == ChannelType::GuildText && c.name == "pins")
    {
        return c;
    }

    source
}

/// Builds the pin payload: one header embed with the original content, the
/// first image attachment inlined into it, one extra embed per further
/// image, then the message's pre-existing embeds appended untouched.
/// Attachments without both dimensions are not images and are dropped.
pub fn build_pin_message(
    source: &Channel,
    message: &Message,
    pinned_by: Option<&User>,
) -> CreateMessage {
    let permalink = message_url(&source.guild_id, &message.channel_id, &message.id);

    let mut fields = vec![EmbedField {
        name: "Channel".to_string(),
        value: source.mention(),
        inline: true,
    }];
    if let Some(user) = pinned_by {
        fields.push(EmbedField {
            name: "Pinned by".to_string(),
            value: user.mention(),
            inline: true,
        });
    }

    let mut embeds = vec![Embed {
        author: Some(EmbedAuthor {
            name: message.author.username.clone(),
            url: Some(permalink.clone()),
            icon_url: Some(message.author.avatar_url()),
        }),
        title: Some(format!("{PIN_EMOJI} Pinned")),
        color: Some(PIN_MESSAGE_COLOR),
        description: Some(message.content.clone()),
        url: Some(permalink),
        timestamp: Some(message.timestamp),
        fields,
        ..Default::default()
    }];

    let mut header_has_image = false;
    for attachment in message.attachments.iter().filter(|a| a.is_image()) {
        let image = EmbedImage {
            url: attachment.url.clone(),
        };
        if !header_has_image {
            // the first image goes into the header embed
            embeds[0].image = Some(image);
            header_has_image = true;
        } else {
            // any other images get their own embed
            embeds.push(Embed {
                kind: Some("image".to_string()),
                color: Some(PIN_MESSAGE_COLOR),
                image: Some(image),
                ..Default::default()
            });
        }
    }

    // preserve the existing embeds
    embeds.extend(message.embeds.iter().cloned());

    CreateMessage { embeds }
}

pub fn message_url(guild_id: &str, channel_id: &str, message_id: &str) -> String {
    format!("https://discord.com/channels/{guild_id}/{channel_id}/{message_id}")
}

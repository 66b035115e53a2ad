// Shared fixtures: an in-memory Discord API fake that records every call
// and can be flipped into failure modes per operation.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use axum::async_trait;
use chrono::{TimeZone, Utc};

use pinbot::discord::rest::{ApiError, DiscordApi};
use pinbot::discord::types::{
    Channel, ChannelType, CommandData, CreateMessage, Interaction, InteractionResponse,
    InteractionType, Member, Message, ResolvedData, User,
};

pub const APP_ID: &str = "app-1";
pub const GUILD_ID: &str = "g-1";

fn remote_error() -> ApiError {
    ApiError::Status {
        status: 500,
        body: "boom".to_string(),
    }
}

#[derive(Default)]
pub struct FakeDiscord {
    pub channels: Mutex<Vec<Channel>>,
    /// Users who placed 📌 on the source message.
    pub reactors: Mutex<Vec<User>>,
    /// (channel_id, payload) for every sent message.
    pub sent: Mutex<Vec<(String, CreateMessage)>>,
    /// (channel_id, message_id, emoji) for every added reaction.
    pub reactions_added: Mutex<Vec<(String, String, String)>>,
    pub acks: Mutex<Vec<InteractionResponse>>,
    pub edits: Mutex<Vec<String>>,
    pub deleted_commands: Mutex<Vec<String>>,

    pub fail_channels: AtomicBool,
    pub fail_reactions: AtomicBool,
    pub fail_send: AtomicBool,
    pub fail_add_reaction: AtomicBool,
    pub fail_ack: AtomicBool,
}

#[async_trait]
impl DiscordApi for FakeDiscord {
    async fn guild_channels(&self, _guild_id: &str) -> Result<Vec<Channel>, ApiError> {
        if self.fail_channels.load(Ordering::SeqCst) {
            return Err(remote_error());
        }
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn message_reactions(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _emoji: &str,
    ) -> Result<Vec<User>, ApiError> {
        if self.fail_reactions.load(Ordering::SeqCst) {
            return Err(remote_error());
        }
        Ok(self.reactors.lock().unwrap().clone())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &CreateMessage,
    ) -> Result<Message, ApiError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 403,
                body: "Missing Permissions".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), message.clone()));
        Ok(Message {
            id: "pin-1".to_string(),
            channel_id: channel_id.to_string(),
            guild_id: GUILD_ID.to_string(),
            author: user("pinbot-user"),
            content: String::new(),
            timestamp: Utc::now(),
            attachments: vec![],
            embeds: vec![],
        })
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ApiError> {
        if self.fail_add_reaction.load(Ordering::SeqCst) {
            return Err(remote_error());
        }
        self.reactions_added.lock().unwrap().push((
            channel_id.to_string(),
            message_id.to_string(),
            emoji.to_string(),
        ));
        Ok(())
    }

    async fn create_interaction_response(
        &self,
        _interaction_id: &str,
        _token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ApiError> {
        if self.fail_ack.load(Ordering::SeqCst) {
            return Err(remote_error());
        }
        self.acks.lock().unwrap().push(response.clone());
        Ok(())
    }

    async fn edit_original_response(
        &self,
        _application_id: &str,
        _token: &str,
        content: &str,
    ) -> Result<(), ApiError> {
        self.edits.lock().unwrap().push(content.to_string());
        Ok(())
    }

    async fn delete_guild_command(
        &self,
        _application_id: &str,
        _guild_id: &str,
        command_id: &str,
    ) -> Result<(), ApiError> {
        self.deleted_commands
            .lock()
            .unwrap()
            .push(command_id.to_string());
        Ok(())
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: id.to_string(),
        avatar: None,
    }
}

pub fn text_channel(id: &str, name: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: name.to_string(),
        kind: ChannelType::GuildText,
        guild_id: GUILD_ID.to_string(),
    }
}

/// A message as it appears in the resolved map: no guild id.
pub fn message(id: &str, channel_id: &str) -> Message {
    Message {
        id: id.to_string(),
        channel_id: channel_id.to_string(),
        guild_id: String::new(),
        author: user("u-author"),
        content: "Hello, World!".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap(),
        attachments: vec![],
        embeds: vec![],
    }
}

pub fn pin_interaction(message: &Message) -> Interaction {
    command_interaction("Pin", message)
}

pub fn command_interaction(command: &str, message: &Message) -> Interaction {
    Interaction {
        id: "i-1".to_string(),
        kind: InteractionType::ApplicationCommand,
        application_id: APP_ID.to_string(),
        token: "interaction-token".to_string(),
        guild_id: GUILD_ID.to_string(),
        channel_id: message.channel_id.clone(),
        member: Some(Member {
            user: Some(user("u-invoker")),
            nick: None,
        }),
        user: None,
        data: Some(CommandData {
            id: "cmd-1".to_string(),
            name: command.to_string(),
            target_id: message.id.clone(),
            resolved: ResolvedData {
                messages: HashMap::from([(message.id.clone(), message.clone())]),
            },
        }),
    }
}

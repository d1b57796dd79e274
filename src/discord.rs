//! Serenity-backed implementation of the chat capability interface.

use crate::client::{Author, AttachmentInfo, ChatClient, ChannelInfo, ClientError, EmbedInfo, MessageData};
use crate::download::USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Discord JSON error code for "Unknown Message".
const UNKNOWN_MESSAGE: isize = 10008;

#[derive(Clone)]
pub struct DiscordClient {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    downloader: reqwest::Client,
}

impl DiscordClient {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> anyhow::Result<Self> {
        let downloader = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            cache,
            downloader,
        })
    }
}

fn convert(message: serenity::Message) -> MessageData {
    MessageData {
        id: message.id.get(),
        author: Some(Author {
            tag: message.author.tag(),
            id: message.author.id.get(),
        }),
        created_at: chrono::DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0),
        content: if message.content.is_empty() {
            None
        } else {
            Some(message.content)
        },
        attachments: message
            .attachments
            .into_iter()
            .map(|a| AttachmentInfo {
                id: a.id.get(),
                url: a.url,
                filename: Some(a.filename),
            })
            .collect(),
        embeds: message
            .embeds
            .into_iter()
            .map(|e| EmbedInfo {
                title: e.title,
                url: e.url,
                description: e.description,
            })
            .collect(),
    }
}

#[async_trait]
impl ChatClient for DiscordClient {
    /// Eligible channels from the gateway cache: text-capable, non-thread
    /// (threads live outside `guild.channels`), and visible to the bot.
    async fn list_channels(&self, guild_id: u64) -> Result<Vec<ChannelInfo>, ClientError> {
        let bot_id = self.cache.current_user().id;
        let guild = self
            .cache
            .guild(serenity::GuildId::new(guild_id))
            .ok_or_else(|| ClientError::Api("guild not in cache".to_string()))?;
        let member = guild
            .members
            .get(&bot_id)
            .ok_or_else(|| ClientError::Api("bot member not in cache".to_string()))?;

        let mut eligible: Vec<(u16, u64, String)> = guild
            .channels
            .values()
            .filter(|c| matches!(c.kind, serenity::ChannelType::Text | serenity::ChannelType::News))
            .filter(|c| {
                guild
                    .user_permissions_in(c, member)
                    .contains(serenity::Permissions::VIEW_CHANNEL)
            })
            .map(|c| (c.position, c.id.get(), c.name.clone()))
            .collect();
        // Cache map order is arbitrary; present channels in sidebar order.
        eligible.sort();

        Ok(eligible
            .into_iter()
            .map(|(_, id, name)| ChannelInfo { id, name })
            .collect())
    }

    async fn fetch_page(
        &self,
        channel_id: u64,
        limit: u8,
        before: Option<u64>,
    ) -> Result<Vec<MessageData>, ClientError> {
        let mut builder = serenity::GetMessages::new().limit(limit);
        if let Some(before) = before {
            builder = builder.before(serenity::MessageId::new(before));
        }
        let messages = serenity::ChannelId::new(channel_id)
            .messages(&self.http, builder)
            .await
            .map_err(|e| ClientError::Api(e.to_string()))?;
        Ok(messages.into_iter().map(convert).collect())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ClientError> {
        match self
            .http
            .delete_message(
                serenity::ChannelId::new(channel_id),
                serenity::MessageId::new(message_id),
                None,
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)))
                if response.error.code == UNKNOWN_MESSAGE =>
            {
                Err(ClientError::NotFound)
            }
            Err(err) => Err(ClientError::Api(err.to_string())),
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes, ClientError> {
        let response = self.downloader.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status().as_u16()));
        }
        Ok(response.bytes().await?)
    }
}

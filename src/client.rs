//! Abstract chat-platform capability interface.
//!
//! The orchestrators never talk to serenity directly; they consume this
//! trait so the archive/purge pipelines can be exercised against an
//! in-memory fake. The production implementation lives in [`crate::discord`].

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A guild as the pipeline sees it: an id plus a display name used only
/// for path naming.
#[derive(Debug, Clone)]
pub struct GuildRef {
    pub id: u64,
    pub name: String,
}

/// An eligible channel (text-capable, not a thread, visible to the bot).
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Author {
    pub tag: String,
    pub id: u64,
}

#[derive(Debug, Clone)]
pub struct AttachmentInfo {
    pub id: u64,
    pub url: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EmbedInfo {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// A message projection. `author` is None when author resolution failed;
/// `content` is None for attachment-only messages.
#[derive(Debug, Clone)]
pub struct MessageData {
    pub id: u64,
    pub author: Option<Author>,
    pub created_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub attachments: Vec<AttachmentInfo>,
    pub embeds: Vec<EmbedInfo>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The target message no longer exists (Discord error 10008).
    #[error("not found")]
    NotFound,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Api(String),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Platform operations the pipeline consumes. All calls are sequential
/// blocking-until-complete requests; rate limiting is the caller's job.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Eligible channels of a guild, in the guild's natural order.
    async fn list_channels(&self, guild_id: u64) -> Result<Vec<ChannelInfo>, ClientError>;

    /// One page of up to `limit` messages strictly older than `before`
    /// (or the newest messages when `before` is None), newest-first.
    async fn fetch_page(
        &self,
        channel_id: u64,
        limit: u8,
        before: Option<u64>,
    ) -> Result<Vec<MessageData>, ClientError>;

    /// Delete a single message. Returns `ClientError::NotFound` when the
    /// message is already gone.
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), ClientError>;

    /// Retrieve the full body of a binary resource.
    async fn download(&self, url: &str) -> Result<Bytes, ClientError>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory `ChatClient` backed by per-channel message lists. Pages
    //! are sliced with the same before-cursor semantics as the real API.

    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockClient {
        pub channels: Vec<ChannelInfo>,
        /// Messages per channel id, newest-first (as the API serves them).
        pub messages: HashMap<u64, Vec<MessageData>>,
        /// Channels whose page fetches fail.
        pub fail_channels: HashSet<u64>,
        /// Attachment URLs whose downloads fail.
        pub fail_urls: HashSet<String>,
        /// Message ids that report NotFound on delete.
        pub missing: HashSet<u64>,
        pub fetch_calls: AtomicUsize,
        pub deleted: Mutex<Vec<u64>>,
        pub downloaded: Mutex<Vec<String>>,
    }

    pub fn msg(id: u64, content: &str) -> MessageData {
        MessageData {
            id,
            author: Some(Author {
                tag: "tester#0".into(),
                id: 1,
            }),
            created_at: DateTime::from_timestamp(1_700_000_000 + id as i64, 0),
            content: if content.is_empty() {
                None
            } else {
                Some(content.to_string())
            },
            attachments: Vec::new(),
            embeds: Vec::new(),
        }
    }

    impl MockClient {
        pub fn with_channel(id: u64, name: &str, messages: Vec<MessageData>) -> Self {
            let mut mock = Self::default();
            mock.add_channel(id, name, messages);
            mock
        }

        pub fn add_channel(&mut self, id: u64, name: &str, messages: Vec<MessageData>) {
            self.channels.push(ChannelInfo {
                id,
                name: name.to_string(),
            });
            self.messages.insert(id, messages);
        }
    }

    #[async_trait]
    impl ChatClient for MockClient {
        async fn list_channels(&self, _guild_id: u64) -> Result<Vec<ChannelInfo>, ClientError> {
            Ok(self.channels.clone())
        }

        async fn fetch_page(
            &self,
            channel_id: u64,
            limit: u8,
            before: Option<u64>,
        ) -> Result<Vec<MessageData>, ClientError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_channels.contains(&channel_id) {
                return Err(ClientError::Status(500));
            }
            let all = self.messages.get(&channel_id).cloned().unwrap_or_default();
            let page = all
                .into_iter()
                .filter(|m| before.map_or(true, |b| m.id < b))
                .take(limit as usize)
                .collect();
            Ok(page)
        }

        async fn delete_message(
            &self,
            _channel_id: u64,
            message_id: u64,
        ) -> Result<(), ClientError> {
            if self.missing.contains(&message_id) {
                return Err(ClientError::NotFound);
            }
            self.deleted.lock().unwrap().push(message_id);
            Ok(())
        }

        async fn download(&self, url: &str) -> Result<Bytes, ClientError> {
            if self.fail_urls.contains(url) {
                return Err(ClientError::Status(404));
            }
            self.downloaded.lock().unwrap().push(url.to_string());
            Ok(Bytes::from(url.as_bytes().to_vec()))
        }
    }
}

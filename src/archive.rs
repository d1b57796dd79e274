//! Full-guild extraction: drains every eligible channel through the
//! paginator, downloads attachments, and persists one pretty-printed
//! JSON record file per channel under a sanitized directory layout:
//!
//! `<base>/<guild>/<channel>/messages.json`
//! `<base>/<guild>/<channel>/attachments/<00000_name>`
//!
//! Channel and attachment failures are recorded in [`Stats::errors`] and
//! never abort the run; only directory/record write failures propagate,
//! since they mean the channel's work is lost.

use crate::client::{AttachmentInfo, ChatClient, ChannelInfo, ClientError, GuildRef, MessageData};
use crate::download::fetch_to_file;
use crate::paginator::fetch_all;
use crate::pause::{wait_unpaused, PauseToken};
use crate::sanitize::safe_name;
use chrono::SecondsFormat;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Per-run accumulator returned to the caller. Owned by exactly one
/// archive invocation; never shared across runs.
#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub channels: usize,
    pub messages: usize,
    pub attachments: usize,
    pub errors: Vec<String>,
}

/// Snapshot emitted after each channel completes (or fails).
#[derive(Debug, Clone)]
pub struct Progress {
    pub channel_name: String,
    pub channel_index: usize,
    pub total_channels: usize,
    pub messages: usize,
    pub attachments: usize,
}

#[derive(Default)]
pub struct ArchiveOptions {
    /// Receives at most one snapshot per channel; the consumer may
    /// throttle rendering further.
    pub progress: Option<UnboundedSender<Progress>>,
    pub pause: Option<PauseToken>,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("list channels: {0}")]
    Channels(#[from] ClientError),
    #[error("create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write {path}: {source}")]
    WriteRecord {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk message projection. Keys stay camelCase so archives remain
/// readable by existing tooling around the JSON layout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord {
    id: String,
    author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_id: Option<String>,
    created_at: Option<String>,
    content: Option<String>,
    attachments: Vec<AttachmentRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embeds: Option<Vec<EmbedRecord>>,
}

#[derive(Debug, Serialize)]
struct AttachmentRecord {
    filename: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct EmbedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Archives one guild under `base_dir` and returns the run's stats.
///
/// Strictly sequential: one channel at a time, one message at a time, one
/// attachment at a time. The pause token is consulted before each channel,
/// message and attachment, so a pause takes effect within one unit of work
/// and resume replays nothing.
pub async fn archive_guild<C: ChatClient + ?Sized>(
    client: &C,
    guild: &GuildRef,
    base_dir: &Path,
    mut opts: ArchiveOptions,
) -> Result<Stats, ArchiveError> {
    let root = base_dir.join(safe_name(&guild.name));
    create_dir(&root).await?;

    let mut stats = Stats::default();
    let channels = client.list_channels(guild.id).await?;
    let total_channels = channels.len();
    info!(guild = %guild.name, total_channels, "archive started");

    for (index, channel) in channels.iter().enumerate() {
        wait_unpaused(&mut opts.pause).await;
        let channel_index = index + 1;

        let dir = root.join(safe_name(&channel.name));
        let att_dir = dir.join("attachments");
        create_dir(&att_dir).await?;

        let messages = match fetch_all(client, channel).await {
            Ok(messages) => messages,
            Err(err) => {
                warn!(channel = %channel.name, %err, "channel fetch failed, skipping");
                stats.errors.push(format!("{}: {}", channel.name, err));
                emit(&opts.progress, channel, channel_index, total_channels, &stats);
                continue;
            }
        };

        let mut records = Vec::with_capacity(messages.len());
        // Channel-wide sequence keeps attachment filenames unique within
        // the channel's attachments directory.
        let mut seq = 0usize;

        for message in &messages {
            wait_unpaused(&mut opts.pause).await;
            let mut record = project(message);

            for attachment in &message.attachments {
                wait_unpaused(&mut opts.pause).await;
                let filename = attachment_filename(seq, attachment);
                let dest = att_dir.join(&filename);
                match fetch_to_file(client, &attachment.url, &dest).await {
                    Ok(()) => stats.attachments += 1,
                    Err(err) => {
                        stats.errors.push(format!("att {}: {}", attachment.url, err));
                    }
                }
                // The record keeps the intended mapping even when the
                // bytes are missing; the source URL stays authoritative.
                record.attachments.push(AttachmentRecord {
                    filename,
                    url: attachment.url.clone(),
                });
                seq += 1;
            }

            records.push(record);
            stats.messages += 1;
        }

        let record_path = dir.join("messages.json");
        let body = serde_json::to_vec_pretty(&records)?;
        tokio::fs::write(&record_path, body)
            .await
            .map_err(|source| ArchiveError::WriteRecord {
                path: record_path.clone(),
                source,
            })?;

        stats.channels += 1;
        emit(&opts.progress, channel, channel_index, total_channels, &stats);
    }

    info!(
        guild = %guild.name,
        channels = stats.channels,
        messages = stats.messages,
        attachments = stats.attachments,
        errors = stats.errors.len(),
        "archive finished"
    );
    Ok(stats)
}

/// Records preserve retrieval order: newest-first, as paginated.
fn project(message: &MessageData) -> MessageRecord {
    MessageRecord {
        id: message.id.to_string(),
        author: message
            .author
            .as_ref()
            .map(|a| a.tag.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        author_id: message.author.as_ref().map(|a| a.id.to_string()),
        created_at: message
            .created_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        content: message.content.clone(),
        attachments: Vec::new(),
        embeds: if message.embeds.is_empty() {
            None
        } else {
            Some(
                message
                    .embeds
                    .iter()
                    .map(|e| EmbedRecord {
                        title: e.title.clone(),
                        url: e.url.clone(),
                        description: e.description.clone(),
                    })
                    .collect(),
            )
        },
    }
}

/// `00042_name` — sequence prefix plus sanitized original name, falling
/// back to the attachment id with the URL's extension.
fn attachment_filename(seq: usize, attachment: &AttachmentInfo) -> String {
    let base = match &attachment.filename {
        Some(name) => name.clone(),
        None => format!("{}{}", attachment.id, url_extension(&attachment.url)),
    };
    format!("{seq:05}_{}", safe_name(&base))
}

fn url_extension(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
        })
        .unwrap_or_else(|| ".bin".to_string())
}

fn emit(
    progress: &Option<UnboundedSender<Progress>>,
    channel: &ChannelInfo,
    channel_index: usize,
    total_channels: usize,
    stats: &Stats,
) {
    if let Some(tx) = progress {
        let _ = tx.send(Progress {
            channel_name: channel.name.clone(),
            channel_index,
            total_channels,
            messages: stats.messages,
            attachments: stats.attachments,
        });
    }
}

async fn create_dir(path: &Path) -> Result<(), ArchiveError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| ArchiveError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

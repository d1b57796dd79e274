//! Full-guild message deletion, rate-limit compliant.

use crate::client::{ChatClient, ClientError, GuildRef};
use crate::paginator::fetch_all;
use std::time::Duration;
use tracing::{info, warn};

/// Unconditional delay after every deletion attempt. This is rate-limit
/// compliance, not backoff: it applies uniformly regardless of outcome.
pub const DELETE_DELAY: Duration = Duration::from_millis(1100);

#[derive(Debug, Default)]
pub struct PurgeOutcome {
    pub deleted: usize,
    pub errors: Vec<String>,
}

/// Deletes every message in every eligible channel of the guild, one at a
/// time. A channel whose history cannot be fetched is recorded and
/// skipped; a message that is already gone is silently ignored. There is
/// no pause support: once confirmed, a purge runs to completion.
pub async fn purge_guild<C: ChatClient + ?Sized>(
    client: &C,
    guild: &GuildRef,
) -> Result<PurgeOutcome, ClientError> {
    let mut outcome = PurgeOutcome::default();
    let channels = client.list_channels(guild.id).await?;
    info!(guild = %guild.name, channels = channels.len(), "purge started");

    for channel in &channels {
        let messages = match fetch_all(client, channel).await {
            Ok(messages) => messages,
            Err(err) => {
                warn!(channel = %channel.name, %err, "channel fetch failed, skipping");
                outcome.errors.push(format!("{}: {}", channel.name, err));
                continue;
            }
        };

        for message in &messages {
            match client.delete_message(channel.id, message.id).await {
                Ok(()) => outcome.deleted += 1,
                // Already gone, e.g. deleted concurrently. Not an error.
                Err(ClientError::NotFound) => {}
                Err(err) => outcome.errors.push(format!("msg {}: {}", message.id, err)),
            }
            tokio::time::sleep(DELETE_DELAY).await;
        }
    }

    info!(
        guild = %guild.name,
        deleted = outcome.deleted,
        errors = outcome.errors.len(),
        "purge finished"
    );
    Ok(outcome)
}

//! Cursor pagination over a channel's message history.

use crate::client::{ChatClient, ChannelInfo, ClientError, MessageData};
use tracing::debug;

/// Page size for history requests; the platform caps pages at 100.
pub const BATCH: u8 = 100;

/// Drains a channel's entire history, newest-first, by walking the
/// "before" cursor until a page comes back empty or short. A short page
/// already signals the end of history, so no trailing request is made.
///
/// Any page failure aborts the channel; pages fetched so far are
/// discarded and the error propagates to the caller.
pub async fn fetch_all<C: ChatClient + ?Sized>(
    client: &C,
    channel: &ChannelInfo,
) -> Result<Vec<MessageData>, ClientError> {
    let mut out: Vec<MessageData> = Vec::new();
    let mut before: Option<u64> = None;

    loop {
        let page = client.fetch_page(channel.id, BATCH, before).await?;
        if page.is_empty() {
            break;
        }
        let short = page.len() < BATCH as usize;
        before = page.last().map(|m| m.id);
        out.extend(page);
        if short {
            break;
        }
    }

    debug!(channel = %channel.name, count = out.len(), "history drained");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{msg, MockClient};
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    fn channel(id: u64) -> ChannelInfo {
        ChannelInfo {
            id,
            name: format!("chan-{id}"),
        }
    }

    /// Newest-first ids for a channel of `n` messages.
    fn history(n: u64) -> Vec<crate::client::MessageData> {
        (1..=n).rev().map(|id| msg(id, "hi")).collect()
    }

    #[tokio::test]
    async fn test_multi_page_union_order_and_uniqueness() {
        let client = MockClient::with_channel(1, "general", history(250));

        let all = fetch_all(&client, &channel(1)).await.unwrap();

        assert_eq!(all.len(), 250);
        // Newest-first, exactly as paginated.
        let ids: Vec<u64> = all.iter().map(|m| m.id).collect();
        assert_eq!(ids.first(), Some(&250));
        assert_eq!(ids.last(), Some(&1));
        assert!(ids.windows(2).all(|w| w[0] > w[1]));
        let unique: HashSet<u64> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 250);
        // 250 = two full pages + one short page; the short page terminates.
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_channel_terminates() {
        let client = MockClient::with_channel(1, "empty", Vec::new());
        let all = fetch_all(&client, &channel(1)).await.unwrap();
        assert!(all.is_empty());
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_batch_needs_trailing_empty_page() {
        // 200 messages: two full pages, then an empty page ends the walk.
        let client = MockClient::with_channel(1, "general", history(200));
        let all = fetch_all(&client, &channel(1)).await.unwrap();
        assert_eq!(all.len(), 200);
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_short_page_terminates_early() {
        let client = MockClient::with_channel(1, "general", history(42));
        let all = fetch_all(&client, &channel(1)).await.unwrap();
        assert_eq!(all.len(), 42);
        assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_failure_propagates() {
        let mut client = MockClient::with_channel(1, "general", history(10));
        client.fail_channels.insert(1);
        let err = fetch_all(&client, &channel(1)).await.unwrap_err();
        assert!(matches!(err, ClientError::Status(500)));
    }
}

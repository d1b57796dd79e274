//! Attachment retrieval to disk.

use crate::client::{ChatClient, ClientError};
use std::path::Path;
use thiserror::Error;

/// Fixed client label sent with every attachment request.
pub const USER_AGENT: &str = "vaultcord-archiver";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] ClientError),
    #[error("write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Downloads one binary resource to `dest`, creating parent directories
/// as needed and overwriting any existing file. Single attempt: no retry,
/// no partial resume, no checksum.
pub async fn fetch_to_file<C: ChatClient + ?Sized>(
    client: &C,
    url: &str,
    dest: &Path,
) -> Result<(), DownloadError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| DownloadError::Write {
                path: parent.display().to_string(),
                source,
            })?;
    }

    let body = client.download(url).await?;

    tokio::fs::write(dest, &body)
        .await
        .map_err(|source| DownloadError::Write {
            path: dest.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockClient;

    #[tokio::test]
    async fn test_writes_body_and_creates_parents() {
        let client = MockClient::default();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("attachments/nested/00000_file.png");

        fetch_to_file(&client, "https://cdn.example/file.png", &dest)
            .await
            .unwrap();

        let written = std::fs::read(&dest).unwrap();
        assert_eq!(written, b"https://cdn.example/file.png");
    }

    #[tokio::test]
    async fn test_overwrites_existing_file() {
        let client = MockClient::default();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("00000_a.bin");
        std::fs::write(&dest, b"stale").unwrap();

        fetch_to_file(&client, "https://cdn.example/a.bin", &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"https://cdn.example/a.bin");
    }

    #[tokio::test]
    async fn test_http_failure_writes_nothing() {
        let mut client = MockClient::default();
        client.fail_urls.insert("https://cdn.example/gone.png".into());
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("00000_gone.png");

        let err = fetch_to_file(&client, "https://cdn.example/gone.png", &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Fetch(ClientError::Status(404))));
        assert!(!dest.exists());
    }
}

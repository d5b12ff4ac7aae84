//! File-based attachment storage implementation
//!
//! Stores each blob as its own file, named by its identifier.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use super::model::{NewAttachment, StoredAttachment};
use super::repository::AttachmentRepository;
use crate::{Error, Result};

/// Directory-backed attachment store
pub struct FileAttachmentStore {
    dir: PathBuf,
}

impl FileAttachmentStore {
    /// Create a new FileAttachmentStore, creating the directory if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Identifiers are plain tokens; anything else could name a path
    /// outside the store.
    fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

#[async_trait]
impl AttachmentRepository for FileAttachmentStore {
    async fn save(&self, attachment: NewAttachment) -> Result<StoredAttachment> {
        if attachment.bytes.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Attachment {} is empty",
                attachment.name
            )));
        }

        let id = Uuid::new_v4().simple().to_string();
        let path = self.dir.join(&id);

        // create_new fails instead of overwriting if an id ever repeats
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&attachment.bytes).await?;
        file.flush().await?;

        debug!("Stored attachment {} ({} bytes) as {}", attachment.name, attachment.bytes.len(), id);

        Ok(StoredAttachment {
            id,
            name: attachment.name,
            mime: attachment.mime,
            size: attachment.bytes.len() as u64,
        })
    }

    async fn load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        if !Self::is_valid_id(id) {
            return Ok(None);
        }

        match tokio::fs::read(self.dir.join(id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn create_test_store() -> (FileAttachmentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileAttachmentStore::new(temp_dir.path().join("uploads"))
            .await
            .unwrap();
        (store, temp_dir)
    }

    fn upload(name: &str, bytes: &[u8]) -> NewAttachment {
        NewAttachment {
            name: name.to_string(),
            mime: Some("text/plain".to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _temp) = create_test_store().await;

        let stored = store.save(upload("notes.txt", b"hello world")).await.unwrap();
        assert_eq!(stored.name, "notes.txt");
        assert_eq!(stored.mime.as_deref(), Some("text/plain"));
        assert_eq!(stored.size, 11);
        assert!(store.dir().join(&stored.id).exists());

        let bytes = store.load(&stored.id).await.unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"hello world"[..]));
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let (store, _temp) = create_test_store().await;

        assert!(store.load("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_path_like_ids() {
        let (store, temp) = create_test_store().await;
        tokio::fs::write(temp.path().join("secret"), b"outside")
            .await
            .unwrap();

        assert!(store.load("../secret").await.unwrap().is_none());
        assert!(store.load("").await.unwrap().is_none());
        assert!(store.load("a/b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let (store, _temp) = create_test_store().await;

        match store.save(upload("empty.txt", b"")).await {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidInput error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_unique_ids() {
        let (store, _temp) = create_test_store().await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .save(upload(&format!("file-{}.txt", i), format!("body {}", i).as_bytes()))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let stored = handle.await.unwrap();
            let bytes = store.load(&stored.id).await.unwrap().unwrap();
            assert_eq!(bytes.len() as u64, stored.size);
            ids.insert(stored.id);
        }
        assert_eq!(ids.len(), 16);
    }
}

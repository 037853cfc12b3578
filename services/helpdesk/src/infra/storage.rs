use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::repository::AttachmentStore;
use crate::domain::types::validate_filename;
use crate::error::HelpdeskError;

/// Attachment bytes on the local filesystem at `<root>/<ticket_id>/<filename>`.
///
/// Storage paths handed back to callers are relative to `root`.
#[derive(Debug, Clone)]
pub struct LocalAttachmentStore {
    root: PathBuf,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored relative path, refusing anything that is not exactly
    /// `<uuid>/<filename>`.
    fn resolve(&self, path: &str) -> Result<PathBuf, HelpdeskError> {
        let (dir, name) = path
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("malformed storage path {path:?}"))?;
        if dir.parse::<Uuid>().is_err() || !validate_filename(name) {
            return Err(anyhow::anyhow!("malformed storage path {path:?}").into());
        }
        Ok(self.root.join(dir).join(name))
    }
}

impl AttachmentStore for LocalAttachmentStore {
    async fn store(
        &self,
        ticket_id: Uuid,
        filename: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<String, HelpdeskError> {
        if !validate_filename(filename) {
            return Err(HelpdeskError::InvalidFilename);
        }
        let dir = self.root.join(ticket_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("create attachment dir {}", dir.display()))?;

        let full = dir.join(filename);
        // `create_new` makes the duplicate check and the create one atomic step.
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(HelpdeskError::DuplicateFilename);
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("open {}", full.display()))
                    .into());
            }
        };

        let written = async {
            file.write_all(&bytes).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&full).await;
            return Err(anyhow::Error::new(e)
                .context(format!("write {}", full.display()))
                .into());
        }
        Ok(format!("{ticket_id}/{filename}"))
    }

    async fn retrieve(&self, path: &str) -> Result<Bytes, HelpdeskError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(HelpdeskError::AttachmentNotFound),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read {}", full.display()))
                .into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), HelpdeskError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove {}", full.display()))
                .into()),
        }
    }
}

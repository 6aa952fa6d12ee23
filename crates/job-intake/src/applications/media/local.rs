use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{sanitize_segment, MediaError, MediaStore, StoredMedia, UploadedFile};

/// Filesystem document store for development and offline deployments.
///
/// Public ids are paths relative to `root` (`{folder}/{field}-{millis}-{seq}.{ext}`), and
/// URLs are built by joining them onto `public_base_url`.
#[derive(Debug)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
    sequence: AtomicU64,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, public_id: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(public_id);
        let safe = !public_id.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(MediaError::InvalidId(public_id.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn public_id_for(&self, folder: &str, file: &UploadedFile) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stem = format!(
            "{}-{}-{sequence:04}",
            sanitize_segment(&file.field),
            Utc::now().timestamp_millis()
        );
        let extension = Path::new(&file.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(sanitize_segment)
            .filter(|ext| !ext.is_empty());

        match extension {
            Some(ext) => format!("{}/{stem}.{ext}", sanitize_segment(folder)),
            None => format!("{}/{stem}", sanitize_segment(folder)),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, folder: &str, file: &UploadedFile) -> Result<StoredMedia, MediaError> {
        let public_id = self.public_id_for(folder, file);
        let path = self.resolve(&public_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &file.bytes).await?;

        debug!(%public_id, bytes = file.bytes.len(), "stored document on local disk");
        Ok(StoredMedia {
            secure_url: format!(
                "{}/{}",
                self.public_base_url.trim_end_matches('/'),
                public_id
            ),
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let path = self.resolve(public_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(%public_id, "document already absent");
                Ok(())
            }
            Err(err) => Err(MediaError::Io(err)),
        }
    }
}

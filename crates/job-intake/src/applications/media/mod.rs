//! Media host abstraction for uploaded application documents.

mod drive;
mod local;

use async_trait::async_trait;
use serde::Serialize;

pub use drive::{DriveHttpsConnector, GoogleDriveMediaStore};
pub use local::LocalMediaStore;

/// Folder that receives every uploaded application document.
pub const DEFAULT_MEDIA_FOLDER: &str = "jobApplications";

/// File part received with a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was posted under (e.g. `resume`).
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Declared content type, falling back to a guess from the file name.
    pub fn mime_type(&self) -> mime::Mime {
        self.content_type
            .as_deref()
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
            .unwrap_or_else(|| mime_guess::from_path(&self.file_name).first_or_octet_stream())
    }
}

/// Handle returned by the media host for a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMedia {
    pub public_id: String,
    pub secure_url: String,
}

/// Keep only the characters a folder or file-name segment may carry on every backend.
pub(crate) fn sanitize_segment(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, folder: &str, file: &UploadedFile) -> Result<StoredMedia, MediaError>;

    /// Remove a stored file. Destroying an unknown id is not an error.
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Backend(String),
    #[error("media storage io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid media identifier `{0}`")]
    InvalidId(String),
}

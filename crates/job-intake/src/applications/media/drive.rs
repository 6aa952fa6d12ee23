use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use google_drive3::api::{File, Scope};
use google_drive3::common::Error as DriveError;
use google_drive3::hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use google_drive3::hyper_util::client::legacy::connect::HttpConnector;
use google_drive3::hyper_util::client::legacy::Client;
use google_drive3::hyper_util::rt::TokioExecutor;
use google_drive3::{yup_oauth2, DriveHub};
use tracing::debug;

use super::{MediaError, MediaStore, StoredMedia, UploadedFile};

pub type DriveHttpsConnector = HttpsConnector<HttpConnector>;

/// Google Drive backed document store.
///
/// Files land in the configured parent folder; the logical folder name is kept as a
/// name prefix and in the file description so documents stay grouped per form.
pub struct GoogleDriveMediaStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    parent_folder_id: Option<String>,
}

impl<C> GoogleDriveMediaStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: DriveHub<C>, parent_folder_id: Option<String>) -> Self {
        Self {
            hub,
            parent_folder_id,
        }
    }

    fn map_error<E: std::fmt::Display>(err: E) -> MediaError {
        MediaError::Backend(err.to_string())
    }
}

impl GoogleDriveMediaStore<DriveHttpsConnector> {
    /// Authenticate with a service account key file and build an HTTPS-backed hub.
    pub async fn from_service_account(
        key_path: impl AsRef<Path>,
        parent_folder_id: Option<String>,
    ) -> Result<Self, MediaError> {
        let key = yup_oauth2::read_service_account_key(key_path.as_ref()).await?;
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await?;

        let connector = HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self::new(DriveHub::new(client, auth), parent_folder_id))
    }
}

impl<C> std::fmt::Debug for GoogleDriveMediaStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveMediaStore")
            .field("parent_folder_id", &self.parent_folder_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C> MediaStore for GoogleDriveMediaStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    async fn upload(&self, folder: &str, file: &UploadedFile) -> Result<StoredMedia, MediaError> {
        let metadata = File {
            name: Some(format!("{folder}-{}-{}", file.field, file.file_name)),
            description: Some(format!("{folder}/{}", file.field)),
            parents: self.parent_folder_id.clone().map(|parent| vec![parent]),
            ..File::default()
        };

        let cursor = Cursor::new(file.bytes.clone());
        let (_, created) = self
            .hub
            .files()
            .create(metadata)
            .param("fields", "id,webViewLink")
            .supports_all_drives(true)
            .add_scope(Scope::File)
            .upload(cursor, file.mime_type())
            .await
            .map_err(Self::map_error)?;

        let public_id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| MediaError::Backend("drive returned no file id".to_string()))?;
        let secure_url = created
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{public_id}/view"));

        debug!(%public_id, field = %file.field, "uploaded document to drive");
        Ok(StoredMedia {
            public_id,
            secure_url,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        if public_id.trim().is_empty() {
            return Err(MediaError::InvalidId(public_id.to_string()));
        }

        match self
            .hub
            .files()
            .delete(public_id)
            .supports_all_drives(true)
            .add_scope(Scope::File)
            .doit()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_missing_file(&err) => {
                debug!(%public_id, "document already absent from drive");
                Ok(())
            }
            Err(err) => Err(Self::map_error(err)),
        }
    }
}

/// Drive reports an unknown file id as 404, either as a decoded error payload or a raw response.
fn is_missing_file(err: &DriveError) -> bool {
    const NOT_FOUND: u16 = 404;
    match err {
        DriveError::Failure(response) => response.status().as_u16() == NOT_FOUND,
        DriveError::BadRequest(payload) => {
            payload["error"]["code"].as_u64() == Some(u64::from(NOT_FOUND))
        }
        _ => false,
    }
}

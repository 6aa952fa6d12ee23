use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::{Mutex as RecordLock, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::domain::{ApplicationId, ApplicationStatus, DocumentSlot, JobApplication, Proof};
use super::intake::{ApplicationForm, IntakeGuard, IntakeViolation};
use super::media::{MediaError, MediaStore, StoredMedia, UploadedFile};
use super::patch;
use super::repository::{ApplicationRepository, RepositoryError};

/// Service composing the intake guard, repository, and media host.
pub struct JobApplicationService<R, M> {
    guard: IntakeGuard,
    repository: Arc<R>,
    media: Arc<M>,
    folder: String,
    record_locks: Mutex<HashMap<ApplicationId, Arc<RecordLock<()>>>>,
}

/// Exclusive hold on one record for a read-modify-write cycle.
///
/// The lock entry is dropped from the table once nobody else is waiting on it.
struct RecordGuard<'a> {
    locks: &'a Mutex<HashMap<ApplicationId, Arc<RecordLock<()>>>>,
    id: ApplicationId,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        drop(self.held.take());
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("ja-{id:06}"))
}

impl<R, M> JobApplicationService<R, M>
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    pub fn new(repository: Arc<R>, media: Arc<M>, folder: impl Into<String>) -> Self {
        Self {
            guard: IntakeGuard::new(),
            repository,
            media,
            folder: folder.into(),
            record_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serialise mutations of one record; callers touching other records are not blocked.
    async fn lock_record(&self, id: &ApplicationId) -> RecordGuard<'_> {
        let lock = self
            .record_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_default()
            .clone();
        let held = lock.lock_owned().await;
        debug!(application_id = %id, "record lock acquired");
        RecordGuard {
            locks: &self.record_locks,
            id: id.clone(),
            held: Some(held),
        }
    }

    /// Validate a new form, upload its documents, and store the record.
    pub async fn submit(
        &self,
        form: ApplicationForm,
        files: Vec<UploadedFile>,
    ) -> Result<JobApplication, ApplicationServiceError> {
        let mut application =
            self.guard
                .application_from_form(form, next_application_id(), Utc::now())?;

        let files = index_files(files)?;
        let missing: Vec<DocumentSlot> = DocumentSlot::ALL
            .into_iter()
            .filter(|slot| !files.contains_key(slot))
            .collect();
        if !missing.is_empty() {
            return Err(ApplicationServiceError::MissingDocuments { missing });
        }

        let uploaded = self.upload_all(files).await?;
        let fresh: Vec<String> = uploaded
            .iter()
            .map(|(_, media)| media.public_id.clone())
            .collect();
        for (slot, media) in uploaded {
            *application.proof_mut(slot) = Some(Proof {
                url: media.secure_url,
                public_id: media.public_id,
                verification: Default::default(),
            });
        }

        match self.repository.insert(application) {
            Ok(stored) => {
                info!(application_id = %stored.id, reg = %stored.reg.value, "job application submitted");
                Ok(stored)
            }
            Err(err) => {
                self.discard(&fresh).await;
                Err(err.into())
            }
        }
    }

    /// Overlay changed fields, replace uploaded documents, and apply verification updates.
    ///
    /// Concurrent updates of the same record run one after another, so each sees the
    /// previous one's documents and none is uploaded without being tracked.
    pub async fn update(
        &self,
        id: &ApplicationId,
        mut form: ApplicationForm,
        files: Vec<UploadedFile>,
    ) -> Result<JobApplication, ApplicationServiceError> {
        let _record = self.lock_record(id).await;
        let mut application = self.get(id).await?;

        let verification_updates = std::mem::take(&mut form.verification_updates);
        patch::apply_form(&mut application, form)?;

        let files = index_files(files)?;
        let uploaded = self.upload_all(files).await?;
        let mut fresh = Vec::with_capacity(uploaded.len());
        let mut superseded = Vec::new();
        for (slot, media) in uploaded {
            let current = application.proof_mut(slot);
            let verification = current
                .as_ref()
                .map(|proof| proof.verification.clone())
                .unwrap_or_default();
            fresh.push(media.public_id.clone());
            let replacement = Proof {
                url: media.secure_url,
                public_id: media.public_id,
                verification,
            };
            if let Some(previous) = current.replace(replacement) {
                superseded.push(previous.public_id);
            }
        }

        for field in patch::apply_verification_updates(&mut application, verification_updates) {
            warn!(application_id = %id, %field, "ignoring verification update for field without verification metadata");
        }

        if let Err(err) = self.repository.update(application.clone()) {
            self.discard(&fresh).await;
            return Err(err.into());
        }
        self.discard(&superseded).await;

        info!(application_id = %id, replaced_documents = fresh.len(), "job application updated");
        Ok(application)
    }

    pub async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<JobApplication, ApplicationServiceError> {
        let _record = self.lock_record(id).await;
        let mut application = self.get(id).await?;
        application.status = status;
        self.repository.update(application.clone())?;
        info!(application_id = %id, status = status.label(), "job application status changed");
        Ok(application)
    }

    pub async fn get(&self, id: &ApplicationId) -> Result<JobApplication, ApplicationServiceError> {
        let application = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(application)
    }

    pub async fn get_by_reg(&self, reg: &str) -> Result<JobApplication, ApplicationServiceError> {
        let application = self
            .repository
            .find_by_reg(reg)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(application)
    }

    pub async fn get_by_email(
        &self,
        email: &str,
    ) -> Result<JobApplication, ApplicationServiceError> {
        let application = self
            .repository
            .find_by_email(email)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(application)
    }

    pub async fn list(&self) -> Result<Vec<JobApplication>, ApplicationServiceError> {
        Ok(self.repository.list()?)
    }

    /// Destroy every stored document, then remove the record.
    ///
    /// A media failure aborts the deletion and keeps the record so it can be retried.
    pub async fn delete(&self, id: &ApplicationId) -> Result<(), ApplicationServiceError> {
        let _record = self.lock_record(id).await;
        let application = self.get(id).await?;
        for (slot, proof) in application.proofs() {
            self.media.destroy(&proof.public_id).await.map_err(|err| {
                warn!(application_id = %id, %slot, error = %err, "document cleanup failed");
                err
            })?;
        }
        self.repository.remove(id)?;
        info!(application_id = %id, "job application deleted");
        Ok(())
    }

    /// Upload in slot order; on failure the files uploaded so far are destroyed.
    async fn upload_all(
        &self,
        files: BTreeMap<DocumentSlot, UploadedFile>,
    ) -> Result<Vec<(DocumentSlot, StoredMedia)>, ApplicationServiceError> {
        let mut uploaded: Vec<(DocumentSlot, StoredMedia)> = Vec::with_capacity(files.len());
        for (slot, file) in files {
            match self.media.upload(&self.folder, &file).await {
                Ok(media) => uploaded.push((slot, media)),
                Err(err) => {
                    warn!(%slot, error = %err, "document upload failed");
                    let fresh: Vec<String> = uploaded
                        .into_iter()
                        .map(|(_, media)| media.public_id)
                        .collect();
                    self.discard(&fresh).await;
                    return Err(err.into());
                }
            }
        }
        Ok(uploaded)
    }

    async fn discard(&self, public_ids: &[String]) {
        for public_id in public_ids {
            if let Err(err) = self.media.destroy(public_id).await {
                warn!(%public_id, error = %err, "unable to remove orphaned document");
            }
        }
    }
}

#[cfg(test)]
impl<R, M> JobApplicationService<R, M> {
    pub(crate) fn record_locks_are_released(&self) -> bool {
        self.record_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

fn index_files(
    files: Vec<UploadedFile>,
) -> Result<BTreeMap<DocumentSlot, UploadedFile>, ApplicationServiceError> {
    let mut indexed = BTreeMap::new();
    for file in files {
        let slot = DocumentSlot::from_field_name(&file.field)
            .ok_or_else(|| ApplicationServiceError::UnexpectedDocument(file.field.clone()))?;
        if indexed.insert(slot, file).is_some() {
            return Err(ApplicationServiceError::DuplicateDocument(slot));
        }
    }
    Ok(indexed)
}

fn describe_slots(slots: &[DocumentSlot]) -> String {
    slots
        .iter()
        .map(|slot| slot.field_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("Please upload all required documents (missing: {})", describe_slots(.missing))]
    MissingDocuments { missing: Vec<DocumentSlot> },
    #[error("Unexpected document field `{0}`")]
    UnexpectedDocument(String),
    #[error("Document `{0}` was uploaded more than once")]
    DuplicateDocument(DocumentSlot),
}

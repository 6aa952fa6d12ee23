use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{ApplicationId, JobApplication};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Store a new record. Fails with [`RepositoryError::Conflict`] on a duplicate
    /// id, registration number, or email.
    fn insert(&self, application: JobApplication) -> Result<JobApplication, RepositoryError>;
    fn update(&self, application: JobApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<JobApplication>, RepositoryError>;
    fn find_by_reg(&self, reg: &str) -> Result<Option<JobApplication>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<JobApplication>, RepositoryError>;
    /// All records, oldest first.
    fn list(&self) -> Result<Vec<JobApplication>, RepositoryError>;
    fn remove(&self, id: &ApplicationId) -> Result<JobApplication, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("A Job Application With This {field} Already Exists!")]
    Conflict { field: &'static str },
    #[error("Job Application Not Found!")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Registration numbers match exactly; emails match case-insensitively.
pub fn matches_reg(application: &JobApplication, reg: &str) -> bool {
    application.reg.value == reg.trim()
}

pub fn matches_email(application: &JobApplication, email: &str) -> bool {
    application.email.value.eq_ignore_ascii_case(email.trim())
}

/// Check `candidate` against the other stored records for duplicate identifying fields.
pub fn ensure_unique<'a, I>(candidate: &JobApplication, existing: I) -> Result<(), RepositoryError>
where
    I: IntoIterator<Item = &'a JobApplication>,
{
    for other in existing {
        if other.id == candidate.id {
            continue;
        }
        if matches_reg(other, &candidate.reg.value) {
            return Err(RepositoryError::Conflict {
                field: "Registration Number",
            });
        }
        if matches_email(other, &candidate.email.value) {
            return Err(RepositoryError::Conflict { field: "Email" });
        }
    }
    Ok(())
}

/// Process-local application store keyed by id. Ids are issued in submission order,
/// so iteration yields the oldest record first.
#[derive(Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<BTreeMap<ApplicationId, JobApplication>>>,
}

impl InMemoryApplicationRepository {
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<ApplicationId, JobApplication>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: JobApplication) -> Result<JobApplication, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict { field: "Id" });
        }
        ensure_unique(&record, guard.values())?;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: JobApplication) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        ensure_unique(&record, guard.values())?;
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn find_by_reg(&self, reg: &str) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(self
            .lock()?
            .values()
            .find(|record| matches_reg(record, reg))
            .cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(self
            .lock()?
            .values()
            .find(|record| matches_email(record, email))
            .cloned())
    }

    fn list(&self) -> Result<Vec<JobApplication>, RepositoryError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn remove(&self, id: &ApplicationId) -> Result<JobApplication, RepositoryError> {
        self.lock()?.remove(id).ok_or(RepositoryError::NotFound)
    }
}

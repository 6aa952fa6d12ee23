//! Job application intake, document storage, and review metadata.
//!
//! Forms arrive as multipart submissions; text fields are validated by [`IntakeGuard`],
//! attached documents are pushed to a [`MediaStore`], and the resulting
//! [`JobApplication`] is kept in an [`ApplicationRepository`].

pub mod domain;
pub mod intake;
pub mod media;
pub mod patch;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationStatus, Branch, DocumentSlot, Gender, JobApplication, Proof,
    VerificationStatus, Verified,
};
pub use intake::{ApplicationForm, IntakeGuard, IntakeViolation};
pub use media::{
    GoogleDriveMediaStore, LocalMediaStore, MediaError, MediaStore, StoredMedia, UploadedFile,
};
pub use repository::{ApplicationRepository, InMemoryApplicationRepository, RepositoryError};
pub use router::{application_router, FormError, ROUTE_PREFIX};
pub use service::{ApplicationServiceError, JobApplicationService};

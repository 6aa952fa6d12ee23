use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{Map, Value};

use crate::applications::domain::{ApplicationId, JobApplication};
use crate::applications::intake::ApplicationForm;
use crate::applications::media::{MediaError, MediaStore, StoredMedia, UploadedFile};
use crate::applications::repository::{ApplicationRepository, RepositoryError};
use crate::applications::{application_router, DocumentSlot, JobApplicationService};

pub(super) const FOLDER: &str = "jobApplications";

pub(super) fn form_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("reg", "REG-2024-001"),
        ("fullName", "Asha Verma"),
        ("email", "asha.verma@example.com"),
        ("phone", "9876543210"),
        ("cgpa", "8.7"),
        ("dob", "2001-04-12"),
        ("gender", "Female"),
        ("address", "12 Lake Road, Pune"),
        ("caste", "General"),
        ("gapYears", "0"),
        ("careerPlans", "Power systems engineering"),
        ("ssc", "91.2"),
        ("sscSchool", "St. Mary's High School"),
        ("hsc", "88.4"),
        ("hscSchool", "City Junior College"),
        ("branch", "Electrical"),
        ("projects", "Smart grid load forecaster"),
        ("internship", "Tata Power, 8 weeks"),
        ("workExperience", "None"),
        ("skills", "Rust, MATLAB, PLC"),
        ("electiveSubjects", "Power electronics"),
        ("communicationLanguages", "English, Hindi"),
        ("references", "Prof. R. Iyer"),
        ("research", "Microgrid stability"),
        ("preferredLocation", "Pune"),
        ("noticePeriod", "Immediate"),
        ("expectedSalary", "600000"),
        ("currentSalary", "0"),
        ("availability", "July 2025"),
        ("hobbies", "Chess"),
        ("extraCurricularActivities", "Robotics club"),
        ("patents", "None"),
        ("professionalMemberships", "IEEE"),
        ("languagesKnown", "English, Hindi, Marathi"),
        ("maritalStatus", "Single"),
        ("nationality", "Indian"),
        ("passportNumber", "P1234567"),
        ("visaStatus", "Not required"),
        ("drivingLicense", "MH12 20190001234"),
        ("disability", "None"),
        ("linkedinProfile", "https://linkedin.com/in/ashaverma"),
    ]
}

pub(super) fn form_from(fields: &[(&str, &str)]) -> ApplicationForm {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();
    serde_json::from_value(Value::Object(map)).expect("form fields decode")
}

pub(super) fn complete_form() -> ApplicationForm {
    form_from(&form_fields())
}

/// Complete form with selected fields replaced.
pub(super) fn form_with(overrides: &[(&str, &str)]) -> ApplicationForm {
    let mut fields: BTreeMap<&str, &str> = form_fields().into_iter().collect();
    for (name, value) in overrides {
        fields.insert(*name, *value);
    }
    let fields: Vec<(&str, &str)> = fields.into_iter().collect();
    form_from(&fields)
}

pub(super) fn document(field: &str) -> UploadedFile {
    UploadedFile {
        field: field.to_string(),
        file_name: format!("{field}.pdf"),
        content_type: Some("application/pdf".to_string()),
        bytes: format!("%PDF-1.7 {field}").into_bytes(),
    }
}

pub(super) fn all_documents() -> Vec<UploadedFile> {
    DocumentSlot::ALL
        .into_iter()
        .map(|slot| document(slot.field_name()))
        .collect()
}

pub(super) fn build_service() -> (
    JobApplicationService<MemoryRepository, MemoryMedia>,
    Arc<MemoryRepository>,
    Arc<MemoryMedia>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let media = Arc::new(MemoryMedia::default());
    let service = JobApplicationService::new(repository.clone(), media.clone(), FOLDER);
    (service, repository, media)
}

pub(super) fn service_with_media(
    media: MemoryMedia,
) -> (
    JobApplicationService<MemoryRepository, MemoryMedia>,
    Arc<MemoryRepository>,
    Arc<MemoryMedia>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let media = Arc::new(media);
    let service = JobApplicationService::new(repository.clone(), media.clone(), FOLDER);
    (service, repository, media)
}

pub(super) async fn submitted(
    service: &JobApplicationService<MemoryRepository, MemoryMedia>,
) -> JobApplication {
    service
        .submit(complete_form(), all_documents())
        .await
        .expect("submission succeeds")
}

pub(super) use crate::applications::InMemoryApplicationRepository as MemoryRepository;

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _application: JobApplication) -> Result<JobApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: JobApplication) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_reg(&self, _reg: &str) -> Result<Option<JobApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_email(&self, _email: &str) -> Result<Option<JobApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<JobApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &ApplicationId) -> Result<JobApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Media host double recording uploads and deletions.
#[derive(Default)]
pub(super) struct MemoryMedia {
    sequence: AtomicU64,
    uploads: Mutex<Vec<(String, StoredMedia)>>,
    destroyed: Mutex<Vec<String>>,
    pub(super) fail_uploads_for: Option<&'static str>,
    pub(super) fail_destroy: bool,
    pub(super) yield_on_upload: bool,
}

impl MemoryMedia {
    pub(super) fn failing_upload(field: &'static str) -> Self {
        Self {
            fail_uploads_for: Some(field),
            ..Self::default()
        }
    }

    pub(super) fn failing_destroy() -> Self {
        Self {
            fail_destroy: true,
            ..Self::default()
        }
    }

    /// Hands control back to the scheduler mid-upload so concurrent requests interleave.
    pub(super) fn yielding() -> Self {
        Self {
            yield_on_upload: true,
            ..Self::default()
        }
    }

    pub(super) fn uploaded_ids(&self) -> Vec<String> {
        self.uploads
            .lock()
            .expect("media mutex poisoned")
            .iter()
            .map(|(_, media)| media.public_id.clone())
            .collect()
    }

    pub(super) fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().expect("media mutex poisoned").clone()
    }
}

#[async_trait]
impl MediaStore for MemoryMedia {
    async fn upload(&self, folder: &str, file: &UploadedFile) -> Result<StoredMedia, MediaError> {
        if self.fail_uploads_for == Some(file.field.as_str()) {
            return Err(MediaError::Backend("upload quota exceeded".to_string()));
        }
        if self.yield_on_upload {
            tokio::task::yield_now().await;
        }
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let public_id = format!("{folder}/{}-{id}", file.field);
        let stored = StoredMedia {
            secure_url: format!("https://media.example.com/{public_id}"),
            public_id,
        };
        self.uploads
            .lock()
            .expect("media mutex poisoned")
            .push((folder.to_string(), stored.clone()));
        Ok(stored)
    }

    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        if self.fail_destroy {
            return Err(MediaError::Backend("media host offline".to_string()));
        }
        self.destroyed
            .lock()
            .expect("media mutex poisoned")
            .push(public_id.to_string());
        Ok(())
    }
}

/// Hand-rolled `multipart/form-data` body for router tests.
pub(super) struct MultipartBody {
    buffer: Vec<u8>,
}

pub(super) const BOUNDARY: &str = "intake-test-boundary";

impl MultipartBody {
    pub(super) fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub(super) fn text(mut self, name: &str, value: &str) -> Self {
        self.buffer.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub(super) fn fields(self, fields: &[(&str, &str)]) -> Self {
        fields
            .iter()
            .fold(self, |body, (name, value)| body.text(name, value))
    }

    pub(super) fn file(mut self, upload: &UploadedFile) -> Self {
        let content_type = upload
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        self.buffer.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {content_type}\r\n\r\n",
                upload.field, upload.file_name
            )
            .as_bytes(),
        );
        self.buffer.extend_from_slice(&upload.bytes);
        self.buffer.extend_from_slice(b"\r\n");
        self
    }

    pub(super) fn request(mut self, method: &str, uri: &str) -> axum::http::Request<axum::body::Body> {
        self.buffer
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header(
                axum::http::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(axum::body::Body::from(self.buffer))
            .expect("request builds")
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn application_router_with_service(
    service: JobApplicationService<MemoryRepository, MemoryMedia>,
) -> axum::Router {
    application_router(Arc::new(service))
}

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, Path, State,
    },
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::domain::{ApplicationId, ApplicationStatus};
use super::intake::ApplicationForm;
use super::media::{MediaStore, UploadedFile};
use super::repository::ApplicationRepository;
use super::service::JobApplicationService;
use crate::error::AppError;

pub const ROUTE_PREFIX: &str = "/api/v1/jobApplication";
const VERIFICATION_UPDATES_FIELD: &str = "verificationUpdates";

type SharedService<R, M> = Arc<JobApplicationService<R, M>>;
type ApiResponse = Result<(StatusCode, Json<Value>), AppError>;

/// Router builder exposing the job application endpoints.
pub fn application_router<R, M>(service: SharedService<R, M>) -> Router
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let routes = Router::new()
        .route("/post", post(submit_handler::<R, M>))
        .route("/getall", get(list_handler::<R, M>))
        .route("/get/:id", get(fetch_handler::<R, M>))
        .route("/update/:id", put(update_handler::<R, M>))
        .route("/update-status/:id", put(update_status_handler::<R, M>))
        .route("/delete/:id", delete(delete_handler::<R, M>))
        .route("/detail/:reg", get(detail_by_reg_handler::<R, M>))
        .route("/details/:email", get(detail_by_email_handler::<R, M>))
        .with_state(service);

    Router::new().nest(ROUTE_PREFIX, routes)
}

/// Request body decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Malformed form submission: {0}")]
    NotMultipart(#[from] MultipartRejection),
    #[error("Malformed form submission: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Invalid status update: {0}")]
    StatusBody(#[from] JsonRejection),
    #[error("verificationUpdates must be a JSON object: {0}")]
    VerificationUpdates(serde_json::Error),
    #[error("Malformed form fields: {0}")]
    Decode(serde_json::Error),
}

impl FormError {
    pub fn status(&self) -> StatusCode {
        match self {
            FormError::NotMultipart(rejection) => rejection.status(),
            FormError::Multipart(err) => err.status(),
            FormError::StatusBody(
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_),
            ) => StatusCode::BAD_REQUEST,
            FormError::StatusBody(rejection) => rejection.status(),
            FormError::VerificationUpdates(_) | FormError::Decode(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Split a multipart body into text fields and file parts.
///
/// Empty file parts are dropped since browsers post them for untouched file inputs.
pub(crate) async fn read_form(
    mut multipart: Multipart,
) -> Result<(ApplicationForm, Vec<UploadedFile>), FormError> {
    let mut fields = Map::new();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let text = field.text().await?;
        if name == VERIFICATION_UPDATES_FIELD {
            if !text.trim().is_empty() {
                let updates = serde_json::from_str::<Value>(&text)
                    .map_err(FormError::VerificationUpdates)?;
                fields.insert(name, updates);
            }
        } else {
            fields.insert(name, Value::String(text));
        }
    }

    let form = serde_json::from_value(Value::Object(fields)).map_err(FormError::Decode)?;
    Ok((form, files))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    pub(crate) status: ApplicationStatus,
}

pub(crate) async fn submit_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let (form, files) = read_form(multipart.map_err(FormError::from)?).await?;
    let application = service.submit(form, files).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "jobApplication": application,
            "message": "Job Application Submitted!",
        })),
    ))
}

pub(crate) async fn list_handler<R, M>(State(service): State<SharedService<R, M>>) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let applications = service.list().await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "jobApplications": applications,
        })),
    ))
}

pub(crate) async fn fetch_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(id): Path<String>,
) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let application = service.get(&ApplicationId(id)).await?;
    Ok(found(application))
}

pub(crate) async fn update_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let (form, files) = read_form(multipart.map_err(FormError::from)?).await?;
    let application = service.update(&ApplicationId(id), form, files).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "jobApplication": application,
            "message": "Job Application Updated Successfully!",
        })),
    ))
}

pub(crate) async fn update_status_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(id): Path<String>,
    request: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let Json(request) = request.map_err(FormError::from)?;
    let application = service
        .update_status(&ApplicationId(id), request.status)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "jobApplication": application,
            "message": format!("Job Application Marked {}!", request.status.label()),
        })),
    ))
}

pub(crate) async fn delete_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(id): Path<String>,
) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    service.delete(&ApplicationId(id)).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Job Application Deleted Successfully!",
        })),
    ))
}

pub(crate) async fn detail_by_reg_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(reg): Path<String>,
) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let application = service.get_by_reg(&reg).await?;
    Ok(found(application))
}

pub(crate) async fn detail_by_email_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(email): Path<String>,
) -> ApiResponse
where
    R: ApplicationRepository + 'static,
    M: MediaStore + 'static,
{
    let application = service.get_by_email(&email).await?;
    Ok(found(application))
}

fn found(application: super::domain::JobApplication) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "jobApplication": application,
        })),
    )
}

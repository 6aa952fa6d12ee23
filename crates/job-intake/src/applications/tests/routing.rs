use super::common::*;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    let (service, _repository, _media) = build_service();
    application_router_with_service(service)
}

fn submission() -> MultipartBody {
    all_documents()
        .iter()
        .fold(MultipartBody::new().fields(&form_fields()), |body, file| {
            body.file(file)
        })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    (status, read_json_body(response).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn submit(router: &Router) -> Value {
    let (status, body) = send(
        router,
        submission().request("POST", "/api/v1/jobApplication/post"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn post_creates_application() {
    let router = router();
    let body = submit(&router).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Job Application Submitted!");
    let application = &body["jobApplication"];
    assert_eq!(application["reg"]["value"], "REG-2024-001");
    assert_eq!(application["status"], "Pending");
    assert!(application["resume"]["url"]
        .as_str()
        .expect("resume url")
        .starts_with("https://media.example.com/jobApplications/resume-"));
    assert_eq!(application["hscProof"]["verification"]["isVerified"], false);
}

#[tokio::test]
async fn post_with_missing_field_is_rejected() {
    let mut fields = form_fields();
    fields.retain(|(name, _)| *name != "nationality");
    let request = all_documents()
        .iter()
        .fold(MultipartBody::new().fields(&fields), |body, file| {
            body.file(file)
        })
        .request("POST", "/api/v1/jobApplication/post");

    let (status, body) = send(&router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "success": false, "message": "Please fill out the entire form!" })
    );
}

#[tokio::test]
async fn post_without_documents_is_rejected() {
    let request = MultipartBody::new()
        .fields(&form_fields())
        .request("POST", "/api/v1/jobApplication/post");

    let (status, body) = send(&router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .expect("message")
        .starts_with("Please upload all required documents"));
}

#[tokio::test]
async fn duplicate_submission_conflicts() {
    let router = router();
    submit(&router).await;

    let (status, body) = send(
        &router,
        submission().request("POST", "/api/v1/jobApplication/post"),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "A Job Application With This Registration Number Already Exists!"
    );
}

#[tokio::test]
async fn lookups_return_the_stored_record() {
    let router = router();
    let created = submit(&router).await;
    let id = created["jobApplication"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    let (status, body) = send(&router, get("/api/v1/jobApplication/getall")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobApplications"].as_array().map(Vec::len), Some(1));

    for uri in [
        format!("/api/v1/jobApplication/get/{id}"),
        "/api/v1/jobApplication/detail/REG-2024-001".to_string(),
        "/api/v1/jobApplication/details/asha.verma@example.com".to_string(),
    ] {
        let (status, body) = send(&router, get(&uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["success"], true);
        assert_eq!(body["jobApplication"]["id"], id.as_str());
    }
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let router = router();
    for uri in [
        "/api/v1/jobApplication/get/ja-404",
        "/api/v1/jobApplication/detail/REG-0000",
        "/api/v1/jobApplication/details/nobody@example.com",
    ] {
        let (status, body) = send(&router, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            body,
            json!({ "success": false, "message": "Job Application Not Found!" })
        );
    }
}

#[tokio::test]
async fn update_applies_fields_and_verification_updates() {
    let router = router();
    let created = submit(&router).await;
    let id = created["jobApplication"]["id"].as_str().expect("id");

    let request = MultipartBody::new()
        .text("phone", "9123456780")
        .text("address", "")
        .text(
            "verificationUpdates",
            r#"{"email":{"isVerified":true,"verifiedBy":"registrar"}}"#,
        )
        .file(&document("idCard"))
        .request("PUT", &format!("/api/v1/jobApplication/update/{id}"));
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Job Application Updated Successfully!");
    let application = &body["jobApplication"];
    assert_eq!(application["phone"]["value"], "9123456780");
    assert_eq!(application["address"]["value"], "12 Lake Road, Pune");
    assert_eq!(application["email"]["verification"]["isVerified"], true);
    assert_eq!(
        application["email"]["verification"]["verifiedBy"],
        "registrar"
    );
    assert_ne!(
        application["idCard"]["public_id"],
        created["jobApplication"]["idCard"]["public_id"]
    );
}

#[tokio::test]
async fn malformed_verification_updates_are_rejected() {
    let router = router();
    let created = submit(&router).await;
    let id = created["jobApplication"]["id"].as_str().expect("id");

    let request = MultipartBody::new()
        .text("verificationUpdates", "{not json")
        .request("PUT", &format!("/api/v1/jobApplication/update/{id}"));
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn status_can_be_changed() {
    let router = router();
    let created = submit(&router).await;
    let id = created["jobApplication"]["id"].as_str().expect("id");

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/jobApplication/update-status/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "status": "Accepted" }).to_string()))
        .expect("request builds");
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job Application Marked Accepted!");
    assert_eq!(body["jobApplication"]["status"], "Accepted");
}

#[tokio::test]
async fn delete_removes_application() {
    let router = router();
    let created = submit(&router).await;
    let id = created["jobApplication"]["id"].as_str().expect("id");

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/jobApplication/delete/{id}"))
        .body(Body::empty())
        .expect("request builds");
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Job Application Deleted Successfully!");

    let (status, _) = send(&router, get(&format!("/api/v1/jobApplication/get/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_multipart_submission_gets_error_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/jobApplication/post")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "reg": "REG-2024-001" }).to_string()))
        .expect("request builds");

    let (status, body) = send(&router(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .expect("message")
        .starts_with("Malformed form submission"));
}

#[tokio::test]
async fn unknown_status_gets_error_envelope() {
    let router = router();
    let created = submit(&router).await;
    let id = created["jobApplication"]["id"].as_str().expect("id");

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/v1/jobApplication/update-status/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "status": "Approved" }).to_string()))
        .expect("request builds");
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .expect("message")
        .starts_with("Invalid status update"));

    let (_, stored) = send(&router, get(&format!("/api/v1/jobApplication/get/{id}"))).await;
    assert_eq!(stored["jobApplication"]["status"], "Pending");
}

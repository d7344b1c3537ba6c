//! End-to-end tests of the HTTP API through the Axum router.

mod fixtures;
mod mocks;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use contact_manager::server::router;
use contact_manager::services::ContactServiceImpl;
use contact_manager::{AppState, Contact, ValidationRules};
use fixtures::*;
use mocks::MockContactService;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "contact-upload-boundary";
const JOHN: &str = "+15551234567";

fn mock_app(mock: &MockContactService) -> Router {
    router(AppState::new(
        Arc::new(mock.clone()),
        ValidationRules::default(),
        1024 * 1024,
    ))
}

async fn sqlite_app() -> Router {
    let service = ContactServiceImpl::new(memory_repository().await);
    router(AppState::new(
        Arc::new(service),
        ValidationRules::default(),
        1024 * 1024,
    ))
}

fn contact_json(phone: &str, name: &str, salary: f64) -> Value {
    json!({
        "phone": phone,
        "name": name,
        "dateOfBirth": "1990-01-01",
        "married": false,
        "salary": salary,
    })
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn upload_request(file_name: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"csvFile\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n",
        boundary = BOUNDARY,
        file_name = file_name,
        contents = contents,
    );
    Request::builder()
        .method(Method::POST)
        .uri("/contacts/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let app = mock_app(&MockContactService::new());
    let (status, body) = send(&app, empty_request(Method::GET, "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_contact_lifecycle() {
    let app = sqlite_app().await;

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/contacts", &contact_json(JOHN, "John Doe", 50000.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Successfully added");
    assert_eq!(body["data"]["phone"], JOHN);

    let (status, body) = send(&app, empty_request(Method::GET, "/contacts/+15551234567")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "John Doe");
    assert_eq!(body["data"]["dateOfBirth"], "1990-01-01");

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/contacts/+15551234567",
            &contact_json(JOHN, "Johnny Doe", 65000.0),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully updated");

    let (_, body) = send(&app, empty_request(Method::GET, "/contacts")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Johnny Doe");
    assert_eq!(body["data"][0]["salary"], 65000.0);

    let (status, body) =
        send(&app, empty_request(Method::DELETE, "/contacts/+15551234567")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully deleted");

    let (status, body) = send(&app, empty_request(Method::GET, "/contacts/+15551234567")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Contact is not found");
}

#[tokio::test]
async fn test_create_duplicate_conflicts() {
    let app = sqlite_app().await;
    let request = || json_request(Method::POST, "/contacts", &contact_json(JOHN, "John Doe", 50000.0));

    let (status, _) = send(&app, request()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Contact already exists");
}

#[tokio::test]
async fn test_invalid_contact_is_unprocessable() {
    let mock = MockContactService::new();
    let app = mock_app(&mock);

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/contacts", &contact_json("12345", "John Doe", 0.0)),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body["data"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "phone");
    assert_eq!(errors[1]["field"], "salary");
    assert_eq!(errors[1]["message"], "Salary must be at least $1.00.");
    assert!(body["message"].as_str().unwrap().contains('\n'));

    // rejected before reaching the service
    assert_eq!(mock.get_call_count("create"), 0);
}

#[tokio::test]
async fn test_edit_rules() {
    let mock = MockContactService::new();
    let app = mock_app(&mock);

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/contacts/+15550000000",
            &contact_json(JOHN, "John Doe", 50000.0),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Phone number cannot be changed");

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/contacts/+15551234567",
            &contact_json(JOHN, "John Doe", 50000.0),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(mock.get_call_count("edit"), 1);
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let mock = MockContactService::new();
    mock.set_failing(true);
    let app = mock_app(&mock);

    let (status, body) = send(&app, empty_request(Method::GET, "/contacts")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error occurred while getting contacts");

    let (status, body) = send(&app, upload_request("contacts.csv", "John Doe,1990-01-01,true,+15551234567,50000")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error occurred while uploading contacts");
}

#[tokio::test]
async fn test_upload_creates_contacts() {
    let mock = MockContactService::new();
    let app = mock_app(&mock);
    let csv = "Name,DateOfBirth,Married,Phone,Salary\n\
               John Doe,1990-01-01,true,+15551234567,50000\n\
               bad,row\n\
               Jane Roe,1985-05-20,false,+15557654321,60000";

    let (status, body) = send(&app, upload_request("contacts.csv", csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully added");
    assert_eq!(body["data"]["created"], 2);
    assert_eq!(body["data"]["skipped"][0]["line"], 3);

    let phones: Vec<String> = mock.contacts().into_iter().map(|c| c.phone).collect();
    assert_eq!(phones, vec![JOHN.to_string(), "+15557654321".to_string()]);
}

#[tokio::test]
async fn test_upload_stops_at_duplicate() {
    let mock = MockContactService::new();
    mock.add_contact(sample_contact("+15557654321", "Jane Roe"));
    let app = mock_app(&mock);
    let csv = "John Doe,1990-01-01,true,+15551234567,50000\n\
               Jane Roe,1985-05-20,false,+15557654321,60000\n\
               Max Power,1970-03-03,true,+15559999999,70000";

    let (status, body) = send(&app, upload_request("contacts.csv", csv)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Contact already exists");
    assert_eq!(body["data"]["created"], 1);
    assert_eq!(body["data"]["stopped"]["kind"], "duplicate");
    assert_eq!(body["data"]["stopped"]["record"], 2);

    // the first row stays created; the third is never attempted
    let contacts: Vec<Contact> = mock.contacts();
    assert_eq!(contacts.len(), 2);
    assert!(contacts.iter().all(|c| c.phone != "+15559999999"));
}

#[tokio::test]
async fn test_upload_stops_at_invalid_row() {
    let mock = MockContactService::new();
    let app = mock_app(&mock);
    let csv = "John Doe,1990-01-01,true,+15551234567,50000\n\
               Jane Roe,1985-05-20,false,+15557654321,-5";

    let (status, body) = send(&app, upload_request("contacts.csv", csv)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Salary must be at least $1.00.");
    assert_eq!(body["data"]["stopped"]["kind"], "invalid");
    assert_eq!(body["data"]["created"], 1);
    assert_eq!(mock.contacts().len(), 1);
}

#[tokio::test]
async fn test_upload_rejects_non_csv_and_missing_file() {
    let mock = MockContactService::new();
    let app = mock_app(&mock);

    let (status, body) = send(&app, upload_request("contacts.txt", "John Doe,1990-01-01,true,+15551234567,50000")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please upload a valid CSV file.");

    let (status, body) = send(&app, upload_request("contacts.csv", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file selected");

    let (status, body) = send(&app, empty_request(Method::POST, "/contacts/upload")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file selected");

    assert_eq!(mock.get_call_count("create"), 0);
}

#[tokio::test]
async fn test_upload_with_only_header() {
    let app = mock_app(&MockContactService::new());
    let (status, body) = send(
        &app,
        upload_request("contacts.csv", "Name,DateOfBirth,Married,Phone,Salary"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No contacts found in file");
    assert_eq!(body["data"]["created"], 0);
}

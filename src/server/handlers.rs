//! HTTP handlers for the contact API.
//!
//! Every response body is an [`ApiResponse`] envelope carrying a success
//! flag, an optional human-readable message and an optional payload.

use crate::domain::ValidationError;
use crate::error::ServiceError;
use crate::models::{Contact, ValidationRules};
use crate::server::upload::upload_contacts;
use crate::services::ContactService;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub contacts: Arc<dyn ContactService>,
    pub rules: ValidationRules,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        contacts: Arc<dyn ContactService>,
        rules: ValidationRules,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            contacts,
            rules,
            max_upload_bytes,
        }
    }
}

/// Response envelope returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::failure(message, None)
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// One failed field rule, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<&ValidationError> for FieldError {
    fn from(err: &ValidationError) -> Self {
        Self {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

pub(crate) const CONTACT_NOT_FOUND: &str = "Contact is not found";
pub(crate) const CONTACT_EXISTS: &str = "Contact already exists";

pub(crate) fn respond<T: Serialize>(status: StatusCode, body: ApiResponse<T>) -> Response {
    (status, Json(body)).into_response()
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Map a service failure to a 500 carrying its generic action message.
pub(crate) fn service_failure(err: ServiceError) -> Response {
    respond(StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::error(err.to_string()))
}

/// 422 response listing every failed field rule.
pub(crate) fn validation_failure<T: Serialize>(
    errors: &[ValidationError],
    data: Option<T>,
) -> Response {
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    respond(
        StatusCode::UNPROCESSABLE_ENTITY,
        ApiResponse::failure(message, data),
    )
}

fn json_rejection(rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "Rejected request body");
    respond(rejection.status(), ApiResponse::error(rejection.body_text()))
}

/// Build the Axum router.
pub fn router(state: AppState) -> Router {
    // multipart framing needs a little room on top of the file itself
    let body_limit = state.max_upload_bytes.saturating_add(64 * 1024);

    Router::new()
        .route("/health", get(health_check))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/upload", post(upload_contacts))
        .route(
            "/contacts/:phone",
            get(get_contact).put(edit_contact).delete(delete_contact),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Response {
    respond(StatusCode::OK, ApiResponse::done("healthy"))
}

async fn list_contacts(State(state): State<AppState>) -> Response {
    match state.contacts.list().await {
        Ok(contacts) => respond(StatusCode::OK, ApiResponse::ok(contacts)),
        Err(e) => service_failure(e),
    }
}

async fn get_contact(State(state): State<AppState>, Path(phone): Path<String>) -> Response {
    match state.contacts.find(Contact::by_phone(phone)).await {
        Ok(Some(contact)) => respond(StatusCode::OK, ApiResponse::ok(contact)),
        Ok(None) => respond(StatusCode::NOT_FOUND, ApiResponse::error(CONTACT_NOT_FOUND)),
        Err(e) => service_failure(e),
    }
}

async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<Contact>, JsonRejection>,
) -> Response {
    let contact = match body {
        Ok(Json(contact)) => contact,
        Err(rejection) => return json_rejection(rejection),
    };

    if let Err(errors) = contact.validate(&state.rules, today()) {
        let details: Vec<FieldError> = errors.iter().map(FieldError::from).collect();
        return validation_failure(&errors, Some(details));
    }

    match state.contacts.create(contact.clone()).await {
        Ok(true) => {
            info!(phone = %contact.phone, "Contact added");
            respond(
                StatusCode::CREATED,
                ApiResponse::ok_with_message("Successfully added", contact),
            )
        }
        Ok(false) => respond(StatusCode::CONFLICT, ApiResponse::error(CONTACT_EXISTS)),
        Err(e) => service_failure(e),
    }
}

async fn edit_contact(
    State(state): State<AppState>,
    Path(phone): Path<String>,
    body: Result<Json<Contact>, JsonRejection>,
) -> Response {
    let contact = match body {
        Ok(Json(contact)) => contact,
        Err(rejection) => return json_rejection(rejection),
    };

    if contact.phone != phone {
        return respond(
            StatusCode::BAD_REQUEST,
            ApiResponse::error("Phone number cannot be changed"),
        );
    }

    if let Err(errors) = contact.validate(&state.rules, today()) {
        let details: Vec<FieldError> = errors.iter().map(FieldError::from).collect();
        return validation_failure(&errors, Some(details));
    }

    match state.contacts.edit(contact.clone()).await {
        Ok(true) => respond(
            StatusCode::OK,
            ApiResponse::ok_with_message("Successfully updated", contact),
        ),
        Ok(false) => respond(StatusCode::NOT_FOUND, ApiResponse::error(CONTACT_NOT_FOUND)),
        Err(e) => service_failure(e),
    }
}

async fn delete_contact(State(state): State<AppState>, Path(phone): Path<String>) -> Response {
    match state.contacts.delete(Contact::by_phone(phone)).await {
        Ok(true) => respond(StatusCode::OK, ApiResponse::done("Successfully deleted")),
        Ok(false) => respond(StatusCode::NOT_FOUND, ApiResponse::error(CONTACT_NOT_FOUND)),
        Err(e) => service_failure(e),
    }
}

//! CSV bulk upload.
//!
//! The uploaded file is parsed into candidates, then each candidate is
//! validated, checked for an existing phone and created, in file order. The
//! first invalid or duplicate candidate stops the upload; contacts created
//! before it stay created.

use crate::error::ServiceResult;
use crate::import::{parse_contacts, SkippedRow};
use crate::models::{Contact, ValidationRules};
use crate::server::handlers::{
    respond, today, ApiResponse, AppState, CONTACT_EXISTS,
};
use crate::services::ContactService;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::Response,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Multipart field holding the uploaded file.
pub const UPLOAD_FIELD: &str = "csvFile";

const NO_FILE: &str = "No file selected";
const NOT_CSV: &str = "Please upload a valid CSV file.";
const UPLOAD_FAILED: &str = "Error occurred while uploading contacts";

/// Outcome of a bulk upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    /// Contacts created before the upload finished or stopped
    pub created: usize,

    /// Rows the CSV reader could not parse
    pub skipped: Vec<SkippedLine>,

    /// Why the upload stopped early, if it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped: Option<UploadStop>,
}

/// A CSV line dropped by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line: usize,
    pub reason: String,
}

impl From<&SkippedRow> for SkippedLine {
    fn from(row: &SkippedRow) -> Self {
        Self {
            line: row.line,
            reason: row.reason.to_string(),
        }
    }
}

/// The candidate that stopped an upload. `record` is 1-based among the
/// parsed candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UploadStop {
    Invalid {
        record: usize,
        phone: String,
        errors: Vec<String>,
    },
    Duplicate {
        record: usize,
        phone: String,
    },
}

/// Validate and create candidates in order, stopping at the first invalid
/// or duplicate one.
///
/// # Errors
///
/// Returns the service error of the first failed store call.
pub async fn import_candidates(
    contacts: &dyn ContactService,
    rules: &ValidationRules,
    today: NaiveDate,
    candidates: Vec<Contact>,
) -> ServiceResult<UploadReport> {
    let mut report = UploadReport::default();

    for (index, candidate) in candidates.into_iter().enumerate() {
        let record = index + 1;

        if let Err(errors) = candidate.validate(rules, today) {
            report.stopped = Some(UploadStop::Invalid {
                record,
                phone: candidate.phone,
                errors: errors.iter().map(ToString::to_string).collect(),
            });
            return Ok(report);
        }

        let duplicate = contacts
            .exists(Contact::by_phone(candidate.phone.as_str()))
            .await?
            || !contacts.create(candidate.clone()).await?;
        if duplicate {
            report.stopped = Some(UploadStop::Duplicate {
                record,
                phone: candidate.phone,
            });
            return Ok(report);
        }

        report.created += 1;
    }

    Ok(report)
}

fn has_csv_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|extension| extension == "csv")
}

/// Read the upload field, returning the file name and contents.
async fn read_upload(mut multipart: Multipart) -> Result<Option<(String, Vec<u8>)>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "Malformed multipart upload");
                return Err(respond(e.status(), ApiResponse::error(e.body_text())));
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        return match field.bytes().await {
            Ok(bytes) => Ok(Some((file_name, bytes.to_vec()))),
            Err(e) => {
                warn!(error = %e, "Failed to read uploaded file");
                Err(respond(e.status(), ApiResponse::error(e.body_text())))
            }
        };
    }
}

pub(crate) async fn upload_contacts(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Upload is not multipart");
            return respond(StatusCode::BAD_REQUEST, ApiResponse::error(NO_FILE));
        }
    };

    let (file_name, bytes) = match read_upload(multipart).await {
        Ok(Some((name, bytes))) if !bytes.is_empty() => (name, bytes),
        Ok(_) => return respond(StatusCode::BAD_REQUEST, ApiResponse::error(NO_FILE)),
        Err(response) => return response,
    };

    if !has_csv_extension(&file_name) {
        warn!(file_name = %file_name, "Rejected upload without .csv extension");
        return respond(StatusCode::BAD_REQUEST, ApiResponse::error(NOT_CSV));
    }

    if bytes.len() > state.max_upload_bytes {
        warn!(size = bytes.len(), limit = state.max_upload_bytes, "Upload too large");
        return respond(
            StatusCode::PAYLOAD_TOO_LARGE,
            ApiResponse::error(format!(
                "File is larger than the {} byte limit",
                state.max_upload_bytes
            )),
        );
    }

    let import = match parse_contacts(&bytes) {
        Ok(import) => import,
        Err(e) => {
            warn!(error = %e, file_name = %file_name, "Unreadable CSV upload");
            return respond(StatusCode::BAD_REQUEST, ApiResponse::error(NOT_CSV));
        }
    };

    let skipped: Vec<SkippedLine> = import.skipped.iter().map(SkippedLine::from).collect();
    let result = import_candidates(
        state.contacts.as_ref(),
        &state.rules,
        today(),
        import.candidates,
    )
    .await;

    let mut report = match result {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "Upload aborted by store failure");
            return respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::error(UPLOAD_FAILED),
            );
        }
    };
    report.skipped = skipped;

    info!(
        file_name = %file_name,
        created = report.created,
        skipped = report.skipped.len(),
        "Processed CSV upload"
    );

    match report.stopped.clone() {
        None if report.created > 0 => respond(
            StatusCode::OK,
            ApiResponse::ok_with_message("Successfully added", report),
        ),
        None => respond(
            StatusCode::OK,
            ApiResponse::ok_with_message("No contacts found in file", report),
        ),
        Some(UploadStop::Duplicate { .. }) => {
            respond(StatusCode::CONFLICT, ApiResponse::failure(CONTACT_EXISTS, Some(report)))
        }
        Some(UploadStop::Invalid { errors, .. }) => {
            let message = errors.join("\n");
            respond(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiResponse::failure(message, Some(report)),
            )
        }
    }
}

//! HTTP request handlers
//!
//! Implementation of the relay's HTTP endpoints. The conversion handler is
//! the request-handling layer around the core: it accepts the uploaded PDF,
//! brackets the upload/convert calls with `get_valid_token` and
//! `record_usage`, and shapes the CSV response.

use crate::{
    error::format_error,
    server::app::AppState,
    types::{ErrorResponse, PingResponse, SessionStatusResponse},
    utils::version,
};
use axum::{
    Json,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Multipart field carrying the uploaded statement
const UPLOAD_FIELD: &str = "file";

/// Service banner
///
/// GET /
pub async fn index() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "Statement Relay is running" }))
}

/// Convert an uploaded PDF statement to CSV
///
/// POST /api/convert-statement
///
/// Accepts a multipart upload (field `file`), proxies it through the upstream
/// conversion service under a valid session token, and returns the CSV with
/// an attachment filename derived from the upload.
pub async fn convert_statement(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (filename, bytes) = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => return error_response(&e, "upload_validation"),
    };

    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&filename);

    tracing::info!("Received '{}' ({} bytes)", filename, bytes.len());

    match run_conversion(&state, bytes, &filename).await {
        Ok(csv) => {
            let csv_filename = format!("converted_{}.csv", stem);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename={}", csv_filename),
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Conversion request failed: {}", format_error(&e));
            error_response(&e, "statement_conversion")
        }
    }
}

/// Pull the statement out of the multipart body, validating it is a PDF
async fn read_upload(multipart: &mut Multipart) -> crate::Result<(String, Vec<u8>)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return Err(crate::Error::validation(
                    UPLOAD_FIELD,
                    "A valid PDF file is required.",
                ));
            }
            Err(e) => {
                tracing::warn!("Malformed multipart body: {}", e);
                return Err(crate::Error::validation(
                    UPLOAD_FIELD,
                    "Malformed multipart body.",
                ));
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("statement.pdf").to_string();
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(crate::Error::validation(
                UPLOAD_FIELD,
                "A valid PDF file is required.",
            ));
        }

        return match field.bytes().await {
            Ok(bytes) => Ok((filename, bytes.to_vec())),
            Err(e) => {
                tracing::warn!("Failed to read upload body: {}", e);
                Err(crate::Error::validation(
                    UPLOAD_FIELD,
                    "Failed to read uploaded file.",
                ))
            }
        };
    }
}

/// The token-bracketed conversion sequence.
///
/// Usage is charged only after the CSV is known good; a crash between the
/// upstream success and the charge loses at most one count.
async fn run_conversion(state: &AppState, bytes: Vec<u8>, filename: &str) -> crate::Result<String> {
    let token = state.session_manager.get_valid_token().await?;

    tracing::info!("Uploading bank statement...");
    let uuid = state.upstream.upload(&token, bytes, filename).await?;
    tracing::info!("Upload successful, UUID: {}", uuid);

    let csv = state.upstream.convert(&token, &uuid).await?;

    state.session_manager.record_usage().await?;
    Ok(csv)
}

/// Ping endpoint for health checks
///
/// GET /ping
///
/// Returns server status and uptime information.
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    let response = PingResponse::new(uptime, version::get_version());

    tracing::debug!(
        "Ping response: uptime={}s, version={}",
        uptime,
        version::get_version()
    );
    Json(response)
}

/// Session quota snapshot
///
/// GET /session
///
/// Reports whether a token is held and how much quota remains, without
/// exposing the token itself.
pub async fn session_status(State(state): State<AppState>) -> Response {
    match state.session_manager.session_status().await {
        Ok(session) => {
            let status =
                SessionStatusResponse::from_session(&session, state.session_manager.max_usage());
            (StatusCode::OK, Json(status)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to read session status: {}", format_error(&e));
            error_response(&e, "session_status")
        }
    }
}

/// Discard the current session
///
/// POST /invalidate_session
///
/// Forces provisioning of a fresh disposable account on the next conversion.
pub async fn invalidate_session(State(state): State<AppState>) -> Response {
    tracing::info!("Invalidating session");
    match state.session_manager.invalidate_session().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to invalidate session: {}", format_error(&e));
            error_response(&e, "session_invalidation")
        }
    }
}

/// Map each failure kind to its own status so operators can tell
/// "mailbox is slow" from "store is down" at the edge
fn status_for(error: &crate::Error) -> StatusCode {
    match error {
        crate::Error::Validation { .. } => StatusCode::BAD_REQUEST,
        crate::Error::StoreUnavailable { .. } | crate::Error::ProvisioningExhausted { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        crate::Error::ConversionTimeout { .. } | crate::Error::VerificationTimeout { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
        crate::Error::RegistrationFailed { .. }
        | crate::Error::VerificationClickFailed { .. }
        | crate::Error::LoginFailed { .. }
        | crate::Error::UploadFailed { .. }
        | crate::Error::ConversionFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Shape an error into the JSON body + status the API promises
fn error_response(error: &crate::Error, context: &str) -> Response {
    (
        status_for(error),
        Json(ErrorResponse::with_context(format_error(error), context)),
    )
        .into_response()
}

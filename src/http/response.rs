//! HTTP response building
//!
//! Every response is JSON with permissive CORS headers and a reason phrase
//! taken from the status table.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::ext::ReasonPhrase;
use hyper::{Response, StatusCode};
use serde_json::Value;

use super::status::{is_known, reason_phrase};
use crate::logger;

/// Body used when the payload itself cannot be serialized
const SERIALIZE_FAILURE_BODY: &str = r#""Internal Server Error""#;

/// `HTTP/1.1 <code> <reason>`
pub fn status_line(status: u16) -> String {
    format!("HTTP/1.1 {status} {}", reason_phrase(status))
}

/// Build the JSON response for `body` with numeric status `status`.
///
/// Codes hyper cannot represent (below 100 or above 999) are sent as 500.
pub fn respond(body: &Value, status: u16) -> Response<Full<Bytes>> {
    let payload = match serde_json::to_vec(body) {
        Ok(bytes) => Bytes::from(bytes),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            Bytes::from_static(SERIALIZE_FAILURE_BODY.as_bytes())
        }
    };

    let code = StatusCode::from_u16(status).unwrap_or_else(|_| {
        logger::log_warning(&format!("Status {status} out of range, sending 500"));
        StatusCode::INTERNAL_SERVER_ERROR
    });
    if !is_known(code.as_u16()) {
        logger::log_debug(&format!("Status {code} has no table entry, using fallback reason"));
    }
    logger::log_debug(&format!("[Response] {}", status_line(code.as_u16())));

    Response::builder()
        .status(code)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "*")
        .header("Content-Type", "application/json")
        .extension(ReasonPhrase::from_static(
            reason_phrase(code.as_u16()).as_bytes(),
        ))
        .body(Full::new(payload))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = Response::new(Full::new(Bytes::from_static(
                SERIALIZE_FAILURE_BODY.as_bytes(),
            )));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

fn log_build_error(status: u16, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}

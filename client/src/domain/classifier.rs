//! Maps terminal failures onto [`AccessError`].
//!
//! Every resource method goes through [`classify`]; status-code branching
//! lives here and nowhere else.

use serde_json::Value;
use tracing::debug;

use crate::domain::AccessError;
use crate::domain::ports::{TransportError, TransportResponse};
use crate::domain::retry::Failure;

const CONNECTIVITY_HINT: &str =
    "Could not reach the server. Check your network connection and try again.";
const TIMEOUT_MESSAGE: &str = "The request took too long. Check your connection and try again.";

/// Classify a terminal failure of the call labelled `endpoint`.
///
/// # Examples
/// ```
/// use client::domain::ports::TransportResponse;
/// use client::domain::{AccessErrorKind, Failure, classify};
///
/// let failure = Failure::Status(TransportResponse::new(
///     404,
///     br#"{"message":"Activity 9 does not exist"}"#.to_vec(),
/// ));
/// let error = classify(&failure, "GET /activities/9");
/// assert_eq!(error.kind(), AccessErrorKind::Validation);
/// assert_eq!(error.message(), "Activity 9 does not exist");
/// ```
pub fn classify(failure: &Failure, endpoint: &str) -> AccessError {
    match failure {
        Failure::Status(response) => classify_status(response)
            .with_status(response.status)
            .with_endpoint(endpoint),
        Failure::Transport(error) => classify_transport(error).with_endpoint(endpoint),
        Failure::Cancelled => AccessError::cancelled().with_endpoint(endpoint),
    }
}

/// Classify a 2xx body that did not match the expected shape.
pub fn decode_failure(endpoint: &str, error: &serde_json::Error) -> AccessError {
    debug!(%endpoint, %error, "response body did not match the expected shape");
    AccessError::unknown("The server sent a response that could not be read.")
        .with_endpoint(endpoint)
}

fn classify_status(response: &TransportResponse) -> AccessError {
    let status = response.status;
    match status {
        401 | 403 => AccessError::permission_denied(
            backend_message(&response.body).unwrap_or_else(|| permission_fallback(status)),
        ),
        500 | 502 | 503 | 504 => AccessError::transient(format!(
            "The server is temporarily unavailable (HTTP {status}). Please try again."
        )),
        400..=499 => AccessError::validation(
            backend_message(&response.body).unwrap_or_else(|| validation_fallback(status)),
        ),
        _ => AccessError::unknown(format!(
            "The server sent an unexpected response (HTTP {status})."
        )),
    }
}

fn classify_transport(error: &TransportError) -> AccessError {
    match error {
        _ if error.is_no_response() => AccessError::unknown(CONNECTIVITY_HINT),
        TransportError::Timeout { .. } => AccessError::timeout(TIMEOUT_MESSAGE),
        other => AccessError::unknown(format!("The request could not be sent ({other}).")),
    }
}

/// Backend-provided message from `message`, `error`, or `detail`, in that
/// order. `error` may itself be an object carrying `message`.
fn backend_message(body: &[u8]) -> Option<String> {
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
        return None;
    };
    ["message", "error", "detail"]
        .into_iter()
        .filter_map(|name| fields.get(name))
        .find_map(|value| match value {
            Value::String(text) => non_blank(text),
            Value::Object(nested) => nested
                .get("message")
                .and_then(Value::as_str)
                .and_then(non_blank),
            _ => None,
        })
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn permission_fallback(status: u16) -> String {
    if status == 401 {
        "You need to sign in to access this content.".to_owned()
    } else {
        "You do not have access to this content. Contact an administrator if you think this is a mistake."
            .to_owned()
    }
}

fn validation_fallback(status: u16) -> String {
    match status {
        400 => "The request was not valid.".to_owned(),
        404 => "The requested item could not be found.".to_owned(),
        409 => "The request conflicts with the current state of the item.".to_owned(),
        410 => "The requested item is no longer available.".to_owned(),
        422 => "Some of the submitted details are not valid.".to_owned(),
        429 => "Too many requests. Please wait a moment and try again.".to_owned(),
        _ => format!("The request could not be completed (HTTP {status})."),
    }
}

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Transport and protocol failures surfaced by the gateway client.
#[derive(Debug, Error)]
pub enum LiteLlmError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} {message}")]
    Status { status: StatusCode, message: String },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("retry exhausted after max attempts (status: {status:?}, last_error: {last_error:?})")]
    RetryExhausted {
        status: Option<StatusCode>,
        last_error: Option<String>,
    },

    #[error("stream ended without a terminal event")]
    MissingTerminal,

    #[error("request was cancelled")]
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorBody>,
}

/// Gateways disagree on the error shape; both `{"error":{"message":..}}` and
/// `{"error":"..."}` appear in the wild.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Object { message: Option<String> },
    Text(String),
}

/// Extract a human-readable message from a non-success response body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        match payload.error {
            Some(ErrorBody::Object {
                message: Some(message),
            }) if !message.trim().is_empty() => return message,
            Some(ErrorBody::Text(message)) if !message.trim().is_empty() => return message,
            _ => {}
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}

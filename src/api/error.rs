use crate::session::Language;
use thiserror::Error;

/// Message logged when the server gives no usable explanation
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again later.";

/// Failure of a single backend call. Nothing is retried.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Server answered with a non-success status; `detail` is the
    /// server's own explanation when it sent one
    #[error("{} (HTTP {status})", .detail.as_deref().unwrap_or(GENERIC_ERROR_MESSAGE))]
    Status { status: u16, detail: Option<String> },

    /// Request never produced a response (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status associated with the failure; transport and decode
    /// failures report 500 like any other unexplained error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            _ => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }

    /// Text for the user: the server's `detail` when present, otherwise
    /// the generic message in the interface language.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => language.generic_error_message().to_string(),
        }
    }

    /// Build the error for a failed response from its status and raw body.
    ///
    /// FastAPI style bodies carry the explanation in `detail`, either as a
    /// string or as a structured validation list.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value.get("detail").cloned())
            .map(|detail| match detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            })
            .filter(|detail| !detail.trim().is_empty());

        Self::Status { status, detail }
    }
}

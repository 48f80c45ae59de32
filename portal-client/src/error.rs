use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum APIError {
    #[error("Unable to deserialize JSON")]
    JSONParseError(#[from] serde_json::Error),
    #[error("HTTP Error")]
    HTTPError(#[from] reqwest::Error),
    #[error("Server answered {status}: {message}")]
    ServerError { status: StatusCode, message: String },
    #[error("Invalid portal URL")]
    URLError(#[from] url::ParseError),
    #[error("Unable to read file")]
    FileError(#[from] std::io::Error),
    #[error("Not a chart package: {0}")]
    InvalidPackage(String),
}

impl APIError {
    /// Message sent back by the portal, if it sent a non empty one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            APIError::ServerError { message, .. } if !message.trim().is_empty() => {
                Some(message.trim())
            }
            _ => None,
        }
    }
}

/// Extracts the human readable part of an error body.
///
/// The portal answers either with plain text or with `{"error": "..."}`.
pub(crate) fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    }
}

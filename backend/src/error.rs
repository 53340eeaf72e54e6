//! Error kinds of the intake pipeline and how they map onto HTTP.
//!
//! Client mistakes (`ValidationError`, a malformed multipart body) answer `400`; anything
//! that goes wrong while storing the photograph or writing the row answers `500`. In both
//! cases the body is a [`SubmitResponse`] whose message is the error's own text.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::responses::SubmitResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ConfigError {
    pub fn invalid(key: &'static str, value: &str) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
        }
    }
}

/// Rejections of the uploaded photograph. The messages are shown to the end user as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Photograph is required.")]
    MissingPhotograph,

    #[error("No selected file.")]
    EmptyFilename,

    #[error("Invalid file type.")]
    InvalidFileType,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Malformed service account JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid service account private key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SPREADSHEET_ID is not configured")]
    MissingSpreadsheetId,

    #[error("Could not sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {body}")]
    Token { status: u16, body: String },

    #[error("Sheets API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Background write failed: {0}")]
    Blocking(String),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Malformed multipart request: {0}")]
    Multipart(#[from] actix_multipart::MultipartError),

    #[error("Could not store photograph: {0}")]
    Upload(#[source] std::io::Error),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResponseError for SubmitError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubmitError::Validation(_) | SubmitError::Multipart(_) => StatusCode::BAD_REQUEST,
            SubmitError::Upload(_) | SubmitError::Credentials(_) | SubmitError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(SubmitResponse::failure(self.to_string()))
    }
}

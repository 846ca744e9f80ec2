// Error types for the web server

use axum::{
    extract::multipart::MultipartError,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::conversion::ConversionError;
use crate::relay::RelayError;

/// HTTP-facing errors, rendered as plain text.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    UnsupportedMediaType(String),
    UnprocessableEntity(String),
    InternalServerError(String),
    BadGateway(String),
    GatewayTimeout(String),
    Multipart(MultipartError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            Self::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            // Keeps 413 for bodies cut off by the size limit
            Self::Multipart(err) => (err.status(), err.body_text()),
        };

        if status.is_server_error() {
            tracing::error!("{}: {}", status, error_message);
        } else {
            tracing::debug!("{}: {}", status, error_message);
        }

        (
            status,
            [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
            error_message,
        )
            .into_response()
    }
}

// Raw PUT transport mapping
impl From<ConversionError> for ApiError {
    fn from(error: ConversionError) -> Self {
        match error {
            ConversionError::NoFile | ConversionError::EmptyOrMissingLength => {
                Self::BadRequest(error.to_string())
            }
            ConversionError::UnsupportedExtension { allowed, .. } => Self::UnsupportedMediaType(
                format!("This file extension is not supported. Use extension: {}", allowed),
            ),
            ConversionError::DecodeFailed(_) => Self::UnprocessableEntity(error.to_string()),
            ConversionError::EncodeFailed { .. } => Self::InternalServerError(error.to_string()),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(error: RelayError) -> Self {
        let message = format!("Test failed. {}", error);
        match error {
            RelayError::UpstreamStatus(_) | RelayError::Transport { .. } => {
                Self::BadGateway(message)
            }
            RelayError::Timeout { .. } => Self::GatewayTimeout(message),
            RelayError::ReadSource { .. } => Self::BadRequest(message),
            RelayError::WriteOutput { .. } | RelayError::Client(_) => {
                Self::InternalServerError(message)
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

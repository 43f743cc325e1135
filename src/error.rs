use crate::models::ErrorBody;
use crate::provider::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request: body is not valid JSON ({0}).")]
    MalformedRequest(String),

    #[error("Invalid request: 'contents' field is missing.")]
    MissingField,

    #[error("Invalid request: 'contents' must contain at least one message.")]
    EmptyContents,

    /// The body could not be read at all, e.g. it exceeded the size limit.
    #[error("Invalid request: {message}")]
    UnreadableBody { status: StatusCode, message: String },

    #[error("Invalid conversation history: {0}")]
    InvalidHistory(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Provider did not respond within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MalformedRequest(_)
            | RelayError::MissingField
            | RelayError::EmptyContents => StatusCode::BAD_REQUEST,
            RelayError::UnreadableBody { status, .. } => *status,
            RelayError::InvalidHistory(_)
            | RelayError::Provider(_)
            | RelayError::Timeout(_)
            | RelayError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!("Error during chat processing: {}", message);
        } else {
            warn!("Rejected chat request: {}", message);
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

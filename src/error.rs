use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorBody;

#[derive(Error, Debug)]
pub enum ProxyError {
    /// Bad or missing caller input.
    #[error("{0}")]
    Validation(&'static str),

    #[error("API Key not found")]
    MissingApiKey,

    /// The catalog answered with a non-success status.
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: &'static str,
    },

    /// Transport or parse failure while talking to the catalog.
    #[error("{0}")]
    Internal(&'static str),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

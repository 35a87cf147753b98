use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Method not allowed: stateless MCP only supports POST")]
    MethodNotAllowed,
    #[error("Not acceptable: Accept header must include application/json")]
    NotAcceptable,
    #[error("{message}")]
    BadRequest { message: String },
    #[error("Failed to create server instance")]
    NoServerInstance,
    #[error("Server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NoServerInstance | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.to_string();

        match self {
            Self::MethodNotAllowed => {
                return (status, [(header::ALLOW, "POST")], body).into_response();
            }
            Self::NoServerInstance | Self::Internal { .. } => {
                tracing::error!(error = %body, "request failed with internal error");
            }
            Self::NotAcceptable | Self::BadRequest { .. } => {}
        }

        (status, body).into_response()
    }
}

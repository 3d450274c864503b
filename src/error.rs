use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// JSON body returned for every failed request
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            error: error.into(),
            code: code.map(str::to_string),
        }
    }
}

/// Errors that map onto an HTTP status and a stable machine-readable code
pub trait HttpError: std::error::Error {
    fn status_code(&self) -> StatusCode;

    /// e.g. "USER_NOT_FOUND"
    fn error_code(&self) -> Option<&'static str> {
        None
    }
}

/// Render any `HttpError` as a JSON `ErrorResponse`, logging 5xx at error level
pub fn into_response<E: HttpError>(err: E) -> Response {
    let status = err.status_code();
    let code = err.error_code();
    let message = err.to_string();

    if status.is_server_error() {
        tracing::error!(error = %message, status = %status, code = ?code, "Request failed");
    } else {
        tracing::warn!(error = %message, status = %status, code = ?code, "Request rejected");
    }

    (status, Json(ErrorResponse::new(message, code))).into_response()
}

/// Implement `IntoResponse` for an `HttpError` so handlers can return it directly
#[macro_export]
macro_rules! impl_into_response {
    ($error_type:ty) => {
        impl axum::response::IntoResponse for $error_type {
            fn into_response(self) -> axum::response::Response {
                $crate::error::into_response(self)
            }
        }
    };
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lut_manager_client::{ErrorKind, LutManagerError};
use serde::Serialize;

pub struct ApiError(LutManagerError);

impl<E: Into<LutManagerError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    error: String,
}

pub fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Wallet => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Transport => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = ErrorBody {
            status: kind.as_str(),
            error: self.0.to_string(),
        };
        (status_code(kind), Json(body)).into_response()
    }
}

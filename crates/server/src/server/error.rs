//! HTTP rendering of service errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::ServiceError;
use tracing::{debug, error};

use crate::error::AccessError;

/// A [`ServiceError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        // The cause is only logged here; the response carries a safe message.
        if err.is_internal() {
            error!(error = %err, cause = ?std::error::Error::source(&err), "request failed");
        } else {
            debug!(error = %err, "request rejected");
        }
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_response())).into_response()
    }
}

//! Error taxonomy shared by the server and the client.

use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::Forbidden`] → 403
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::Conflict`] → 409
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The request was malformed: empty field, unknown secret type, bad id.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing, invalid, or expired session token, or bad credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the resource belongs to another user.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No such user or secret.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate login or secret name.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code carried in [`ErrorResponse::code`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// The caller-safe message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::BadRequest(m)
            | ServiceError::Unauthorized(m)
            | ServiceError::Forbidden(m)
            | ServiceError::NotFound(m)
            | ServiceError::Conflict(m)
            | ServiceError::Internal(m) => m,
        }
    }

    /// Build the JSON body sent alongside [`ServiceError::http_status`].
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.code(), self.message())
    }

    /// Rebuild an error from a non-2xx status and the message the server sent.
    ///
    /// Unknown statuses fold into [`ServiceError::Internal`].
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ServiceError::BadRequest(message),
            401 => ServiceError::Unauthorized(message),
            403 => ServiceError::Forbidden(message),
            404 => ServiceError::NotFound(message),
            409 => ServiceError::Conflict(message),
            _ => ServiceError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::BadRequest("x".into()).http_status(), 400);
        assert_eq!(ServiceError::Unauthorized("x".into()).http_status(), 401);
        assert_eq!(ServiceError::Forbidden("x".into()).http_status(), 403);
        assert_eq!(ServiceError::NotFound("x".into()).http_status(), 404);
        assert_eq!(ServiceError::Conflict("x".into()).http_status(), 409);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn display_includes_message() {
        let e = ServiceError::Conflict("secret name already taken".into());
        assert!(e.to_string().contains("secret name already taken"));
    }

    #[test]
    fn from_status_inverts_http_status() {
        for err in [
            ServiceError::BadRequest("m".into()),
            ServiceError::Unauthorized("m".into()),
            ServiceError::Forbidden("m".into()),
            ServiceError::NotFound("m".into()),
            ServiceError::Conflict("m".into()),
            ServiceError::Internal("m".into()),
        ] {
            assert_eq!(ServiceError::from_status(err.http_status(), "m"), err);
        }
    }

    #[test]
    fn unknown_status_is_internal() {
        assert_eq!(
            ServiceError::from_status(502, "bad gateway"),
            ServiceError::Internal("bad gateway".into())
        );
    }

    #[test]
    fn to_response_uses_code_and_bare_message() {
        let body = ServiceError::Forbidden("not your secret".into()).to_response();
        assert_eq!(body.code, "forbidden");
        assert_eq!(body.message, "not your secret");
    }
}

//! HTTP boundary error mapping.
//!
//! Each domain kind maps to one fixed status code. Internal causes are never
//! echoed to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sentra_auth::AuthError;
use serde_json::json;

pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AuthError::InvalidEmailOrPassword
            | AuthError::InvalidLoginOrPassword
            | AuthError::Unauthorized
            | AuthError::RefreshTokenInvalid
            | AuthError::ResetPasswordFailed
            | AuthError::EmailVerificationFailed => StatusCode::UNAUTHORIZED,

            AuthError::TokenNotFound
            | AuthError::ResetPasswordInvalidEmail
            | AuthError::UserNotFound => StatusCode::NOT_FOUND,

            AuthError::MfaNotEnabled
            | AuthError::MfaAlreadyEnabled
            | AuthError::InvalidMfaCode
            | AuthError::EmailTaken
            | AuthError::UsernameTaken
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,

            AuthError::MfaDisableFailed
            | AuthError::Store(_)
            | AuthError::Crypto(_)
            | AuthError::Jwt(_)
            | AuthError::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            AuthError::Unknown.to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentra_core::StoreError;

    #[test]
    fn domain_kinds_map_to_fixed_statuses() {
        assert_eq!(
            ApiError(AuthError::InvalidEmailOrPassword).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(AuthError::TokenNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(AuthError::MfaAlreadyEnabled).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(AuthError::MfaDisableFailed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_causes_are_server_errors() {
        let err = ApiError(AuthError::Store(StoreError::Backend("down".into())));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};

/// Every failure the service can report to a client.
///
/// The first block is the token/authorization taxonomy; each variant maps to
/// exactly one HTTP status and one stable `api_code` through
/// [`AppError::descriptor`]. Clients branch on `api_code`, never on `message`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing Authorization header")]
    MissingCredential,
    #[error("Malformed Authorization header")]
    MalformedCredential,
    #[error("Wrong type of Authorization header")]
    UnsupportedScheme,
    #[error("Malformed JWT: {0}")]
    MalformedToken(String),
    #[error("Expired JWT")]
    ExpiredToken,
    #[error("JWT not valid yet")]
    NotYetValidToken,
    #[error("Unauthorized")]
    InvalidSignature,
    #[error("Wrong audience in JWT")]
    WrongAudience,
    #[error("User not allowed to reach this endpoint")]
    RoleNotPermitted,
    #[error("Email not confirmed")]
    EmailNotConfirmed,
    #[error("{0}")]
    RefreshBindingMismatch(String),
    #[error("{0}")]
    WrongTokenType(String),
    #[error("Signing keys unavailable: {0}")]
    SigningKeyUnavailable(String),

    #[error("Couldn't generate JWT: {0}")]
    Signing(String),
    #[error("Wrong credentials")]
    InvalidCredentials,
    #[error("Token doesn't belong to user")]
    TokenUserMismatch,
    #[error("{0}")]
    ResourceForbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Missing or invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not implemented: {0}")]
    NotImplemented(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Email error: {0}")]
    Email(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Transport-level description of an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub status: StatusCode,
    pub api_code: &'static str,
    pub error_type: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    pub api_code: String,
    pub error_type: String,
}

impl AppError {
    pub fn descriptor(&self) -> ErrorDescriptor {
        let (status, api_code, error_type) = match self {
            AppError::MissingCredential => (StatusCode::UNAUTHORIZED, "0100", "missing_credential"),
            AppError::MalformedCredential => (StatusCode::UNAUTHORIZED, "0101", "malformed_credential"),
            AppError::UnsupportedScheme => (StatusCode::UNAUTHORIZED, "0105", "unsupported_scheme"),
            AppError::MalformedToken(_) => (StatusCode::UNAUTHORIZED, "0102", "malformed_token"),
            AppError::ExpiredToken => (StatusCode::UNAUTHORIZED, "0103", "expired_token"),
            AppError::NotYetValidToken => (StatusCode::UNAUTHORIZED, "0104", "token_not_active"),
            AppError::InvalidSignature => (StatusCode::UNAUTHORIZED, "0109", "invalid_signature"),
            AppError::WrongAudience => (StatusCode::UNAUTHORIZED, "0106", "wrong_audience"),
            AppError::RoleNotPermitted => (StatusCode::FORBIDDEN, "0110", "role_not_permitted"),
            AppError::EmailNotConfirmed => (StatusCode::FORBIDDEN, "0111", "email_not_confirmed"),
            AppError::RefreshBindingMismatch(_) => (StatusCode::UNAUTHORIZED, "0107", "refresh_binding_mismatch"),
            AppError::WrongTokenType(_) => (StatusCode::UNAUTHORIZED, "0108", "wrong_token_type"),
            AppError::SigningKeyUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "0005", "signing_key_unavailable"),
            AppError::Signing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "0002", "jwt_error"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "0113", "invalid_credentials"),
            AppError::TokenUserMismatch => (StatusCode::FORBIDDEN, "0112", "token_user_mismatch"),
            AppError::ResourceForbidden(_) => (StatusCode::FORBIDDEN, "0114", "resource_forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "0301", "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "0204", "bad_request"),
            AppError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "0205", "invalid_parameter"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "0201", "validation_error"),
            AppError::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "0006", "not_implemented"),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "0007", "configuration_error"),
            AppError::Email(_) => (StatusCode::INTERNAL_SERVER_ERROR, "0004", "email_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "0001", "internal_error"),
        };
        ErrorDescriptor { status, api_code, error_type }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let descriptor = self.descriptor();

        let error_response = ErrorResponse {
            status: descriptor.status.as_u16(),
            message: self.to_string(),
            api_code: descriptor.api_code.to_string(),
            error_type: descriptor.error_type.to_string(),
        };

        HttpResponse::build(descriptor.status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.descriptor().status
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", error))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use pretty_assertions::assert_eq;

    #[test]
    fn auth_failures_that_require_new_login_are_401() {
        for err in [
            AppError::MissingCredential,
            AppError::MalformedCredential,
            AppError::UnsupportedScheme,
            AppError::ExpiredToken,
            AppError::NotYetValidToken,
            AppError::InvalidSignature,
            AppError::WrongAudience,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{:?}", err);
        }
    }

    #[test]
    fn forbidden_kinds_have_distinct_codes() {
        let role = AppError::RoleNotPermitted.descriptor();
        let email = AppError::EmailNotConfirmed.descriptor();
        assert_eq!(role.status, StatusCode::FORBIDDEN);
        assert_eq!(email.status, StatusCode::FORBIDDEN);
        assert_eq!(role.api_code, "0110");
        assert_eq!(email.api_code, "0111");
    }

    #[test]
    fn expired_and_not_active_are_distinguishable() {
        assert_eq!(AppError::ExpiredToken.descriptor().api_code, "0103");
        assert_eq!(AppError::NotYetValidToken.descriptor().api_code, "0104");
        assert_eq!(AppError::MalformedToken(String::new()).descriptor().api_code, "0102");
    }

    #[test]
    fn every_kind_has_its_own_api_code() {
        let kinds = [
            AppError::MissingCredential,
            AppError::MalformedCredential,
            AppError::UnsupportedScheme,
            AppError::MalformedToken(String::new()),
            AppError::ExpiredToken,
            AppError::NotYetValidToken,
            AppError::InvalidSignature,
            AppError::WrongAudience,
            AppError::RoleNotPermitted,
            AppError::EmailNotConfirmed,
            AppError::RefreshBindingMismatch(String::new()),
            AppError::WrongTokenType(String::new()),
            AppError::SigningKeyUnavailable(String::new()),
            AppError::Signing(String::new()),
            AppError::InvalidCredentials,
            AppError::TokenUserMismatch,
            AppError::ResourceForbidden(String::new()),
            AppError::NotFound(String::new()),
            AppError::BadRequest(String::new()),
            AppError::InvalidParameter(String::new()),
            AppError::Validation(String::new()),
            AppError::NotImplemented(String::new()),
            AppError::Configuration(String::new()),
            AppError::Email(String::new()),
            AppError::Internal(String::new()),
        ];

        let mut codes: Vec<&str> = kinds.iter().map(|kind| kind.descriptor().api_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());

        let mut types: Vec<&str> = kinds.iter().map(|kind| kind.descriptor().error_type).collect();
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), kinds.len());
    }

    #[actix_web::test]
    async fn error_response_body_carries_api_code() {
        let response = AppError::EmailNotConfirmed.error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.status, 403);
        assert_eq!(parsed.api_code, "0111");
        assert_eq!(parsed.error_type, "email_not_confirmed");
        assert_eq!(parsed.message, "Email not confirmed");
    }
}

use chrono::Utc;
use log::{debug, error};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::auth_jwt_claims::{Claims, Role, TokenType};
use crate::services::auth::token_service::TokenService;

/// Query parameter carrying the confirmation token.
pub const CONFIRM_TOKEN_PARAM: &str = "t";

impl TokenService {
    /// Claims for an email confirmation link. They carry no `exp`, so the link
    /// stays usable until the account is confirmed.
    pub fn issue_confirmation_claims(&self, user_id: &str) -> Claims {
        let now = Utc::now().timestamp();
        let mut claims = Claims::new(self.audience(), TokenType::Confirm, Role::User, user_id);
        claims.issued_at = now;
        claims.not_before = now;
        claims.expires_at = None;
        claims.email_confirmed = false;
        claims.subject = format!("/users/{}/confirm", user_id);
        claims
    }

    pub fn issue_confirmation_token(&self, user_id: &str) -> AppResult<String> {
        let claims = self.issue_confirmation_claims(user_id);
        debug!("Issuing confirmation token {} for user {}", claims.id, user_id);
        self.keys().sign(&claims)
    }

    /// Verify a confirmation token presented for `expected_user_id`.
    pub fn verify_confirmation_token(&self, token: &str, expected_user_id: &str) -> AppResult<Claims> {
        let claims = self.keys().verify(token)?;

        if claims.audience != self.audience() {
            return Err(AppError::WrongAudience);
        }
        match claims.token_type {
            TokenType::Confirm => {}
            TokenType::Access | TokenType::Refresh => {
                return Err(AppError::WrongTokenType("This is not a confirm token".to_string()));
            }
        }
        if claims.user_id != expected_user_id {
            return Err(AppError::TokenUserMismatch);
        }

        Ok(claims)
    }
}

/// `{base_url}/users/{user_id}/confirm?t={token}`
pub fn confirmation_url(base_url: &str, user_id: &str, token: &str) -> AppResult<String> {
    let mut url = Url::parse(base_url).map_err(|e| {
        error!("Invalid API base URL '{}': {}", base_url, e);
        AppError::Internal("Couldn't build confirmation link".to_string())
    })?;

    url.path_segments_mut()
        .map_err(|_| AppError::Internal("API base URL cannot have a path".to_string()))?
        .pop_if_empty()
        .extend(["users", user_id, "confirm"]);
    url.query_pairs_mut().append_pair(CONFIRM_TOKEN_PARAM, token);

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::jwt::test_keys;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn service() -> TokenService {
        TokenService::new(Arc::new(test_keys::keys()), "chocolate")
    }

    #[test]
    fn confirmation_claims_never_expire() {
        let claims = service().issue_confirmation_claims("u9");
        assert_eq!(claims.token_type, TokenType::Confirm);
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.expires_at, None);
        assert_eq!(claims.subject, "/users/u9/confirm");
        assert!(!claims.email_confirmed);
    }

    #[test]
    fn confirmation_token_round_trips_for_its_user() {
        let svc = service();
        let token = svc.issue_confirmation_token("u9").unwrap();
        let claims = svc.verify_confirmation_token(&token, "u9").unwrap();
        assert_eq!(claims.user_id, "u9");
    }

    #[test]
    fn confirmation_token_for_other_user_is_rejected() {
        let svc = service();
        let token = svc.issue_confirmation_token("u9").unwrap();
        assert!(matches!(
            svc.verify_confirmation_token(&token, "u10"),
            Err(AppError::TokenUserMismatch)
        ));
    }

    #[test]
    fn access_token_cannot_confirm() {
        let svc = service();
        let pair = svc.issue_login_pair(Role::User, "u9", false, false).unwrap();
        assert!(matches!(
            svc.verify_confirmation_token(&pair.access_token, "u9"),
            Err(AppError::WrongTokenType(_))
        ));
    }

    #[test]
    fn confirmation_url_appends_path_and_token() {
        let url = confirmation_url("http://localhost:8080/v1", "u9", "a.b.c").unwrap();
        assert_eq!(url, "http://localhost:8080/v1/users/u9/confirm?t=a.b.c");

        let trailing = confirmation_url("http://localhost:8080/v1/", "u9", "a.b.c").unwrap();
        assert_eq!(trailing, url);
    }

    #[test]
    fn confirmation_url_rejects_bad_base() {
        assert!(confirmation_url("not a url", "u9", "tok").is_err());
    }
}

use log::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::auth::TokenPair;
use crate::models::auth_jwt_claims::{Claims, TokenType};
use crate::services::auth::token_service::TokenService;

/// Check that `refresh` was issued together with `access`.
pub fn validate_refresh_binding(access: &Claims, refresh: &Claims) -> AppResult<()> {
    match access.token_type {
        TokenType::Access => {}
        TokenType::Refresh | TokenType::Confirm => {
            return Err(AppError::WrongTokenType("This is not an access token".to_string()));
        }
    }
    match refresh.token_type {
        TokenType::Refresh => {}
        TokenType::Access | TokenType::Confirm => {
            return Err(AppError::WrongTokenType("This is not a refresh token".to_string()));
        }
    }

    if refresh.subject != access.id {
        return Err(AppError::RefreshBindingMismatch(
            "Refresh token doesn't match access token".to_string(),
        ));
    }
    if refresh.user_id != access.user_id {
        return Err(AppError::RefreshBindingMismatch(
            "Refresh token user ID doesn't match access token".to_string(),
        ));
    }

    Ok(())
}

impl TokenService {
    /// Verify `refresh_token` against the claims of the access token it must be
    /// paired with.
    pub fn verify_refresh(&self, access_claims: &Claims, refresh_token: &str) -> AppResult<Claims> {
        let refresh_claims = self.keys().verify(refresh_token)?;

        if refresh_claims.audience != self.audience() {
            return Err(AppError::WrongAudience);
        }

        validate_refresh_binding(access_claims, &refresh_claims).inspect_err(|e| {
            warn!("Refresh rejected for user {}: {}", access_claims.user_id, e);
        })?;

        Ok(refresh_claims)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The new refresh token keeps the lifetime of the one presented, so a
    /// "remember me" session stays 30 days across refresh cycles.
    pub fn refresh(&self, access_claims: &Claims, refresh_token: &str) -> AppResult<TokenPair> {
        let refresh_claims = self.verify_refresh(access_claims, refresh_token)?;

        let lifetime = refresh_claims
            .lifetime()
            .ok_or_else(|| AppError::MalformedToken("refresh token without exp".to_string()))?;

        debug!(
            "Refreshing tokens for user {} with lifetime {}s",
            access_claims.user_id,
            lifetime.num_seconds()
        );

        self.issue_pair(
            access_claims.role,
            &access_claims.user_id,
            access_claims.email_confirmed,
            lifetime,
        )
    }
}

//! Issuance policy for access, refresh and confirmation tokens.
//!
//! Tokens are self-contained: the service keeps no record of what it issued.
//! A refresh token is tied to its access token only through its `sub`, which
//! holds the access token's `jti`.

use chrono::{Duration, Utc};
use log::debug;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::auth::TokenPair;
use crate::models::auth_jwt_claims::{Claims, Role, TokenType};
use crate::services::auth::jwt::JwtKeys;

/// Lifetime of every access token.
pub const ACCESS_TOKEN_LIFETIME_DAYS: i64 = 7;
/// Refresh lifetime when the user asked to be remembered at login.
pub const REMEMBERED_REFRESH_LIFETIME_DAYS: i64 = 30;
/// Refresh lifetime otherwise.
pub const DEFAULT_REFRESH_LIFETIME_DAYS: i64 = 8;

/// Refresh lifetime chosen from the login-time "remember" flag.
pub fn refresh_lifetime(remember: bool) -> Duration {
    if remember {
        Duration::days(REMEMBERED_REFRESH_LIFETIME_DAYS)
    } else {
        Duration::days(DEFAULT_REFRESH_LIFETIME_DAYS)
    }
}

/// Builds and signs tokens for the configured audience.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: Arc<JwtKeys>,
    audience: String,
}

impl TokenService {
    pub fn new(keys: Arc<JwtKeys>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            audience: audience.into(),
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issue_access_claims(&self, role: Role, user_id: &str, email_confirmed: bool) -> Claims {
        self.issue_access_claims_at(Utc::now().timestamp(), role, user_id, email_confirmed)
    }

    pub fn issue_access_claims_at(
        &self,
        now: i64,
        role: Role,
        user_id: &str,
        email_confirmed: bool,
    ) -> Claims {
        let mut claims = Claims::new(&self.audience, TokenType::Access, role, user_id);
        claims.issued_at = now;
        claims.not_before = now;
        claims.expires_at = Some(now + Duration::days(ACCESS_TOKEN_LIFETIME_DAYS).num_seconds());
        claims.email_confirmed = email_confirmed;
        claims.subject = format!("/{}s/{}", role, user_id);
        claims
    }

    pub fn issue_refresh_claims(&self, access_claims: &Claims, lifetime: Duration) -> Claims {
        self.issue_refresh_claims_at(Utc::now().timestamp(), access_claims, lifetime)
    }

    pub fn issue_refresh_claims_at(&self, now: i64, access_claims: &Claims, lifetime: Duration) -> Claims {
        let mut claims = Claims::new(
            &self.audience,
            TokenType::Refresh,
            access_claims.role,
            access_claims.user_id.clone(),
        );
        claims.issued_at = now;
        claims.not_before = now;
        claims.expires_at = Some(now + lifetime.num_seconds());
        // The subject binds this refresh token to its access token
        claims.subject = access_claims.id.clone();
        claims
    }

    /// Sign a fresh access token and a refresh token bound to it.
    ///
    /// Either both tokens are returned or neither is.
    pub fn issue_pair(
        &self,
        role: Role,
        user_id: &str,
        email_confirmed: bool,
        refresh_lifetime: Duration,
    ) -> AppResult<TokenPair> {
        if refresh_lifetime <= Duration::zero() {
            return Err(AppError::Internal(format!(
                "refresh lifetime must be positive, got {}s",
                refresh_lifetime.num_seconds()
            )));
        }

        let access_claims = self.issue_access_claims(role, user_id, email_confirmed);
        let access_token = self.keys.sign(&access_claims)?;

        let refresh_claims = self.issue_refresh_claims(&access_claims, refresh_lifetime);
        let refresh_token = self.keys.sign(&refresh_claims)?;

        debug!(
            "Issued token pair for {} {} (access jti {}, refresh lifetime {}s)",
            role,
            user_id,
            access_claims.id,
            refresh_lifetime.num_seconds()
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Token pair for a credential login; `remember` picks the refresh lifetime.
    pub fn issue_login_pair(
        &self,
        role: Role,
        user_id: &str,
        email_confirmed: bool,
        remember: bool,
    ) -> AppResult<TokenPair> {
        self.issue_pair(role, user_id, email_confirmed, refresh_lifetime(remember))
    }
}

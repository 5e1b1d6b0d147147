use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Authorization role carried in the `rol` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Business,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Business, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Business => "business",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose discriminator carried in the `ttp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
    #[serde(rename = "confirm_token")]
    Confirm,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Access => "access_token",
            TokenType::Refresh => "refresh_token",
            TokenType::Confirm => "confirm_token",
        };
        f.write_str(name)
    }
}

/// Presentation scheme carried in the `ath` claim. Only bearer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthScheme {
    #[default]
    #[serde(rename = "bearer")]
    Bearer,
}

/// Why a decoded claims set was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsValidationError {
    #[error("token expired")]
    Expired,
    #[error("token not valid yet")]
    NotYetValid,
    #[error("missing {0} claim")]
    Malformed(&'static str),
}

/// JWT claims for every token this service signs.
///
/// Standard claims keep their registered names on the wire; the service
/// specific ones use short names (`uid`, `eok`, `rol`, `ttp`, `ath`).
/// A value is built fresh for each issuance and never mutated after signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID, unique per token
    #[serde(rename = "jti")]
    pub id: String,
    /// Token-kind specific target; for refresh tokens the paired access token id
    #[serde(rename = "sub", default)]
    pub subject: String,
    #[serde(rename = "iss")]
    pub issuer: String,
    #[serde(rename = "aud")]
    pub audience: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "nbf")]
    pub not_before: i64,
    /// Absent for confirmation tokens, which never expire
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(rename = "uid", default)]
    pub user_id: String,
    #[serde(rename = "eok", default)]
    pub email_confirmed: bool,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "ttp")]
    pub token_type: TokenType,
    #[serde(rename = "ath", default)]
    pub auth_scheme: AuthScheme,
}

impl Claims {
    /// Fresh claims with a new `jti`, issuer and audience set to `audience`,
    /// and the bearer scheme. Timing and subject are left for the caller.
    pub fn new(audience: &str, token_type: TokenType, role: Role, user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            subject: String::new(),
            issuer: audience.to_string(),
            audience: audience.to_string(),
            issued_at: 0,
            not_before: 0,
            expires_at: None,
            user_id: user_id.into(),
            email_confirmed: false,
            role,
            token_type,
            auth_scheme: AuthScheme::Bearer,
        }
    }

    /// Checks the validity window against the current time, then the
    /// required service claims.
    pub fn validate(&self) -> Result<(), ClaimsValidationError> {
        self.validate_at(Utc::now().timestamp())
    }

    pub fn validate_at(&self, now: i64) -> Result<(), ClaimsValidationError> {
        self.check(now, true)
    }

    /// Same as [`Claims::validate_at`] without the `exp` check.
    pub fn validate_ignoring_expiry_at(&self, now: i64) -> Result<(), ClaimsValidationError> {
        self.check(now, false)
    }

    fn check(&self, now: i64, enforce_expiry: bool) -> Result<(), ClaimsValidationError> {
        if enforce_expiry {
            if let Some(exp) = self.expires_at {
                if now > exp {
                    return Err(ClaimsValidationError::Expired);
                }
            }
        }
        if now < self.issued_at || now < self.not_before {
            return Err(ClaimsValidationError::NotYetValid);
        }

        if self.user_id.trim().is_empty() {
            return Err(ClaimsValidationError::Malformed("uid"));
        }

        Ok(())
    }

    /// Length of the validity window, `exp - iat`. `None` for tokens
    /// without expiry.
    pub fn lifetime(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| Duration::seconds(exp - self.issued_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(now: i64) -> Claims {
        let mut claims = Claims::new("chocolate", TokenType::Access, Role::User, "u1");
        claims.issued_at = now;
        claims.not_before = now;
        claims.expires_at = Some(now + 60);
        claims.subject = "/users/u1".to_string();
        claims
    }

    #[test]
    fn new_claims_get_unique_ids_and_bearer_scheme() {
        let a = Claims::new("aud", TokenType::Access, Role::Admin, "u1");
        let b = Claims::new("aud", TokenType::Access, Role::Admin, "u1");
        assert_ne!(a.id, b.id);
        assert_eq!(a.issuer, "aud");
        assert_eq!(a.audience, "aud");
        assert_eq!(a.auth_scheme, AuthScheme::Bearer);
    }

    #[test]
    fn wire_names_match_the_token_format() {
        let claims = sample(1_000);
        let value = serde_json::to_value(&claims).unwrap();
        for key in ["sub", "iss", "aud", "exp", "iat", "nbf", "jti", "uid", "eok", "rol", "ttp", "ath"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["rol"], "user");
        assert_eq!(value["ttp"], "access_token");
        assert_eq!(value["ath"], "bearer");
    }

    #[test]
    fn exp_is_omitted_when_absent() {
        let mut claims = sample(1_000);
        claims.expires_at = None;
        let value = serde_json::to_value(&claims).unwrap();
        assert!(value.get("exp").is_none());
        assert_eq!(claims.lifetime(), None);
    }

    #[test]
    fn unknown_role_fails_to_decode() {
        let mut value = serde_json::to_value(sample(1_000)).unwrap();
        value["rol"] = serde_json::json!("root");
        assert!(serde_json::from_value::<Claims>(value).is_err());
    }

    #[test]
    fn validity_window_is_enforced() {
        let claims = sample(1_000);
        assert_eq!(claims.validate_at(1_000), Ok(()));
        assert_eq!(claims.validate_at(1_060), Ok(()));
        assert_eq!(claims.validate_at(1_061), Err(ClaimsValidationError::Expired));
        assert_eq!(claims.validate_at(999), Err(ClaimsValidationError::NotYetValid));
        assert_eq!(claims.validate_ignoring_expiry_at(5_000), Ok(()));
    }

    #[test]
    fn missing_user_id_is_malformed_even_inside_window() {
        let mut claims = sample(1_000);
        claims.user_id = String::new();
        assert_eq!(claims.validate_at(1_010), Err(ClaimsValidationError::Malformed("uid")));
    }

    #[test]
    fn tokens_without_exp_never_expire() {
        let mut claims = sample(1_000);
        claims.expires_at = None;
        assert_eq!(claims.validate_at(i64::MAX), Ok(()));
        assert_eq!(claims.validate(), Ok(()));
    }

    #[test]
    fn lifetime_is_exp_minus_iat() {
        let claims = sample(1_000);
        assert_eq!(claims.lifetime(), Some(Duration::seconds(60)));
    }
}

//! Per-request authorization decision.
//!
//! `authorize` runs the gate in a fixed order and stops at the first
//! rejection: extract bearer credential, verify signature and validity
//! window, check audience, token type, role and finally email confirmation.
//! Handlers declare their requirements with the [`Authorized`] extractor and
//! receive the verified claims as an ordinary parameter.

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use log::{debug, warn};
use std::marker::PhantomData;

use crate::error::{AppError, AppResult};
use crate::models::auth_jwt_claims::{Claims, Role, TokenType};
use crate::models::runtime_config::AppState;
use crate::services::auth::TokenService;

/// Scheme expected in the `Authorization` header, compared case-insensitively.
pub const BEARER_SCHEME: &str = "bearer";

/// Roles admitted by an operation and whether it needs a confirmed email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRule {
    pub roles: &'static [Role],
    pub require_confirmed_email: bool,
}

impl AccessRule {
    pub const fn new(roles: &'static [Role], require_confirmed_email: bool) -> Self {
        Self {
            roles,
            require_confirmed_email,
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer_token(header: Option<&str>) -> AppResult<&str> {
    let header = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AppError::MissingCredential),
    };

    let items: Vec<&str> = header.split(' ').collect();
    if !items[0].eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AppError::UnsupportedScheme);
    }
    // Bearer must be followed by exactly one token
    match items.as_slice() {
        [_, token] if !token.is_empty() => Ok(*token),
        _ => Err(AppError::MalformedCredential),
    }
}

/// Audience, token type, role and email checks on already verified claims.
pub fn check_claims(claims: &Claims, audience: &str, rule: &AccessRule) -> AppResult<()> {
    if claims.audience != audience {
        return Err(AppError::WrongAudience);
    }

    match claims.token_type {
        TokenType::Access => {}
        TokenType::Refresh | TokenType::Confirm => {
            return Err(AppError::WrongTokenType(format!(
                "{} cannot be used as an access token",
                claims.token_type
            )));
        }
    }

    if !rule.permits(claims.role) {
        return Err(AppError::RoleNotPermitted);
    }

    match claims.role {
        Role::Admin => {}
        Role::User | Role::Business => {
            if rule.require_confirmed_email && !claims.email_confirmed {
                return Err(AppError::EmailNotConfirmed);
            }
        }
    }

    Ok(())
}

/// Run the full gate on a raw `Authorization` header value.
pub fn authorize(tokens: &TokenService, authorization: Option<&str>, rule: &AccessRule) -> AppResult<Claims> {
    let token = extract_bearer_token(authorization)?;
    let claims = tokens.keys().verify(token)?;
    check_claims(&claims, tokens.audience(), rule)?;
    Ok(claims)
}

/// Gate for the refresh endpoint: the access token may have expired, but it
/// must still be a correctly signed access token for this audience.
pub fn authorize_refresh(tokens: &TokenService, authorization: Option<&str>) -> AppResult<Claims> {
    let token = extract_bearer_token(authorization)?;
    let claims = tokens.keys().verify_allowing_expiry(token)?;
    check_claims(&claims, tokens.audience(), &AnyRole::RULE)?;
    Ok(claims)
}

fn authorization_header(req: &HttpRequest) -> AppResult<Option<&str>> {
    req.headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AppError::MalformedCredential))
        .transpose()
}

fn token_service(req: &HttpRequest) -> AppResult<&TokenService> {
    req.app_data::<web::Data<AppState>>()
        .map(|state| state.tokens.as_ref())
        .ok_or_else(|| AppError::Internal("Application state not configured".to_string()))
}

/// Authorize an actix request against `rule`.
pub fn authorize_request(req: &HttpRequest, rule: &AccessRule) -> AppResult<Claims> {
    let result = token_service(req)
        .and_then(|tokens| authorize(tokens, authorization_header(req)?, rule));

    match &result {
        Ok(claims) => debug!(
            "Admitted {} {} on {} {}",
            claims.role,
            claims.user_id,
            req.method(),
            req.path()
        ),
        Err(e) => warn!("Rejected {} {}: {}", req.method(), req.path(), e),
    }
    result
}

/// Static access requirements of a route.
pub trait AccessPolicy {
    const RULE: AccessRule;
}

/// Any role, email confirmation not required.
pub struct AnyRole;

impl AccessPolicy for AnyRole {
    const RULE: AccessRule = AccessRule::new(&Role::ALL, false);
}

/// Users and admins; users must have confirmed their email.
pub struct ConfirmedUserOrAdmin;

impl AccessPolicy for ConfirmedUserOrAdmin {
    const RULE: AccessRule = AccessRule::new(&[Role::User, Role::Admin], true);
}

/// Admins only.
pub struct AdminOnly;

impl AccessPolicy for AdminOnly {
    const RULE: AccessRule = AccessRule::new(&[Role::Admin], false);
}

/// Claims of a request that passed the gate for policy `P`.
pub struct Authorized<P: AccessPolicy> {
    pub claims: Claims,
    _policy: PhantomData<P>,
}

impl<P: AccessPolicy> Authorized<P> {
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

impl<P: AccessPolicy> FromRequest for Authorized<P> {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authorize_request(req, &P::RULE).map(|claims| Authorized {
            claims,
            _policy: PhantomData,
        }))
    }
}

/// Claims of the (possibly expired) access token presented to the refresh
/// endpoint.
#[derive(Debug, Clone)]
pub struct PresentedAccessToken(pub Claims);

impl FromRequest for PresentedAccessToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = token_service(req)
            .and_then(|tokens| authorize_refresh(tokens, authorization_header(req)?))
            .map(PresentedAccessToken)
            .inspect_err(|e| warn!("Rejected refresh on {}: {}", req.path(), e));
        ready(result)
    }
}

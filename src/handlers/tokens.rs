use actix_web::{HttpResponse, web};
use log::{info, warn};

use crate::error::AppError;
use crate::middleware::authorization::PresentedAccessToken;
use crate::models::auth::{LoginRequest, RefreshRequest, UserType};
use crate::models::auth_jwt_claims::Role;
use crate::models::runtime_config::AppState;
use crate::security::password::verify_password;

/// Exchange username and password for an access/refresh token pair
pub async fn generate_tokens(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let request = payload.into_inner();

    match request.validate()? {
        UserType::Client => {}
        UserType::Business | UserType::Admin => {
            return Err(AppError::NotImplemented(format!(
                "Login for user_type '{}' is not available",
                request.user_type
            )));
        }
    }

    let user = state.user_store.lookup_by_username(&request.username)?;

    // Argon2 runs on the blocking pool
    let password = request.password;
    let salt = user.salt.clone();
    let hash = user.password_hash.clone();
    let matches = web::block(move || verify_password(&password, &salt, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password check failed: {}", e)))?;

    if !matches {
        warn!("Wrong password for user {}", user.id);
        return Err(AppError::InvalidCredentials);
    }

    let pair = state
        .tokens
        .issue_login_pair(Role::User, &user.id, user.confirmed, request.remember)?;

    info!("Issued tokens for user {} (remember: {})", user.id, request.remember);
    Ok(HttpResponse::Created().json(pair))
}

/// Trade a refresh token for a new pair. The caller's access token may have
/// expired but must be the one the refresh token was issued with.
pub async fn refresh_tokens(
    state: web::Data<AppState>,
    access: PresentedAccessToken,
    payload: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let request = payload.into_inner();
    request.validate()?;

    let PresentedAccessToken(access_claims) = access;
    let pair = state.tokens.refresh(&access_claims, &request.refresh_token)?;

    info!("Refreshed tokens for user {}", access_claims.user_id);
    Ok(HttpResponse::Created().json(pair))
}

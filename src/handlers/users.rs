use actix_web::{HttpResponse, web};
use chrono::Utc;
use log::{debug, error, info};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::authorization::{AdminOnly, Authorized, ConfirmedUserOrAdmin};
use crate::models::auth_jwt_claims::{Claims, Role};
use crate::models::runtime_config::AppState;
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserRecord, UserResponse};
use crate::security::password::hash_password;
use crate::services::auth::confirmation_url;

/// Path alias for the authenticated caller.
pub const SELF_ALIAS: &str = "this";

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub t: Option<String>,
}

/// Resolve the `{user_id}` path segment for `claims`. Plain users may only
/// address their own account.
fn target_user_id(claims: &Claims, requested: &str) -> Result<String, AppError> {
    let user_id = match requested {
        "" => return Err(AppError::InvalidParameter("user_id".to_string())),
        SELF_ALIAS => claims.user_id.clone(),
        other => other.to_string(),
    };

    match claims.role {
        Role::Admin => {}
        Role::User | Role::Business => {
            if user_id != claims.user_id {
                return Err(AppError::ResourceForbidden(
                    "You can't access this resource".to_string(),
                ));
            }
        }
    }
    Ok(user_id)
}

/// Register a user and mail them a confirmation link
pub async fn create_user(
    state: web::Data<AppState>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let request = payload.into_inner();
    request.validate()?;

    let password = request.password;
    let hashed = web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))??;

    let user = state.user_store.insert(UserRecord {
        id: Uuid::new_v4().to_string(),
        username: request.username,
        password_hash: hashed.hash,
        salt: hashed.salt,
        confirmed: false,
        confirmed_at: None,
        created_at: Utc::now().timestamp(),
    })?;

    let token = state.tokens.issue_confirmation_token(&user.id)?;
    let link = confirmation_url(&state.settings.server.api_base_url(), &user.id, &token)?;

    // Roll back the account when its link cannot be delivered
    if let Err(e) = state.mailer.send_confirmation(&user.username, &link) {
        error!("Confirmation email for user {} failed: {}", user.id, e);
        state.user_store.delete(&user.id)?;
        return Err(e.into());
    }

    info!("Created user {}", user.id);
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// List every user (admins only)
pub async fn list_users(
    state: web::Data<AppState>,
    caller: Authorized<AdminOnly>,
) -> Result<HttpResponse, AppError> {
    let users: Vec<UserResponse> = state
        .user_store
        .list()?
        .iter()
        .map(UserResponse::from)
        .collect();

    debug!("Listed {} users for {}", users.len(), caller.claims.user_id);
    Ok(HttpResponse::Ok().json(users))
}

/// Fetch a user. Plain users may only read their own account.
pub async fn get_user(
    state: web::Data<AppState>,
    caller: Authorized<ConfirmedUserOrAdmin>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let claims = caller.into_claims();
    let user_id = target_user_id(&claims, &path.into_inner())?;

    let user = state.user_store.get_by_id(&user_id)?;
    debug!("User {} read by {}", user.id, claims.user_id);
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Change a user's password.
pub async fn update_user(
    state: web::Data<AppState>,
    caller: Authorized<ConfirmedUserOrAdmin>,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = caller.into_claims();
    let user_id = target_user_id(&claims, &path.into_inner())?;

    let request = payload.into_inner();
    request.validate()?;

    let mut user = state.user_store.get_by_id(&user_id)?;

    let password = request.password;
    let hashed = web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))??;
    user.password_hash = hashed.hash;
    user.salt = hashed.salt;

    let user = state.user_store.update(user)?;
    info!("User {} updated by {}", user.id, claims.user_id);
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Remove a user (admins only)
pub async fn delete_user(
    state: web::Data<AppState>,
    caller: Authorized<AdminOnly>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let claims = caller.into_claims();
    let user_id = target_user_id(&claims, &path.into_inner())?;

    state.user_store.delete(&user_id)?;
    info!("User {} deleted by {}", user_id, claims.user_id);
    Ok(HttpResponse::NoContent().finish())
}

/// Consume a confirmation link
pub async fn confirm_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ConfirmQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let token = match query.into_inner().t {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AppError::InvalidParameter("t".to_string())),
    };

    state.tokens.verify_confirmation_token(&token, &user_id)?;
    let user = state.user_store.mark_email_confirmed(&user_id)?;

    info!("User {} confirmed their email", user.id);
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn claims(role: Role, user_id: &str) -> Claims {
        Claims::new("chocolate", crate::models::auth_jwt_claims::TokenType::Access, role, user_id)
    }

    #[test]
    fn this_resolves_to_caller() {
        assert_eq!(target_user_id(&claims(Role::User, "u1"), SELF_ALIAS).unwrap(), "u1");
    }

    #[test]
    fn users_are_limited_to_themselves() {
        assert!(matches!(
            target_user_id(&claims(Role::User, "u1"), "u2"),
            Err(AppError::ResourceForbidden(_))
        ));
        assert_eq!(target_user_id(&claims(Role::Admin, "a1"), "u2").unwrap(), "u2");
    }

    #[test]
    fn empty_id_is_an_invalid_parameter() {
        assert!(matches!(
            target_user_id(&claims(Role::Admin, "a1"), ""),
            Err(AppError::InvalidParameter(_))
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub confirmed: bool,
    pub confirmed_at: Option<i64>,
    pub created_at: i64,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest("Missing username or password".to_string()));
        }
        if self.password != self.password_confirm {
            return Err(AppError::Validation("Password confirmation doesn't match".to_string()));
        }
        Ok(())
    }
}

/// Body of `PUT /users/{user_id}`. Only the password can change; the
/// username and confirmation state are fixed.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.is_some() {
            return Err(AppError::Validation("Can't modify username".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::BadRequest("Missing password".to_string()));
        }
        if self.password != self.password_confirm {
            return Err(AppError::Validation("Password confirmation doesn't match".to_string()));
        }
        Ok(())
    }
}

/// Public view of a user; never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    pub created_at: i64,
}

impl From<&UserRecord> for UserResponse {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            confirmed: user.confirmed,
            confirmed_at: user.confirmed_at,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_matching_confirmation() {
        let request = CreateUserRequest {
            username: "ana".to_string(),
            password: "cocoa".to_string(),
            password_confirm: "cacao".to_string(),
        };
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn update_cannot_rename() {
        let request: UpdateUserRequest = serde_json::from_str(
            r#"{"username":"bo","password":"cocoa","password_confirm":"cocoa"}"#,
        )
        .unwrap();
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn update_ignores_confirmed_flag_in_body() {
        let request: UpdateUserRequest = serde_json::from_str(
            r#"{"password":"cocoa","password_confirm":"cocoa","confirmed":true}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
    }
}

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Account family a login is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Client,
    Business,
    Admin,
}

/// Body of `POST /tokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub grant_type: String,
    pub user_type: String,
    pub username: String,
    pub password: String,
    /// Longer refresh lifetime when set
    #[serde(default)]
    pub remember: bool,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<UserType, AppError> {
        if self.grant_type != "password" {
            return Err(AppError::BadRequest("Wrong grant_type".to_string()));
        }
        let user_type = match self.user_type.as_str() {
            "client" => UserType::Client,
            "business" => UserType::Business,
            "admin" => UserType::Admin,
            _ => return Err(AppError::BadRequest("Invalid user_type".to_string())),
        };
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest("Missing username or password".to_string()));
        }
        Ok(user_type)
    }
}

/// Body of `POST /tokens/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

impl RefreshRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.refresh_token.is_empty() {
            return Err(AppError::BadRequest("Missing 'refresh_token'".to_string()));
        }
        Ok(())
    }
}

/// Access/refresh tokens issued together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(grant_type: &str, user_type: &str) -> LoginRequest {
        LoginRequest {
            grant_type: grant_type.to_string(),
            user_type: user_type.to_string(),
            username: "ana@example.com".to_string(),
            password: "secret".to_string(),
            remember: false,
        }
    }

    #[test]
    fn login_requires_password_grant() {
        assert!(matches!(login("client_credentials", "client").validate(), Err(AppError::BadRequest(_))));
        assert_eq!(login("password", "client").validate().unwrap(), UserType::Client);
    }

    #[test]
    fn login_rejects_unknown_user_type() {
        assert!(matches!(login("password", "robot").validate(), Err(AppError::BadRequest(_))));
        assert_eq!(login("password", "business").validate().unwrap(), UserType::Business);
    }

    #[test]
    fn remember_defaults_to_false() {
        let parsed: LoginRequest = serde_json::from_str(
            r#"{"grant_type":"password","user_type":"client","username":"a","password":"b"}"#,
        )
        .unwrap();
        assert!(!parsed.remember);
    }

    #[test]
    fn refresh_request_needs_a_token() {
        let empty: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.validate().is_err());
    }
}

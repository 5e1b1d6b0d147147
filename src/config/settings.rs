use std::env;
use std::path::PathBuf;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub api_version: String,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Value placed in, and required from, the `aud` and `iss` claims.
    pub audience: String,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
}

impl ServerConfig {
    /// Base URL of the versioned API, e.g. `http://0.0.0.0:8080/v1`.
    pub fn api_base_url(&self) -> String {
        format!(
            "{}://{}:{}/{}",
            self.protocol,
            self.host,
            self.port,
            self.api_version.trim_matches('/')
        )
    }
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        // App config
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "chocolate".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Server config
        let protocol = env::var("SERVER_PROTOCOL").unwrap_or_else(|_| "http".to_string());
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;
        let api_version = env::var("API_VERSION").unwrap_or_else(|_| "v1".to_string());

        // CORS origins
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // Auth config
        let audience = env::var("JWT_AUDIENCE")
            .map_err(|_| AppError::Configuration("JWT_AUDIENCE must be set".to_string()))?;
        if audience.trim().is_empty() {
            return Err(AppError::Configuration("JWT_AUDIENCE must not be empty".to_string()));
        }

        let private_key_path = env::var("JWT_PRIVATE_KEY_PATH")
            .map_err(|_| AppError::Configuration("JWT_PRIVATE_KEY_PATH must be set".to_string()))?;

        let public_key_path = env::var("JWT_PUBLIC_KEY_PATH")
            .map_err(|_| AppError::Configuration("JWT_PUBLIC_KEY_PATH must be set".to_string()))?;

        Ok(Self {
            app: AppConfig {
                name: app_name,
                environment,
            },
            server: ServerConfig {
                protocol,
                host,
                port,
                api_version,
                cors_origins,
            },
            auth: AuthConfig {
                audience,
                private_key_path: PathBuf::from(private_key_path),
                public_key_path: PathBuf::from(public_key_path),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_url_joins_protocol_host_port_and_version() {
        let server = ServerConfig {
            protocol: "https".to_string(),
            host: "api.example.com".to_string(),
            port: 8443,
            api_version: "/v1/".to_string(),
            cors_origins: vec!["*".to_string()],
        };
        assert_eq!(server.api_base_url(), "https://api.example.com:8443/v1");
    }
}

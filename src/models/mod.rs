pub mod auth;
pub mod auth_jwt_claims;
pub mod runtime_config;
pub mod user;

pub use auth::{LoginRequest, RefreshRequest, TokenPair, UserType};
pub use auth_jwt_claims::*;
pub use runtime_config::*;
pub use user::{CreateUserRequest, UpdateUserRequest, UserRecord, UserResponse};

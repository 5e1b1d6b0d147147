pub mod confirmation;
pub mod jwt;
pub mod refresh;
pub mod token_service;

pub use confirmation::confirmation_url;
pub use jwt::JwtKeys;
pub use refresh::validate_refresh_binding;
pub use token_service::{refresh_lifetime, TokenService};

use actix_web::{HttpRequest, error::JsonPayloadError, web};
use log::debug;

use crate::error::AppError;
use crate::handlers;

/// JSON extractor config that reports body errors in the service's error format.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected JSON body on {}: {}", req.path(), err);
    AppError::BadRequest(err.to_string()).into()
}

/// Configures the versioned API routes.
/// Mounted under the "/{api_version}" scope in main.rs.
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tokens") // Base path: /v1/tokens
            .route("", web::post().to(handlers::tokens::generate_tokens))
            .route("/refresh", web::post().to(handlers::tokens::refresh_tokens)),
    );
    cfg.service(
        web::scope("/users") // Base path: /v1/users
            .route("", web::post().to(handlers::users::create_user))
            .route("", web::get().to(handlers::users::list_users))
            .route("/{user_id}", web::get().to(handlers::users::get_user))
            .route("/{user_id}", web::put().to(handlers::users::update_user))
            .route("/{user_id}", web::delete().to(handlers::users::delete_user))
            .route("/{user_id}/confirm", web::get().to(handlers::users::confirm_user)),
    );
}

/// Registers every route of the service: health check at the root and the
/// API under its version prefix.
pub fn configure_app(cfg: &mut web::ServiceConfig, api_version: &str) {
    cfg.app_data(json_config());
    cfg.service(web::resource("/health").route(web::get().to(handlers::health::health_check)));
    cfg.service(web::scope(&format!("/{}", api_version.trim_matches('/'))).configure(configure_api_routes));
}

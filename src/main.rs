use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::{Logger, from_fn}, web};
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

use chocolate_service::config;
use chocolate_service::middleware::request_metrics;
use chocolate_service::models::runtime_config::AppState;
use chocolate_service::routes;
use chocolate_service::services::auth::{JwtKeys, TokenService};
use chocolate_service::services::{InMemoryUserStore, LogMailer};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let app_settings = match config::init_config() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    // Signing keys are loaded once and shared by every worker
    let jwt_keys = match JwtKeys::from_pem_files(
        &app_settings.auth.private_key_path,
        &app_settings.auth.public_key_path,
    ) {
        Ok(keys) => Arc::new(keys),
        Err(e) => {
            log::error!("Failed to initialize JWT keys: {}", e);
            log::error!("Cannot start server without working JWT keys");
            std::process::exit(1);
        }
    };

    let token_service = Arc::new(TokenService::new(jwt_keys, app_settings.auth.audience.clone()));
    let app_state = AppState::new(
        Arc::new(app_settings.clone()),
        token_service,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(LogMailer),
    );

    // Get server host and port from settings
    let host = &app_settings.server.host;
    let port = app_settings.server.port;

    log::info!(
        "Starting {} ({}) at {}://{}:{}",
        app_settings.app.name,
        app_settings.app.environment,
        app_settings.server.protocol,
        host,
        port
    );

    if app_settings.is_production() && app_settings.server.cors_origins.iter().any(|origin| origin == "*") {
        log::warn!("CORS allows any origin in production");
    }

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr)?;

    HttpServer::new(move || {
        let app_settings = app_settings.clone();

        // Configure CORS using actix-cors
        let mut cors = Cors::default();
        if app_settings.server.cors_origins.iter().any(|origin| origin == "*") {
            cors = cors.allow_any_origin();
        } else {
            for origin in &app_settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header();

        App::new()
            .wrap(from_fn(request_metrics))
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_state.clone()))
            .configure(|cfg| routes::configure_app(cfg, &app_settings.server.api_version))
    })
    .listen(listener)?
    .run()
    .await
}

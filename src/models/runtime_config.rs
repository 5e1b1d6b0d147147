use std::sync::Arc;

use crate::config::AppSettings;
use crate::services::auth::TokenService;
use crate::services::mailer::ConfirmationMailer;
use crate::services::user_store::UserStore;

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub tokens: Arc<TokenService>,
    pub user_store: Arc<dyn UserStore>,
    pub mailer: Arc<dyn ConfirmationMailer>,
}

impl AppState {
    pub fn new(
        settings: Arc<AppSettings>,
        tokens: Arc<TokenService>,
        user_store: Arc<dyn UserStore>,
        mailer: Arc<dyn ConfirmationMailer>,
    ) -> Self {
        Self {
            settings,
            tokens,
            user_store,
            mailer,
        }
    }
}

pub mod auth;
pub mod mailer;
pub mod user_store;

pub use mailer::{ConfirmationMailer, LogMailer, MailerError};
pub use user_store::{InMemoryUserStore, UserStore};

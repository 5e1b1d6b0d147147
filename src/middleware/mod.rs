pub mod authorization;
pub mod request_metrics;

pub use authorization::{
    AccessPolicy,
    AccessRule,
    AdminOnly,
    AnyRole,
    Authorized,
    ConfirmedUserOrAdmin,
    PresentedAccessToken,
    authorize,
    extract_bearer_token,
};
pub use request_metrics::{REQUEST_ID_HEADER, request_metrics};

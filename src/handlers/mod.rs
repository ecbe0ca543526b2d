pub mod admin;
pub mod auth;
pub mod blog;
pub mod prediction;
pub mod stats;
pub mod subscription;

pub use admin::admin_config;
pub use auth::auth_config;
pub use blog::blog_config;
pub use prediction::prediction_config;
pub use stats::stats_config;
pub use subscription::subscription_config;

use actix_web::web;

use crate::config::AccessConfig;
use crate::error::{AppError, AppResult};
use crate::middlewares::Principal;
use crate::services::UserService;

/// Every route under `/api`.
pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth_config)
            .configure(prediction_config)
            .configure(blog_config)
            .configure(stats_config)
            .configure(subscription_config)
            .configure(admin_config),
    );
}

/// Malformed JSON bodies answer with the standard 400 envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid request body: {err}")).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query parameters: {err}")).into()
    })
}

/// Path segments that do not parse (e.g. a non-numeric id) are a 400, not a 404.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid path parameter: {err}")).into()
    })
}

/// Content writes outside `/api/admin` need the admin role unless the
/// deployment opened them to every signed-in user.
pub(crate) async fn authorize_content_write(
    access: &AccessConfig,
    user_service: &UserService,
    principal: &Principal,
) -> AppResult<()> {
    if access.admin_only_content {
        user_service.require_admin(&principal.user_id).await?;
    }
    Ok(())
}

pub mod auth;
pub mod cors;

pub use auth::{AdminUser, AuthMiddleware, CurrentUser, MaybeUser, Principal};
pub use cors::create_cors;

pub mod access_policy;
pub mod access_service;
pub mod blog_service;
pub mod prediction_service;
pub mod stats_service;
pub mod user_service;

pub use access_policy::*;
pub use access_service::*;
pub use blog_service::*;
pub use prediction_service::*;
pub use stats_service::*;
pub use user_service::*;

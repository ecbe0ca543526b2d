pub mod blog_posts;
pub mod predictions;
pub mod user_prediction_access;
pub mod users;

pub use blog_posts as blog_post_entity;
pub use predictions as prediction_entity;
pub use user_prediction_access as access_entity;
pub use users as user_entity;

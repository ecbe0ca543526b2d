pub mod jwt;
pub mod limit;
pub mod slug;
pub mod validation;

pub use jwt::*;
pub use limit::*;
pub use slug::{is_valid_slug, slugify};
pub use validation::FieldErrors;

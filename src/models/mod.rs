pub mod access;
pub mod blog;
pub mod common;
pub mod prediction;
pub mod stats;
pub mod user;

pub use access::*;
pub use blog::*;
pub use common::*;
pub use prediction::*;
pub use stats::*;
pub use user::*;

pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, get_identity_from_request};
pub use cors::create_cors;

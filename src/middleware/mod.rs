pub mod admin;
pub mod auth;

pub use admin::{admin_key_middleware, AdminAccess, ADMIN_KEY_HEADER};
pub use auth::{tenant_key_middleware, API_KEY_HEADER, LIBRARY_API_PREFIX};

//! Cross-cutting HTTP layers applied by [`crate::server::create_router`].

pub mod cors;
pub mod security;

pub use cors::{cors_layer, cors_layer_from_env};
pub use security::security_headers;

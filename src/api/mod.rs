//! API Module
//!
//! HTTP transport for the command gateway.
//!
//! # Endpoints
//! - `/<command>` - Any built-in command, any HTTP method
//! - `/<extension>` - Commands added through the [`ExtensionRegistry`]
//!
//! Parameters come from the URL query and the body, and every response is
//! a `{"errors": [...], "response": [...]}` envelope.

pub mod extensions;
pub mod handlers;
mod params;
pub mod routes;

pub use extensions::{builtin_extensions, ExistsExtension, Extension, ExtensionRegistry};
pub use handlers::AppState;
pub use routes::create_router;

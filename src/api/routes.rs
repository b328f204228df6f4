//! API Routes
//!
//! Configures the Axum router: one route per extension, then the generic
//! `/:command` route. Every route accepts any HTTP method.

use std::sync::Arc;

use axum::{extract::State, routing::any, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;

use super::extensions::Extension;
use super::handlers::{command_handler, extension_handler, AppState};
use crate::models::KeyPairs;

/// Creates the main router.
///
/// Extension routes are added ahead of `/:command`, so an extension
/// registered on a built-in path such as `/get` takes precedence.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new();
    for extension in state.extensions.iter() {
        debug!(path = extension.path(), "Mounting extension route");
        let path = extension.path().to_string();
        let extension: Arc<dyn Extension> = Arc::clone(extension);
        router = router.route(
            &path,
            any(move |State(state): State<AppState>, params: KeyPairs| {
                let extension = Arc::clone(&extension);
                async move { extension_handler(&state, extension.as_ref(), &params).await }
            }),
        );
    }

    router
        .route("/:command", any(command_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

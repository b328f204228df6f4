//! API Handlers
//!
//! One handler serves every built-in command; extensions get a handler
//! bound to their registry entry.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::extensions::{Extension, ExtensionRegistry};
use crate::error::Result;
use crate::gateway::{BatchResult, Command, CommandGateway};
use crate::models::KeyPairs;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<CommandGateway>,
    pub extensions: Arc<ExtensionRegistry>,
}

impl AppState {
    pub fn new(gateway: CommandGateway, extensions: ExtensionRegistry) -> Self {
        Self {
            gateway: Arc::new(gateway),
            extensions: Arc::new(extensions),
        }
    }
}

/// Handler for `/:command`, any method.
///
/// Unknown and disabled commands fail the whole request; once a command
/// runs, per-item failures are reported inside a 200 envelope.
pub async fn command_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    params: KeyPairs,
) -> Result<Json<BatchResult>> {
    let command: Command = name.parse()?;
    // The gateway rejects disabled commands too; checking here only selects
    // the 403 status for the envelope.
    state.gateway.toggles().check(command)?;

    Ok(Json(state.gateway.execute(command, &params).await))
}

/// Runs an extension under the store's write lock.
pub async fn extension_handler(
    state: &AppState,
    extension: &dyn Extension,
    params: &KeyPairs,
) -> Json<BatchResult> {
    let mut cache = state.gateway.cache().write().await;
    Json(extension.handle(&mut cache, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::extensions::builtin_extensions;
    use crate::backup::{BackupConfig, BackupManager};
    use crate::cache::{shared, CacheStore};
    use crate::error::CacheError;
    use crate::gateway::CommandToggles;
    use serde_json::json;

    fn test_state() -> AppState {
        let cache = shared(CacheStore::new(None));
        let backups = Arc::new(BackupManager::new(BackupConfig::default(), cache.clone()));
        let gateway = CommandGateway::new(cache, backups, CommandToggles::default());
        AppState::new(gateway, builtin_extensions())
    }

    fn params(items: &[(&str, &str)]) -> KeyPairs {
        items.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = command_handler(
            State(state.clone()),
            Path("set".to_string()),
            params(&[("test_key", "test_value")]),
        )
        .await
        .unwrap();
        assert_eq!(result.response, vec![json!(true)]);

        let result = command_handler(
            State(state),
            Path("GET".to_string()),
            params(&[("test_key", "")]),
        )
        .await
        .unwrap();
        assert_eq!(result.response, vec![json!("test_value")]);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let result =
            command_handler(State(test_state()), Path("nope".to_string()), KeyPairs::new()).await;
        assert!(matches!(result, Err(CacheError::UnknownCommand(_))));
    }

    #[tokio::test]
    async fn test_disabled_command() {
        let result =
            command_handler(State(test_state()), Path("backup".to_string()), KeyPairs::new())
                .await;
        assert!(matches!(result, Err(CacheError::DisabledCommand(_))));
    }

    #[tokio::test]
    async fn test_extension_handler() {
        let state = test_state();
        state.gateway.cache().write().await.set("a", "1");

        let extension = state.extensions.get("/exists").unwrap().clone();
        let result = extension_handler(&state, extension.as_ref(), &params(&[("a", "")])).await;
        assert_eq!(result.response, vec![json!(true)]);
    }
}

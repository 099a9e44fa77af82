//! Handler registration methods for [`EventSystem`].

use super::core::EventSystem;
use crate::events::{Event, EventError, EventHandler, TypedEventHandler};
use std::sync::Arc;
use tracing::info;

impl EventSystem {
    /// Registers a handler for a core server event.
    ///
    /// Core events are the host infrastructure notifications:
    /// `server_initialized`, `world_changed`, `client_connected`,
    /// `client_disconnected`, `account_created`, plus the plugin lifecycle
    /// events emitted by the registry.
    pub async fn on_core<T, F>(&self, event_name: &str, handler: F) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("core:{}", event_name);
        self.register_typed_handler(event_key, handler).await
    }

    /// Registers a handler for a client-scoped event within a namespace
    /// (e.g. `"chat"`, `"raw"`, `"equipment"`, `"appearance"`).
    pub async fn on_client<T, F>(
        &self,
        namespace: &str,
        event_name: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("client:{}:{}", namespace, event_name);
        self.register_typed_handler(event_key, handler).await
    }

    /// Registers a handler for an event emitted by another plugin.
    pub async fn on_plugin<T, F>(
        &self,
        plugin_name: &str,
        event_name: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("plugin:{}:{}", plugin_name, event_name);
        self.register_typed_handler(event_key, handler).await
    }

    async fn register_typed_handler<T, F>(
        &self,
        event_key: String,
        handler: F,
    ) -> Result<(), EventError>
    where
        T: Event + 'static,
        F: Fn(T) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let handler_name = format!("{}::{}", event_key, T::type_name());
        let typed_handler = TypedEventHandler::new(handler_name, handler);
        let handler_arc: Arc<dyn EventHandler> = Arc::new(typed_handler);

        let mut handlers = self.handlers.write().await;
        handlers.entry(event_key.clone()).or_default().push(handler_arc);

        let mut stats = self.stats.write().await;
        stats.total_handlers += 1;

        info!("📝 Registered handler for {}", event_key);
        Ok(())
    }
}

//! Event emission methods for [`EventSystem`].

use super::core::EventSystem;
use crate::events::{Event, EventError};
use tracing::{debug, error, warn};

impl EventSystem {
    /// Emits a core server event to all registered handlers.
    ///
    /// The payload is serialized once, then dispatched to every handler in
    /// registration order. A failing handler is logged and skipped; it never
    /// prevents later handlers from running.
    pub async fn emit_core<T>(&self, event_name: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("core:{}", event_name);
        self.emit_event(&event_key, event).await
    }

    /// Emits a client-scoped event to all registered handlers.
    pub async fn emit_client<T>(
        &self,
        namespace: &str,
        event_name: &str,
        event: &T,
    ) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("client:{}:{}", namespace, event_name);
        self.emit_event(&event_key, event).await
    }

    /// Emits a plugin-to-plugin event to all registered handlers.
    pub async fn emit_plugin<T>(
        &self,
        plugin_name: &str,
        event_name: &str,
        event: &T,
    ) -> Result<(), EventError>
    where
        T: Event,
    {
        let event_key = format!("plugin:{}:{}", plugin_name, event_name);
        self.emit_event(&event_key, event).await
    }

    async fn emit_event<T>(&self, event_key: &str, event: &T) -> Result<(), EventError>
    where
        T: Event,
    {
        let data = event.serialize()?;

        // Clone the handler list out so no lock is held while handlers run;
        // a handler may re-enter the system to register more handlers.
        let event_handlers = {
            let handlers = self.handlers.read().await;
            handlers.get(event_key).cloned()
        };

        if let Some(event_handlers) = event_handlers {
            debug!(
                "📤 Emitting {} to {} handlers",
                event_key,
                event_handlers.len()
            );

            for handler in &event_handlers {
                if let Err(e) = handler.handle(&data).await {
                    error!("❌ Handler {} failed: {}", handler.handler_name(), e);
                }
            }

            let mut stats = self.stats.write().await;
            stats.events_emitted += 1;
        } else {
            // Not an error: the host fires every event it defines whether or
            // not any loaded plugin cares.
            warn!("⚠️ No handlers for event: {}", event_key);
        }

        Ok(())
    }
}

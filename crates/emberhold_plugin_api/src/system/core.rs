//! Core [`EventSystem`] state.

use super::stats::EventSystemStats;
use crate::events::EventHandler;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The event bus plugins register callbacks on and the host dispatches
/// through.
///
/// Handlers are keyed by string (`core:x`, `client:ns:x`, `plugin:name:x`),
/// with any number of handlers per key. Registration and dispatch are both
/// safe to perform from any task; the system is shared as
/// `Arc<EventSystem>`.
///
/// Dispatch is synchronous with respect to the emitter: `emit_*` awaits
/// every handler before returning, on whatever task the host emits from.
pub struct EventSystem {
    /// Map of event keys to their registered handlers.
    pub(super) handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    /// Registration and dispatch counters.
    pub(super) stats: RwLock<EventSystemStats>,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("handlers", &"[handlers]")
            .finish()
    }
}

impl EventSystem {
    /// Creates a new event system with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            stats: RwLock::new(EventSystemStats::default()),
        }
    }

    /// Returns a snapshot of the current statistics.
    pub async fn get_stats(&self) -> EventSystemStats {
        self.stats.read().await.clone()
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

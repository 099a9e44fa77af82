//! Event system statistics.

/// Counters describing event system usage, useful for monitoring and for
/// the plugin registry's handler accounting.
#[derive(Debug, Default, Clone)]
pub struct EventSystemStats {
    /// Total number of registered event handlers.
    pub total_handlers: usize,
    /// Total number of events emitted that reached at least one handler.
    pub events_emitted: u64,
}

//! Utility functions shared across the plugin API.

use crate::system::EventSystem;
use std::sync::Arc;

/// Returns the current Unix timestamp in seconds.
///
/// All event payloads stamp their construction time through this function so
/// timestamps stay comparable across the system.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Creates a new event system ready for handler registration.
///
/// The returned `Arc<EventSystem>` is the instance the host shares with
/// every plugin through the server context.
pub fn create_event_system() -> Arc<EventSystem> {
    Arc::new(EventSystem::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_monotonic_enough() {
        let a = current_timestamp();
        let b = current_timestamp();
        assert!(b >= a);
        assert!(a > 0);
    }
}

//! Herald plugin: announces arrivals, departures and world changes.
//!
//! A small but complete plugin showing the intended shape of an Emberhold
//! plugin — state shared into handler closures, registration via
//! `register_handlers!`, and announcements emitted on the plugin bus so
//! other plugins can react.

use async_trait::async_trait;
use emberhold_plugin_api::{
    register_handlers, ClientConnectedEvent, ClientDisconnectedEvent, EventSystem, LogLevel,
    PluginError, PluginRegistry, ServerContext, SimplePlugin, WorldChangedEvent,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::info;

/// Announcement the herald emits on the plugin bus after each welcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeAnnouncedEvent {
    pub client_id: u16,
    pub welcome_count: u32,
}

/// Greets connecting clients and keeps a running welcome count.
pub struct HeraldPlugin {
    welcome_count: Arc<AtomicU32>,
}

impl HeraldPlugin {
    pub fn new() -> Self {
        Self {
            welcome_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Total clients welcomed since load.
    pub fn welcome_count(&self) -> u32 {
        self.welcome_count.load(Ordering::SeqCst)
    }

    /// Registers this plugin's factory under its canonical name.
    pub fn register(registry: &mut PluginRegistry) -> Result<(), PluginError> {
        registry.register_simple("herald", HeraldPlugin::new)
    }
}

impl Default for HeraldPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimplePlugin for HeraldPlugin {
    fn name(&self) -> &str {
        "herald"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    async fn register_handlers(&mut self, events: Arc<EventSystem>) -> Result<(), PluginError> {
        let welcome_count = self.welcome_count.clone();
        let announce_on = events.clone();
        register_handlers!(events;
            core {
                "client_connected" => move |event: ClientConnectedEvent| {
                    let count = welcome_count.fetch_add(1, Ordering::SeqCst) + 1;
                    info!(
                        "herald: welcome client {} from {} (welcome #{})",
                        event.client_id(),
                        event.remote_addr(),
                        count
                    );
                    let announcement = WelcomeAnnouncedEvent {
                        client_id: event.client_id().0,
                        welcome_count: count,
                    };
                    // Fire-and-forget: announcement failures only matter to
                    // whoever listens, not to the connect path.
                    let announce_on = announce_on.clone();
                    tokio::spawn(async move {
                        let _ = announce_on
                            .emit_plugin("herald", "welcome_announced", &announcement)
                            .await;
                    });
                    Ok(())
                },
                "client_disconnected" => move |event: ClientDisconnectedEvent| {
                    info!(
                        "herald: farewell client {} ({:?})",
                        event.client_id(),
                        event.reason()
                    );
                    Ok(())
                },
                "world_changed" => move |event: WorldChangedEvent| {
                    info!("herald: the server moved to {}", event.new_world());
                    Ok(())
                }
            }
        );
        Ok(())
    }

    async fn on_init(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        context.log(
            LogLevel::Info,
            &format!("herald online in world {}", context.world()),
        );
        Ok(())
    }

    async fn on_shutdown(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        context.log(
            LogLevel::Info,
            &format!("herald offline, welcomed {} clients", self.welcome_count()),
        );
        Ok(())
    }
}

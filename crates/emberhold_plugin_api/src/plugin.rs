//! # Plugin Contract and Registry
//!
//! The lifecycle contract plugins implement and the factory-registration
//! table the host populates at startup. Discovery is explicit: the host
//! registers one factory per plugin under a unique name, then asks the
//! registry to load everything two-phase — every plugin's `pre_init`
//! (handler registration) runs before any plugin's `init`, so no plugin can
//! emit an event another loaded plugin has not yet subscribed to.
//!
//! Most plugins implement [`SimplePlugin`] and let the adapter take care of
//! the split lifecycle.

use crate::events::EventError;
use crate::server::ServerContext;
use crate::system::EventSystem;
use crate::types::{require_non_empty, ValidationError};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Errors raised by plugin lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin initialization failed: {0}")]
    InitializationFailed(String),
    #[error("plugin execution error: {0}")]
    ExecutionError(String),
    #[error("plugin not found: {0}")]
    NotFound(String),
    #[error("plugin '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Full plugin lifecycle contract the registry drives.
///
/// 1. The factory creates the instance.
/// 2. `pre_init` registers event handlers — every plugin's `pre_init` runs
///    before any plugin's `init`.
/// 3. `init` runs with the full server context.
/// 4. `shutdown` is called on unload or server stop.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique, stable plugin name used for registration and event routing.
    fn name(&self) -> &str;

    /// Version string, semver by convention.
    fn version(&self) -> &str;

    /// Registers event handlers. Runs before any plugin's `init`.
    async fn pre_init(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError>;

    /// Initializes the plugin with server context.
    async fn init(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError>;

    /// Shuts the plugin down. Errors are logged but do not block unloading.
    async fn shutdown(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError>;
}

/// Simplified plugin trait most plugins implement.
///
/// [`SimplePluginAdapter`] bridges it onto [`Plugin`]: `register_handlers`
/// becomes `pre_init` with the bus already extracted from the context, and
/// `on_init` / `on_shutdown` default to no-ops.
#[async_trait]
pub trait SimplePlugin: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Registers this plugin's event handlers on the shared bus.
    async fn register_handlers(&mut self, events: Arc<EventSystem>) -> Result<(), PluginError>;

    async fn on_init(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        Ok(())
    }

    async fn on_shutdown(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Bridges a [`SimplePlugin`] onto the full [`Plugin`] lifecycle.
pub struct SimplePluginAdapter<P: SimplePlugin> {
    inner: P,
}

impl<P: SimplePlugin> SimplePluginAdapter<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: SimplePlugin> Plugin for SimplePluginAdapter<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn version(&self) -> &str {
        self.inner.version()
    }

    async fn pre_init(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        self.inner.register_handlers(context.events()).await
    }

    async fn init(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        self.inner.on_init(context).await
    }

    async fn shutdown(&mut self, context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
        self.inner.on_shutdown(context).await
    }
}

/// Factory producing a fresh plugin instance at load time.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Fired on the core bus when a plugin finishes loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginLoadedEvent {
    plugin_name: String,
    version: String,
    timestamp: u64,
}

impl PluginLoadedEvent {
    pub fn new(
        plugin_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let plugin_name = plugin_name.into();
        require_non_empty("plugin_name", &plugin_name)?;
        Ok(Self {
            plugin_name,
            version: version.into(),
            timestamp: current_timestamp(),
        })
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Fired on the core bus when a plugin is unloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginUnloadedEvent {
    plugin_name: String,
    timestamp: u64,
}

impl PluginUnloadedEvent {
    pub fn new(plugin_name: impl Into<String>) -> Result<Self, ValidationError> {
        let plugin_name = plugin_name.into();
        require_non_empty("plugin_name", &plugin_name)?;
        Ok(Self {
            plugin_name,
            timestamp: current_timestamp(),
        })
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

struct LoadedPlugin {
    name: String,
    plugin: Box<dyn Plugin>,
    handler_count: usize,
}

/// Factory-registration table replacing container-driven plugin discovery.
///
/// The host registers factories during startup, calls
/// [`load_all`](Self::load_all) once, and
/// [`shutdown_all`](Self::shutdown_all) on stop. Loaded plugins are shut
/// down in reverse load order.
pub struct PluginRegistry {
    factories: Vec<(String, PluginFactory)>,
    loaded: Vec<LoadedPlugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            loaded: Vec::new(),
        }
    }

    /// Registers a plugin factory under a unique name.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<(), PluginError>
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        if self.factories.iter().any(|(n, _)| n == name) {
            return Err(PluginError::AlreadyRegistered(name.to_string()));
        }
        self.factories.push((name.to_string(), Box::new(factory)));
        info!("registered plugin factory: {}", name);
        Ok(())
    }

    /// Registers a [`SimplePlugin`] factory, wrapping it in the adapter.
    pub fn register_simple<P, F>(&mut self, name: &str, factory: F) -> Result<(), PluginError>
    where
        P: SimplePlugin,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.register(name, move || Box::new(SimplePluginAdapter::new(factory())))
    }

    /// Loads every registered plugin two-phase.
    ///
    /// Phase 1 instantiates all factories, phase 2 runs every `pre_init`,
    /// phase 3 runs every `init`. A plugin failing either phase is dropped
    /// with an error log; the others continue. Returns the names that
    /// loaded, in load order.
    pub async fn load_all(
        &mut self,
        context: Arc<dyn ServerContext>,
    ) -> Result<Vec<String>, PluginError> {
        let events = context.events();

        // Phase 1: instantiate.
        let mut instances: Vec<LoadedPlugin> = Vec::new();
        for (name, factory) in &self.factories {
            if self.loaded.iter().any(|p| &p.name == name) {
                warn!("plugin {} is already loaded, skipping", name);
                continue;
            }
            instances.push(LoadedPlugin {
                name: name.clone(),
                plugin: factory(),
                handler_count: 0,
            });
        }

        info!("loading {} plugins two-phase", instances.len());

        // Phase 2: register all handlers before any init runs.
        let mut pre_initialized = Vec::new();
        for mut entry in instances {
            let handlers_before = events.get_stats().await.total_handlers;
            match entry.plugin.pre_init(context.clone()).await {
                Ok(()) => {
                    entry.handler_count =
                        events.get_stats().await.total_handlers - handlers_before;
                    info!(
                        "plugin {} pre-initialized, registered {} handlers",
                        entry.name, entry.handler_count
                    );
                    pre_initialized.push(entry);
                }
                Err(e) => {
                    error!("plugin {} pre-initialization failed: {}", entry.name, e);
                }
            }
        }

        // Phase 3: initialize.
        let mut loaded_names = Vec::new();
        for mut entry in pre_initialized {
            match entry.plugin.init(context.clone()).await {
                Ok(()) => {
                    let payload =
                        PluginLoadedEvent::new(entry.name.clone(), entry.plugin.version())
                            .map_err(|e| PluginError::InitializationFailed(e.to_string()))?;
                    if let Err(e) = events.emit_core("plugin_loaded", &payload).await {
                        warn!("failed to emit plugin_loaded for {}: {}", entry.name, e);
                    }
                    info!("plugin {} initialized", entry.name);
                    loaded_names.push(entry.name.clone());
                    self.loaded.push(entry);
                }
                Err(e) => {
                    error!("plugin {} initialization failed: {}", entry.name, e);
                }
            }
        }

        Ok(loaded_names)
    }

    /// Unloads one plugin by name.
    pub async fn unload(
        &mut self,
        name: &str,
        context: Arc<dyn ServerContext>,
    ) -> Result<(), PluginError> {
        let position = self
            .loaded
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        let mut entry = self.loaded.remove(position);
        if let Err(e) = entry.plugin.shutdown(context.clone()).await {
            error!("error shutting down plugin {}: {}", name, e);
        }

        let payload = PluginUnloadedEvent::new(name)
            .map_err(|e| PluginError::ExecutionError(e.to_string()))?;
        if let Err(e) = context.events().emit_core("plugin_unloaded", &payload).await {
            warn!("failed to emit plugin_unloaded for {}: {}", name, e);
        }

        info!("plugin {} unloaded", name);
        Ok(())
    }

    /// Shuts every loaded plugin down in reverse load order.
    pub async fn shutdown_all(&mut self, context: Arc<dyn ServerContext>) {
        info!("shutting down {} plugins", self.loaded.len());
        while let Some(mut entry) = self.loaded.pop() {
            if let Err(e) = entry.plugin.shutdown(context.clone()).await {
                error!("error shutting down plugin {}: {}", entry.name, e);
            }
            match PluginUnloadedEvent::new(entry.name.clone()) {
                Ok(payload) => {
                    if let Err(e) = context
                        .events()
                        .emit_core("plugin_unloaded", &payload)
                        .await
                    {
                        warn!("failed to emit plugin_unloaded for {}: {}", entry.name, e);
                    }
                }
                Err(e) => warn!("invalid plugin name at shutdown: {}", e),
            }
        }
    }

    /// Names of currently loaded plugins, in load order.
    pub fn loaded_plugins(&self) -> Vec<String> {
        self.loaded.iter().map(|p| p.name.clone()).collect()
    }

    /// Handler count a loaded plugin registered during `pre_init`.
    pub fn handler_count(&self, name: &str) -> Option<usize> {
        self.loaded
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.handler_count)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers multiple event handlers with a declarative syntax, organized
/// by event category.
///
/// ```ignore
/// register_handlers!(events;
///     core {
///         "client_connected" => |event: ClientConnectedEvent| { Ok(()) }
///     }
///     client {
///         "chat", "command" => |event: CommandReceivedEvent| { Ok(()) }
///     }
/// );
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($events:expr;
     $(core { $($core_event:expr => $core_handler:expr),* $(,)? })?
     $(client { $($c_ns:expr, $c_event:expr => $c_handler:expr),* $(,)? })?
     $(plugin { $($p_name:expr, $p_event:expr => $p_handler:expr),* $(,)? })?
    ) => {{
        $($(
            $events
                .on_core($core_event, $core_handler)
                .await
                .map_err($crate::plugin::PluginError::Event)?;
        )*)?
        $($(
            $events
                .on_client($c_ns, $c_event, $c_handler)
                .await
                .map_err($crate::plugin::PluginError::Event)?;
        )*)?
        $($(
            $events
                .on_plugin($p_name, $p_event, $p_handler)
                .await
                .map_err($crate::plugin::PluginError::Event)?;
        )*)?
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SlotClientList;
    use crate::server::LocalServerContext;
    use crate::utils::create_event_system;
    use std::sync::Mutex;

    fn test_context() -> Arc<dyn ServerContext> {
        Arc::new(LocalServerContext::new(
            create_event_system(),
            Arc::new(SlotClientList::new(8)),
            "NEWWORLD",
        ))
    }

    /// Appends lifecycle steps to a shared trace.
    struct TracingPlugin {
        name: String,
        trace: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for TracingPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        async fn pre_init(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
            self.trace
                .lock()
                .unwrap()
                .push(format!("{}:pre_init", self.name));
            Ok(())
        }

        async fn init(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
            self.trace.lock().unwrap().push(format!("{}:init", self.name));
            Ok(())
        }

        async fn shutdown(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
            self.trace
                .lock()
                .unwrap()
                .push(format!("{}:shutdown", self.name));
            Ok(())
        }
    }

    fn tracing_factory(
        name: &str,
        trace: Arc<Mutex<Vec<String>>>,
    ) -> impl Fn() -> Box<dyn Plugin> + Send + Sync {
        let name = name.to_string();
        move || {
            Box::new(TracingPlugin {
                name: name.clone(),
                trace: trace.clone(),
            })
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        registry
            .register("herald", tracing_factory("herald", trace.clone()))
            .unwrap();
        assert!(matches!(
            registry.register("herald", tracing_factory("herald", trace)),
            Err(PluginError::AlreadyRegistered(_))
        ));
    }

    #[tokio::test]
    async fn load_all_runs_every_pre_init_before_any_init() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        registry
            .register("alpha", tracing_factory("alpha", trace.clone()))
            .unwrap();
        registry
            .register("beta", tracing_factory("beta", trace.clone()))
            .unwrap();

        let loaded = registry.load_all(test_context()).await.unwrap();
        assert_eq!(loaded, vec!["alpha".to_string(), "beta".to_string()]);

        let steps = trace.lock().unwrap().clone();
        assert_eq!(
            steps,
            vec![
                "alpha:pre_init",
                "beta:pre_init",
                "alpha:init",
                "beta:init"
            ]
        );
    }

    #[tokio::test]
    async fn shutdown_all_runs_in_reverse_load_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        registry
            .register("alpha", tracing_factory("alpha", trace.clone()))
            .unwrap();
        registry
            .register("beta", tracing_factory("beta", trace.clone()))
            .unwrap();

        let context = test_context();
        registry.load_all(context.clone()).await.unwrap();
        registry.shutdown_all(context).await;

        let steps = trace.lock().unwrap().clone();
        assert_eq!(steps[steps.len() - 2..], ["beta:shutdown", "alpha:shutdown"]);
        assert!(registry.loaded_plugins().is_empty());
    }

    #[tokio::test]
    async fn failing_pre_init_drops_only_that_plugin() {
        struct BrokenPlugin;

        #[async_trait]
        impl Plugin for BrokenPlugin {
            fn name(&self) -> &str {
                "broken"
            }
            fn version(&self) -> &str {
                "0.0.1"
            }
            async fn pre_init(
                &mut self,
                _context: Arc<dyn ServerContext>,
            ) -> Result<(), PluginError> {
                Err(PluginError::InitializationFailed("no config".to_string()))
            }
            async fn init(&mut self, _context: Arc<dyn ServerContext>) -> Result<(), PluginError> {
                Ok(())
            }
            async fn shutdown(
                &mut self,
                _context: Arc<dyn ServerContext>,
            ) -> Result<(), PluginError> {
                Ok(())
            }
        }

        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        registry.register("broken", || Box::new(BrokenPlugin)).unwrap();
        registry
            .register("alpha", tracing_factory("alpha", trace))
            .unwrap();

        let loaded = registry.load_all(test_context()).await.unwrap();
        assert_eq!(loaded, vec!["alpha".to_string()]);
        assert!(registry.handler_count("broken").is_none());
    }

    #[tokio::test]
    async fn load_emits_plugin_loaded_event() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let context = test_context();
        let seen = Arc::new(AtomicU32::new(0));
        let seen_in_handler = seen.clone();
        context
            .events()
            .on_core("plugin_loaded", move |event: PluginLoadedEvent| {
                assert_eq!(event.plugin_name(), "alpha");
                seen_in_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        registry
            .register("alpha", tracing_factory("alpha", trace))
            .unwrap();
        registry.load_all(context).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unload_of_unknown_plugin_is_not_found() {
        let mut registry = PluginRegistry::new();
        assert!(matches!(
            registry.unload("ghost", test_context()).await,
            Err(PluginError::NotFound(_))
        ));
    }
}

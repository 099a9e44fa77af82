//! # Emberhold Plugin API
//!
//! The extension surface of the Emberhold game server: typed event
//! payloads, the event bus plugins register callbacks on, the trait seams
//! the host implements (server context, client registry, inventory,
//! scripting bridge, packet interceptor), domain error types, and the
//! plugin lifecycle contract with its factory registry.
//!
//! This crate does not contain a server. The host owns networking,
//! scheduling and the embedded scripting runtime; plugins link against
//! this crate, register handlers during `pre_init`, and react to the
//! events the host fires.
//!
//! ## Quick start
//!
//! ```rust
//! use emberhold_plugin_api::*;
//! use std::sync::Arc;
//!
//! struct GuardPlugin;
//!
//! #[async_trait::async_trait]
//! impl SimplePlugin for GuardPlugin {
//!     fn name(&self) -> &str { "guard" }
//!     fn version(&self) -> &str { "1.0.0" }
//!
//!     async fn register_handlers(
//!         &mut self,
//!         events: Arc<EventSystem>,
//!     ) -> Result<(), PluginError> {
//!         events
//!             .on_core("client_connected", |event: ClientConnectedEvent| {
//!                 tracing::info!("client {} joined", event.client_id());
//!                 Ok(())
//!             })
//!             .await?;
//!         Ok(())
//!     }
//! }
//!
//! # async fn load(registry: &mut PluginRegistry) -> Result<(), PluginError> {
//! registry.register_simple("guard", || GuardPlugin)?;
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod client;
pub mod events;
pub mod inventory;
pub mod plugin;
pub mod script;
pub mod server;
pub mod system;
pub mod types;
pub mod utils;

pub use account::{AccountCreatedEvent, AccountError};
pub use client::{Client, ClientListError, ClientRegistry, ConnectedClient, SlotClientList};
pub use events::{
    ClientConnectedEvent, ClientDisconnectedEvent, CommandReceivedEvent, DisconnectReason, Event,
    EventError, EventHandler, ItemEquippedEvent, NameColorChangedEvent, PacketReceivedEvent,
    ServerInitializedEvent, TypedEventHandler, WorldChangedEvent,
};
pub use inventory::{Inventory, InventoryError, Item, StackedInventory};
pub use plugin::{
    Plugin, PluginError, PluginLoadedEvent, PluginRegistry, PluginUnloadedEvent, SimplePlugin,
    SimplePluginAdapter,
};
pub use script::{ScriptBridge, ScriptError, ScriptInventory, ScriptValue};
pub use server::{
    InterceptAction, LocalServerContext, LogLevel, PacketInterceptor, ServerContext, ServerError,
};
pub use system::{EventSystem, EventSystemStats};
pub use types::{ClientId, Color, SessionId, ValidationError};
pub use utils::{create_event_system, current_timestamp};

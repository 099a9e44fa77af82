//! # Event Infrastructure and Core Payloads
//!
//! The [`Event`] trait plus the typed payloads the host fires at plugins.
//! Handling follows the event-bus model: plugins register callbacks against
//! string event keys on the [`EventSystem`](crate::system::EventSystem), and
//! the host constructs a payload immediately before dispatch, hands it to
//! every registered handler synchronously, then discards it.
//!
//! Payload carriers are immutable: they validate their required fields in
//! `new()` and expose them through read-only accessors.
//!
//! ## Event keys fired by the host
//!
//! - core: `server_initialized`, `world_changed`, `client_connected`,
//!   `client_disconnected`, `account_created`
//! - client-scoped: `chat`/`command`, `raw`/`packet`,
//!   `equipment`/`item_equipped`, `appearance`/`name_color`

use crate::inventory::Item;
use crate::types::{require_non_empty, ClientId, Color, SessionId, ValidationError};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::any::{Any, TypeId};

// ============================================================================
// Event Trait and Handler Plumbing
// ============================================================================

/// Core trait that all event payloads must implement.
///
/// Provides serialization for bus transport, a stable type name for routing
/// and `Any` access for downcasting. The blanket impl below covers any
/// serde-capable type, so new payloads only need the usual derives.
pub trait Event: Send + Sync + Any + std::fmt::Debug {
    /// Stable type name used in handler diagnostics.
    fn type_name() -> &'static str
    where
        Self: Sized;

    /// Serializes the event for dispatch on the bus.
    fn serialize(&self) -> Result<Vec<u8>, EventError>;

    /// Deserializes an event from bus data.
    fn deserialize(data: &[u8]) -> Result<Self, EventError>
    where
        Self: Sized;

    /// Dynamic-typing escape hatch.
    fn as_any(&self) -> &dyn Any;
}

impl<T> Event for T
where
    T: Serialize + DeserializeOwned + Send + Sync + Any + std::fmt::Debug + 'static,
{
    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    fn serialize(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(EventError::Serialization)
    }

    fn deserialize(data: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(data).map_err(EventError::Deserialization)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Uniform interface the event system calls handlers through.
///
/// Plugin code rarely implements this directly; the typed registration
/// methods wrap plain closures in [`TypedEventHandler`].
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles an event from serialized bus data.
    async fn handle(&self, data: &[u8]) -> Result<(), EventError>;

    /// TypeId of the payload type this handler expects.
    fn expected_type_id(&self) -> TypeId;

    /// Human-readable handler name for diagnostics.
    fn handler_name(&self) -> &str;
}

/// Bridges a typed closure to the untyped [`EventHandler`] interface.
pub struct TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<T>,
}

impl<T, F> TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> EventHandler for TypedEventHandler<T, F>
where
    T: Event,
    F: Fn(T) -> Result<(), EventError> + Send + Sync,
{
    async fn handle(&self, data: &[u8]) -> Result<(), EventError> {
        let event = T::deserialize(data)?;
        (self.handler)(event)
    }

    fn expected_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Errors raised by event registration and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Payload could not be serialized for the bus.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Bus data could not be decoded into the handler's payload type.
    #[error("deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),
    /// Handler execution failed.
    #[error("handler execution error: {0}")]
    HandlerExecution(String),
}

// ============================================================================
// Core Event Payloads
// ============================================================================

/// Why a client left the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Client closed the connection itself.
    ClientQuit,
    /// Connection timed out.
    Timeout,
    /// Client was kicked, with the stated cause.
    Kicked(String),
    /// Server is shutting down.
    ServerShutdown,
    /// Transport or protocol error forced the disconnect.
    Error(String),
}

/// Fired once when the host server has finished starting up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInitializedEvent {
    world: String,
    max_slots: usize,
    timestamp: u64,
}

impl ServerInitializedEvent {
    pub fn new(world: impl Into<String>, max_slots: usize) -> Result<Self, ValidationError> {
        let world = world.into();
        require_non_empty("world", &world)?;
        if max_slots == 0 {
            return Err(ValidationError::NonPositive {
                field: "max_slots",
                value: 0,
            });
        }
        Ok(Self {
            world,
            max_slots,
            timestamp: current_timestamp(),
        })
    }

    /// Name of the world the server booted into.
    pub fn world(&self) -> &str {
        &self.world
    }

    /// Capacity of the client slot table.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Fired when the active world is switched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldChangedEvent {
    new_world: String,
    timestamp: u64,
}

impl WorldChangedEvent {
    pub fn new(new_world: impl Into<String>) -> Result<Self, ValidationError> {
        let new_world = new_world.into();
        require_non_empty("new_world", &new_world)?;
        Ok(Self {
            new_world,
            timestamp: current_timestamp(),
        })
    }

    /// Name of the world the server switched to.
    pub fn new_world(&self) -> &str {
        &self.new_world
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Fired when a client's nickname color changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameColorChangedEvent {
    client_id: ClientId,
    color: Color,
    timestamp: u64,
}

impl NameColorChangedEvent {
    pub fn new(client_id: ClientId, color: Color) -> Self {
        Self {
            client_id,
            color,
            timestamp: current_timestamp(),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Fired when a character equips an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEquippedEvent {
    client_id: ClientId,
    item: Item,
    timestamp: u64,
}

impl ItemEquippedEvent {
    pub fn new(client_id: ClientId, item: Item) -> Self {
        Self {
            client_id,
            item,
            timestamp: current_timestamp(),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// The equipped item line (instance name + amount).
    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Fired when a client connection is accepted into the slot table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConnectedEvent {
    client_id: ClientId,
    session_id: SessionId,
    remote_addr: String,
    timestamp: u64,
}

impl ClientConnectedEvent {
    pub fn new(
        client_id: ClientId,
        session_id: SessionId,
        remote_addr: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let remote_addr = remote_addr.into();
        require_non_empty("remote_addr", &remote_addr)?;
        Ok(Self {
            client_id,
            session_id,
            remote_addr,
            timestamp: current_timestamp(),
        })
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Fired when a client leaves the slot table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDisconnectedEvent {
    client_id: ClientId,
    session_id: SessionId,
    reason: DisconnectReason,
    timestamp: u64,
}

impl ClientDisconnectedEvent {
    pub fn new(client_id: ClientId, session_id: SessionId, reason: DisconnectReason) -> Self {
        Self {
            client_id,
            session_id,
            reason,
            timestamp: current_timestamp(),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn reason(&self) -> &DisconnectReason {
        &self.reason
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Raw packet received from a client, routed to plugins before the host
/// interprets it. Plugins own the payload format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketReceivedEvent {
    client_id: ClientId,
    data: Vec<u8>,
    timestamp: u64,
}

impl PacketReceivedEvent {
    pub fn new(client_id: ClientId, data: Vec<u8>) -> Self {
        Self {
            client_id,
            data,
            timestamp: current_timestamp(),
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Raw packet bytes as received.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// Chat command line received from a client (leading slash stripped by the
/// host).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandReceivedEvent {
    client_id: ClientId,
    command: String,
    timestamp: u64,
}

impl CommandReceivedEvent {
    pub fn new(client_id: ClientId, command: impl Into<String>) -> Result<Self, ValidationError> {
        let command = command.into();
        require_non_empty("command", &command)?;
        Ok(Self {
            client_id,
            command,
            timestamp: current_timestamp(),
        })
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_changed_round_trips() {
        let event = WorldChangedEvent::new("NEWWORLD").unwrap();
        assert_eq!(event.new_world(), "NEWWORLD");
        assert!(event.timestamp() > 0);
    }

    #[test]
    fn world_changed_rejects_empty_name() {
        let err = WorldChangedEvent::new("").unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyField { field: "new_world" }
        );
    }

    #[test]
    fn server_initialized_validates_both_fields() {
        let event = ServerInitializedEvent::new("NEWWORLD\\NEWWORLD.ZEN", 128).unwrap();
        assert_eq!(event.world(), "NEWWORLD\\NEWWORLD.ZEN");
        assert_eq!(event.max_slots(), 128);

        assert!(ServerInitializedEvent::new("", 128).is_err());
        assert!(ServerInitializedEvent::new("WORLD.ZEN", 0).is_err());
    }

    #[test]
    fn name_color_changed_round_trips() {
        let event = NameColorChangedEvent::new(ClientId(4), Color::new(255, 80, 0));
        assert_eq!(event.client_id(), ClientId(4));
        assert_eq!(event.color(), Color::new(255, 80, 0));
        assert!(event.timestamp() > 0);
    }

    #[test]
    fn item_equipped_round_trips() {
        let item = Item::new("ITMW_1H_SWORD", 1).unwrap();
        let event = ItemEquippedEvent::new(ClientId(2), item.clone());
        assert_eq!(event.client_id(), ClientId(2));
        assert_eq!(event.item(), &item);
        assert!(event.timestamp() > 0);
    }

    #[test]
    fn client_connected_rejects_empty_address() {
        let err = ClientConnectedEvent::new(ClientId(0), SessionId::new(), "").unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyField {
                field: "remote_addr"
            }
        );
    }

    #[test]
    fn command_received_keeps_text() {
        let event = CommandReceivedEvent::new(ClientId(3), "goto oldcamp").unwrap();
        assert_eq!(event.client_id(), ClientId(3));
        assert_eq!(event.command(), "goto oldcamp");
        assert!(CommandReceivedEvent::new(ClientId(3), "").is_err());
    }

    #[test]
    fn events_serialize_for_the_bus() {
        let event = WorldChangedEvent::new("OLDCAMP").unwrap();
        let bytes = Event::serialize(&event).unwrap();
        let back = <WorldChangedEvent as Event>::deserialize(&bytes).unwrap();
        assert_eq!(back.new_world(), "OLDCAMP");
    }

    #[tokio::test]
    async fn typed_handler_decodes_and_invokes() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicU32::new(0));
        let hits_in_handler = hits.clone();
        let handler = TypedEventHandler::new(
            "test::world_changed".to_string(),
            move |event: WorldChangedEvent| {
                assert_eq!(event.new_world(), "SWAMP");
                hits_in_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        let data = Event::serialize(&WorldChangedEvent::new("SWAMP").unwrap()).unwrap();
        handler.handle(&data).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(handler.expected_type_id(), TypeId::of::<WorldChangedEvent>());
    }
}

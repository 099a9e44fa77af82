//! # Client Registry
//!
//! Connected-client tracking as plugins see it: a slot-bounded, indexable
//! registry of [`Client`]s. Lookups of ids with no connected client yield
//! `None`, never an error — absence is an ordinary answer here.
//!
//! [`SlotClientList`] is the in-memory implementation hosts and tests use;
//! its attach/detach methods hand back the connect/disconnect event payloads
//! so the host can emit them on the bus.

use crate::events::{ClientConnectedEvent, ClientDisconnectedEvent, DisconnectReason};
use crate::types::{require_non_empty, ClientId, SessionId, ValidationError};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// A connected game-session endpoint as exposed to plugins.
pub trait Client: Send + Sync {
    /// Slot this client occupies.
    fn client_id(&self) -> ClientId;

    /// Connection session, unique across reconnects.
    fn session_id(&self) -> SessionId;

    /// Display name the client connected with.
    fn nickname(&self) -> &str;

    /// Remote address in `ip:port` form.
    fn remote_addr(&self) -> &str;
}

/// Plain client record implementing [`Client`].
#[derive(Debug, Clone)]
pub struct ConnectedClient {
    client_id: ClientId,
    session_id: SessionId,
    nickname: String,
    remote_addr: String,
}

impl ConnectedClient {
    pub fn new(
        client_id: ClientId,
        nickname: impl Into<String>,
        remote_addr: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let nickname = nickname.into();
        let remote_addr = remote_addr.into();
        require_non_empty("nickname", &nickname)?;
        require_non_empty("remote_addr", &remote_addr)?;
        Ok(Self {
            client_id,
            session_id: SessionId::new(),
            nickname,
            remote_addr,
        })
    }
}

impl Client for ConnectedClient {
    fn client_id(&self) -> ClientId {
        self.client_id
    }

    fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn nickname(&self) -> &str {
        &self.nickname
    }

    fn remote_addr(&self) -> &str {
        &self.remote_addr
    }
}

/// Read side of the registry, the `IClientList` surface plugins index into.
pub trait ClientRegistry: Send + Sync {
    /// Client at `client_id`, or `None` if no client occupies that slot.
    fn get(&self, client_id: ClientId) -> Option<Arc<dyn Client>>;

    /// Number of currently connected clients.
    fn count(&self) -> usize;

    /// Capacity of the slot table.
    fn max_slots(&self) -> usize;
}

/// Errors raised when attaching a client to the slot table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientListError {
    #[error("client list is full ({max_slots} slots)")]
    Full { max_slots: usize },
    #[error("slot {0} is already occupied")]
    SlotOccupied(ClientId),
    #[error("slot {0} is out of range")]
    OutOfRange(ClientId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Slot-bounded in-memory client list.
pub struct SlotClientList {
    clients: DashMap<ClientId, Arc<dyn Client>>,
    max_slots: usize,
}

impl SlotClientList {
    pub fn new(max_slots: usize) -> Self {
        Self {
            clients: DashMap::new(),
            max_slots,
        }
    }

    /// Places a client into its slot and returns the connected-event payload
    /// for the host to emit.
    pub fn attach(
        &self,
        client: Arc<dyn Client>,
    ) -> Result<ClientConnectedEvent, ClientListError> {
        let id = client.client_id();
        if id.index() >= self.max_slots {
            return Err(ClientListError::OutOfRange(id));
        }
        if self.clients.len() >= self.max_slots {
            return Err(ClientListError::Full {
                max_slots: self.max_slots,
            });
        }

        let event = ClientConnectedEvent::new(id, client.session_id(), client.remote_addr())?;

        match self.clients.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(ClientListError::SlotOccupied(id));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(client);
            }
        }

        info!("client {} attached ({}/{})", id, self.count(), self.max_slots);
        Ok(event)
    }

    /// Removes the client at `client_id`, returning the disconnected-event
    /// payload for the host to emit, or `None` if the slot was empty.
    pub fn detach(
        &self,
        client_id: ClientId,
        reason: DisconnectReason,
    ) -> Option<ClientDisconnectedEvent> {
        let (_, client) = self.clients.remove(&client_id)?;
        info!("client {} detached ({:?})", client_id, reason);
        Some(ClientDisconnectedEvent::new(
            client_id,
            client.session_id(),
            reason,
        ))
    }
}

impl ClientRegistry for SlotClientList {
    fn get(&self, client_id: ClientId) -> Option<Arc<dyn Client>> {
        self.clients.get(&client_id).map(|entry| entry.value().clone())
    }

    fn count(&self) -> usize {
        self.clients.len()
    }

    fn max_slots(&self) -> usize {
        self.max_slots
    }
}

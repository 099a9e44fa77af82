//! # Server Context
//!
//! The seam between plugins and the host server. Plugins receive an
//! `Arc<dyn ServerContext>` at every lifecycle step and use it for
//! everything they need from the host: the event bus, the client registry,
//! the active world, logging, and raw packet egress.
//!
//! The host owns all concurrency: it decides which task a context method
//! runs on, and event dispatch happens synchronously on whatever task it
//! emits from.

use crate::client::{ClientRegistry, SlotClientList};
use crate::system::EventSystem;
use crate::types::ClientId;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Severity for [`ServerContext::log`], routed into the host's tracing
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Errors raised by host-side operations on the context.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("client {0} is not connected")]
    ClientNotConnected(ClientId),
    #[error("network error: {0}")]
    Network(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

/// Host services exposed to plugins.
#[async_trait]
pub trait ServerContext: Send + Sync {
    /// The shared event bus.
    fn events(&self) -> Arc<EventSystem>;

    /// The connected-client registry.
    fn clients(&self) -> Arc<dyn ClientRegistry>;

    /// Name of the currently loaded world.
    fn world(&self) -> String;

    /// Logs through the host's logging pipeline.
    fn log(&self, level: LogLevel, message: &str);

    /// Sends raw bytes to one client.
    async fn send_to_client(&self, client_id: ClientId, data: &[u8]) -> Result<(), ServerError>;

    /// Sends raw bytes to every connected client.
    async fn broadcast(&self, data: &[u8]) -> Result<(), ServerError>;
}

/// Routes a [`LogLevel`] message into tracing. Context implementations can
/// delegate their `log` to this.
pub fn log_with_tracing(level: LogLevel, message: &str) {
    match level {
        LogLevel::Error => error!("{}", message),
        LogLevel::Warn => warn!("{}", message),
        LogLevel::Info => info!("{}", message),
        LogLevel::Debug => debug!("{}", message),
        LogLevel::Trace => tracing::trace!("{}", message),
    }
}

/// In-memory [`ServerContext`] for embedding hosts and tests.
///
/// Carries the event bus, a [`SlotClientList`] and the active world name.
/// Packet egress only checks connectivity — a real host replaces
/// `send_to_client` / `broadcast` with its transport.
pub struct LocalServerContext {
    events: Arc<EventSystem>,
    clients: Arc<SlotClientList>,
    world: std::sync::RwLock<String>,
}

impl LocalServerContext {
    pub fn new(events: Arc<EventSystem>, clients: Arc<SlotClientList>, world: impl Into<String>) -> Self {
        Self {
            events,
            clients,
            world: std::sync::RwLock::new(world.into()),
        }
    }

    /// Swaps the active world name. The host emits the matching
    /// `world_changed` event itself.
    pub fn set_world(&self, world: impl Into<String>) {
        if let Ok(mut current) = self.world.write() {
            *current = world.into();
        }
    }

    /// The slot list backing this context, for attach/detach bookkeeping.
    pub fn client_list(&self) -> Arc<SlotClientList> {
        self.clients.clone()
    }
}

#[async_trait]
impl ServerContext for LocalServerContext {
    fn events(&self) -> Arc<EventSystem> {
        self.events.clone()
    }

    fn clients(&self) -> Arc<dyn ClientRegistry> {
        self.clients.clone()
    }

    fn world(&self) -> String {
        self.world.read().map(|w| w.clone()).unwrap_or_default()
    }

    fn log(&self, level: LogLevel, message: &str) {
        log_with_tracing(level, message);
    }

    async fn send_to_client(&self, client_id: ClientId, data: &[u8]) -> Result<(), ServerError> {
        if self.clients.get(client_id).is_none() {
            return Err(ServerError::ClientNotConnected(client_id));
        }
        debug!("sending {} bytes to client {}", data.len(), client_id);
        Ok(())
    }

    async fn broadcast(&self, data: &[u8]) -> Result<(), ServerError> {
        debug!(
            "broadcasting {} bytes to {} clients",
            data.len(),
            self.clients.count()
        );
        Ok(())
    }
}

/// Decision returned by a [`PacketInterceptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptAction {
    /// Hand the packet on to event dispatch.
    Forward,
    /// Swallow the packet; no event is fired for it.
    Drop,
}

impl InterceptAction {
    pub fn is_forward(&self) -> bool {
        matches!(self, InterceptAction::Forward)
    }
}

/// Inspects inbound raw packets before the host dispatches them as events.
///
/// Interceptors run in registration order; the first `Drop` wins and the
/// remaining interceptors are not consulted.
#[async_trait]
pub trait PacketInterceptor: Send + Sync {
    async fn intercept(&self, client_id: ClientId, packet: &[u8]) -> InterceptAction;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthFilter {
        max_len: usize,
    }

    #[async_trait]
    impl PacketInterceptor for LengthFilter {
        async fn intercept(&self, _client_id: ClientId, packet: &[u8]) -> InterceptAction {
            if packet.len() > self.max_len {
                InterceptAction::Drop
            } else {
                InterceptAction::Forward
            }
        }
    }

    #[tokio::test]
    async fn local_context_checks_connectivity_on_send() {
        use crate::client::ConnectedClient;
        use crate::utils::create_event_system;

        let clients = Arc::new(SlotClientList::new(4));
        let context = LocalServerContext::new(create_event_system(), clients.clone(), "NEWWORLD");

        assert!(matches!(
            context.send_to_client(ClientId(1), b"hi").await,
            Err(ServerError::ClientNotConnected(_))
        ));

        clients
            .attach(Arc::new(
                ConnectedClient::new(ClientId(1), "Diego", "10.0.0.1:28960").unwrap(),
            ))
            .unwrap();
        context.send_to_client(ClientId(1), b"hi").await.unwrap();

        context.set_world("OLDCAMP");
        assert_eq!(context.world(), "OLDCAMP");
    }

    #[tokio::test]
    async fn interceptor_decides_per_packet() {
        let filter = LengthFilter { max_len: 4 };
        assert!(filter
            .intercept(ClientId(0), &[1, 2, 3])
            .await
            .is_forward());
        assert_eq!(
            filter.intercept(ClientId(0), &[0; 16]).await,
            InterceptAction::Drop
        );
    }
}

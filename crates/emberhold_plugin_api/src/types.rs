//! # Core Type Definitions
//!
//! Fundamental identifier and value types shared by the rest of the plugin
//! API. Everything here is a thin, strongly typed wrapper so that a client
//! slot can never be confused with a session, and invalid values are caught
//! at construction rather than deep inside a handler.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Slot index of a connected client.
///
/// The host server tracks clients in a fixed-capacity slot table; this id is
/// the index into that table. It is only meaningful while the client is
/// connected — after a disconnect the same slot may be reused for a new
/// session, which is what [`SessionId`] disambiguates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u16);

impl ClientId {
    /// Returns the raw slot index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one connection session.
///
/// Generated when the connection is accepted and never reused, unlike the
/// slot-based [`ClientId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random session id using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// RGB color used for client nickname rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Invalid-argument failure raised by validating constructors.
///
/// Every event payload and value type in this crate validates its required
/// fields when constructed; this is the error they all report with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required string field was empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    /// A numeric field that must be strictly positive was not.
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: i64 },
}

/// Checks that a required string field is non-empty.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::EmptyField { field })
    } else {
        Ok(())
    }
}

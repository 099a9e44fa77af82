//! Event system module, broken down into manageable components.

mod core;
mod emitters;
mod handlers;
mod stats;

pub use self::core::EventSystem;
pub use stats::EventSystemStats;

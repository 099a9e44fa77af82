//! # Scripting Bridge
//!
//! The narrow seam to the host's embedded scripting runtime. The host owns
//! the VM; plugins only get [`ScriptBridge::call`] — invoke a named script
//! function with positional arguments and get one value back.
//!
//! [`ScriptInventory`] adapts the [`Inventory`] contract onto that seam. The
//! native side exposes exactly two mutations (`giveItem` / `removeItem`) and
//! no queries, so the adapter keeps a local mirror of the stacks to answer
//! `has_item` / `get_item` / `items` without round-tripping into the VM.

use crate::inventory::{Inventory, InventoryError, Item, StackedInventory};
use crate::types::ClientId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A value passed to or returned from a script function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptValue {
    Int(i64),
    Str(String),
    Bool(bool),
    Unit,
}

impl From<i64> for ScriptValue {
    fn from(v: i64) -> Self {
        ScriptValue::Int(v)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        ScriptValue::Str(v.to_string())
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        ScriptValue::Bool(v)
    }
}

/// Errors surfaced by the scripting runtime.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    /// No script function with this name is exported by the runtime.
    #[error("unknown script function '{0}'")]
    UnknownFunction(String),
    /// The function exists but its invocation failed.
    #[error("script function '{function}' failed: {message}")]
    CallFailed { function: String, message: String },
}

/// Host-implemented seam to the embedded scripting runtime.
///
/// Calls are in-process and synchronous; the host decides which functions
/// are exported and on which thread the VM runs.
pub trait ScriptBridge: Send + Sync {
    fn call(&self, function: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError>;
}

/// Inventory adapter over the scripting bridge.
///
/// Mutations are forwarded to the native `giveItem` / `removeItem` exports
/// for the owning client and applied to the local mirror only after the
/// bridge accepts them, so a rejected call leaves the mirror untouched.
pub struct ScriptInventory<B: ScriptBridge> {
    bridge: B,
    owner: ClientId,
    mirror: StackedInventory,
}

impl<B: ScriptBridge> ScriptInventory<B> {
    pub fn new(bridge: B, owner: ClientId) -> Self {
        Self {
            bridge,
            owner,
            mirror: StackedInventory::new(),
        }
    }

    /// The client whose native inventory this adapter drives.
    pub fn owner(&self) -> ClientId {
        self.owner
    }

    fn call_native(
        &self,
        function: &str,
        instance: &str,
        amount: u32,
    ) -> Result<(), InventoryError> {
        let args = [
            ScriptValue::Int(self.owner.0 as i64),
            ScriptValue::from(instance),
            ScriptValue::Int(amount as i64),
        ];
        debug!(
            "forwarding {}({}, '{}', {}) to script runtime",
            function, self.owner, instance, amount
        );
        self.bridge.call(function, &args)?;
        Ok(())
    }
}

impl<B: ScriptBridge> Inventory for ScriptInventory<B> {
    fn add_item(&mut self, instance: &str, amount: u32) -> Result<(), InventoryError> {
        // Validate against the mirror first so the bridge never sees
        // arguments the contract forbids.
        let mut staged = self.mirror.clone();
        staged.add_item(instance, amount)?;

        self.call_native("giveItem", instance, amount)?;
        self.mirror = staged;
        Ok(())
    }

    fn remove_item(&mut self, instance: &str, amount: u32) -> Result<(), InventoryError> {
        let mut staged = self.mirror.clone();
        staged.remove_item(instance, amount)?;

        self.call_native("removeItem", instance, amount)?;
        self.mirror = staged;
        Ok(())
    }

    fn get_item(&self, instance: &str) -> Result<Item, InventoryError> {
        self.mirror.get_item(instance)
    }

    fn has_item(&self, instance: &str) -> bool {
        self.mirror.has_item(instance)
    }

    fn items(&self) -> Vec<Item> {
        self.mirror.items()
    }

    fn clear(&mut self) {
        // The native side has no bulk clear; remove line by line.
        for item in self.mirror.items() {
            if self
                .call_native("removeItem", item.instance(), item.amount())
                .is_err()
            {
                continue;
            }
            let _ = self.mirror.remove_item(item.instance(), item.amount());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and optionally fails a named function.
    struct RecordingBridge {
        calls: Mutex<Vec<(String, Vec<ScriptValue>)>>,
        fail_function: Option<String>,
    }

    impl RecordingBridge {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_function: None,
            }
        }

        fn failing_on(function: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_function: Some(function.to_string()),
            }
        }

        fn calls(&self) -> Vec<(String, Vec<ScriptValue>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ScriptBridge for &RecordingBridge {
        fn call(&self, function: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
            self.calls
                .lock()
                .unwrap()
                .push((function.to_string(), args.to_vec()));
            if self.fail_function.as_deref() == Some(function) {
                return Err(ScriptError::CallFailed {
                    function: function.to_string(),
                    message: "native rejected".to_string(),
                });
            }
            Ok(ScriptValue::Unit)
        }
    }

    #[test]
    fn add_forwards_give_item_with_owner_and_args() {
        let bridge = RecordingBridge::new();
        let mut inv = ScriptInventory::new(&bridge, ClientId(4));

        inv.add_item("ITMW_1H_SWORD", 1).unwrap();

        let calls = bridge.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "giveItem");
        assert_eq!(
            calls[0].1,
            vec![
                ScriptValue::Int(4),
                ScriptValue::from("ITMW_1H_SWORD"),
                ScriptValue::Int(1),
            ]
        );
        assert!(inv.has_item("ITMW_1H_SWORD"));
    }

    #[test]
    fn remove_forwards_remove_item_and_updates_mirror() {
        let bridge = RecordingBridge::new();
        let mut inv = ScriptInventory::new(&bridge, ClientId(2));

        inv.add_item("ITFO_APPLE", 5).unwrap();
        inv.remove_item("ITFO_APPLE", 2).unwrap();

        let calls = bridge.calls();
        assert_eq!(calls[1].0, "removeItem");
        assert_eq!(inv.get_item("ITFO_APPLE").unwrap().amount(), 3);
    }

    #[test]
    fn bridge_failure_leaves_mirror_untouched() {
        let bridge = RecordingBridge::failing_on("giveItem");
        let mut inv = ScriptInventory::new(&bridge, ClientId(0));

        let err = inv.add_item("ITFO_APPLE", 1).unwrap_err();
        assert!(matches!(err, InventoryError::Bridge(_)));
        assert!(!inv.has_item("ITFO_APPLE"));
    }

    #[test]
    fn over_removal_fails_before_touching_the_bridge() {
        let bridge = RecordingBridge::new();
        let mut inv = ScriptInventory::new(&bridge, ClientId(0));
        inv.add_item("ITFO_BEER", 1).unwrap();

        assert!(inv.remove_item("ITFO_BEER", 3).is_err());
        // Only the giveItem call was made; the invalid removal never hit the
        // native side.
        assert_eq!(bridge.calls().len(), 1);
        assert_eq!(inv.get_item("ITFO_BEER").unwrap().amount(), 1);
    }

    #[test]
    fn overflowing_add_fails_before_touching_the_bridge() {
        let bridge = RecordingBridge::new();
        let mut inv = ScriptInventory::new(&bridge, ClientId(0));
        inv.add_item("ITMI_GOLD", u32::MAX).unwrap();

        let err = inv.add_item("ITMI_GOLD", 1).unwrap_err();
        assert!(matches!(err, InventoryError::AmountOverflow { .. }));
        // One giveItem call; the overflowing addition never reached the
        // native side, so mirror and native inventory still agree.
        assert_eq!(bridge.calls().len(), 1);
        assert_eq!(inv.get_item("ITMI_GOLD").unwrap().amount(), u32::MAX);
    }

    #[test]
    fn clear_removes_each_line_natively() {
        let bridge = RecordingBridge::new();
        let mut inv = ScriptInventory::new(&bridge, ClientId(1));
        inv.add_item("ITFO_APPLE", 2).unwrap();
        inv.add_item("ITMI_GOLD", 10).unwrap();

        inv.clear();

        assert!(inv.items().is_empty());
        let removes = bridge
            .calls()
            .iter()
            .filter(|(f, _)| f == "removeItem")
            .count();
        assert_eq!(removes, 2);
    }
}

//! # Inventory Surface
//!
//! The keyed-multiset inventory contract the host exposes per character:
//! stacks of items keyed by their engine instance name. [`StackedInventory`]
//! is the in-memory reference implementation; the host may instead back the
//! trait with its native inventory (see
//! [`ScriptInventory`](crate::script::ScriptInventory)).

use crate::script::ScriptError;
use crate::types::{require_non_empty, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One inventory line: an instance name plus how many of it are held.
///
/// Validated at construction (positive amount, non-empty instance name) and
/// immutable afterwards. Owned exclusively by the inventory holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    instance: String,
    amount: u32,
}

impl Item {
    /// Creates a new item line.
    ///
    /// Fails with [`ValidationError`] if `instance` is empty or `amount` is
    /// zero.
    pub fn new(instance: impl Into<String>, amount: u32) -> Result<Self, ValidationError> {
        let instance = instance.into();
        require_non_empty("instance", &instance)?;
        if amount == 0 {
            return Err(ValidationError::NonPositive {
                field: "amount",
                value: 0,
            });
        }
        Ok(Self { instance, amount })
    }

    /// Instance name recognized by the engine's content database.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Held amount, always positive.
    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Builds an item from stack state whose invariants already hold.
    pub(crate) fn from_stack(instance: String, amount: u32) -> Self {
        debug_assert!(!instance.is_empty() && amount > 0);
        Self { instance, amount }
    }
}

/// Errors raised by inventory operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Lookup or removal against an instance name that is not held.
    #[error("no item with instance name '{0}' is held")]
    UnknownInstance(String),
    /// Removal amount exceeds what is held.
    #[error("cannot remove {requested} of '{instance}', only {held} held")]
    InsufficientAmount {
        instance: String,
        requested: u32,
        held: u32,
    },
    /// Addition would push the stack past the representable amount.
    #[error("cannot add {requested} of '{instance}', {held} already held")]
    AmountOverflow {
        instance: String,
        requested: u32,
        held: u32,
    },
    /// Invalid instance name or amount.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The scripting bridge rejected a forwarded mutation.
    #[error(transparent)]
    Bridge(#[from] ScriptError),
}

/// CRUD-style operations over a set of named, stackable items.
///
/// Adding an instance that is already held grows its stack; removing the
/// whole stack drops the line. `get_item` and `remove_item` signal absence
/// and over-removal through [`InventoryError`] and leave the caller to
/// decide — no recovery is attempted here.
pub trait Inventory: Send + Sync {
    /// Adds `amount` of `instance`, stacking onto an existing line.
    fn add_item(&mut self, instance: &str, amount: u32) -> Result<(), InventoryError>;

    /// Removes `amount` of `instance`.
    ///
    /// Fails without changing anything if the instance is absent or the
    /// amount exceeds the held stack.
    fn remove_item(&mut self, instance: &str, amount: u32) -> Result<(), InventoryError>;

    /// Returns the current line for `instance`.
    fn get_item(&self, instance: &str) -> Result<Item, InventoryError>;

    /// Whether any amount of `instance` is held.
    fn has_item(&self, instance: &str) -> bool;

    /// All held lines, in no particular order.
    fn items(&self) -> Vec<Item>;

    /// Drops every line.
    fn clear(&mut self);
}

/// In-memory inventory stacking items by instance name.
#[derive(Debug, Default, Clone)]
pub struct StackedInventory {
    stacks: HashMap<String, u32>,
}

impl StackedInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate(instance: &str, amount: u32) -> Result<(), InventoryError> {
        require_non_empty("instance", instance)?;
        if amount == 0 {
            return Err(ValidationError::NonPositive {
                field: "amount",
                value: 0,
            }
            .into());
        }
        Ok(())
    }
}

impl Inventory for StackedInventory {
    fn add_item(&mut self, instance: &str, amount: u32) -> Result<(), InventoryError> {
        Self::validate(instance, amount)?;
        let held = self.stacks.get(instance).copied().unwrap_or(0);
        let total = held
            .checked_add(amount)
            .ok_or_else(|| InventoryError::AmountOverflow {
                instance: instance.to_string(),
                requested: amount,
                held,
            })?;
        self.stacks.insert(instance.to_string(), total);
        Ok(())
    }

    fn remove_item(&mut self, instance: &str, amount: u32) -> Result<(), InventoryError> {
        Self::validate(instance, amount)?;
        let held = *self
            .stacks
            .get(instance)
            .ok_or_else(|| InventoryError::UnknownInstance(instance.to_string()))?;

        if amount > held {
            return Err(InventoryError::InsufficientAmount {
                instance: instance.to_string(),
                requested: amount,
                held,
            });
        }

        if amount == held {
            self.stacks.remove(instance);
        } else {
            self.stacks.insert(instance.to_string(), held - amount);
        }
        Ok(())
    }

    fn get_item(&self, instance: &str) -> Result<Item, InventoryError> {
        self.stacks
            .get(instance)
            .map(|&amount| Item::from_stack(instance.to_string(), amount))
            .ok_or_else(|| InventoryError::UnknownInstance(instance.to_string()))
    }

    fn has_item(&self, instance: &str) -> bool {
        self.stacks.contains_key(instance)
    }

    fn items(&self) -> Vec<Item> {
        self.stacks
            .iter()
            .map(|(instance, &amount)| Item::from_stack(instance.clone(), amount))
            .collect()
    }

    fn clear(&mut self) {
        self.stacks.clear();
    }
}

//! Slot hook bookkeeping
//!
//! Maps method table indices to hooks installed through a [`HookEngine`].

use std::collections::BTreeMap;

use super::engine::HookEngine;
use crate::error::SessionError;
use crate::table::MethodTable;

/// A bound slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookRecord {
    /// Slot value captured at bind time
    pub target: *const (),
    pub replacement: *const (),
    /// Trampoline reproducing the target's original behavior
    pub original: *const (),
}

// SAFETY: Records only carry addresses, never dereferenced by the registry
unsafe impl Send for HookRecord {}
unsafe impl Sync for HookRecord {}

/// Hooks bound to slots of the active method table
#[derive(Debug, Default)]
pub struct HookRegistry {
    records: BTreeMap<usize, HookRecord>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect the function in slot `index` to `replacement`
    ///
    /// Returns the pointer to call the original function.
    ///
    /// # Safety
    /// `replacement` must be a function whose signature and calling
    /// convention match the function in slot `index`
    pub unsafe fn bind(
        &mut self,
        engine: &mut dyn HookEngine,
        table: &MethodTable,
        index: usize,
        replacement: *const (),
    ) -> Result<*const (), SessionError> {
        let target = table.get(index).ok_or(SessionError::SlotOutOfRange {
            index,
            len: table.len(),
        })?;
        if target.is_null() {
            return Err(SessionError::EmptySlot(index));
        }
        if replacement.is_null() {
            return Err(SessionError::NullPointer);
        }
        if self.records.contains_key(&index) {
            return Err(SessionError::SlotAlreadyBound(index));
        }

        let original = engine.create_hook(target, replacement)?;

        if let Err(e) = engine.enable_hook(target) {
            if let Err(remove_err) = engine.remove_hook(target) {
                tracing::warn!(
                    "Failed to remove half-created hook at {:x}: {}",
                    target as usize,
                    remove_err
                );
            }
            return Err(e.into());
        }

        self.records.insert(
            index,
            HookRecord {
                target,
                replacement,
                original,
            },
        );

        tracing::info!(
            "Bound slot {} ({:x} -> {:x})",
            index,
            target as usize,
            replacement as usize
        );

        Ok(original)
    }

    /// Remove the hook on slot `index`, if there is one
    ///
    /// If the engine cannot remove the hook it is disabled instead and the
    /// slot stays bound, so a later `unbind` can retry.
    pub fn unbind(&mut self, engine: &mut dyn HookEngine, index: usize) {
        let Some(target) = self.records.get(&index).map(|record| record.target) else {
            return;
        };

        if let Err(e) = engine.remove_hook(target) {
            tracing::warn!("Failed to remove hook on slot {}, keeping it bound: {}", index, e);
            if let Err(e) = engine.disable_hook(target) {
                tracing::error!("Failed to disable hook on slot {}: {}", index, e);
            }
            return;
        }

        self.records.remove(&index);
        tracing::info!("Unbound slot {}", index);
    }

    pub fn is_bound(&self, index: usize) -> bool {
        self.records.contains_key(&index)
    }

    pub fn get(&self, index: usize) -> Option<&HookRecord> {
        self.records.get(&index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

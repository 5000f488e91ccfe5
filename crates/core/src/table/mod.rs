//! Unified method table
//!
//! Harvested dispatch slots are concatenated into one flat [`MethodTable`].
//! [`TableBuilder`] enforces the backend's [`TableLayout`]: every sub-table
//! is filled exactly once, in order, with exactly its published slot count.

pub mod harvest;
pub mod layout;

pub use harvest::read_dispatch_table;
pub use layout::{NamedSlot, SlotManifest, SubTable, SubTableEntry, TableLayout};

use crate::backend::Backend;
use crate::error::SessionError;

/// Owned, contiguous array of dispatch slot addresses
pub struct MethodTable {
    layout: &'static TableLayout,
    slots: Box<[*const ()]>,
}

// SAFETY: Slots are plain addresses; the table never dereferences them
unsafe impl Send for MethodTable {}
unsafe impl Sync for MethodTable {}

impl MethodTable {
    pub fn backend(&self) -> Backend {
        self.layout.backend
    }

    pub fn layout(&self) -> &'static TableLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot value, or `None` if `index` is out of range
    ///
    /// The value itself may be null for symbol-table backends.
    pub fn get(&self, index: usize) -> Option<*const ()> {
        self.slots.get(index).copied()
    }

    pub fn as_slice(&self) -> &[*const ()] {
        &self.slots
    }

    /// Pointer to the first slot, valid while the table is alive
    pub fn as_ptr(&self) -> *const *const () {
        self.slots.as_ptr()
    }

    /// Slots of the named sub-table
    pub fn sub_table(&self, name: &str) -> Option<&[*const ()]> {
        let start = self.layout.sub_table_start(name)?;
        let sub = self.layout.sub_tables.iter().find(|sub| sub.name == name)?;
        self.slots.get(start..start + sub.count)
    }

    /// Number of slots left empty (unresolved symbols)
    pub fn null_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_null()).count()
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("backend", &self.layout.backend)
            .field("len", &self.slots.len())
            .field("null_slots", &self.null_slots())
            .finish()
    }
}

/// Assembles a [`MethodTable`] sub-table by sub-table
pub struct TableBuilder {
    layout: &'static TableLayout,
    slots: Vec<*const ()>,
    filled: usize,
}

impl TableBuilder {
    pub fn new(layout: &'static TableLayout) -> Self {
        Self {
            layout,
            slots: Vec::with_capacity(layout.len()),
            filled: 0,
        }
    }

    pub fn layout(&self) -> &'static TableLayout {
        self.layout
    }

    /// The sub-table expected next, if any remain
    pub fn next_sub_table(&self) -> Option<&'static SubTable> {
        self.layout.sub_tables.get(self.filled)
    }

    /// Append the next sub-table
    pub fn push(&mut self, name: &str, slots: &[*const ()]) -> Result<(), SessionError> {
        let expected = self
            .next_sub_table()
            .ok_or_else(|| SessionError::SubTableMismatch {
                expected: "end of table".to_string(),
                found: name.to_string(),
            })?;

        if expected.name != name || expected.count != slots.len() {
            return Err(SessionError::SubTableMismatch {
                expected: format!("{} ({} slots)", expected.name, expected.count),
                found: format!("{} ({} slots)", name, slots.len()),
            });
        }

        tracing::debug!(
            "Harvested {} slots of {} at index {}",
            slots.len(),
            name,
            self.slots.len()
        );

        self.slots.extend_from_slice(slots);
        self.filled += 1;
        Ok(())
    }

    /// Finish the table; every sub-table must have been pushed
    pub fn finish(self) -> Result<MethodTable, SessionError> {
        if self.filled != self.layout.sub_tables.len() {
            return Err(SessionError::TableIncomplete {
                filled: self.slots.len(),
                expected: self.layout.len(),
            });
        }

        Ok(MethodTable {
            layout: self.layout,
            slots: self.slots.into_boxed_slice(),
        })
    }
}

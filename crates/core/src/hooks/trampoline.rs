//! Trampoline slots
//!
//! Each hook gets a fixed-size slot of executable memory holding its
//! relocated prologue, the jump back into the target and, when needed, an
//! absolute-jump relay to the detour. Slots are carved from pages mapped as
//! close to the hooked code as possible so those jumps fit in a rel32.
//!
//! Reserving a slot is two-step: [`TrampolineArena::peek`] hands out the
//! next free slot without consuming it and [`TrampolineArena::commit`]
//! consumes it once the hook is known to be valid. Pages are never unmapped,
//! so an original-function pointer stays callable after its hook is removed.

use std::collections::BTreeMap;
use std::ptr::NonNull;

use parking_lot::{Mutex, MutexGuard};

const PAGE_SIZE: usize = 4096;

/// Bytes per trampoline slot
pub const SLOT_SIZE: usize = 64;

const SLOTS_PER_PAGE: usize = PAGE_SIZE / SLOT_SIZE;

/// Largest distance between a page and the code it serves; leaves room for
/// the page itself inside a signed 32-bit displacement
const REACH: usize = 0x7FFF_0000;

/// Distance between successive mapping hints
#[cfg(unix)]
const HINT_STEP: usize = PAGE_SIZE * 64;

/// `VirtualAlloc` reserves on 64KB boundaries
#[cfg(windows)]
const HINT_STEP: usize = 0x1_0000;

#[cfg(not(any(unix, windows)))]
const HINT_STEP: usize = PAGE_SIZE;

static ARENA: Mutex<TrampolineArena> = Mutex::new(TrampolineArena::new());

/// Lock the process-wide arena
pub fn arena() -> MutexGuard<'static, TrampolineArena> {
    ARENA.lock()
}

/// Whether a slot can reach the code it was requested for with rel32 jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    Near,
    /// Only absolute jumps connect the target and the slot
    Far,
}

/// An unconsumed trampoline slot from [`TrampolineArena::peek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    page: usize,
    index: usize,
    reach: Reach,
}

impl Slot {
    pub fn address(&self) -> usize {
        self.page + self.index * SLOT_SIZE
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.address() as *mut u8
    }

    pub fn reach(&self) -> Reach {
        self.reach
    }
}

/// Executable pages and the number of slots consumed in each
pub struct TrampolineArena {
    pages: BTreeMap<usize, usize>,
}

impl TrampolineArena {
    pub const fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// Next free slot for a hook on `target`, mapping a page if none has room
    ///
    /// Near pages are preferred; a far slot is only returned when nothing
    /// can be mapped within reach.
    pub fn peek(&mut self, target: usize) -> Option<Slot> {
        let low = target.saturating_sub(REACH);
        let high = target.saturating_add(REACH);

        let near = self
            .pages
            .range(low..=high)
            .find(|(_, used)| **used < SLOTS_PER_PAGE)
            .map(|(page, _)| *page);

        let (page, reach) = match near.or_else(|| self.map_near(target)) {
            Some(page) => (page, Reach::Near),
            None => (self.any_free().or_else(|| self.map_anywhere())?, Reach::Far),
        };

        Some(Slot {
            page,
            index: self.pages.get(&page).copied().unwrap_or(0),
            reach,
        })
    }

    /// Consume `slot`; later peeks return the slot after it
    pub fn commit(&mut self, slot: &Slot) {
        if let Some(used) = self.pages.get_mut(&slot.page) {
            *used = (*used).max(slot.index + 1);
        }
    }

    /// Slots consumed across every page
    pub fn committed(&self) -> usize {
        self.pages.values().sum()
    }

    fn any_free(&self) -> Option<usize> {
        self.pages
            .iter()
            .find(|(_, used)| **used < SLOTS_PER_PAGE)
            .map(|(page, _)| *page)
    }

    fn map_near(&mut self, target: usize) -> Option<usize> {
        let page = hints(target).find_map(|hint| {
            let base = map_page(Some(hint))?;
            if base.abs_diff(target) <= REACH {
                Some(base)
            } else {
                unmap_page(base);
                None
            }
        })?;

        tracing::debug!("Mapped trampoline page {:x} near {:x}", page, target);
        self.pages.insert(page, 0);
        Some(page)
    }

    fn map_anywhere(&mut self) -> Option<usize> {
        let page = map_page(None)?;
        tracing::warn!("No trampoline page within reach, mapped {:x}", page);
        self.pages.insert(page, 0);
        Some(page)
    }
}

impl Default for TrampolineArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Hint addresses alternating below and above `target`, nearest first
fn hints(target: usize) -> impl Iterator<Item = usize> {
    let origin = target & !(HINT_STEP - 1);
    (1..=REACH / HINT_STEP)
        .flat_map(move |step| {
            let offset = step * HINT_STEP;
            [origin.checked_sub(offset), origin.checked_add(offset)]
        })
        .flatten()
        .filter(|hint| *hint >= HINT_STEP)
}

#[cfg(unix)]
fn map_page(hint: Option<usize>) -> Option<usize> {
    use nix::sys::mman::{mmap_anonymous, MapFlags, ProtFlags};
    use std::num::NonZeroUsize;

    let length = NonZeroUsize::new(PAGE_SIZE)?;
    // SAFETY: A fresh anonymous private mapping aliases nothing
    let mapped = unsafe {
        mmap_anonymous(
            hint.and_then(NonZeroUsize::new),
            length,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE | ProtFlags::PROT_EXEC,
            MapFlags::MAP_PRIVATE | MapFlags::MAP_ANONYMOUS,
        )
    };

    match mapped {
        Ok(base) => Some(base.as_ptr() as usize),
        Err(e) => {
            if hint.is_none() {
                tracing::error!("Failed to map trampoline page: {}", e);
            }
            None
        }
    }
}

#[cfg(unix)]
fn unmap_page(base: usize) {
    if let Some(base) = NonNull::new(base as *mut std::ffi::c_void) {
        // SAFETY: `base` was just mapped by `map_page` and never handed out
        let _ = unsafe { nix::sys::mman::munmap(base, PAGE_SIZE) };
    }
}

#[cfg(windows)]
fn map_page(hint: Option<usize>) -> Option<usize> {
    use windows::Win32::System::Memory::{
        VirtualAlloc, MEM_COMMIT, MEM_RESERVE, PAGE_EXECUTE_READWRITE,
    };

    // SAFETY: Reserving fresh memory aliases nothing
    let base = unsafe {
        VirtualAlloc(
            hint.map(|hint| hint as *const std::ffi::c_void),
            PAGE_SIZE,
            MEM_COMMIT | MEM_RESERVE,
            PAGE_EXECUTE_READWRITE,
        )
    };
    NonNull::new(base).map(|base| base.as_ptr() as usize)
}

#[cfg(windows)]
fn unmap_page(base: usize) {
    use windows::Win32::System::Memory::{VirtualFree, MEM_RELEASE};

    // SAFETY: `base` was just reserved by `map_page` and never handed out
    let _ = unsafe { VirtualFree(base as *mut std::ffi::c_void, 0, MEM_RELEASE) };
}

#[cfg(not(any(unix, windows)))]
fn map_page(_hint: Option<usize>) -> Option<usize> {
    None
}

#[cfg(not(any(unix, windows)))]
fn unmap_page(_base: usize) {}

#[cfg(all(test, any(unix, windows)))]
mod tests {
    use super::*;

    fn own_code() -> usize {
        own_code as usize
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut arena = TrampolineArena::new();
        let first = arena.peek(own_code()).unwrap();
        let again = arena.peek(own_code()).unwrap();

        assert_eq!(first, again);
        assert_eq!(arena.committed(), 0);
    }

    #[test]
    fn test_commit_advances_to_distinct_slots() {
        let mut arena = TrampolineArena::new();

        let mut addresses = Vec::new();
        for _ in 0..3 {
            let slot = arena.peek(own_code()).unwrap();
            arena.commit(&slot);
            addresses.push(slot.address());
        }

        assert_eq!(addresses[1], addresses[0] + SLOT_SIZE);
        assert_eq!(addresses[2], addresses[1] + SLOT_SIZE);
        assert_eq!(arena.committed(), 3);
    }

    #[test]
    fn test_slots_are_near_own_code() {
        let mut arena = TrampolineArena::new();
        let slot = arena.peek(own_code()).unwrap();

        assert_eq!(slot.reach(), Reach::Near);
        assert!(slot.address().abs_diff(own_code()) <= REACH + PAGE_SIZE);
    }

    #[test]
    fn test_full_page_maps_another() {
        let mut arena = TrampolineArena::new();
        let first = arena.peek(own_code()).unwrap();
        for _ in 0..SLOTS_PER_PAGE {
            let slot = arena.peek(own_code()).unwrap();
            arena.commit(&slot);
        }

        let next = arena.peek(own_code()).unwrap();
        assert_ne!(next.page, first.page);
        assert_eq!(next.index, 0);
        assert_eq!(arena.pages.len(), 2);
    }

    #[test]
    fn test_hints_alternate_outward() {
        let target = 0x4000_0000;
        let hints: Vec<usize> = hints(target).take(4).collect();
        assert_eq!(
            hints,
            vec![
                target - HINT_STEP,
                target + HINT_STEP,
                target - 2 * HINT_STEP,
                target + 2 * HINT_STEP
            ]
        );
    }
}

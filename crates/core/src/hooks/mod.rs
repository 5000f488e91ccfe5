//! Hook system
//!
//! - [`HookEngine`]: redirects a function address to a detour
//! - [`InlineHookEngine`]: native x86/x86_64 implementation with relocated
//!   trampolines
//! - [`HookRegistry`]: which method table slots are bound, and to what
//! - [`SlotHook`] / [`slot_hook!`](crate::slot_hook): typed wrappers over
//!   session binds

pub mod engine;
pub mod inline;
pub mod registry;
pub mod trampoline;
pub mod typed;

pub use engine::{HookEngine, HookError};
pub use inline::InlineHookEngine;
pub use registry::{HookRecord, HookRegistry};
pub use typed::SlotHook;

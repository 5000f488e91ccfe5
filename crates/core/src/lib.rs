//! renderhook Core - Method Tables, Slot Hooks and Session Lifecycle
//!
//! This crate turns a graphics backend loaded in the current process into a
//! flat table of dispatch slot addresses and binds hooks to those slots.
//!
//! # Overview
//!
//! ```ignore
//! use renderhook_core::{Backend, Session};
//! use renderhook_sdk::slots;
//!
//! let mut session = Session::native();
//! session.init(Backend::Auto)?;
//!
//! let original = unsafe { session.bind(slots::d3d11::PRESENT, present_detour as *const ())? };
//! // ...
//! session.shutdown();
//! ```
//!
//! # Re-exports
//!
//! This crate re-exports the SDK and platform crates for convenience:
//! - [`sdk`] - Module names, layouts, symbol lists and well-known slots
//! - [`platform`] - Module lookup and dummy window services

pub use renderhook_platform as platform;
pub use renderhook_sdk as sdk;

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod hooks;
pub mod session;
pub mod status;
pub mod table;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use backend::{Backend, BackendSet, UnknownBackend};
pub use backends::{BackendRegistry, ContextStrategy, RenderBackend};
pub use config::{ConfigError, SessionConfig};
pub use error::SessionError;
pub use hooks::{HookEngine, HookError, InlineHookEngine, SlotHook};
pub use session::Session;
pub use status::Status;
pub use table::{MethodTable, SlotManifest, TableLayout};

#[doc(hidden)]
pub mod __private {
    pub use paste;
}

//! renderhook Platform - OS Services
//!
//! This crate handles:
//! - Checking whether a backend library is already loaded in the process
//! - Resolving exported symbols from such a library
//! - Creating and destroying the invisible window device construction needs
//!
//! # Architecture
//!
//! Everything the rest of the workspace needs from the OS goes through the
//! [`Platform`] trait, so the core can be driven by a fake in tests.
//! [`NativePlatform`] is the real implementation.

pub mod error;
pub mod loader;
pub mod window;

use std::ffi::c_void;
use std::ptr::NonNull;

pub use error::PlatformError;
pub use loader::LoadedModule;
pub use window::WindowHandle;

/// OS module and window services consumed by the core
pub trait Platform: Send + Sync {
    /// Whether `module` is already loaded in this process
    fn is_module_loaded(&self, module: &str) -> bool;

    /// Resolve `symbol` exported by the already-loaded `module`
    ///
    /// Returns [`PlatformError::ModuleNotLoaded`] if the module is absent and
    /// `Ok(None)` if it is present but does not export the symbol.
    fn resolve_symbol(
        &self,
        module: &str,
        symbol: &str,
    ) -> Result<Option<NonNull<c_void>>, PlatformError>;

    /// Resolve many symbols from one module, preserving order
    fn resolve_symbols(
        &self,
        module: &str,
        symbols: &[&str],
    ) -> Result<Vec<Option<NonNull<c_void>>>, PlatformError> {
        symbols
            .iter()
            .map(|symbol| self.resolve_symbol(module, symbol))
            .collect()
    }

    /// Register the dummy window class and create an invisible window
    fn create_dummy_window(&self) -> Result<WindowHandle, PlatformError>;

    /// Destroy a window from [`Platform::create_dummy_window`] and unregister its class
    fn destroy_dummy_window(&self, window: WindowHandle);
}

/// Platform services backed by the running OS
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePlatform;

impl NativePlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for NativePlatform {
    fn is_module_loaded(&self, module: &str) -> bool {
        matches!(LoadedModule::find(module), Ok(Some(_)))
    }

    fn resolve_symbol(
        &self,
        module: &str,
        symbol: &str,
    ) -> Result<Option<NonNull<c_void>>, PlatformError> {
        LoadedModule::require(module)?.symbol(symbol)
    }

    fn resolve_symbols(
        &self,
        module: &str,
        symbols: &[&str],
    ) -> Result<Vec<Option<NonNull<c_void>>>, PlatformError> {
        // One lookup for the whole batch
        let loaded = LoadedModule::require(module)?;
        symbols.iter().map(|symbol| loaded.symbol(symbol)).collect()
    }

    fn create_dummy_window(&self) -> Result<WindowHandle, PlatformError> {
        window::create_dummy_window()
    }

    fn destroy_dummy_window(&self, window: WindowHandle) {
        window::destroy_dummy_window(window)
    }
}

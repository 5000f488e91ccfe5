//! Backend strategies
//!
//! Each supported API is a [`RenderBackend`] that knows how to produce the
//! backend's [`MethodTable`]. Which strategies a session may use is decided
//! at runtime through a [`BackendRegistry`].
//!
//! # Strategy kinds
//!
//! - Object-based (Direct3D): a throwaway device is built in a dummy window
//!   and its dispatch tables are read, see [`factory`]
//! - Symbol-table (OpenGL, Vulkan): exported entry points are resolved by
//!   name, see [`symbols`]

pub mod factory;
pub mod symbols;

#[cfg(windows)]
mod dxgi;

#[cfg(windows)]
pub mod d3d9;

#[cfg(windows)]
pub mod d3d10;

#[cfg(windows)]
pub mod d3d11;

#[cfg(windows)]
pub mod d3d12;

use renderhook_platform::Platform;

pub use factory::{ContextStrategy, MinimalContextFactory, ObjectBackend};
pub use symbols::SymbolTableBackend;

use crate::backend::{Backend, BackendSet};
use crate::error::SessionError;
use crate::table::MethodTable;

/// A strategy producing the method table of one backend
pub trait RenderBackend: Send + Sync {
    fn backend(&self) -> Backend;

    /// Whether the backend's identifying module is loaded in this process
    fn is_present(&self, platform: &dyn Platform) -> bool {
        self.backend()
            .probe_module()
            .map(|module| platform.is_module_loaded(module))
            .unwrap_or(false)
    }

    /// Build the backend's method table
    fn build_table(&self, platform: &dyn Platform) -> Result<MethodTable, SessionError>;
}

/// The set of backends a session may initialize
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Box<dyn RenderBackend>>,
}

impl BackendRegistry {
    /// Registry with no backends
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every backend implemented for the current OS
    pub fn native() -> Self {
        let mut registry = Self::empty();

        #[cfg(windows)]
        {
            registry.register(Box::new(ObjectBackend::new(d3d9::D3D9Strategy)));
            registry.register(Box::new(ObjectBackend::new(d3d10::D3D10Strategy)));
            registry.register(Box::new(ObjectBackend::new(d3d11::D3D11Strategy)));
            registry.register(Box::new(ObjectBackend::new(d3d12::D3D12Strategy)));
        }

        registry.register(Box::new(SymbolTableBackend::opengl()));
        registry.register(Box::new(SymbolTableBackend::vulkan()));
        registry
    }

    /// Builder-style [`BackendRegistry::register`]
    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        self.register(Box::new(backend));
        self
    }

    /// Add a strategy, replacing any registered for the same backend
    pub fn register(&mut self, strategy: Box<dyn RenderBackend>) {
        let backend = strategy.backend();
        if !backend.is_concrete() {
            tracing::warn!("Ignoring strategy for non-concrete backend {}", backend);
            return;
        }

        self.backends.retain(|existing| existing.backend() != backend);
        self.backends.push(strategy);
        tracing::debug!("Registered backend {}", backend);
    }

    /// Keep only backends in `enabled`
    pub fn retain(&mut self, enabled: BackendSet) {
        self.backends
            .retain(|strategy| enabled.has(strategy.backend()));
    }

    pub fn get(&self, backend: Backend) -> Option<&dyn RenderBackend> {
        self.backends
            .iter()
            .find(|strategy| strategy.backend() == backend)
            .map(|strategy| strategy.as_ref())
    }

    /// Registered backends
    pub fn available(&self) -> BackendSet {
        self.backends
            .iter()
            .map(|strategy| strategy.backend())
            .collect()
    }

    /// First registered backend, in auto-detection order, whose module is loaded
    pub fn detect(&self, platform: &dyn Platform) -> Option<Backend> {
        Backend::AUTO_DETECT_ORDER
            .into_iter()
            .filter_map(|backend| self.get(backend))
            .find(|strategy| strategy.is_present(platform))
            .map(|strategy| strategy.backend())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("available", &self.available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, FakePlatform};
    use renderhook_sdk::modules;

    fn registry() -> BackendRegistry {
        BackendRegistry::empty()
            .with_backend(FakeBackend::new(Backend::D3D9))
            .with_backend(FakeBackend::new(Backend::D3D11))
            .with_backend(FakeBackend::new(Backend::OpenGL))
    }

    #[test]
    fn test_detect_follows_priority() {
        let platform = FakePlatform::with_modules(&[modules::OPENGL, modules::D3D11]);
        assert_eq!(registry().detect(&platform), Some(Backend::D3D11));
    }

    #[test]
    fn test_detect_skips_unregistered() {
        // Vulkan is loaded but not registered
        let platform = FakePlatform::with_modules(&[modules::VULKAN]);
        assert_eq!(registry().detect(&platform), None);

        let platform = FakePlatform::with_modules(&[modules::VULKAN, modules::OPENGL]);
        assert_eq!(registry().detect(&platform), Some(Backend::OpenGL));
    }

    #[test]
    fn test_register_replaces_and_retain_filters() {
        let mut registry = registry().with_backend(FakeBackend::new(Backend::D3D11));
        assert_eq!(registry.len(), 3);

        registry.register(Box::new(FakeBackend::new(Backend::Auto)));
        assert_eq!(registry.len(), 3);

        registry.retain(BackendSet::DIRECT3D);
        assert_eq!(registry.available(), BackendSet::D3D9 | BackendSet::D3D11);
        assert!(registry.get(Backend::OpenGL).is_none());
    }

    #[test]
    fn test_native_registry_contents() {
        let available = BackendRegistry::native().available();
        assert!(available.has(Backend::OpenGL));
        assert!(available.has(Backend::Vulkan));
        assert_eq!(available.intersects(BackendSet::DIRECT3D), cfg!(windows));
    }
}

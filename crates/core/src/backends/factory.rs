//! Minimal context construction for object-based backends
//!
//! Every Direct3D strategy follows the same sequence:
//!
//! 1. Create the dummy window
//! 2. Check that the backend's modules are loaded
//! 3. Construct the throwaway objects ([`ContextStrategy::create_context`])
//! 4. Read their dispatch tables ([`ContextStrategy::harvest_slots`])
//! 5. Release the objects ([`ContextStrategy::destroy_context`])
//! 6. Destroy the window
//!
//! The window is destroyed exactly once on every path.

use renderhook_platform::{Platform, WindowHandle};

use super::RenderBackend;
use crate::backend::Backend;
use crate::error::SessionError;
use crate::table::{MethodTable, TableBuilder, TableLayout};

/// Backend-specific part of minimal context construction
pub trait ContextStrategy: Send + Sync {
    /// Native objects kept alive until harvesting is done
    type Context;

    fn backend(&self) -> Backend;

    /// Construct the throwaway objects presenting to `window`
    fn create_context(
        &self,
        platform: &dyn Platform,
        window: WindowHandle,
    ) -> Result<Self::Context, SessionError>;

    /// Push every sub-table of the layout, in order
    fn harvest_slots(
        &self,
        context: &Self::Context,
        table: &mut TableBuilder,
    ) -> Result<(), SessionError>;

    /// Release the objects
    fn destroy_context(&self, context: Self::Context) {
        drop(context);
    }
}

/// Runs a [`ContextStrategy`] with window and object cleanup
pub struct MinimalContextFactory<'a> {
    platform: &'a dyn Platform,
}

impl<'a> MinimalContextFactory<'a> {
    pub fn new(platform: &'a dyn Platform) -> Self {
        Self { platform }
    }

    pub fn build<S: ContextStrategy>(&self, strategy: &S) -> Result<MethodTable, SessionError> {
        let backend = strategy.backend();
        let layout = TableLayout::of(backend).ok_or(SessionError::NotSupported(backend))?;

        let window = WindowGuard::create(self.platform)?;

        for module in backend.required_modules() {
            if !self.platform.is_module_loaded(module) {
                tracing::debug!("{} requires {}, which is not loaded", backend, module);
                return Err(SessionError::ModuleNotFound(module.to_string()));
            }
        }

        let context = strategy.create_context(self.platform, window.handle())?;

        let mut builder = TableBuilder::new(layout);
        let harvested = strategy.harvest_slots(&context, &mut builder);
        strategy.destroy_context(context);
        harvested?;

        let table = builder.finish()?;
        tracing::debug!("Built {} method table with {} slots", backend, table.len());
        Ok(table)
    }
}

/// Dummy window destroyed on drop
struct WindowGuard<'a> {
    platform: &'a dyn Platform,
    handle: WindowHandle,
}

impl<'a> WindowGuard<'a> {
    fn create(platform: &'a dyn Platform) -> Result<Self, SessionError> {
        let handle = platform.create_dummy_window()?;
        Ok(Self { platform, handle })
    }

    fn handle(&self) -> WindowHandle {
        self.handle
    }
}

impl Drop for WindowGuard<'_> {
    fn drop(&mut self) {
        self.platform.destroy_dummy_window(self.handle);
    }
}

/// [`RenderBackend`] for a [`ContextStrategy`]
pub struct ObjectBackend<S> {
    strategy: S,
}

impl<S: ContextStrategy> ObjectBackend<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }
}

impl<S: ContextStrategy> RenderBackend for ObjectBackend<S> {
    fn backend(&self) -> Backend {
        self.strategy.backend()
    }

    fn build_table(&self, platform: &dyn Platform) -> Result<MethodTable, SessionError> {
        MinimalContextFactory::new(platform).build(&self.strategy)
    }
}

//! Symbol-table backends (OpenGL, Vulkan)
//!
//! No object is constructed. Each name of a fixed entry point list is
//! resolved in the already-loaded library and stored at its list position.

use renderhook_platform::Platform;
use renderhook_sdk::{modules, OPENGL_ENTRY_POINTS, VULKAN_ENTRY_POINTS};

use super::RenderBackend;
use crate::backend::Backend;
use crate::error::SessionError;
use crate::table::{MethodTable, TableBuilder, TableLayout};

/// Backend whose table is a list of exported entry points
pub struct SymbolTableBackend {
    backend: Backend,
    module: &'static str,
    symbols: &'static [&'static str],
}

impl SymbolTableBackend {
    pub fn opengl() -> Self {
        Self {
            backend: Backend::OpenGL,
            module: modules::OPENGL,
            symbols: OPENGL_ENTRY_POINTS,
        }
    }

    pub fn vulkan() -> Self {
        Self {
            backend: Backend::Vulkan,
            module: modules::VULKAN,
            symbols: VULKAN_ENTRY_POINTS,
        }
    }

    pub fn module(&self) -> &'static str {
        self.module
    }
}

impl RenderBackend for SymbolTableBackend {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn build_table(&self, platform: &dyn Platform) -> Result<MethodTable, SessionError> {
        let layout = TableLayout::of(self.backend).ok_or(SessionError::NotSupported(self.backend))?;

        if !platform.is_module_loaded(self.module) {
            return Err(SessionError::ModuleNotFound(self.module.to_string()));
        }

        let slots: Vec<*const ()> = platform
            .resolve_symbols(self.module, self.symbols)?
            .into_iter()
            .map(|symbol| symbol.map_or(std::ptr::null(), |ptr| ptr.as_ptr() as *const ()))
            .collect();

        let missing = slots.iter().filter(|slot| slot.is_null()).count();
        if missing > 0 {
            tracing::debug!(
                "{} of {} {} entry points not exported by {}",
                missing,
                slots.len(),
                self.backend,
                self.module
            );
        }

        // Symbol layouts are a single sub-table named after the backend
        let mut builder = TableBuilder::new(layout);
        builder.push(self.backend.name(), &slots)?;
        builder.finish()
    }
}

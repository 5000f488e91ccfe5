//! Session lifecycle
//!
//! A [`Session`] owns at most one active backend together with its method
//! table and the hooks bound to it.
//!
//! ```text
//! Uninitialized --init--> Bound(backend) --shutdown--> Uninitialized
//! ```

use renderhook_platform::{NativePlatform, Platform};

use crate::backend::{Backend, BackendSet};
use crate::backends::BackendRegistry;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::hooks::{HookEngine, HookRecord, HookRegistry, InlineHookEngine};
use crate::table::MethodTable;

enum SessionState {
    Uninitialized,
    Bound {
        table: MethodTable,
        hooks: HookRegistry,
    },
}

/// Controller for one backend's method table and slot hooks
pub struct Session {
    platform: Box<dyn Platform>,
    registry: BackendRegistry,
    engine: Box<dyn HookEngine>,
    state: SessionState,
}

impl Session {
    pub fn new(
        platform: impl Platform + 'static,
        registry: BackendRegistry,
        engine: impl HookEngine + 'static,
    ) -> Self {
        Self {
            platform: Box::new(platform),
            registry,
            engine: Box::new(engine),
            state: SessionState::Uninitialized,
        }
    }

    /// Session using the OS, every native backend and the inline hook engine
    pub fn native() -> Self {
        Self::new(
            NativePlatform::new(),
            BackendRegistry::native(),
            InlineHookEngine::new(),
        )
    }

    /// Native session restricted to the backends enabled by `config`
    pub fn from_config(config: &SessionConfig) -> Self {
        let mut registry = BackendRegistry::native();
        if let Some(enabled) = config.enabled_backends() {
            registry.retain(enabled);
        }
        tracing::debug!("Session backends: {:?}", registry.available());

        Self::new(NativePlatform::new(), registry, InlineHookEngine::new())
    }

    /// Build the method table of `requested` and make it the active backend
    ///
    /// `Backend::None` succeeds without doing anything. `Backend::Auto` picks
    /// the first registered backend whose module is loaded.
    pub fn init(&mut self, requested: Backend) -> Result<(), SessionError> {
        if let SessionState::Bound { table, .. } = &self.state {
            return Err(SessionError::AlreadyInitialized(table.backend()));
        }

        let backend = match requested {
            Backend::None => {
                tracing::debug!("init(None) requested, nothing to do");
                return Ok(());
            }
            Backend::Auto => {
                let detected = self
                    .registry
                    .detect(self.platform.as_ref())
                    .ok_or(SessionError::NoBackendDetected)?;
                tracing::info!("Auto-detected backend {}", detected);
                detected
            }
            backend => backend,
        };

        let strategy = self
            .registry
            .get(backend)
            .ok_or(SessionError::NotSupported(backend))?;

        let table = strategy.build_table(self.platform.as_ref()).map_err(|e| {
            tracing::warn!("Failed to build {} method table: {}", backend, e);
            e
        })?;

        self.engine.initialize()?;

        tracing::info!(
            "Initialized {} ({} slots, {} empty)",
            backend,
            table.len(),
            table.null_slots()
        );

        self.state = SessionState::Bound {
            table,
            hooks: HookRegistry::new(),
        };
        Ok(())
    }

    /// Disable every hook, release the engine and drop the method table
    pub fn shutdown(&mut self) {
        let SessionState::Bound { table, hooks } =
            std::mem::replace(&mut self.state, SessionState::Uninitialized)
        else {
            return;
        };

        if let Err(e) = self.engine.disable_all() {
            tracing::error!("Failed to disable hooks during shutdown: {}", e);
        }
        if let Err(e) = self.engine.uninitialize() {
            tracing::error!("Failed to uninitialize hook engine: {}", e);
        }

        tracing::info!(
            "Shut down {} ({} hooks released)",
            table.backend(),
            hooks.len()
        );

        drop(hooks);
        drop(table);
    }

    /// Redirect the function in slot `index` to `replacement`
    ///
    /// Returns the pointer to call the original function. It stays callable
    /// after the slot is unbound.
    ///
    /// # Safety
    /// `replacement` must be a function whose signature and calling
    /// convention match the function in slot `index`
    pub unsafe fn bind(
        &mut self,
        index: usize,
        replacement: *const (),
    ) -> Result<*const (), SessionError> {
        let SessionState::Bound { table, hooks } = &mut self.state else {
            return Err(SessionError::NotInitialized);
        };
        hooks.bind(self.engine.as_mut(), table, index, replacement)
    }

    /// Remove the hook on slot `index`; does nothing if there is none
    pub fn unbind(&mut self, index: usize) {
        if let SessionState::Bound { hooks, .. } = &mut self.state {
            hooks.unbind(self.engine.as_mut(), index);
        }
    }

    /// Active backend, `Backend::None` when uninitialized
    pub fn active_backend(&self) -> Backend {
        self.method_table()
            .map(MethodTable::backend)
            .unwrap_or(Backend::None)
    }

    pub fn method_table(&self) -> Option<&MethodTable> {
        match &self.state {
            SessionState::Bound { table, .. } => Some(table),
            SessionState::Uninitialized => None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, SessionState::Bound { .. })
    }

    pub fn is_bound(&self, index: usize) -> bool {
        self.hook(index).is_some()
    }

    pub fn hook(&self, index: usize) -> Option<&HookRecord> {
        match &self.state {
            SessionState::Bound { hooks, .. } => hooks.get(index),
            SessionState::Uninitialized => None,
        }
    }

    pub fn bound_count(&self) -> usize {
        match &self.state {
            SessionState::Bound { hooks, .. } => hooks.len(),
            SessionState::Uninitialized => 0,
        }
    }

    /// Backends this session may initialize
    pub fn available_backends(&self) -> BackendSet {
        self.registry.available()
    }

    /// Backend `init(Backend::Auto)` would select right now
    pub fn detect(&self) -> Option<Backend> {
        self.registry.detect(self.platform.as_ref())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.active_backend())
            .field("bound", &self.bound_count())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, FakeBackend, FakePlatform, RecordingEngine};
    use crate::Status;
    use renderhook_sdk::{layouts, modules, slots};
    use std::sync::atomic::Ordering;

    fn replacement() -> *const () {
        0xDEAD_0000usize as *const ()
    }

    fn full_registry() -> BackendRegistry {
        BackendRegistry::empty()
            .with_backend(FakeBackend::new(Backend::D3D9))
            .with_backend(FakeBackend::new(Backend::D3D10))
            .with_backend(FakeBackend::new(Backend::D3D11))
            .with_backend(FakeBackend::new(Backend::D3D12))
            .with_backend(FakeBackend::new(Backend::OpenGL))
            .with_backend(FakeBackend::new(Backend::Vulkan))
    }

    fn session(modules: &[&str]) -> (Session, RecordingEngine) {
        let engine = RecordingEngine::new();
        let session = Session::new(
            FakePlatform::with_modules(modules),
            full_registry(),
            engine.clone(),
        );
        (session, engine)
    }

    fn d3d11_session() -> (Session, RecordingEngine) {
        let (mut session, engine) = session(&[modules::D3D11]);
        session.init(Backend::D3D11).unwrap();
        (session, engine)
    }

    #[test]
    fn test_init_missing_module() {
        let (mut session, engine) = session(&[modules::OPENGL]);

        let err = session.init(Backend::D3D9).unwrap_err();
        assert_eq!(err.status(), Status::ModuleNotFoundError);
        assert_eq!(session.active_backend(), Backend::None);
        assert!(session.method_table().is_none());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_init_twice_keeps_first_backend() {
        let (mut session, _engine) = session(&[modules::D3D11, modules::OPENGL]);

        session.init(Backend::D3D11).unwrap();
        let err = session.init(Backend::OpenGL).unwrap_err();

        assert!(matches!(err, SessionError::AlreadyInitialized(Backend::D3D11)));
        assert_eq!(err.status(), Status::AlreadyInitializedError);
        assert_eq!(session.active_backend(), Backend::D3D11);

        let err = session.init(Backend::None).unwrap_err();
        assert_eq!(err.status(), Status::AlreadyInitializedError);
    }

    #[test]
    fn test_init_none_is_noop() {
        let (mut session, engine) = session(&[modules::D3D11]);

        session.init(Backend::None).unwrap();
        assert_eq!(session.active_backend(), Backend::None);
        assert!(!session.is_initialized());
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_init_table_length_matches_layout() {
        let (session, engine) = d3d11_session();
        let table = session.method_table().unwrap();

        assert_eq!(table.len(), layouts::d3d11::TOTAL);
        assert_eq!(
            table.get(slots::d3d11::PRESENT),
            Some(FakeBackend::slot_address(Backend::D3D11, slots::d3d11::PRESENT))
        );
        assert_eq!(engine.calls(), vec![EngineCall::Initialize]);
    }

    #[test]
    fn test_auto_detect_is_deterministic() {
        for _ in 0..3 {
            let (mut session, _engine) = session(&[modules::OPENGL, modules::D3D11]);
            session.init(Backend::Auto).unwrap();
            assert_eq!(session.active_backend(), Backend::D3D11);
        }
    }

    #[test]
    fn test_auto_detect_nothing_loaded() {
        let (mut session, _engine) = session(&[]);

        let err = session.init(Backend::Auto).unwrap_err();
        assert!(matches!(err, SessionError::NoBackendDetected));
        assert_eq!(err.status(), Status::NotSupportedError);
        assert_eq!(session.active_backend(), Backend::None);
    }

    #[test]
    fn test_unregistered_backend_not_supported() {
        let engine = RecordingEngine::new();
        let d3d12 = FakeBackend::new(Backend::D3D12);
        let builds = d3d12.builds();
        let mut session = Session::new(
            FakePlatform::with_modules(&[modules::VULKAN, modules::DXGI, modules::D3D12]),
            BackendRegistry::empty().with_backend(d3d12),
            engine,
        );

        let err = session.init(Backend::Vulkan).unwrap_err();
        assert_eq!(err.status(), Status::NotSupportedError);

        session.init(Backend::Auto).unwrap();
        assert_eq!(session.active_backend(), Backend::D3D12);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bind_returns_original_and_records_hook() {
        let (mut session, engine) = d3d11_session();
        let target = FakeBackend::slot_address(Backend::D3D11, slots::d3d11::PRESENT);

        let original = unsafe { session.bind(slots::d3d11::PRESENT, replacement()) }.unwrap();

        assert_eq!(original as usize, target as usize + 1);
        assert!(session.is_bound(slots::d3d11::PRESENT));
        assert_eq!(session.bound_count(), 1);

        let record = session.hook(slots::d3d11::PRESENT).unwrap();
        assert_eq!(record.target, target);
        assert_eq!(record.replacement, replacement());
        assert_eq!(record.original, original);

        assert_eq!(
            engine.calls()[1..],
            [
                EngineCall::Create(target as usize, replacement() as usize),
                EngineCall::Enable(target as usize),
            ]
        );
        assert_eq!(engine.enabled_hooks(), 1);
    }

    #[test]
    fn test_bind_requires_initialization() {
        let (mut session, engine) = session(&[modules::D3D11]);

        let err = unsafe { session.bind(0, replacement()) }.unwrap_err();
        assert_eq!(err.status(), Status::NotInitializedError);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_out_of_range_slots_never_reach_engine() {
        let (mut session, engine) = d3d11_session();

        let err = unsafe { session.bind(layouts::d3d11::TOTAL, replacement()) }.unwrap_err();
        assert!(matches!(
            err,
            SessionError::SlotOutOfRange {
                index: 205,
                len: 205
            }
        ));
        assert_eq!(err.status(), Status::InvalidArgumentError);

        session.unbind(layouts::d3d11::TOTAL);
        session.unbind(usize::MAX);

        assert_eq!(engine.calls(), vec![EngineCall::Initialize]);
    }

    #[test]
    fn test_bind_rejects_null_and_empty_slots() {
        let engine = RecordingEngine::new();
        let mut session = Session::new(
            FakePlatform::with_modules(&[modules::OPENGL]),
            BackendRegistry::empty().with_backend(FakeBackend::new(Backend::OpenGL).with_empty_slot(3)),
            engine.clone(),
        );
        session.init(Backend::OpenGL).unwrap();

        let err = unsafe { session.bind(3, replacement()) }.unwrap_err();
        assert!(matches!(err, SessionError::EmptySlot(3)));
        assert_eq!(err.status(), Status::InvalidArgumentError);

        let err = unsafe { session.bind(4, std::ptr::null()) }.unwrap_err();
        assert!(matches!(err, SessionError::NullPointer));

        assert_eq!(engine.calls(), vec![EngineCall::Initialize]);
    }

    #[test]
    fn test_double_bind_is_unknown_error() {
        let (mut session, _engine) = d3d11_session();

        unsafe { session.bind(8, replacement()) }.unwrap();
        let err = unsafe { session.bind(8, replacement()) }.unwrap_err();

        assert!(matches!(err, SessionError::SlotAlreadyBound(8)));
        assert_eq!(err.status(), Status::UnknownError);
        assert_eq!(session.bound_count(), 1);
    }

    #[test]
    fn test_engine_rejections() {
        let (mut session, engine) = d3d11_session();
        engine.state.lock().fail_create = true;

        let err = unsafe { session.bind(8, replacement()) }.unwrap_err();
        assert_eq!(err.status(), Status::UnknownError);
        assert!(!session.is_bound(8));

        engine.state.lock().fail_create = false;
        engine.state.lock().fail_enable = true;

        let err = unsafe { session.bind(9, replacement()) }.unwrap_err();
        assert_eq!(err.status(), Status::UnknownError);
        assert!(!session.is_bound(9));

        // The half-created hook was removed
        let target = FakeBackend::slot_address(Backend::D3D11, 9) as usize;
        assert_eq!(engine.calls().last(), Some(&EngineCall::Remove(target)));
        assert_eq!(engine.hook_count(), 0);
    }

    #[test]
    fn test_unbind_removes_hook() {
        let (mut session, engine) = d3d11_session();
        let target = FakeBackend::slot_address(Backend::D3D11, 73) as usize;

        unsafe { session.bind(73, replacement()) }.unwrap();
        session.unbind(73);

        assert!(!session.is_bound(73));
        assert_eq!(engine.calls().last(), Some(&EngineCall::Remove(target)));
        assert_eq!(engine.hook_count(), 0);

        // Unbinding again is a no-op
        let calls = engine.calls().len();
        session.unbind(73);
        assert_eq!(engine.calls().len(), calls);

        // Slot can be bound again
        unsafe { session.bind(73, replacement()) }.unwrap();
    }

    #[test]
    fn test_failed_unbind_keeps_slot_bound() {
        let (mut session, engine) = d3d11_session();
        let target = FakeBackend::slot_address(Backend::D3D11, 8) as usize;

        unsafe { session.bind(8, replacement()) }.unwrap();
        engine.state.lock().fail_remove = true;
        session.unbind(8);

        // The hook is disabled but still known to both sides
        assert!(session.is_bound(8));
        assert_eq!(engine.hook_count(), 1);
        assert_eq!(engine.enabled_hooks(), 0);
        assert_eq!(engine.calls().last(), Some(&EngineCall::Disable(target)));

        engine.state.lock().fail_remove = false;
        session.unbind(8);
        assert!(!session.is_bound(8));
        assert_eq!(engine.hook_count(), 0);

        unsafe { session.bind(8, replacement()) }.unwrap();
        assert_eq!(engine.enabled_hooks(), 1);
    }

    #[test]
    fn test_unbind_uninitialized_is_noop() {
        let (mut session, engine) = session(&[]);
        session.unbind(0);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_shutdown_disables_hooks_and_resets() {
        let (mut session, engine) = d3d11_session();
        unsafe { session.bind(8, replacement()) }.unwrap();
        unsafe { session.bind(73, replacement()) }.unwrap();

        session.shutdown();

        let calls = engine.calls();
        let tail = &calls[calls.len() - 2..];
        assert_eq!(tail, [EngineCall::DisableAll, EngineCall::Uninitialize]);
        assert_eq!(engine.enabled_hooks(), 0);

        assert_eq!(session.active_backend(), Backend::None);
        assert!(session.method_table().is_none());
        assert_eq!(session.bound_count(), 0);

        // Idempotent
        session.shutdown();
        assert_eq!(engine.calls().len(), calls.len());

        // Can initialize again
        session.init(Backend::D3D11).unwrap();
        assert_eq!(session.active_backend(), Backend::D3D11);
    }

    #[test]
    fn test_drop_shuts_down() {
        let (mut session, engine) = d3d11_session();
        unsafe { session.bind(8, replacement()) }.unwrap();

        drop(session);

        assert_eq!(engine.calls().last(), Some(&EngineCall::Uninitialize));
        assert_eq!(engine.hook_count(), 0);
    }

    #[test]
    fn test_from_config_filters_backends() {
        let config = SessionConfig {
            backends: vec![Backend::Vulkan],
            ..Default::default()
        };
        let session = Session::from_config(&config);
        assert_eq!(session.available_backends(), BackendSet::VULKAN);

        let session = Session::from_config(&SessionConfig::default());
        assert!(session.available_backends().has(Backend::OpenGL));
    }
}

//! Test doubles for platform services, backends and the hook engine

use std::collections::{HashMap, HashSet};
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use renderhook_platform::{Platform, PlatformError, WindowHandle};

use crate::backend::Backend;
use crate::backends::RenderBackend;
use crate::error::SessionError;
use crate::hooks::{HookEngine, HookError};
use crate::table::{MethodTable, TableBuilder, TableLayout};

/// Platform with a fixed set of loaded modules and exported symbols
#[derive(Default)]
pub struct FakePlatform {
    modules: HashSet<String>,
    symbols: HashMap<(String, String), usize>,
    no_windows: bool,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl FakePlatform {
    pub fn with_modules(modules: &[&str]) -> Self {
        Self {
            modules: modules.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_symbol(mut self, module: &str, symbol: &str, address: usize) -> Self {
        self.symbols
            .insert((module.to_string(), symbol.to_string()), address);
        self
    }

    /// Make dummy window creation fail
    pub fn without_windows(mut self) -> Self {
        self.no_windows = true;
        self
    }

    pub fn windows_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn windows_destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Platform for FakePlatform {
    fn is_module_loaded(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    fn resolve_symbol(
        &self,
        module: &str,
        symbol: &str,
    ) -> Result<Option<NonNull<c_void>>, PlatformError> {
        if !self.is_module_loaded(module) {
            return Err(PlatformError::ModuleNotLoaded(module.to_string()));
        }
        Ok(self
            .symbols
            .get(&(module.to_string(), symbol.to_string()))
            .and_then(|address| NonNull::new(*address as *mut c_void)))
    }

    fn create_dummy_window(&self) -> Result<WindowHandle, PlatformError> {
        if self.no_windows {
            return Err(PlatformError::WindowCreation("disabled".to_string()));
        }
        let count = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = NonNull::new((0x1000 * count) as *mut c_void)
            .ok_or(PlatformError::WindowCreation("null".to_string()))?;
        Ok(WindowHandle::from_raw(handle))
    }

    fn destroy_dummy_window(&self, _window: WindowHandle) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Backend whose table is synthesized from its layout
///
/// Slot `i` holds `base + i * 16`; the backend is present when its probe
/// module is loaded in the platform.
pub struct FakeBackend {
    backend: Backend,
    base: usize,
    empty_slots: Vec<usize>,
    builds: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            base: 0x10_0000 * (backend.as_raw().max(1) as usize),
            empty_slots: Vec::new(),
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_empty_slot(mut self, index: usize) -> Self {
        self.empty_slots.push(index);
        self
    }

    pub fn builds(&self) -> Arc<AtomicUsize> {
        self.builds.clone()
    }

    pub fn slot_address(backend: Backend, index: usize) -> *const () {
        (0x10_0000 * (backend.as_raw().max(1) as usize) + index * 16) as *const ()
    }
}

impl RenderBackend for FakeBackend {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn build_table(&self, platform: &dyn Platform) -> Result<MethodTable, SessionError> {
        self.builds.fetch_add(1, Ordering::SeqCst);

        let layout = TableLayout::of(self.backend).ok_or(SessionError::NotSupported(self.backend))?;
        for module in self.backend.required_modules() {
            if !platform.is_module_loaded(module) {
                return Err(SessionError::ModuleNotFound(module.to_string()));
            }
        }

        let mut builder = TableBuilder::new(layout);
        let mut start = 0;
        for sub in layout.sub_tables {
            let slots: Vec<*const ()> = (start..start + sub.count)
                .map(|index| {
                    if self.empty_slots.contains(&index) {
                        std::ptr::null()
                    } else {
                        (self.base + index * 16) as *const ()
                    }
                })
                .collect();
            builder.push(sub.name, &slots)?;
            start += sub.count;
        }
        builder.finish()
    }
}

/// Hook engine call, as recorded by [`RecordingEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    Initialize,
    Uninitialize,
    Create(usize, usize),
    Enable(usize),
    Disable(usize),
    Remove(usize),
    DisableAll,
}

#[derive(Debug, Default)]
pub struct EngineState {
    pub calls: Vec<EngineCall>,
    /// Prepared hooks and whether each is enabled
    pub hooks: HashMap<usize, bool>,
    pub fail_create: bool,
    pub fail_enable: bool,
    pub fail_remove: bool,
}

/// Hook engine that records calls instead of patching code
///
/// The returned "original" for a target is `target + 1`.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    pub state: Arc<Mutex<EngineState>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    pub fn enabled_hooks(&self) -> usize {
        self.state.lock().hooks.values().filter(|enabled| **enabled).count()
    }

    pub fn hook_count(&self) -> usize {
        self.state.lock().hooks.len()
    }
}

impl HookEngine for RecordingEngine {
    fn initialize(&mut self) -> Result<(), HookError> {
        self.state.lock().calls.push(EngineCall::Initialize);
        Ok(())
    }

    fn uninitialize(&mut self) -> Result<(), HookError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Uninitialize);
        state.hooks.clear();
        Ok(())
    }

    unsafe fn create_hook(
        &mut self,
        target: *const (),
        detour: *const (),
    ) -> Result<*const (), HookError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(EngineCall::Create(target as usize, detour as usize));
        if state.fail_create {
            return Err(HookError::DetourCreation("rejected".to_string()));
        }
        if state.hooks.contains_key(&(target as usize)) {
            return Err(HookError::AlreadyCreated(target as usize));
        }
        state.hooks.insert(target as usize, false);
        Ok((target as usize + 1) as *const ())
    }

    fn enable_hook(&mut self, target: *const ()) -> Result<(), HookError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Enable(target as usize));
        if state.fail_enable {
            return Err(HookError::EnableFailed("rejected".to_string()));
        }
        let enabled = state
            .hooks
            .get_mut(&(target as usize))
            .ok_or(HookError::NotFound)?;
        *enabled = true;
        Ok(())
    }

    fn disable_hook(&mut self, target: *const ()) -> Result<(), HookError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Disable(target as usize));
        let enabled = state
            .hooks
            .get_mut(&(target as usize))
            .ok_or(HookError::NotFound)?;
        *enabled = false;
        Ok(())
    }

    fn remove_hook(&mut self, target: *const ()) -> Result<(), HookError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Remove(target as usize));
        if state.fail_remove {
            return Err(HookError::DisableFailed("rejected".to_string()));
        }
        state
            .hooks
            .remove(&(target as usize))
            .map(|_| ())
            .ok_or(HookError::NotFound)
    }

    fn disable_all(&mut self) -> Result<(), HookError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::DisableAll);
        for enabled in state.hooks.values_mut() {
            *enabled = false;
        }
        Ok(())
    }
}

/// Hand-assembled functions in executable memory
#[cfg(all(target_arch = "x86_64", unix))]
pub mod code {
    pub type BinaryFn = extern "C" fn(i32, i32) -> i32;

    /// push rbp; mov rbp, rsp; mov eax, edi; add eax, esi; pop rbp; ret
    pub const ADD_CODE: [u8; 10] = [0x55, 0x48, 0x89, 0xE5, 0x89, 0xF8, 0x01, 0xF0, 0x5D, 0xC3];

    pub extern "C" fn multiply(a: i32, b: i32) -> i32 {
        a * b
    }

    /// An RWX page holding a copy of some machine code
    pub struct CodePage {
        allocation: region::Allocation,
    }

    impl CodePage {
        pub fn with_code(code: &[u8]) -> Self {
            let mut allocation =
                region::alloc(4096, region::Protection::READ_WRITE_EXECUTE).unwrap();
            let base = allocation.as_mut_ptr::<u8>();
            unsafe { std::ptr::copy_nonoverlapping(code.as_ptr(), base, code.len()) };
            Self { allocation }
        }

        pub fn entry(&self) -> *const () {
            self.allocation.as_ptr::<u8>() as *const ()
        }

        pub fn function(&self) -> BinaryFn {
            unsafe { std::mem::transmute::<*const (), BinaryFn>(self.entry()) }
        }
    }
}

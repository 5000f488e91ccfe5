//! Hook engine abstraction
//!
//! The session never patches code itself. It asks a [`HookEngine`] to
//! redirect a function address and to hand back a pointer that still reaches
//! the original behavior.

/// Error type for hook engine operations
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Hook engine not initialized")]
    NotInitialized,

    #[error("Hook already created at {0:x}")]
    AlreadyCreated(usize),

    #[error("Hook not found")]
    NotFound,

    #[error("Invalid address: {0:x}")]
    InvalidAddress(usize),

    #[error("Failed to create detour: {0}")]
    DetourCreation(String),

    #[error("Failed to enable hook: {0}")]
    EnableFailed(String),

    #[error("Failed to disable hook: {0}")]
    DisableFailed(String),

    #[error("Memory protection failed: {0}")]
    MemoryProtection(String),

    #[error("Function at {0:x} is too short to patch")]
    TooShort(usize),

    #[error("Instruction relocation failed: {0}")]
    RelocationFailed(String),

    #[error("Failed to allocate trampoline near {0:x}")]
    TrampolineAllocation(usize),

    #[error("Inline hooks are not supported on this architecture")]
    UnsupportedArchitecture,
}

/// Control-flow redirection at function addresses
///
/// Targets are identified by address. An engine holds at most one hook per
/// target.
pub trait HookEngine: Send {
    /// One-time global setup; calling it again is a no-op
    fn initialize(&mut self) -> Result<(), HookError>;

    /// Global teardown; every remaining hook is disabled and forgotten
    fn uninitialize(&mut self) -> Result<(), HookError>;

    /// Prepare (but do not enable) a redirection from `target` to `detour`
    ///
    /// Returns a pointer that reproduces the original behavior of `target`.
    ///
    /// # Safety
    /// - `target` must be the entry point of a live function
    /// - `detour` must be a function with a signature compatible with `target`
    unsafe fn create_hook(
        &mut self,
        target: *const (),
        detour: *const (),
    ) -> Result<*const (), HookError>;

    /// Start redirecting calls to `target`
    fn enable_hook(&mut self, target: *const ()) -> Result<(), HookError>;

    /// Stop redirecting calls to `target`, keeping the hook prepared
    fn disable_hook(&mut self, target: *const ()) -> Result<(), HookError>;

    /// Disable and forget the hook at `target`
    fn remove_hook(&mut self, target: *const ()) -> Result<(), HookError>;

    /// Disable every hook this engine created
    fn disable_all(&mut self) -> Result<(), HookError>;
}

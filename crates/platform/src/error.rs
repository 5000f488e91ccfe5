//! Error types for platform services

/// Error type for module, symbol and window operations
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The library is not loaded in this process
    #[error("Module not loaded: {0}")]
    ModuleNotLoaded(String),

    /// Module or symbol name contains an interior NUL byte
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Registering the dummy window class failed
    #[error("Failed to register window class: {0}")]
    WindowClass(String),

    /// Creating the dummy window failed
    #[error("Failed to create window: {0}")]
    WindowCreation(String),

    /// Operation has no implementation on this platform
    #[error("Unsupported on this platform: {0}")]
    Unsupported(&'static str),
}

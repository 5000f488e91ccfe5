//! Session error type

use renderhook_platform::PlatformError;

use crate::backend::Backend;
use crate::hooks::HookError;
use crate::status::Status;

/// Error type for session, table and hook registry operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Backend {0} is already initialized")]
    AlreadyInitialized(Backend),

    #[error("No backend is initialized")]
    NotInitialized,

    #[error("Backend {0} is not available")]
    NotSupported(Backend),

    #[error("No supported backend module is loaded")]
    NoBackendDetected,

    #[error("Module not loaded: {0}")]
    ModuleNotFound(String),

    #[error("Entry point not found: {0}")]
    EntryPointNotFound(&'static str),

    #[error("Failed to create {object}: {reason}")]
    ContextCreation {
        object: &'static str,
        reason: String,
    },

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Sub-table mismatch: expected {expected}, got {found}")]
    SubTableMismatch { expected: String, found: String },

    #[error("Method table incomplete: {filled} of {expected} slots")]
    TableIncomplete { filled: usize, expected: usize },

    #[error("Slot {index} out of range (table has {len} slots)")]
    SlotOutOfRange { index: usize, len: usize },

    #[error("Slot {0} is empty")]
    EmptySlot(usize),

    #[error("Replacement function is null")]
    NullPointer,

    #[error("Slot {0} is already bound")]
    SlotAlreadyBound(usize),

    #[error("Hook engine error: {0}")]
    Hook(#[from] HookError),
}

impl SessionError {
    /// Status code reported across the C ABI
    pub fn status(&self) -> Status {
        match self {
            SessionError::AlreadyInitialized(_) => Status::AlreadyInitializedError,
            SessionError::NotInitialized => Status::NotInitializedError,
            SessionError::NotSupported(_) | SessionError::NoBackendDetected => {
                Status::NotSupportedError
            }
            SessionError::ModuleNotFound(_)
            | SessionError::Platform(PlatformError::ModuleNotLoaded(_)) => {
                Status::ModuleNotFoundError
            }
            SessionError::SlotOutOfRange { .. }
            | SessionError::EmptySlot(_)
            | SessionError::NullPointer => Status::InvalidArgumentError,
            SessionError::EntryPointNotFound(_)
            | SessionError::ContextCreation { .. }
            | SessionError::Platform(_)
            | SessionError::SubTableMismatch { .. }
            | SessionError::TableIncomplete { .. }
            | SessionError::SlotAlreadyBound(_)
            | SessionError::Hook(_) => Status::UnknownError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            SessionError::AlreadyInitialized(Backend::D3D11).status(),
            Status::AlreadyInitializedError
        );
        assert_eq!(
            SessionError::NoBackendDetected.status(),
            Status::NotSupportedError
        );
        assert_eq!(
            SessionError::Platform(PlatformError::ModuleNotLoaded("d3d9.dll".into())).status(),
            Status::ModuleNotFoundError
        );
        assert_eq!(
            SessionError::Platform(PlatformError::WindowCreation("denied".into())).status(),
            Status::UnknownError
        );
        assert_eq!(
            SessionError::SlotOutOfRange { index: 500, len: 205 }.status(),
            Status::InvalidArgumentError
        );
        assert_eq!(SessionError::SlotAlreadyBound(8).status(), Status::UnknownError);
        assert_eq!(
            SessionError::Hook(HookError::NotFound).status(),
            Status::UnknownError
        );
    }
}

//! Status codes returned across the C ABI

use std::ffi::CStr;

/// Outcome of a public operation, as an integer for C callers
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success = 0,
    UnknownError = -1,
    NotSupportedError = -2,
    ModuleNotFoundError = -3,
    AlreadyInitializedError = -4,
    NotInitializedError = -5,
    InvalidArgumentError = -6,
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Status::Success),
            -1 => Some(Status::UnknownError),
            -2 => Some(Status::NotSupportedError),
            -3 => Some(Status::ModuleNotFoundError),
            -4 => Some(Status::AlreadyInitializedError),
            -5 => Some(Status::NotInitializedError),
            -6 => Some(Status::InvalidArgumentError),
            _ => None,
        }
    }

    pub fn to_error_string(&self) -> &'static str {
        self.as_c_str().to_str().unwrap_or_default()
    }

    /// Description of the status as a static C string
    pub fn as_c_str(&self) -> &'static CStr {
        match self {
            Status::Success => c"Success",
            Status::UnknownError => c"Unexpected native or hook engine failure",
            Status::NotSupportedError => c"Backend not supported or no backend module loaded",
            Status::ModuleNotFoundError => c"Backend module is not loaded in this process",
            Status::AlreadyInitializedError => c"A backend is already initialized",
            Status::NotInitializedError => c"No backend is initialized",
            Status::InvalidArgumentError => c"Invalid slot index or null pointer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values() {
        assert_eq!(Status::Success.as_raw(), 0);
        assert_eq!(Status::UnknownError.as_raw(), -1);
        assert_eq!(Status::NotSupportedError.as_raw(), -2);
        assert_eq!(Status::ModuleNotFoundError.as_raw(), -3);
        assert_eq!(Status::AlreadyInitializedError.as_raw(), -4);
        assert_eq!(Status::NotInitializedError.as_raw(), -5);
        assert_eq!(Status::InvalidArgumentError.as_raw(), -6);
        assert_eq!(Status::from_raw(-6), Some(Status::InvalidArgumentError));
        assert_eq!(Status::from_raw(1), None);
    }

    #[test]
    fn test_error_strings() {
        assert_eq!(Status::Success.to_error_string(), "Success");
        assert_eq!(
            Status::NotInitializedError.to_error_string(),
            "No backend is initialized"
        );
        for raw in 0..=6 {
            assert!(!Status::from_raw(-raw).unwrap().to_error_string().is_empty());
        }
    }
}

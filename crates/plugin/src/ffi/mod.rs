//! FFI boundary
//!
//! Every export maps one session operation onto C types and status codes.

pub mod exports;

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, turning a panic into `fallback`
fn guarded<R>(name: &str, fallback: R, f: impl FnOnce() -> R) -> R {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!("Panic in {}", name);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_passes_value_through() {
        assert_eq!(guarded("test", -1, || 7), 7);
    }

    #[test]
    fn test_guarded_catches_panic() {
        let value = guarded("test", -1, || -> i32 { panic!("boom") });
        assert_eq!(value, -1);
    }
}

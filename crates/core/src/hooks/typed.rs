//! Typed slot hooks
//!
//! [`SlotHook`] remembers a slot index and the typed original function
//! returned when the slot was bound, so detours can call through without
//! transmuting raw pointers themselves.

use parking_lot::RwLock;

use crate::error::SessionError;
use crate::session::Session;

/// A hook on one method table slot with function pointer type `F`
pub struct SlotHook<F> {
    index: usize,
    original: RwLock<Option<F>>,
}

impl<F: Copy> SlotHook<F> {
    const POINTER_SIZED: () = assert!(
        std::mem::size_of::<F>() == std::mem::size_of::<*const ()>(),
        "SlotHook requires a function pointer type"
    );

    pub const fn new(index: usize) -> Self {
        Self {
            index,
            original: RwLock::new(None),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Bind `detour` to the slot and remember the original
    ///
    /// # Safety
    /// `F` must be a function pointer type matching the signature and calling
    /// convention of the function in the slot
    pub unsafe fn bind(&self, session: &mut Session, detour: F) -> Result<F, SessionError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::POINTER_SIZED;

        let replacement: *const () = std::mem::transmute_copy(&detour);
        let original = session.bind(self.index, replacement)?;
        let original: F = std::mem::transmute_copy(&original);

        *self.original.write() = Some(original);
        Ok(original)
    }

    /// Original function, if the slot is bound through this hook
    pub fn original(&self) -> Option<F> {
        *self.original.read()
    }

    pub fn is_bound(&self) -> bool {
        self.original.read().is_some()
    }

    /// Unbind the slot and forget the original
    pub fn unbind(&self, session: &mut Session) {
        session.unbind(self.index);
        *self.original.write() = None;
    }
}

/// Declare a typed hook on a method table slot
///
/// Generates a `{NAME}_HOOK` static plus `{name}_bind`, `{name}_original`
/// and `{name}_unbind` functions.
///
/// # Example
/// ```ignore
/// use renderhook_sdk::slots;
///
/// slot_hook!(pub present, slots::d3d11::PRESENT,
///     unsafe extern "system" fn(*mut c_void, u32, u32) -> i32);
///
/// unsafe extern "system" fn present_detour(chain: *mut c_void, sync: u32, flags: u32) -> i32 {
///     // Draw overlay here
///     match present_original() {
///         Some(original) => original(chain, sync, flags),
///         None => 0,
///     }
/// }
///
/// unsafe { present_bind(&mut session, present_detour)? };
/// ```
#[macro_export]
macro_rules! slot_hook {
    ($vis:vis $name:ident, $index:expr, $fn_ty:ty) => {
        $crate::__private::paste::paste! {
            $vis static [<$name:upper _HOOK>]: $crate::hooks::SlotHook<$fn_ty> =
                $crate::hooks::SlotHook::new($index);

            /// # Safety
            /// The detour must match the slot's function signature
            #[allow(dead_code)]
            $vis unsafe fn [<$name _bind>](
                session: &mut $crate::Session,
                detour: $fn_ty,
            ) -> Result<$fn_ty, $crate::SessionError> {
                [<$name:upper _HOOK>].bind(session, detour)
            }

            #[allow(dead_code)]
            $vis fn [<$name _original>]() -> Option<$fn_ty> {
                [<$name:upper _HOOK>].original()
            }

            #[allow(dead_code)]
            $vis fn [<$name _unbind>](session: &mut $crate::Session) {
                [<$name:upper _HOOK>].unbind(session)
            }
        }
    };
}

#[cfg(all(test, target_arch = "x86_64", unix))]
mod tests {
    use renderhook_platform::Platform;
    use renderhook_sdk::modules;

    use crate::backend::Backend;
    use crate::backends::{BackendRegistry, RenderBackend};
    use crate::hooks::InlineHookEngine;
    use crate::table::{MethodTable, TableBuilder, TableLayout};
    use crate::testing::code::{multiply, BinaryFn, CodePage, ADD_CODE};
    use crate::testing::FakePlatform;
    use crate::{Session, SessionError};

    slot_hook!(add, 3, extern "C" fn(i32, i32) -> i32);

    /// OpenGL-shaped table whose slot 3 is real code
    struct CodeBackend {
        entry: usize,
    }

    impl RenderBackend for CodeBackend {
        fn backend(&self) -> Backend {
            Backend::OpenGL
        }

        fn build_table(&self, _platform: &dyn Platform) -> Result<MethodTable, SessionError> {
            let layout = TableLayout::of(Backend::OpenGL).unwrap();
            let mut slots = vec![std::ptr::null(); layout.len()];
            slots[3] = self.entry as *const ();

            let mut builder = TableBuilder::new(layout);
            builder.push("opengl", &slots)?;
            builder.finish()
        }
    }

    #[test]
    fn test_bound_slot_reaches_replacement() {
        let page = CodePage::with_code(&ADD_CODE);
        let target: BinaryFn = page.function();

        let mut session = Session::new(
            FakePlatform::with_modules(&[modules::OPENGL]),
            BackendRegistry::empty().with_backend(CodeBackend {
                entry: page.entry() as usize,
            }),
            InlineHookEngine::new(),
        );
        session.init(Backend::OpenGL).unwrap();
        assert_eq!(target(3, 4), 7);

        let original = unsafe { add_bind(&mut session, multiply) }.unwrap();
        assert!(ADD_HOOK.is_bound());
        assert_eq!(target(3, 4), 12);
        assert_eq!(original(3, 4), 7);
        assert_eq!(add_original().map(|f| f(2, 5)), Some(7));

        add_unbind(&mut session);
        assert!(add_original().is_none());
        assert_eq!(target(3, 4), 7);
        // Trampolines outlive their hooks
        assert_eq!(original(3, 4), 7);

        unsafe { add_bind(&mut session, multiply) }.unwrap();
        assert_eq!(target(6, 7), 42);

        session.shutdown();
        assert_eq!(target(6, 7), 13);
    }
}

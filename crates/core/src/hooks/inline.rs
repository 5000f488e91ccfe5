//! Inline function hooks
//!
//! Patches the entry of a target function with a jump to the detour. The
//! overwritten instructions are relocated with iced-x86 into a trampoline
//! that jumps back to the rest of the target, so the trampoline behaves like
//! the unhooked function.
//!
//! Patch forms:
//! - `E9 rel32` (5 bytes) straight to the detour when it is within ±2GB
//! - `E9 rel32` to an absolute-jump relay stored in the trampoline otherwise
//! - `FF 25 00000000 <abs64>` (14 bytes) when no near trampoline exists

use std::collections::HashMap;
use std::ptr::NonNull;

use super::engine::{HookEngine, HookError};
use super::trampoline::{self, Reach, Slot, TrampolineArena, SLOT_SIZE};

const JMP_REL32_LEN: usize = 5;

#[cfg(target_arch = "x86_64")]
const JMP_ABS_LEN: usize = 14;

#[cfg(target_arch = "x86_64")]
const BITNESS: u32 = 64;

#[cfg(target_arch = "x86")]
const BITNESS: u32 = 32;

/// Offset of the relay inside a trampoline; relocated code must end before it
#[cfg(target_arch = "x86_64")]
const RELAY_OFFSET: usize = SLOT_SIZE - JMP_ABS_LEN;

#[cfg(target_arch = "x86")]
const RELAY_OFFSET: usize = SLOT_SIZE;

/// Longest x86 instruction
const MAX_INSTRUCTION_LEN: usize = 15;

/// A prepared inline hook
struct InlineHook {
    target: usize,
    detour: usize,
    trampoline: NonNull<u8>,
    /// Bytes at the target that the patch replaces
    original_bytes: Vec<u8>,
    /// Jump (padded with NOPs) written over `original_bytes` while enabled
    patch: Vec<u8>,
    enabled: bool,
}

// SAFETY: Trampoline memory is never freed and is only written while the
// owning engine is borrowed mutably
unsafe impl Send for InlineHook {}

/// [`HookEngine`] that patches x86/x86_64 code in place
#[derive(Default)]
pub struct InlineHookEngine {
    hooks: HashMap<usize, InlineHook>,
    initialized: bool,
}

impl InlineHookEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hooks currently prepared
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Whether the hook at `target` is currently patched in
    pub fn is_enabled(&self, target: *const ()) -> bool {
        self.hooks
            .get(&(target as usize))
            .map(|hook| hook.enabled)
            .unwrap_or(false)
    }

    fn hook_mut(&mut self, target: *const ()) -> Result<&mut InlineHook, HookError> {
        if !self.initialized {
            return Err(HookError::NotInitialized);
        }
        self.hooks
            .get_mut(&(target as usize))
            .ok_or(HookError::NotFound)
    }
}

impl HookEngine for InlineHookEngine {
    fn initialize(&mut self) -> Result<(), HookError> {
        if !cfg!(any(target_arch = "x86_64", target_arch = "x86")) {
            return Err(HookError::UnsupportedArchitecture);
        }
        if !self.initialized {
            tracing::debug!("Inline hook engine initialized");
        }
        self.initialized = true;
        Ok(())
    }

    fn uninitialize(&mut self) -> Result<(), HookError> {
        if !self.initialized {
            return Ok(());
        }

        let mut result = Ok(());
        for (_, mut hook) in self.hooks.drain() {
            if let Err(e) = hook.restore() {
                tracing::error!("Failed to restore {:x}: {}", hook.target, e);
                result = Err(e);
            }
        }

        self.initialized = false;
        tracing::debug!("Inline hook engine uninitialized");
        result
    }

    unsafe fn create_hook(
        &mut self,
        target: *const (),
        detour: *const (),
    ) -> Result<*const (), HookError> {
        if !self.initialized {
            return Err(HookError::NotInitialized);
        }
        if target.is_null() {
            return Err(HookError::InvalidAddress(0));
        }
        if detour.is_null() {
            return Err(HookError::InvalidAddress(0));
        }
        if self.hooks.contains_key(&(target as usize)) {
            return Err(HookError::AlreadyCreated(target as usize));
        }

        tracing::debug!(
            "Creating inline hook at {:x} -> {:x}",
            target as usize,
            detour as usize
        );

        let hook = build_hook(&mut trampoline::arena(), target as usize, detour as usize)?;
        let original = hook.trampoline.as_ptr() as *const ();

        tracing::info!(
            "Created inline hook at {:x} ({} bytes patched, trampoline {:x})",
            hook.target,
            hook.patch.len(),
            original as usize
        );

        self.hooks.insert(target as usize, hook);
        Ok(original)
    }

    fn enable_hook(&mut self, target: *const ()) -> Result<(), HookError> {
        let hook = self.hook_mut(target)?;
        if hook.enabled {
            return Ok(());
        }

        write_code(hook.target, &hook.patch)
            .map_err(|e| HookError::EnableFailed(e.to_string()))?;
        hook.enabled = true;

        tracing::info!(
            "Enabled inline hook at {:x} -> {:x}",
            hook.target,
            hook.detour
        );
        Ok(())
    }

    fn disable_hook(&mut self, target: *const ()) -> Result<(), HookError> {
        let hook = self.hook_mut(target)?;
        hook.restore()
            .map_err(|e| HookError::DisableFailed(e.to_string()))?;

        tracing::info!("Disabled inline hook at {:x}", hook.target);
        Ok(())
    }

    fn remove_hook(&mut self, target: *const ()) -> Result<(), HookError> {
        self.disable_hook(target)?;
        self.hooks.remove(&(target as usize));

        tracing::info!("Removed inline hook at {:x}", target as usize);
        Ok(())
    }

    fn disable_all(&mut self) -> Result<(), HookError> {
        if !self.initialized {
            return Err(HookError::NotInitialized);
        }

        let mut result = Ok(());
        for hook in self.hooks.values_mut() {
            if let Err(e) = hook.restore() {
                tracing::error!("Failed to disable hook at {:x}: {}", hook.target, e);
                result = Err(HookError::DisableFailed(e.to_string()));
            }
        }
        result
    }
}

impl InlineHook {
    /// Put the original bytes back if the patch is in place
    fn restore(&mut self) -> Result<(), HookError> {
        if !self.enabled {
            return Ok(());
        }
        write_code(self.target, &self.original_bytes)?;
        self.enabled = false;
        Ok(())
    }
}

/// Overwrite code at `address`, temporarily making it writable
fn write_code(address: usize, bytes: &[u8]) -> Result<(), HookError> {
    // SAFETY: The caller owns a hook at `address`, so the range is mapped code
    // we previously read
    unsafe {
        let _guard = region::protect_with_handle(
            address as *const u8,
            bytes.len(),
            region::Protection::READ_WRITE_EXECUTE,
        )
        .map_err(|e| HookError::MemoryProtection(e.to_string()))?;

        std::ptr::copy_nonoverlapping(bytes.as_ptr(), address as *mut u8, bytes.len());
    }
    Ok(())
}

fn rel32_displacement(from: usize, to: usize) -> Option<i32> {
    let next = from.wrapping_add(JMP_REL32_LEN) as i64;
    i32::try_from(to as i64 - next).ok()
}

fn jmp_rel32(from: usize, to: usize) -> Option<Vec<u8>> {
    let displacement = rel32_displacement(from, to)?;
    let mut bytes = Vec::with_capacity(JMP_REL32_LEN);
    bytes.push(0xE9);
    bytes.extend_from_slice(&displacement.to_le_bytes());
    Some(bytes)
}

#[cfg(target_arch = "x86_64")]
fn jmp_abs(to: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(JMP_ABS_LEN);
    bytes.extend_from_slice(&[0xFF, 0x25, 0x00, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(&(to as u64).to_le_bytes());
    bytes
}

/// Entry patch for `target`, plus the relay to place in the slot if the
/// patch jumps through one
#[cfg(target_arch = "x86_64")]
fn entry_jump(target: usize, detour: usize, slot: &Slot) -> (Vec<u8>, Option<Vec<u8>>) {
    if let Some(jump) = jmp_rel32(target, detour) {
        return (jump, None);
    }

    if slot.reach() == Reach::Near {
        if let Some(jump) = jmp_rel32(target, slot.address() + RELAY_OFFSET) {
            return (jump, Some(jmp_abs(detour)));
        }
    }

    (jmp_abs(detour), None)
}

#[cfg(target_arch = "x86")]
fn entry_jump(target: usize, detour: usize, _slot: &Slot) -> (Vec<u8>, Option<Vec<u8>>) {
    // Every 32-bit address is reachable with rel32
    (jmp_rel32(target, detour).unwrap_or_default(), None)
}

/// Relocate the prologue of `target` into a slot from `arena`
///
/// The slot is only consumed once the prologue decodes and relocates.
#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
fn build_hook(
    arena: &mut TrampolineArena,
    target: usize,
    detour: usize,
) -> Result<InlineHook, HookError> {
    use iced_x86::{
        BlockEncoder, BlockEncoderOptions, Code, Decoder, DecoderOptions, FlowControl,
        Instruction, InstructionBlock,
    };

    let slot = arena
        .peek(target)
        .ok_or(HookError::TrampolineAllocation(target))?;

    let (jump, relay) = entry_jump(target, detour, &slot);
    if jump.is_empty() {
        return Err(HookError::DetourCreation(format!(
            "no jump encoding from {:x} to {:x}",
            target, detour
        )));
    }

    // SAFETY: `target` is the entry of a live function; the window covers
    // the instructions we may overwrite plus one maximal instruction
    let window = unsafe {
        std::slice::from_raw_parts(target as *const u8, jump.len() + MAX_INSTRUCTION_LEN)
    };
    let mut decoder = Decoder::with_ip(BITNESS, window, target as u64, DecoderOptions::NONE);

    let mut instructions: Vec<Instruction> = Vec::new();
    let mut copied = 0;
    while copied < jump.len() {
        let instr = decoder.decode();
        if instr.is_invalid() {
            return Err(HookError::RelocationFailed(format!(
                "undecodable instruction at {:x}",
                instr.ip()
            )));
        }

        copied += instr.len();
        let flow = instr.flow_control();
        instructions.push(instr);

        // The function ends before the patch does
        if copied < jump.len()
            && matches!(
                flow,
                FlowControl::Return | FlowControl::UnconditionalBranch | FlowControl::IndirectBranch
            )
        {
            return Err(HookError::TooShort(target));
        }
    }

    let resume = (target + copied) as u64;
    let jump_back = if BITNESS == 64 {
        Instruction::with_branch(Code::Jmp_rel32_64, resume)
    } else {
        Instruction::with_branch(Code::Jmp_rel32_32, resume)
    }
    .map_err(|e| HookError::RelocationFailed(e.to_string()))?;
    instructions.push(jump_back);

    let block = InstructionBlock::new(&instructions, slot.address() as u64);
    let encoded = BlockEncoder::encode(BITNESS, block, BlockEncoderOptions::NONE)
        .map_err(|e| HookError::RelocationFailed(e.to_string()))?;

    if encoded.code_buffer.len() > RELAY_OFFSET {
        return Err(HookError::RelocationFailed(format!(
            "relocated prologue of {:x} needs {} bytes",
            target,
            encoded.code_buffer.len()
        )));
    }

    arena.commit(&slot);

    // SAFETY: The slot is RWX memory of SLOT_SIZE bytes reserved for this
    // hook; the code ends before the relay and the relay ends at the slot end
    unsafe {
        std::ptr::copy_nonoverlapping(
            encoded.code_buffer.as_ptr(),
            slot.as_ptr(),
            encoded.code_buffer.len(),
        );
        if let Some(relay) = &relay {
            std::ptr::copy_nonoverlapping(
                relay.as_ptr(),
                slot.as_ptr().add(RELAY_OFFSET),
                relay.len(),
            );
        }
    }

    let original_bytes = window[..copied].to_vec();
    let mut patch = jump;
    patch.resize(copied, 0x90);

    Ok(InlineHook {
        target,
        detour,
        trampoline: NonNull::new(slot.as_ptr()).ok_or(HookError::TrampolineAllocation(target))?,
        original_bytes,
        patch,
        enabled: false,
    })
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
fn build_hook(
    _arena: &mut TrampolineArena,
    _target: usize,
    _detour: usize,
) -> Result<InlineHook, HookError> {
    Err(HookError::UnsupportedArchitecture)
}

//! Well-known slot indices into the unified method table
//!
//! Indices are absolute (sub-table base already added) and only valid for the
//! backend whose module they live in. The full per-backend mapping follows
//! from [`crate::layouts`] and the interface declaration order in the
//! platform SDK headers.

use crate::layouts;

/// `IDXGISwapChain` method offsets, relative to the swap chain sub-table
mod swap_chain {
    pub const PRESENT: usize = 8;
    pub const RESIZE_BUFFERS: usize = 13;
}

pub mod d3d9 {
    pub const RESET: usize = 16;
    pub const PRESENT: usize = 17;
    pub const BEGIN_SCENE: usize = 41;
    pub const END_SCENE: usize = 42;
    pub const CLEAR: usize = 43;
    pub const DRAW_PRIMITIVE: usize = 81;
    pub const DRAW_INDEXED_PRIMITIVE: usize = 82;
}

pub mod d3d10 {
    use super::{layouts, swap_chain};

    const DEVICE_BASE: usize = layouts::d3d10::SWAP_CHAIN;

    pub const PRESENT: usize = swap_chain::PRESENT;
    pub const RESIZE_BUFFERS: usize = swap_chain::RESIZE_BUFFERS;
    pub const DRAW_INDEXED: usize = DEVICE_BASE + 8;
    pub const DRAW: usize = DEVICE_BASE + 9;
}

pub mod d3d11 {
    use super::{layouts, swap_chain};

    const CONTEXT_BASE: usize = layouts::d3d11::SWAP_CHAIN + layouts::d3d11::DEVICE;

    pub const PRESENT: usize = swap_chain::PRESENT;
    pub const RESIZE_BUFFERS: usize = swap_chain::RESIZE_BUFFERS;
    pub const PS_SET_SHADER_RESOURCES: usize = CONTEXT_BASE + 8;
    pub const DRAW_INDEXED: usize = CONTEXT_BASE + 12;
    pub const DRAW: usize = CONTEXT_BASE + 13;
}

pub mod d3d12 {
    use super::{layouts, swap_chain};

    const QUEUE_BASE: usize = layouts::d3d12::DEVICE;
    const LIST_BASE: usize = QUEUE_BASE + layouts::d3d12::COMMAND_QUEUE + layouts::d3d12::COMMAND_ALLOCATOR;
    const SWAP_CHAIN_BASE: usize = LIST_BASE + layouts::d3d12::COMMAND_LIST;

    pub const EXECUTE_COMMAND_LISTS: usize = QUEUE_BASE + 10;
    pub const DRAW_INSTANCED: usize = LIST_BASE + 12;
    pub const DRAW_INDEXED_INSTANCED: usize = LIST_BASE + 13;
    pub const PRESENT: usize = SWAP_CHAIN_BASE + swap_chain::PRESENT;
    pub const RESIZE_BUFFERS: usize = SWAP_CHAIN_BASE + swap_chain::RESIZE_BUFFERS;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_known_indices() {
        assert_eq!(super::d3d9::END_SCENE, 42);
        assert_eq!(super::d3d10::DRAW_INDEXED, 26);
        assert_eq!(super::d3d11::PRESENT, 8);
        assert_eq!(super::d3d11::DRAW_INDEXED, 73);
        assert_eq!(super::d3d12::EXECUTE_COMMAND_LISTS, 54);
        assert_eq!(super::d3d12::DRAW_INDEXED_INSTANCED, 85);
        assert_eq!(super::d3d12::PRESENT, 140);
    }
}

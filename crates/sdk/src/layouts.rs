//! Dispatch slot counts per harvested interface
//!
//! These counts, together with the order in which interfaces are harvested,
//! form the external contract consumers rely on when addressing a specific
//! operation by index. Counts cover the full inheritance chain of each
//! interface (IUnknown methods included).

/// Direct3D 9: `IDirect3DDevice9`
pub mod d3d9 {
    pub const DEVICE: usize = 119;

    pub const TOTAL: usize = DEVICE;
}

/// Direct3D 10: swap chain first, then device
pub mod d3d10 {
    pub const SWAP_CHAIN: usize = 18;
    pub const DEVICE: usize = 98;

    pub const TOTAL: usize = SWAP_CHAIN + DEVICE;
}

/// Direct3D 11: swap chain, device, immediate context
pub mod d3d11 {
    pub const SWAP_CHAIN: usize = 18;
    pub const DEVICE: usize = 43;
    pub const CONTEXT: usize = 144;

    pub const TOTAL: usize = SWAP_CHAIN + DEVICE + CONTEXT;
}

/// Direct3D 12: device, command queue, command allocator, command list, swap chain
pub mod d3d12 {
    pub const DEVICE: usize = 44;
    pub const COMMAND_QUEUE: usize = 19;
    pub const COMMAND_ALLOCATOR: usize = 9;
    pub const COMMAND_LIST: usize = 60;
    pub const SWAP_CHAIN: usize = 18;

    pub const TOTAL: usize = DEVICE + COMMAND_QUEUE + COMMAND_ALLOCATOR + COMMAND_LIST + SWAP_CHAIN;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_totals() {
        assert_eq!(d3d9::TOTAL, 119);
        assert_eq!(d3d10::TOTAL, 116);
        assert_eq!(d3d11::TOTAL, 205);
        assert_eq!(d3d12::TOTAL, 150);
    }
}

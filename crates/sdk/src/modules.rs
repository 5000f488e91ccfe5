//! Backend library and entry point names
//!
//! Library names are looked up among modules that are already loaded into the
//! host process; nothing here is ever loaded on our behalf.

/// Direct3D 9 runtime
pub const D3D9: &str = "d3d9.dll";

/// DXGI, shared by Direct3D 10 and 12 for factory/adapter/swap chain creation
pub const DXGI: &str = "dxgi.dll";

/// Direct3D 10 runtime
pub const D3D10: &str = "d3d10.dll";

/// Direct3D 11 runtime
pub const D3D11: &str = "d3d11.dll";

/// Direct3D 12 runtime
pub const D3D12: &str = "d3d12.dll";

/// OpenGL ICD loader
#[cfg(windows)]
pub const OPENGL: &str = "opengl32.dll";

/// OpenGL (GLVND / Mesa)
#[cfg(not(windows))]
pub const OPENGL: &str = "libGL.so.1";

/// Vulkan loader
#[cfg(windows)]
pub const VULKAN: &str = "vulkan-1.dll";

/// Vulkan loader
#[cfg(not(windows))]
pub const VULKAN: &str = "libvulkan.so.1";

/// Native entry points used to build minimal contexts
pub mod entry_points {
    /// `IDirect3D9* Direct3DCreate9(UINT SDKVersion)`
    pub const DIRECT3D_CREATE9: &str = "Direct3DCreate9";

    /// `HRESULT CreateDXGIFactory(REFIID riid, void** ppFactory)`
    pub const CREATE_DXGI_FACTORY: &str = "CreateDXGIFactory";

    /// `HRESULT D3D10CreateDeviceAndSwapChain(...)`
    pub const D3D10_CREATE_DEVICE_AND_SWAP_CHAIN: &str = "D3D10CreateDeviceAndSwapChain";

    /// `HRESULT D3D11CreateDeviceAndSwapChain(...)`
    pub const D3D11_CREATE_DEVICE_AND_SWAP_CHAIN: &str = "D3D11CreateDeviceAndSwapChain";

    /// `HRESULT D3D12CreateDevice(IUnknown*, D3D_FEATURE_LEVEL, REFIID, void**)`
    pub const D3D12_CREATE_DEVICE: &str = "D3D12CreateDevice";
}

/// SDK versions passed to the creation entry points
pub mod sdk_versions {
    /// `D3D_SDK_VERSION` from d3d9.h
    pub const D3D9: u32 = 32;

    /// `D3D10_SDK_VERSION` from d3d10.h
    pub const D3D10: u32 = 29;

    /// `D3D11_SDK_VERSION` from d3d11.h
    pub const D3D11: u32 = 7;
}

/// Dummy window parameters shared by every object-based backend
pub mod dummy_window {
    /// Window class registered for the lifetime of context construction
    pub const CLASS_NAME: &str = "renderhook";

    /// Window title (never shown)
    pub const TITLE: &str = "renderhook DirectX Window";

    /// Width and height of the window and of every dummy back buffer
    pub const SIZE: u32 = 100;
}

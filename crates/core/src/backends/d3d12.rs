//! Direct3D 12 strategy
//!
//! Creates a device on the first DXGI adapter plus a direct command queue,
//! allocator, graphics command list and a flip-model swap chain on the
//! queue. The factory stays alive until the swap chain exists.

use std::ffi::c_void;

use renderhook_platform::{Platform, WindowHandle};
use renderhook_sdk::modules::{self, entry_points};
use windows::core::{Interface, GUID, HRESULT};
use windows::Win32::Graphics::Direct3D::{D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_11_0};
use windows::Win32::Graphics::Direct3D12::{
    ID3D12CommandAllocator, ID3D12CommandQueue, ID3D12Device, ID3D12GraphicsCommandList,
    ID3D12PipelineState, D3D12_COMMAND_LIST_TYPE_DIRECT, D3D12_COMMAND_QUEUE_DESC,
    D3D12_COMMAND_QUEUE_FLAG_NONE,
};
use windows::Win32::Graphics::Dxgi::{
    IDXGIAdapter, IDXGIFactory, IDXGISwapChain, DXGI_SWAP_EFFECT_FLIP_DISCARD,
};

use super::dxgi::{self, check, creation_error, entry_point, take_interface};
use super::factory::ContextStrategy;
use crate::backend::Backend;
use crate::error::SessionError;
use crate::table::TableBuilder;

type D3D12CreateDeviceFn = unsafe extern "system" fn(
    adapter: *mut c_void,
    minimum_feature_level: D3D_FEATURE_LEVEL,
    riid: *const GUID,
    device: *mut *mut c_void,
) -> HRESULT;

/// Throwaway Direct3D 12 objects, released in declaration order
pub struct D3D12Context {
    swap_chain: IDXGISwapChain,
    command_list: ID3D12GraphicsCommandList,
    command_allocator: ID3D12CommandAllocator,
    command_queue: ID3D12CommandQueue,
    device: ID3D12Device,
    _adapter: IDXGIAdapter,
    _factory: IDXGIFactory,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct D3D12Strategy;

impl ContextStrategy for D3D12Strategy {
    type Context = D3D12Context;

    fn backend(&self) -> Backend {
        Backend::D3D12
    }

    fn create_context(
        &self,
        platform: &dyn Platform,
        window: WindowHandle,
    ) -> Result<Self::Context, SessionError> {
        let factory = dxgi::create_factory(platform)?;
        let adapter = unsafe { factory.EnumAdapters(0) }
            .map_err(|e| creation_error("IDXGIAdapter", e))?;

        unsafe {
            let create: D3D12CreateDeviceFn =
                entry_point(platform, modules::D3D12, entry_points::D3D12_CREATE_DEVICE)?;

            let mut device = std::ptr::null_mut();
            check(
                create(
                    adapter.as_raw(),
                    D3D_FEATURE_LEVEL_11_0,
                    &ID3D12Device::IID,
                    &mut device,
                ),
                "ID3D12Device",
            )?;
            let device: ID3D12Device = take_interface(device, "ID3D12Device")?;

            let command_queue: ID3D12CommandQueue = device
                .CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                    Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                    Priority: 0,
                    Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                    NodeMask: 0,
                })
                .map_err(|e| creation_error("ID3D12CommandQueue", e))?;

            let command_allocator: ID3D12CommandAllocator = device
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .map_err(|e| creation_error("ID3D12CommandAllocator", e))?;

            let command_list: ID3D12GraphicsCommandList = device
                .CreateCommandList(
                    0,
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                    &command_allocator,
                    None::<&ID3D12PipelineState>,
                )
                .map_err(|e| creation_error("ID3D12GraphicsCommandList", e))?;

            let desc = dxgi::swap_chain_desc(window, 2, DXGI_SWAP_EFFECT_FLIP_DISCARD);
            let mut swap_chain = None;
            check(
                factory.CreateSwapChain(&command_queue, &desc, &mut swap_chain),
                "IDXGISwapChain",
            )?;
            let swap_chain = swap_chain.ok_or(SessionError::ContextCreation {
                object: "IDXGISwapChain",
                reason: "no swap chain returned".to_string(),
            })?;

            Ok(D3D12Context {
                swap_chain,
                command_list,
                command_allocator,
                command_queue,
                device,
                _adapter: adapter,
                _factory: factory,
            })
        }
    }

    fn harvest_slots(
        &self,
        context: &Self::Context,
        table: &mut TableBuilder,
    ) -> Result<(), SessionError> {
        dxgi::harvest(table, "ID3D12Device", &context.device)?;
        dxgi::harvest(table, "ID3D12CommandQueue", &context.command_queue)?;
        dxgi::harvest(table, "ID3D12CommandAllocator", &context.command_allocator)?;
        dxgi::harvest(table, "ID3D12GraphicsCommandList", &context.command_list)?;
        dxgi::harvest(table, "IDXGISwapChain", &context.swap_chain)
    }
}

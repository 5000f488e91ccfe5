//! Direct3D 10 strategy
//!
//! Uses the first DXGI adapter to create a hardware device with a swap
//! chain, then harvests the swap chain and device tables.

use std::ffi::c_void;

use renderhook_platform::{Platform, WindowHandle};
use renderhook_sdk::modules::{self, entry_points, sdk_versions};
use windows::core::{Interface, HRESULT};
use windows::Win32::Graphics::Direct3D10::{
    ID3D10Device, D3D10_DRIVER_TYPE, D3D10_DRIVER_TYPE_HARDWARE,
};
use windows::Win32::Graphics::Dxgi::{
    IDXGIAdapter, IDXGIFactory, IDXGISwapChain, DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_EFFECT_DISCARD,
};

use super::dxgi::{self, check, creation_error, entry_point, take_interface};
use super::factory::ContextStrategy;
use crate::backend::Backend;
use crate::error::SessionError;
use crate::table::TableBuilder;

type D3D10CreateDeviceAndSwapChainFn = unsafe extern "system" fn(
    adapter: *mut c_void,
    driver_type: D3D10_DRIVER_TYPE,
    software: *mut c_void,
    flags: u32,
    sdk_version: u32,
    swap_chain_desc: *const DXGI_SWAP_CHAIN_DESC,
    swap_chain: *mut *mut c_void,
    device: *mut *mut c_void,
) -> HRESULT;

/// Throwaway Direct3D 10 objects, released in declaration order
pub struct D3D10Context {
    swap_chain: IDXGISwapChain,
    device: ID3D10Device,
    _adapter: IDXGIAdapter,
    _factory: IDXGIFactory,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct D3D10Strategy;

impl ContextStrategy for D3D10Strategy {
    type Context = D3D10Context;

    fn backend(&self) -> Backend {
        Backend::D3D10
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
            let create: D3D10CreateDeviceAndSwapChainFn = entry_point(
                platform,
                modules::D3D10,
                entry_points::D3D10_CREATE_DEVICE_AND_SWAP_CHAIN,
            )?;

            let desc = dxgi::swap_chain_desc(window, 1, DXGI_SWAP_EFFECT_DISCARD);
            let mut swap_chain = std::ptr::null_mut();
            let mut device = std::ptr::null_mut();

            check(
                create(
                    adapter.as_raw(),
                    D3D10_DRIVER_TYPE_HARDWARE,
                    std::ptr::null_mut(),
                    0,
                    sdk_versions::D3D10,
                    &desc,
                    &mut swap_chain,
                    &mut device,
                ),
                "ID3D10Device",
            )?;

            // Take both before checking either so nothing leaks
            let swap_chain = take_interface::<IDXGISwapChain>(swap_chain, "IDXGISwapChain");
            let device = take_interface::<ID3D10Device>(device, "ID3D10Device");

            Ok(D3D10Context {
                swap_chain: swap_chain?,
                device: device?,
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
        dxgi::harvest(table, "IDXGISwapChain", &context.swap_chain)?;
        dxgi::harvest(table, "ID3D10Device", &context.device)
    }
}

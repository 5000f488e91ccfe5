//! Published method table layouts
//!
//! A layout is the order and size of the sub-tables concatenated into a
//! backend's [`MethodTable`](super::MethodTable). Consumers address slots by
//! index, so layouts never change once published.

use renderhook_sdk::{layouts, OPENGL_ENTRY_POINTS, VULKAN_ENTRY_POINTS};
use serde::{Deserialize, Serialize};

use crate::backend::Backend;

/// One harvested interface (or export list) within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubTable {
    pub name: &'static str,
    pub count: usize,
}

impl SubTable {
    pub const fn new(name: &'static str, count: usize) -> Self {
        Self { name, count }
    }
}

/// Static description of a backend's method table
#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    pub backend: Backend,
    pub sub_tables: &'static [SubTable],
    /// Slot names for symbol-table backends
    pub slot_names: Option<&'static [&'static str]>,
}

pub static D3D9_LAYOUT: TableLayout = TableLayout {
    backend: Backend::D3D9,
    sub_tables: &[SubTable::new("IDirect3DDevice9", layouts::d3d9::DEVICE)],
    slot_names: None,
};

pub static D3D10_LAYOUT: TableLayout = TableLayout {
    backend: Backend::D3D10,
    sub_tables: &[
        SubTable::new("IDXGISwapChain", layouts::d3d10::SWAP_CHAIN),
        SubTable::new("ID3D10Device", layouts::d3d10::DEVICE),
    ],
    slot_names: None,
};

pub static D3D11_LAYOUT: TableLayout = TableLayout {
    backend: Backend::D3D11,
    sub_tables: &[
        SubTable::new("IDXGISwapChain", layouts::d3d11::SWAP_CHAIN),
        SubTable::new("ID3D11Device", layouts::d3d11::DEVICE),
        SubTable::new("ID3D11DeviceContext", layouts::d3d11::CONTEXT),
    ],
    slot_names: None,
};

pub static D3D12_LAYOUT: TableLayout = TableLayout {
    backend: Backend::D3D12,
    sub_tables: &[
        SubTable::new("ID3D12Device", layouts::d3d12::DEVICE),
        SubTable::new("ID3D12CommandQueue", layouts::d3d12::COMMAND_QUEUE),
        SubTable::new("ID3D12CommandAllocator", layouts::d3d12::COMMAND_ALLOCATOR),
        SubTable::new("ID3D12GraphicsCommandList", layouts::d3d12::COMMAND_LIST),
        SubTable::new("IDXGISwapChain", layouts::d3d12::SWAP_CHAIN),
    ],
    slot_names: None,
};

pub static OPENGL_LAYOUT: TableLayout = TableLayout {
    backend: Backend::OpenGL,
    sub_tables: &[SubTable::new("opengl", OPENGL_ENTRY_POINTS.len())],
    slot_names: Some(OPENGL_ENTRY_POINTS),
};

pub static VULKAN_LAYOUT: TableLayout = TableLayout {
    backend: Backend::Vulkan,
    sub_tables: &[SubTable::new("vulkan", VULKAN_ENTRY_POINTS.len())],
    slot_names: Some(VULKAN_ENTRY_POINTS),
};

impl TableLayout {
    /// Layout of a concrete backend
    pub fn of(backend: Backend) -> Option<&'static TableLayout> {
        match backend {
            Backend::D3D9 => Some(&D3D9_LAYOUT),
            Backend::D3D10 => Some(&D3D10_LAYOUT),
            Backend::D3D11 => Some(&D3D11_LAYOUT),
            Backend::D3D12 => Some(&D3D12_LAYOUT),
            Backend::OpenGL => Some(&OPENGL_LAYOUT),
            Backend::Vulkan => Some(&VULKAN_LAYOUT),
            Backend::None | Backend::Auto => None,
        }
    }

    /// Total slot count
    pub fn len(&self) -> usize {
        self.sub_tables.iter().map(|sub| sub.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First slot index of the named sub-table
    pub fn sub_table_start(&self, name: &str) -> Option<usize> {
        let mut start = 0;
        for sub in self.sub_tables {
            if sub.name == name {
                return Some(start);
            }
            start += sub.count;
        }
        None
    }

    /// Sub-table containing `index` and the offset within it
    pub fn locate(&self, index: usize) -> Option<(&'static SubTable, usize)> {
        let mut start = 0;
        for sub in self.sub_tables {
            if index < start + sub.count {
                return Some((sub, index - start));
            }
            start += sub.count;
        }
        None
    }

    /// Exported symbol name of a slot (symbol-table backends only)
    pub fn slot_name(&self, index: usize) -> Option<&'static str> {
        self.slot_names.and_then(|names| names.get(index).copied())
    }

    /// Serializable description of this layout
    pub fn manifest(&self) -> SlotManifest {
        let mut start = 0;
        let sub_tables = self
            .sub_tables
            .iter()
            .map(|sub| {
                let entry = SubTableEntry {
                    name: sub.name.to_string(),
                    start,
                    count: sub.count,
                };
                start += sub.count;
                entry
            })
            .collect();

        let slots = self
            .slot_names
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(index, name)| NamedSlot {
                index,
                name: name.to_string(),
            })
            .collect();

        SlotManifest {
            backend: self.backend,
            total: self.len(),
            sub_tables,
            slots,
        }
    }
}

/// JSON-serializable listing of a table layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotManifest {
    pub backend: Backend,
    pub total: usize,
    pub sub_tables: Vec<SubTableEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<NamedSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTableEntry {
    pub name: String,
    pub start: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSlot {
    pub index: usize,
    pub name: String,
}

impl SlotManifest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

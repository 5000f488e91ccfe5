//! Backend identifiers
//!
//! [`Backend`] names a graphics API whose dispatch slots can be harvested.
//! Its integer values are part of the C ABI.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use renderhook_sdk::modules;
use serde::{Deserialize, Serialize};

/// A graphics/compute backend
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    None = 0,
    D3D9 = 1,
    D3D10 = 2,
    D3D11 = 3,
    D3D12 = 4,
    OpenGL = 5,
    Vulkan = 6,
    Auto = 7,
}

impl Backend {
    /// Auto-detection priority; the first backend whose module is loaded wins
    pub const AUTO_DETECT_ORDER: [Backend; 6] = [
        Backend::D3D9,
        Backend::D3D10,
        Backend::D3D11,
        Backend::D3D12,
        Backend::OpenGL,
        Backend::Vulkan,
    ];

    /// Convert from the C ABI integer value
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::D3D9),
            2 => Some(Self::D3D10),
            3 => Some(Self::D3D11),
            4 => Some(Self::D3D12),
            5 => Some(Self::OpenGL),
            6 => Some(Self::Vulkan),
            7 => Some(Self::Auto),
            _ => None,
        }
    }

    /// C ABI integer value
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Whether this names a concrete API (not `None` or `Auto`)
    pub fn is_concrete(self) -> bool {
        !matches!(self, Self::None | Self::Auto)
    }

    /// Module whose presence identifies this backend during auto-detection
    pub fn probe_module(self) -> Option<&'static str> {
        match self {
            Self::D3D9 => Some(modules::D3D9),
            Self::D3D10 => Some(modules::D3D10),
            Self::D3D11 => Some(modules::D3D11),
            Self::D3D12 => Some(modules::D3D12),
            Self::OpenGL => Some(modules::OPENGL),
            Self::Vulkan => Some(modules::VULKAN),
            Self::None | Self::Auto => None,
        }
    }

    /// Every module that must be loaded before a minimal context can be built
    pub fn required_modules(self) -> &'static [&'static str] {
        match self {
            Self::D3D9 => &[modules::D3D9],
            Self::D3D10 => &[modules::DXGI, modules::D3D10],
            Self::D3D11 => &[modules::D3D11],
            Self::D3D12 => &[modules::DXGI, modules::D3D12],
            Self::OpenGL => &[modules::OPENGL],
            Self::Vulkan => &[modules::VULKAN],
            Self::None | Self::Auto => &[],
        }
    }

    /// Lowercase name used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::D3D9 => "d3d9",
            Self::D3D10 => "d3d10",
            Self::D3D11 => "d3d11",
            Self::D3D12 => "d3d12",
            Self::OpenGL => "opengl",
            Self::Vulkan => "vulkan",
            Self::Auto => "auto",
        }
    }

    /// Set flag for a concrete backend
    pub fn flag(self) -> BackendSet {
        match self {
            Self::D3D9 => BackendSet::D3D9,
            Self::D3D10 => BackendSet::D3D10,
            Self::D3D11 => BackendSet::D3D11,
            Self::D3D12 => BackendSet::D3D12,
            Self::OpenGL => BackendSet::OPENGL,
            Self::Vulkan => BackendSet::VULKAN,
            Self::None | Self::Auto => BackendSet::empty(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error parsing a backend name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown backend: {0}")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "d3d9" => Ok(Self::D3D9),
            "d3d10" => Ok(Self::D3D10),
            "d3d11" => Ok(Self::D3D11),
            "d3d12" => Ok(Self::D3D12),
            "opengl" | "gl" => Ok(Self::OpenGL),
            "vulkan" | "vk" => Ok(Self::Vulkan),
            "auto" => Ok(Self::Auto),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

bitflags! {
    /// A set of concrete backends
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BackendSet: u32 {
        const D3D9 = 1 << 0;
        const D3D10 = 1 << 1;
        const D3D11 = 1 << 2;
        const D3D12 = 1 << 3;
        const OPENGL = 1 << 4;
        const VULKAN = 1 << 5;

        const DIRECT3D = Self::D3D9.bits() | Self::D3D10.bits() | Self::D3D11.bits() | Self::D3D12.bits();
    }
}

impl BackendSet {
    /// Whether `backend` is in the set
    pub fn has(&self, backend: Backend) -> bool {
        let flag = backend.flag();
        !flag.is_empty() && self.contains(flag)
    }

    /// Concrete backends in the set, in auto-detection order
    pub fn backends(&self) -> impl Iterator<Item = Backend> + '_ {
        Backend::AUTO_DETECT_ORDER
            .into_iter()
            .filter(move |backend| self.has(*backend))
    }
}

impl FromIterator<Backend> for BackendSet {
    fn from_iter<I: IntoIterator<Item = Backend>>(iter: I) -> Self {
        iter.into_iter()
            .fold(BackendSet::empty(), |set, backend| set | backend.flag())
    }
}

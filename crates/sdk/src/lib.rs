//! renderhook SDK - Graphics Backend Definitions
//!
//! This crate contains the static facts the rest of the workspace is built
//! on: which libraries identify each backend, which entry points create the
//! throwaway objects, and how many dispatch slots each harvested interface
//! contributes to the unified method table.
//!
//! It has no dependencies and compiles quickly, allowing parallel compilation
//! of dependent crates.
//!
//! # Modules
//!
//! - [`modules`] - Library names and native entry point names
//! - [`layouts`] - Per-interface slot counts (the table contract)
//! - [`slots`] - Well-known slot indices into the unified table
//! - [`symbols`] - Exported symbol lists for OpenGL and Vulkan

pub mod layouts;
pub mod modules;
pub mod slots;
pub mod symbols;

pub use symbols::{OPENGL_ENTRY_POINTS, VULKAN_ENTRY_POINTS};

//! # vkcaps
//! Vulkan capability resolution and function pointer loading.
//!
//! Every Vulkan scope (the loader itself, an instance, a device) gets one immutable
//! [`Capabilities`](caps::Capabilities) object. It records, for every
//! [functional group](caps::GroupDecl) of the [registry](caps::Registry), whether the group is
//! usable and, if so, the complete table of its entry points. A group is never half loaded.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use vkcaps::caps::groups::KhrSurfaceFn;
//! use vkcaps::caps::{vulkan_registry, Dispatchable};
//! use vkcaps::gapi::{entry::Entry, instance::Instance};
//!
//! let entry = Entry::open(Arc::new(vulkan_registry()?))?;
//! let instance = Instance::new(&entry, "demo")?;
//! if let Some(surface) = instance.capabilities().group::<KhrSurfaceFn>() {
//!     // `surface.destroy_surface_khr` is callable
//! #   let _ = surface;
//! }
//! # Ok(())
//! # }
//! ```

pub mod caps;
mod config;
pub mod errors;
pub mod gapi;
pub mod logging;

pub use caps::{Capabilities, DeclaredSupport, FunctionTable, GroupDecl, Registry, SymbolProvider};

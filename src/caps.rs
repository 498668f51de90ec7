//! # Capability resolution
//! Decides, once per provider scope, which functional groups of the Vulkan API are callable and
//! binds their entry points.
//!
//! The pieces, leaves first:
//! - [`SymbolProvider`]: name → address, or nothing.
//! - [`Registry`]: the declared [functional groups](GroupDecl), in precedence order.
//! - [`FunctionTable`]: the complete set of addresses of one group.
//! - [`Capabilities`]: the frozen per-scope result, queried before every call.

pub mod capabilities;
pub mod dispatch;
pub mod groups;
pub mod provider;
pub mod registry;
pub mod table;

pub use capabilities::{Capabilities, DeclaredSupport};
pub use dispatch::{Dispatchable, Handle};
pub use groups::{vulkan_registry, TypedGroup};
pub use provider::{
    is_instance_level, DeviceProcAddr, Fallback, InstanceLevel, InstanceProcAddr, RawFn, SymbolProvider,
};
pub use registry::{GroupClass, GroupDecl, GroupId, Registry};
pub use table::FunctionTable;

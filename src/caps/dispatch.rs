//! Handle to capabilities association for dispatchable handles.

use crate::caps::capabilities::Capabilities;
use crate::caps::table::FunctionTable;

/// Anything that knows the [`Capabilities`] of the scope it was created in.
///
/// Scope owners ([`Instance`](crate::gapi::instance::Instance),
/// [`Device`](crate::gapi::device::Device)) and [`Handle`] implement it.
pub trait Dispatchable {
    fn capabilities(&self) -> &Capabilities;

    /// Shortcut for `self.capabilities().table_checked(name)`.
    #[track_caller]
    fn table_checked(&self, name: &str) -> &FunctionTable {
        self.capabilities().table_checked(name)
    }
}

impl Dispatchable for Capabilities {
    fn capabilities(&self) -> &Capabilities {
        self
    }
}

/// A raw dispatchable handle (physical device, queue, command buffer...) paired with the
/// capabilities of the scope it belongs to.
///
/// The back-reference is set when the wrapper is created and never reassigned; it does not own
/// the capabilities and cannot outlive them.
#[derive(Debug, Clone, Copy)]
pub struct Handle<'c, H> {
    raw: H,
    capabilities: &'c Capabilities,
}

impl<'c, H: Copy> Handle<'c, H> {
    pub fn new(raw: H, capabilities: &'c Capabilities) -> Self {
        Self { raw, capabilities }
    }

    pub fn raw(&self) -> H {
        self.raw
    }
}

impl<H> Dispatchable for Handle<'_, H> {
    fn capabilities(&self) -> &Capabilities {
        self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::groups::{KhrSurfaceFn, TypedGroup};
    use crate::caps::provider::RawFn;
    use crate::caps::registry::{GroupDecl, Registry};
    use std::ffi::CStr;
    use std::sync::Arc;

    unsafe extern "system" fn stub() {}

    fn caps() -> Capabilities {
        let registry = Registry::new([KhrSurfaceFn::declaration(), GroupDecl::marker("VK_marker")]).unwrap();
        Capabilities::global(Arc::new(registry), &|_: &CStr| Some(stub as RawFn))
    }

    #[test]
    fn handles_reach_their_capabilities() {
        let caps = caps();
        let handle = Handle::new(7_u64, &caps);
        assert_eq!(handle.raw(), 7);
        assert!(handle.capabilities().is_supported("VK_KHR_surface"));
        let surface = KhrSurfaceFn::from_handle(&handle);
        assert_eq!(surface.destroy_surface_khr as usize, stub as RawFn as usize);
    }

    #[test]
    #[should_panic(expected = "`VK_marker` is not supported")]
    fn checked_table_through_handle() {
        let caps = caps();
        Handle::new((), &caps).table_checked("VK_marker");
    }
}

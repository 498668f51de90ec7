//! Symbol providers: where a functional group gets its entry point addresses from.
//!
//! A provider maps an entry point name to an address, or to nothing. Nothing is the normal way a
//! provider says "not here" and is what marks a group unsupported.

use std::ffi::{c_char, CStr};
use vulkanalia::vk;

/// An untyped native entry point. Always non-null: absence is `None` at the provider level.
pub type RawFn = unsafe extern "system" fn();

/// `vkGetInstanceProcAddr` as exported by the Vulkan loader library.
pub type GetInstanceProcAddr =
    unsafe extern "system" fn(instance: vk::Instance, name: *const c_char) -> Option<RawFn>;

/// `vkGetDeviceProcAddr`, itself resolved through an instance provider.
pub type GetDeviceProcAddr =
    unsafe extern "system" fn(device: vk::Device, name: *const c_char) -> Option<RawFn>;

/// # Symbol Provider
/// Maps a textual entry point name to its native address for one provider scope.
///
/// # Details
/// Implementations have no side effects visible to the resolution engine and may cache. A missing
/// symbol is reported as `None`; it is never an error.
///
/// Any `Fn(&CStr) -> Option<RawFn>` is a provider, which is what tests and custom hosts use.
pub trait SymbolProvider {
    fn resolve(&self, name: &CStr) -> Option<RawFn>;

    /// Tries `self` first, then `fallback` for the names `self` does not know.
    fn or_else<B>(self, fallback: B) -> Fallback<Self, B>
    where
        Self: Sized,
        B: SymbolProvider,
    {
        Fallback {
            primary: self,
            fallback,
        }
    }

    /// Restricts `self` to the [instance-level](is_instance_level) commands.
    fn instance_level(self) -> InstanceLevel<Self>
    where
        Self: Sized,
    {
        InstanceLevel(self)
    }
}

impl<F> SymbolProvider for F
where
    F: Fn(&CStr) -> Option<RawFn>,
{
    fn resolve(&self, name: &CStr) -> Option<RawFn> {
        self(name)
    }
}

/// Resolves through `vkGetInstanceProcAddr`.
/// With a null instance this is the global scope (only the global commands resolve).
#[derive(Clone, Copy, Debug)]
pub struct InstanceProcAddr {
    get_instance_proc_addr: GetInstanceProcAddr,
    instance: vk::Instance,
}

impl InstanceProcAddr {
    /// # Safety
    /// `get_instance_proc_addr` must be a valid `vkGetInstanceProcAddr` and `instance` either null
    /// or a live instance created by the same loader, for as long as the provider is used.
    pub unsafe fn new(get_instance_proc_addr: GetInstanceProcAddr, instance: vk::Instance) -> Self {
        Self {
            get_instance_proc_addr,
            instance,
        }
    }

    pub fn instance(&self) -> vk::Instance {
        self.instance
    }
}

impl SymbolProvider for InstanceProcAddr {
    fn resolve(&self, name: &CStr) -> Option<RawFn> {
        unsafe { (self.get_instance_proc_addr)(self.instance, name.as_ptr()) }
    }
}

/// Resolves through `vkGetDeviceProcAddr` for one device.
#[derive(Clone, Copy, Debug)]
pub struct DeviceProcAddr {
    get_device_proc_addr: GetDeviceProcAddr,
    device: vk::Device,
}

impl DeviceProcAddr {
    /// # Safety
    /// `get_device_proc_addr` must be a valid `vkGetDeviceProcAddr` and `device` a live device,
    /// for as long as the provider is used.
    pub unsafe fn new(get_device_proc_addr: GetDeviceProcAddr, device: vk::Device) -> Self {
        Self {
            get_device_proc_addr,
            device,
        }
    }
}

impl SymbolProvider for DeviceProcAddr {
    fn resolve(&self, name: &CStr) -> Option<RawFn> {
        unsafe { (self.get_device_proc_addr)(self.device, name.as_ptr()) }
    }
}

/// Two providers chained; see [`SymbolProvider::or_else`].
///
/// A device provider falls back to its instance provider so that core groups mixing instance- and
/// device-level commands still resolve at device scope. An unrestricted instance fallback would
/// answer device-level names with loader trampolines and hide the `NULL` that marks a group
/// absent for the device, so the fallback is wrapped in [`InstanceLevel`].
#[derive(Clone, Copy, Debug)]
pub struct Fallback<A, B> {
    primary: A,
    fallback: B,
}

impl<A: SymbolProvider, B: SymbolProvider> SymbolProvider for Fallback<A, B> {
    fn resolve(&self, name: &CStr) -> Option<RawFn> {
        self.primary
            .resolve(name)
            .or_else(|| self.fallback.resolve(name))
    }
}

/// Device-creating and device-querying commands that take a `VkPhysicalDevice` without saying so
/// in their name.
const INSTANCE_LEVEL_COMMANDS: [&CStr; 6] = [
    c"vkCreateDevice",
    c"vkEnumerateDeviceExtensionProperties",
    c"vkEnumerateDeviceLayerProperties",
    c"vkGetDeviceProcAddr",
    c"vkDestroySurfaceKHR",
    c"vkSubmitDebugUtilsMessageEXT",
];

/// Whether `name` is dispatched through a `VkInstance` or a `VkPhysicalDevice`, following the
/// Vulkan naming conventions.
pub fn is_instance_level(name: &CStr) -> bool {
    let Ok(name) = name.to_str() else {
        return false;
    };
    INSTANCE_LEVEL_COMMANDS.iter().any(|command| command.to_bytes() == name.as_bytes())
        || name.contains("Instance")
        || name.contains("PhysicalDevice")
        || name.contains("DebugUtilsMessenger")
        || (name.starts_with("vkCreate") && name.ends_with("SurfaceKHR"))
}

/// A provider answering only [instance-level](is_instance_level) names.
#[derive(Clone, Copy, Debug)]
pub struct InstanceLevel<P>(P);

impl<P: SymbolProvider> SymbolProvider for InstanceLevel<P> {
    fn resolve(&self, name: &CStr) -> Option<RawFn> {
        if is_instance_level(name) {
            self.0.resolve(name)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "system" fn first() {}
    unsafe extern "system" fn second() {}

    #[test]
    fn closures_are_providers() {
        let provider = |name: &CStr| (name == c"vkFirst").then_some(first as RawFn);
        assert_eq!(provider.resolve(c"vkFirst").map(|f| f as usize), Some(first as RawFn as usize));
        assert!(provider.resolve(c"vkSecond").is_none());
    }

    #[test]
    fn fallback_prefers_primary() {
        let primary = |name: &CStr| (name == c"vkShared").then_some(first as RawFn);
        let fallback = |name: &CStr| {
            (name == c"vkShared" || name == c"vkOnlyFallback").then_some(second as RawFn)
        };
        let chained = primary.or_else(fallback);

        assert_eq!(chained.resolve(c"vkShared").map(|f| f as usize), Some(first as RawFn as usize));
        assert_eq!(
            chained.resolve(c"vkOnlyFallback").map(|f| f as usize),
            Some(second as RawFn as usize)
        );
        assert!(chained.resolve(c"vkNowhere").is_none());
    }

    #[test]
    fn instance_level_names() {
        for name in [
            c"vkDestroyInstance",
            c"vkEnumeratePhysicalDevices",
            c"vkGetPhysicalDeviceProperties2KHR",
            c"vkCreateDevice",
            c"vkEnumerateDeviceExtensionProperties",
            c"vkCreateWaylandSurfaceKHR",
            c"vkDestroySurfaceKHR",
            c"vkCreateDebugUtilsMessengerEXT",
        ] {
            assert!(is_instance_level(name), "{name:?}");
        }
        for name in [
            c"vkDestroyDevice",
            c"vkQueueSubmit",
            c"vkCreateSwapchainKHR",
            c"vkCmdBeginRenderingKHR",
            c"vkSetDebugUtilsObjectNameEXT",
        ] {
            assert!(!is_instance_level(name), "{name:?}");
        }
    }

    #[test]
    fn device_misses_stay_misses_behind_an_instance_fallback() {
        let device = |name: &CStr| (name == c"vkQueueSubmit").then_some(first as RawFn);
        let instance = |_: &CStr| Some(second as RawFn);
        let chained = device.or_else(instance.instance_level());

        assert_eq!(chained.resolve(c"vkQueueSubmit").map(|f| f as usize), Some(first as RawFn as usize));
        assert_eq!(
            chained.resolve(c"vkEnumeratePhysicalDevices").map(|f| f as usize),
            Some(second as RawFn as usize)
        );
        assert!(chained.resolve(c"vkCmdBeginRenderingKHR").is_none());
    }
}

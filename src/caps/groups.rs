//! Typed views over resolved functional groups, and the groups this crate knows about.

use crate::caps::dispatch::Dispatchable;
use crate::caps::provider::GetDeviceProcAddr;
use crate::caps::registry::{GroupDecl, Registry};
use crate::caps::table::FunctionTable;
use crate::errors::RegistryError;
use vulkanalia::vk;

/// A functional group with named, typed entry points.
///
/// Implementations come from [`function_group!`](crate::function_group): the declaration and the
/// typed fields are generated from the same list, so slot `i` always has the type of field `i`.
pub trait TypedGroup: Sized {
    /// Capability name of the group.
    const NAME: &'static str;

    /// The registry declaration of the group.
    fn declaration() -> GroupDecl;

    /// Reads the typed entry points out of a resolved table of this group.
    ///
    /// # Panics
    /// If `table` belongs to another group.
    fn from_table(table: &FunctionTable) -> Self;

    /// The group as supported by the scope `handle` belongs to.
    ///
    /// # Panics
    /// If that scope does not support the group.
    #[track_caller]
    fn from_handle<D: Dispatchable + ?Sized>(handle: &D) -> Self {
        handle.capabilities().group_checked::<Self>()
    }
}

#[cold]
#[inline(never)]
#[track_caller]
#[doc(hidden)]
pub fn table_mismatch(expected: &str, table: &FunctionTable) -> ! {
    panic!(
        "table of `{}` ({} entry points) read as `{expected}`",
        table.name(),
        table.len()
    );
}

/// Declares a typed functional group.
///
/// ```ignore
/// function_group! {
///     /// VK_KHR_surface entry points
///     pub struct KhrSurfaceFn: extension "VK_KHR_surface" {
///         destroy_surface_khr: vk::PFN_vkDestroySurfaceKHR = c"vkDestroySurfaceKHR",
///     }
/// }
/// ```
///
/// The group kind is one of `version(major, minor)` (named `Vulkan{major}{minor}`),
/// `core "Name"` or `extension "Name"`.
#[macro_export]
macro_rules! function_group {
    (@typed $(#[$meta:meta])* $vis:vis $ty:ident, $name:expr, $decl:expr, $($field:ident : $pfn:ty),+) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        $vis struct $ty {
            $(pub $field: $pfn,)+
        }

        impl $crate::caps::TypedGroup for $ty {
            const NAME: &'static str = $name;

            fn declaration() -> $crate::caps::GroupDecl {
                $decl
            }

            #[track_caller]
            fn from_table(table: &$crate::caps::FunctionTable) -> Self {
                const COUNT: usize = [$(stringify!($field)),+].len();
                if table.name() != Self::NAME {
                    $crate::caps::groups::table_mismatch(Self::NAME, table);
                }
                let slots: [$crate::caps::RawFn; COUNT] = match table.slots().try_into() {
                    Ok(slots) => slots,
                    Err(_) => $crate::caps::groups::table_mismatch(Self::NAME, table),
                };
                let [$($field),+] = slots;
                // Slot `i` was resolved from the symbol declared next to field `i`.
                unsafe {
                    Self {
                        $($field: ::std::mem::transmute::<$crate::caps::RawFn, $pfn>($field),)+
                    }
                }
            }
        }

        impl ::std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &(self.$field as *const ())))+
                    .finish()
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident : version($major:literal, $minor:literal) {
            $($field:ident : $pfn:ty = $symbol:literal),+ $(,)?
        }
    ) => {
        $crate::function_group!(@typed $(#[$meta])* $vis $ty,
            concat!("Vulkan", $major, $minor),
            $crate::caps::GroupDecl::core_version($major, $minor, [$($symbol),+]),
            $($field : $pfn),+);
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident : core $name:literal {
            $($field:ident : $pfn:ty = $symbol:literal),+ $(,)?
        }
    ) => {
        $crate::function_group!(@typed $(#[$meta])* $vis $ty,
            $name,
            $crate::caps::GroupDecl::new($name, $crate::caps::GroupClass::Core, [$($symbol),+]),
            $($field : $pfn),+);
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident : extension $name:literal {
            $($field:ident : $pfn:ty = $symbol:literal),+ $(,)?
        }
    ) => {
        $crate::function_group!(@typed $(#[$meta])* $vis $ty,
            $name,
            $crate::caps::GroupDecl::extension($name, [$($symbol),+]),
            $($field : $pfn),+);
    };
}

function_group! {
    /// Commands available before any instance exists.
    pub struct GlobalFn: core "VulkanGlobal" {
        create_instance: vk::PFN_vkCreateInstance = c"vkCreateInstance",
        enumerate_instance_extension_properties: vk::PFN_vkEnumerateInstanceExtensionProperties = c"vkEnumerateInstanceExtensionProperties",
        enumerate_instance_layer_properties: vk::PFN_vkEnumerateInstanceLayerProperties = c"vkEnumerateInstanceLayerProperties",
    }
}

function_group! {
    /// `vkEnumerateInstanceVersion`, only exported by 1.1+ loaders.
    pub struct Global11Fn: core "VulkanGlobal11" {
        enumerate_instance_version: vk::PFN_vkEnumerateInstanceVersion = c"vkEnumerateInstanceVersion",
    }
}

function_group! {
    /// The Vulkan 1.0 commands this crate binds.
    pub struct Vulkan10Fn: version(1, 0) {
        destroy_instance: vk::PFN_vkDestroyInstance = c"vkDestroyInstance",
        enumerate_physical_devices: vk::PFN_vkEnumeratePhysicalDevices = c"vkEnumeratePhysicalDevices",
        get_physical_device_properties: vk::PFN_vkGetPhysicalDeviceProperties = c"vkGetPhysicalDeviceProperties",
        get_physical_device_features: vk::PFN_vkGetPhysicalDeviceFeatures = c"vkGetPhysicalDeviceFeatures",
        get_physical_device_queue_family_properties: vk::PFN_vkGetPhysicalDeviceQueueFamilyProperties = c"vkGetPhysicalDeviceQueueFamilyProperties",
        get_physical_device_memory_properties: vk::PFN_vkGetPhysicalDeviceMemoryProperties = c"vkGetPhysicalDeviceMemoryProperties",
        enumerate_device_extension_properties: vk::PFN_vkEnumerateDeviceExtensionProperties = c"vkEnumerateDeviceExtensionProperties",
        create_device: vk::PFN_vkCreateDevice = c"vkCreateDevice",
        get_device_proc_addr: GetDeviceProcAddr = c"vkGetDeviceProcAddr",
        destroy_device: vk::PFN_vkDestroyDevice = c"vkDestroyDevice",
        get_device_queue: vk::PFN_vkGetDeviceQueue = c"vkGetDeviceQueue",
        device_wait_idle: vk::PFN_vkDeviceWaitIdle = c"vkDeviceWaitIdle",
        queue_submit: vk::PFN_vkQueueSubmit = c"vkQueueSubmit",
        queue_wait_idle: vk::PFN_vkQueueWaitIdle = c"vkQueueWaitIdle",
        create_fence: vk::PFN_vkCreateFence = c"vkCreateFence",
        destroy_fence: vk::PFN_vkDestroyFence = c"vkDestroyFence",
        wait_for_fences: vk::PFN_vkWaitForFences = c"vkWaitForFences",
        reset_fences: vk::PFN_vkResetFences = c"vkResetFences",
        create_semaphore: vk::PFN_vkCreateSemaphore = c"vkCreateSemaphore",
        destroy_semaphore: vk::PFN_vkDestroySemaphore = c"vkDestroySemaphore",
    }
}

function_group! {
    pub struct Vulkan11Fn: version(1, 1) {
        get_physical_device_features2: vk::PFN_vkGetPhysicalDeviceFeatures2 = c"vkGetPhysicalDeviceFeatures2",
        get_physical_device_properties2: vk::PFN_vkGetPhysicalDeviceProperties2 = c"vkGetPhysicalDeviceProperties2",
        get_device_queue2: vk::PFN_vkGetDeviceQueue2 = c"vkGetDeviceQueue2",
        bind_buffer_memory2: vk::PFN_vkBindBufferMemory2 = c"vkBindBufferMemory2",
        bind_image_memory2: vk::PFN_vkBindImageMemory2 = c"vkBindImageMemory2",
    }
}

function_group! {
    pub struct Vulkan12Fn: version(1, 2) {
        get_semaphore_counter_value: vk::PFN_vkGetSemaphoreCounterValue = c"vkGetSemaphoreCounterValue",
        wait_semaphores: vk::PFN_vkWaitSemaphores = c"vkWaitSemaphores",
        signal_semaphore: vk::PFN_vkSignalSemaphore = c"vkSignalSemaphore",
        get_buffer_device_address: vk::PFN_vkGetBufferDeviceAddress = c"vkGetBufferDeviceAddress",
        cmd_draw_indirect_count: vk::PFN_vkCmdDrawIndirectCount = c"vkCmdDrawIndirectCount",
    }
}

function_group! {
    pub struct Vulkan13Fn: version(1, 3) {
        cmd_begin_rendering: vk::PFN_vkCmdBeginRendering = c"vkCmdBeginRendering",
        cmd_end_rendering: vk::PFN_vkCmdEndRendering = c"vkCmdEndRendering",
        cmd_pipeline_barrier2: vk::PFN_vkCmdPipelineBarrier2 = c"vkCmdPipelineBarrier2",
        queue_submit2: vk::PFN_vkQueueSubmit2 = c"vkQueueSubmit2",
    }
}

function_group! {
    pub struct KhrSurfaceFn: extension "VK_KHR_surface" {
        destroy_surface_khr: vk::PFN_vkDestroySurfaceKHR = c"vkDestroySurfaceKHR",
        get_physical_device_surface_support_khr: vk::PFN_vkGetPhysicalDeviceSurfaceSupportKHR = c"vkGetPhysicalDeviceSurfaceSupportKHR",
        get_physical_device_surface_capabilities_khr: vk::PFN_vkGetPhysicalDeviceSurfaceCapabilitiesKHR = c"vkGetPhysicalDeviceSurfaceCapabilitiesKHR",
        get_physical_device_surface_formats_khr: vk::PFN_vkGetPhysicalDeviceSurfaceFormatsKHR = c"vkGetPhysicalDeviceSurfaceFormatsKHR",
        get_physical_device_surface_present_modes_khr: vk::PFN_vkGetPhysicalDeviceSurfacePresentModesKHR = c"vkGetPhysicalDeviceSurfacePresentModesKHR",
    }
}

function_group! {
    /// Promoted to core in 1.1; same signatures as the core commands.
    pub struct KhrGetPhysicalDeviceProperties2Fn: extension "VK_KHR_get_physical_device_properties2" {
        get_physical_device_features2_khr: vk::PFN_vkGetPhysicalDeviceFeatures2 = c"vkGetPhysicalDeviceFeatures2KHR",
        get_physical_device_properties2_khr: vk::PFN_vkGetPhysicalDeviceProperties2 = c"vkGetPhysicalDeviceProperties2KHR",
        get_physical_device_format_properties2_khr: vk::PFN_vkGetPhysicalDeviceFormatProperties2 = c"vkGetPhysicalDeviceFormatProperties2KHR",
        get_physical_device_queue_family_properties2_khr: vk::PFN_vkGetPhysicalDeviceQueueFamilyProperties2 = c"vkGetPhysicalDeviceQueueFamilyProperties2KHR",
        get_physical_device_memory_properties2_khr: vk::PFN_vkGetPhysicalDeviceMemoryProperties2 = c"vkGetPhysicalDeviceMemoryProperties2KHR",
    }
}

function_group! {
    pub struct KhrSwapchainFn: extension "VK_KHR_swapchain" {
        create_swapchain_khr: vk::PFN_vkCreateSwapchainKHR = c"vkCreateSwapchainKHR",
        destroy_swapchain_khr: vk::PFN_vkDestroySwapchainKHR = c"vkDestroySwapchainKHR",
        get_swapchain_images_khr: vk::PFN_vkGetSwapchainImagesKHR = c"vkGetSwapchainImagesKHR",
        acquire_next_image_khr: vk::PFN_vkAcquireNextImageKHR = c"vkAcquireNextImageKHR",
        queue_present_khr: vk::PFN_vkQueuePresentKHR = c"vkQueuePresentKHR",
    }
}

function_group! {
    pub struct ExtDebugUtilsFn: extension "VK_EXT_debug_utils" {
        create_debug_utils_messenger_ext: vk::PFN_vkCreateDebugUtilsMessengerEXT = c"vkCreateDebugUtilsMessengerEXT",
        destroy_debug_utils_messenger_ext: vk::PFN_vkDestroyDebugUtilsMessengerEXT = c"vkDestroyDebugUtilsMessengerEXT",
        set_debug_utils_object_name_ext: vk::PFN_vkSetDebugUtilsObjectNameEXT = c"vkSetDebugUtilsObjectNameEXT",
        cmd_begin_debug_utils_label_ext: vk::PFN_vkCmdBeginDebugUtilsLabelEXT = c"vkCmdBeginDebugUtilsLabelEXT",
        cmd_end_debug_utils_label_ext: vk::PFN_vkCmdEndDebugUtilsLabelEXT = c"vkCmdEndDebugUtilsLabelEXT",
    }
}

function_group! {
    /// Promoted to core in 1.3; same signatures as the core commands.
    pub struct KhrDynamicRenderingFn: extension "VK_KHR_dynamic_rendering" {
        cmd_begin_rendering_khr: vk::PFN_vkCmdBeginRendering = c"vkCmdBeginRenderingKHR",
        cmd_end_rendering_khr: vk::PFN_vkCmdEndRendering = c"vkCmdEndRenderingKHR",
    }
}

function_group! {
    /// Promoted to core in 1.3; same signatures as the core commands.
    pub struct KhrSynchronization2Fn: extension "VK_KHR_synchronization2" {
        cmd_pipeline_barrier2_khr: vk::PFN_vkCmdPipelineBarrier2 = c"vkCmdPipelineBarrier2KHR",
        queue_submit2_khr: vk::PFN_vkQueueSubmit2 = c"vkQueueSubmit2KHR",
        cmd_write_timestamp2_khr: vk::PFN_vkCmdWriteTimestamp2 = c"vkCmdWriteTimestamp2KHR",
    }
}

/// Extensions that add no commands, only structures and behaviour.
pub const MARKER_EXTENSIONS: [&str; 4] = [
    "VK_KHR_portability_enumeration",
    "VK_KHR_portability_subset",
    "VK_EXT_descriptor_indexing",
    "VK_KHR_shader_draw_parameters",
];

/// The registry of every group declared in this module.
pub fn vulkan_registry() -> Result<Registry, RegistryError> {
    let typed = [
        GlobalFn::declaration(),
        Global11Fn::declaration(),
        Vulkan10Fn::declaration(),
        Vulkan11Fn::declaration(),
        Vulkan12Fn::declaration(),
        Vulkan13Fn::declaration(),
        KhrSurfaceFn::declaration(),
        KhrGetPhysicalDeviceProperties2Fn::declaration(),
        KhrSwapchainFn::declaration(),
        ExtDebugUtilsFn::declaration(),
        KhrDynamicRenderingFn::declaration(),
        KhrSynchronization2Fn::declaration(),
    ];
    Registry::new(typed.into_iter().chain(MARKER_EXTENSIONS.map(GroupDecl::marker)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::registry::GroupClass;
    use crate::caps::{GroupId, RawFn};
    use std::ffi::CStr;

    unsafe extern "system" fn stub() {}

    fn everything(_: &CStr) -> Option<RawFn> {
        Some(stub as RawFn)
    }

    #[test]
    fn builtin_registry_is_valid_and_ordered() {
        let registry = vulkan_registry().unwrap();
        let names = registry.iter().map(|(_, g)| g.name()).collect::<Vec<_>>();
        assert_eq!(
            &names[..6],
            ["Vulkan10", "Vulkan11", "Vulkan12", "Vulkan13", "VulkanGlobal", "VulkanGlobal11"]
        );
        assert_eq!(names.len(), 16);
        assert!(registry.iter().skip(6).all(|(_, g)| g.class() == GroupClass::Extension));
    }

    #[test]
    fn macro_names_core_versions() {
        assert_eq!(Vulkan12Fn::NAME, "Vulkan12");
        assert_eq!(Vulkan12Fn::declaration().version(), Some((1, 2)));
        assert_eq!(&*KhrSwapchainFn::declaration().entry_points()[3], c"vkAcquireNextImageKHR");
    }

    #[test]
    fn typed_view_reads_every_slot() {
        let decl = KhrSurfaceFn::declaration();
        let table = FunctionTable::try_resolve(GroupId(0), &decl, &everything).unwrap();
        let surface = KhrSurfaceFn::from_table(&table);
        assert_eq!(surface.destroy_surface_khr as usize, stub as RawFn as usize);
        assert_eq!(
            surface.get_physical_device_surface_present_modes_khr as usize,
            stub as RawFn as usize
        );
    }

    #[test]
    #[should_panic(expected = "read as `VK_KHR_swapchain`")]
    fn typed_view_rejects_foreign_tables() {
        let decl = KhrSurfaceFn::declaration();
        let table = FunctionTable::try_resolve(GroupId(0), &decl, &everything).unwrap();
        KhrSwapchainFn::from_table(&table);
    }
}

//! # Vulkan Extensions and Layers
//! The extensions and layers the scope objects negotiate.
//!
//! # Details
//! Vulkan extensions must be explicitly **queried for availability** and **enabled during creation**
//! of the instance or the device. The names that end up enabled are the declared-support set of
//! the resulting [`Capabilities`](crate::caps::Capabilities): a group is only resolved if its
//! extension was enabled.
//!
//! - **Instance extensions** are enabled in `vkCreateInstance` (window system integration, debugging).
//! - **Device extensions** are enabled in `vkCreateDevice` (swapchain, synchronization, rendering).
//! - **Layers** intercept calls; only instance layers are used.

use crate::config::{API_DUMP_ENABLED, VALIDATION_ENABLED};

macro_rules! name_enum {
    (
        $(#[$outer:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$inner:meta])*
                $variant:ident = $str:literal,
            )+
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$inner])*
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            /// The Vulkan name string.
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }

            /// Constructs the variant from a Vulkan name, `None` for names this crate does not use.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($str => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

name_enum! {
    /// Instance extensions the instance may enable.
    pub enum InstanceExtension {
        /// # VK_EXT_debug_utils
        /// Debug names, labels and the validation message callback.
        ExtDebugUtils = "VK_EXT_debug_utils",
        /// # VK_KHR_surface
        /// Cross-platform window system integration base.
        KhrSurface = "VK_KHR_surface",
        /// # VK_KHR_get_physical_device_properties2
        /// Extended feature and property queries. Promoted to core in Vulkan 1.1.
        KhrGetPhysicalDeviceProperties2 = "VK_KHR_get_physical_device_properties2",
        /// # VK_KHR_portability_enumeration
        /// Lists portability-subset devices (MoltenVK). Needs the
        /// `ENUMERATE_PORTABILITY_KHR` instance flag.
        KhrPortabilityEnumeration = "VK_KHR_portability_enumeration",
    }
}

name_enum! {
    /// Device extensions the device may enable.
    pub enum DeviceExtension {
        /// Required for presenting images to a surface
        KhrSwapchain = "VK_KHR_swapchain",
        /// Pipeline barriers and submissions v2
        KhrSynchronization2 = "VK_KHR_synchronization2",
        /// Render pass-less rendering
        KhrDynamicRendering = "VK_KHR_dynamic_rendering",
        /// Bindless / variable-descriptor-count magic
        ExtDescriptorIndexing = "VK_EXT_descriptor_indexing",
        /// gl_DrawID etc. without vertex attributes
        KhrShaderDrawParameters = "VK_KHR_shader_draw_parameters",
        /// Portability subset (MoltenVK etc.)
        KhrPortabilitySubset = "VK_KHR_portability_subset",
    }
}

name_enum! {
    /// Instance layers.
    pub enum InstanceLayer {
        /// # `VK_LAYER_KHRONOS_validation`
        /// The official all-in-one validation layer maintained by Khronos.
        Validation = "VK_LAYER_KHRONOS_validation",
        /// # `VK_LAYER_LUNARG_api_dump`
        /// Logs every Vulkan call with its parameters.
        ApiDump = "VK_LAYER_LUNARG_api_dump",
    }
}

impl InstanceExtension {
    /// The instance extensions wanted with the current configuration.
    pub fn requested() -> Vec<InstanceExtension> {
        let mut extensions = vec![InstanceExtension::KhrSurface];
        if VALIDATION_ENABLED || API_DUMP_ENABLED {
            extensions.push(InstanceExtension::ExtDebugUtils);
        }
        if cfg!(target_os = "macos") {
            extensions.push(InstanceExtension::KhrGetPhysicalDeviceProperties2);
            extensions.push(InstanceExtension::KhrPortabilityEnumeration);
        }
        extensions
    }
}

impl DeviceExtension {
    /// The device extensions wanted with the current configuration.
    pub fn requested() -> Vec<DeviceExtension> {
        let mut extensions = vec![
            DeviceExtension::KhrSwapchain,
            DeviceExtension::KhrSynchronization2,
            DeviceExtension::KhrDynamicRendering,
            DeviceExtension::ExtDescriptorIndexing,
            DeviceExtension::KhrShaderDrawParameters,
        ];
        if cfg!(target_os = "macos") {
            extensions.push(DeviceExtension::KhrPortabilitySubset);
        }
        extensions
    }
}

impl InstanceLayer {
    /// The layers wanted with the current configuration.
    pub fn requested() -> Vec<InstanceLayer> {
        let mut layers = vec![];
        if VALIDATION_ENABLED && API_DUMP_ENABLED {
            layers.push(InstanceLayer::ApiDump);
        }
        if VALIDATION_ENABLED {
            layers.push(InstanceLayer::Validation);
        }
        layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::vulkan_registry;

    #[test]
    fn names_round_trip_through_from_name() {
        for extension in DeviceExtension::ALL {
            assert_eq!(DeviceExtension::from_name(extension.name()), Some(*extension));
        }
        assert_eq!(InstanceExtension::from_name("VK_KHR_wayland_surface"), None);
    }

    #[test]
    fn every_negotiated_extension_is_a_registered_group() {
        let registry = vulkan_registry().unwrap();
        let names = InstanceExtension::ALL
            .iter()
            .map(InstanceExtension::name)
            .chain(DeviceExtension::ALL.iter().map(DeviceExtension::name));
        for name in names {
            assert!(registry.id(name).is_some(), "{name} is not registered");
        }
    }
}

use crate::caps::groups::{Global11Fn, GlobalFn};
use crate::caps::provider::GetInstanceProcAddr;
use crate::caps::{Capabilities, Dispatchable, InstanceProcAddr, Registry, TypedGroup};
use crate::errors::{check, LoaderError, ScopeError};
use crate::{debug_success, info_success};
use libloading::Library;
use log::{debug, trace};
use std::collections::HashSet;
use std::ptr;
use std::sync::Arc;
use vulkanalia::vk;
use vulkanalia::vk::Handle as _;

#[cfg(windows)]
pub const LIBRARY: &str = "vulkan-1.dll";

#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "ios", target_os = "android"))
))]
pub const LIBRARY: &str = "libvulkan.so.1";

#[cfg(target_os = "android")]
pub const LIBRARY: &str = "libvulkan.so";

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const LIBRARY: &str = "libvulkan.dylib";

/// # Vulkan Entry
/// The entry point for Vulkan: the opened loader library and its global capabilities.
///
/// # Details
/// At the point of creating the `Entry`, no instance exists, so only the global commands
/// (`vkCreateInstance`, the instance enumerations) can be resolved.
///
/// What `Entry` does is find the loader in the system (i.e. `vulkan-1.dll` and `libvulkan.so.1`),
/// take its `vkGetInstanceProcAddr`, and resolve the global [`Capabilities`] through it.
pub struct Entry {
    library: Arc<Library>,
    get_instance_proc_addr: GetInstanceProcAddr,
    registry: Arc<Registry>,
    capabilities: Capabilities,
}

impl Entry {
    /// Opens the system Vulkan loader and resolves the global capabilities.
    ///
    /// # Errors
    ///
    /// - If the loader is not found.
    /// - If it does not export `vkGetInstanceProcAddr`.
    pub fn open(registry: Arc<Registry>) -> Result<Self, LoaderError> {
        debug!("Opening Vulkan library {LIBRARY}...");
        // Finds the dynamic library (e.g. `.so` or `.dll`)
        let library = unsafe { Library::new(LIBRARY) }.map_err(|source| LoaderError::Library {
            name: LIBRARY.to_string(),
            source,
        })?;

        let get_instance_proc_addr = unsafe {
            library
                .get::<GetInstanceProcAddr>(b"vkGetInstanceProcAddr\0")
                .map(|symbol| *symbol)
                .map_err(|source| LoaderError::MissingBootstrap {
                    symbol: "vkGetInstanceProcAddr",
                    source,
                })?
        };
        trace!("vkGetInstanceProcAddr found in {LIBRARY}");

        let provider = unsafe { InstanceProcAddr::new(get_instance_proc_addr, vk::Instance::null()) };
        let capabilities = Capabilities::global(registry.clone(), &provider);
        info_success!("Vulkan library {LIBRARY} loaded!");

        Ok(Self {
            library: Arc::new(library),
            get_instance_proc_addr,
            registry,
            capabilities,
        })
    }

    pub(crate) fn library(&self) -> Arc<Library> {
        self.library.clone()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Provider for the scope of `instance` (null for the global scope).
    pub fn instance_provider(&self, instance: vk::Instance) -> InstanceProcAddr {
        unsafe { InstanceProcAddr::new(self.get_instance_proc_addr, instance) }
    }

    /// The (maximum) Vulkan version the loader supports.
    ///
    /// Loaders older than 1.1 do not export `vkEnumerateInstanceVersion`; they are 1.0.
    pub fn version(&self) -> Result<u32, ScopeError> {
        let Some(global11) = self.capabilities.group::<Global11Fn>() else {
            debug!("vkEnumerateInstanceVersion not available, assuming Vulkan 1.0");
            return Ok(vk::make_version(1, 0, 0));
        };
        let mut version = 0;
        check("vkEnumerateInstanceVersion", unsafe {
            (global11.enumerate_instance_version)(&mut version)
        })?;
        Ok(version)
    }

    /// Names of the instance extensions the loader and its implicit layers expose.
    pub fn available_extensions(&self) -> Result<HashSet<String>, ScopeError> {
        let global = self.global()?;
        let mut count = 0;
        check("vkEnumerateInstanceExtensionProperties", unsafe {
            (global.enumerate_instance_extension_properties)(ptr::null(), &mut count, ptr::null_mut())
        })?;

        let mut properties = vec![vk::ExtensionProperties::default(); count as usize];
        check("vkEnumerateInstanceExtensionProperties", unsafe {
            (global.enumerate_instance_extension_properties)(
                ptr::null(),
                &mut count,
                properties.as_mut_ptr(),
            )
        })?;
        properties.truncate(count as usize);

        let names = properties
            .iter()
            .map(|p| p.extension_name.to_string_lossy().into_owned())
            .collect::<HashSet<_>>();
        debug_success!("Available instance extensions: \n\t{:?}", names);
        Ok(names)
    }

    /// Names of the instance layers found in the layer manifests.
    pub fn available_layers(&self) -> Result<HashSet<String>, ScopeError> {
        let global = self.global()?;
        let mut count = 0;
        check("vkEnumerateInstanceLayerProperties", unsafe {
            (global.enumerate_instance_layer_properties)(&mut count, ptr::null_mut())
        })?;

        let mut properties = vec![vk::LayerProperties::default(); count as usize];
        check("vkEnumerateInstanceLayerProperties", unsafe {
            (global.enumerate_instance_layer_properties)(&mut count, properties.as_mut_ptr())
        })?;
        properties.truncate(count as usize);

        let names = properties
            .iter()
            .map(|p| p.layer_name.to_string_lossy().into_owned())
            .collect::<HashSet<_>>();
        debug_success!("Available layers: \n\t{:?}", names);
        Ok(names)
    }

    /// The global commands; every conformant loader exports them.
    pub(crate) fn global(&self) -> Result<GlobalFn, ScopeError> {
        self.capabilities
            .group::<GlobalFn>()
            .ok_or(ScopeError::Unsupported(GlobalFn::NAME))
    }
}

impl Dispatchable for Entry {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

use crate::caps::capabilities::DisplayVersion;
use crate::caps::groups::Vulkan10Fn;
use crate::caps::{
    Capabilities, DeclaredSupport, Dispatchable, Handle, InstanceProcAddr, RawFn, Registry,
    SymbolProvider, TypedGroup,
};
use crate::errors::{check, ScopeError};
use crate::gapi::entry::Entry;
use crate::gapi::extensions::{InstanceExtension, InstanceLayer};
use crate::{debug_success, info_success, trace_success, warn_warning};
use libloading::Library;
use log::{debug, error, info, trace};
use std::collections::HashSet;
use std::ffi::{c_char, CString};
use std::mem;
use std::ptr;
use std::sync::Arc;
use vulkanalia::vk;
use vulkanalia::vk::{Handle as _, HasBuilder};

/// # Vulkan Instance
/// The connection between this program and the Vulkan driver, with the capabilities it was
/// created with.
///
/// # Details
/// The instance owns its [`Capabilities`]: resolved once at creation against
/// `vkGetInstanceProcAddr(instance, ..)`, with the enabled extensions and the negotiated API
/// version as declared support. They live exactly as long as the instance.
///
/// > Note: Instance captures the driver state at creation time, so any changes to the driver,
/// > layers, or extensions at system level after instance creation will not be reflected in the
/// > instance.
pub struct Instance {
    handle: vk::Instance,
    provider: InstanceProcAddr,
    capabilities: Capabilities,
    enabled_extensions: Vec<InstanceExtension>,
    _library: Arc<Library>,
}

impl Instance {
    /// # Instance Creation
    ///
    /// - Requests the configured [extensions](InstanceExtension) and [layers](InstanceLayer) that
    ///   are available (missing ones are logged and skipped).
    /// - Creates the instance through the global `vkCreateInstance`.
    /// - Resolves the instance capabilities in scoped mode.
    ///
    /// # Errors
    ///
    /// - If the loader lacks the global commands, or `vkCreateInstance` fails.
    /// - If the instance does not support Vulkan 1.0 itself.
    pub fn new(entry: &Entry, application_name: &str) -> Result<Self, ScopeError> {
        // Highest core version the built-in groups go up to.
        let application_name = application_name_c(application_name)?;
        let api_version = entry.version()?.min(vk::make_version(1, 3, 0));
        debug!("Requesting Vulkan {}", DisplayVersion(api_version));

        debug!("Getting configured instance extensions...");
        let extensions = negotiate(
            InstanceExtension::requested(),
            &entry.available_extensions()?,
            InstanceExtension::name,
        );
        info!("Enabled instance extensions: \n\t{:?}", extensions);

        debug!("Getting configured instance layers...");
        let layers = negotiate(
            InstanceLayer::requested(),
            &entry.available_layers()?,
            InstanceLayer::name,
        );
        info!("Enabled layers: \n\t{:?}", layers);

        let extension_names = c_names(extensions.iter().map(InstanceExtension::name));
        let extension_ptrs = extension_names.iter().map(|n| n.as_ptr()).collect::<Vec<*const c_char>>();
        let layer_names = c_names(layers.iter().map(InstanceLayer::name));
        let layer_ptrs = layer_names.iter().map(|n| n.as_ptr()).collect::<Vec<*const c_char>>();

        trace!("Building application info");
        let application_info = vk::ApplicationInfo::builder()
            .application_name(application_name.as_bytes_with_nul())
            .application_version(vk::make_version(1, 0, 0))
            .engine_name(b"vkcaps\0")
            .engine_version(vk::make_version(1, 0, 0))
            .api_version(api_version)
            .build();
        trace_success!("Application info built!: \n\t{:?}", application_info);

        let flags = if extensions.contains(&InstanceExtension::KhrPortabilityEnumeration) {
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::empty()
        };

        let info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs)
            .flags(flags)
            .build();

        trace!("Creating vulkan instance...");
        let global = entry.global()?;
        let mut handle = vk::Instance::null();
        check("vkCreateInstance", unsafe {
            (global.create_instance)(&info, ptr::null(), &mut handle)
        })?;
        info_success!("Vulkan Instance created!");

        let declared = DeclaredSupport::new(extensions.iter().map(InstanceExtension::name))
            .with_core_versions(entry.registry(), api_version);
        let provider = entry.instance_provider(handle);
        let capabilities = Capabilities::scoped(entry.registry().clone(), api_version, &declared, &provider);

        if !capabilities.is_supported(Vulkan10Fn::NAME) {
            error!("Instance {handle:?} created without the Vulkan 1.0 commands");
            if !destroy_unusable(&provider, handle) {
                error!("vkDestroyInstance not found either, instance {handle:?} leaked");
            }
            return Err(ScopeError::Unsupported(Vulkan10Fn::NAME));
        }
        debug_success!("Instance capabilities resolved: {:?}", capabilities);

        Ok(Self {
            handle,
            provider,
            capabilities,
            enabled_extensions: extensions,
            _library: entry.library(),
        })
    }

    pub fn handle(&self) -> vk::Instance {
        self.handle
    }

    pub fn registry(&self) -> &Registry {
        self.capabilities.registry()
    }

    /// Provider resolving through this instance, used as fallback by its devices.
    pub fn provider(&self) -> InstanceProcAddr {
        self.provider
    }

    pub fn enabled_extensions(&self) -> &[InstanceExtension] {
        &self.enabled_extensions
    }

    pub fn enumerate_physical_devices(&self) -> Result<Vec<Handle<'_, vk::PhysicalDevice>>, ScopeError> {
        trace!("Querying all physical devices...");
        let v10 = Vulkan10Fn::from_handle(self);
        let mut count = 0;
        check("vkEnumeratePhysicalDevices", unsafe {
            (v10.enumerate_physical_devices)(self.handle, &mut count, ptr::null_mut())
        })?;

        let mut devices = vec![vk::PhysicalDevice::null(); count as usize];
        check("vkEnumeratePhysicalDevices", unsafe {
            (v10.enumerate_physical_devices)(self.handle, &mut count, devices.as_mut_ptr())
        })?;
        devices.truncate(count as usize);

        trace_success!("Physical devices found: \n\t{:?}", devices);
        Ok(devices
            .into_iter()
            .map(|device| Handle::new(device, &self.capabilities))
            .collect())
    }

    pub fn physical_device_properties(
        &self,
        physical_device: &Handle<'_, vk::PhysicalDevice>,
    ) -> vk::PhysicalDeviceProperties {
        let v10 = Vulkan10Fn::from_handle(physical_device);
        let mut properties = vk::PhysicalDeviceProperties::default();
        unsafe { (v10.get_physical_device_properties)(physical_device.raw(), &mut properties) };
        properties
    }

    pub fn queue_family_properties(
        &self,
        physical_device: &Handle<'_, vk::PhysicalDevice>,
    ) -> Vec<vk::QueueFamilyProperties> {
        let v10 = Vulkan10Fn::from_handle(physical_device);
        let mut count = 0;
        unsafe {
            (v10.get_physical_device_queue_family_properties)(physical_device.raw(), &mut count, ptr::null_mut())
        };
        let mut properties = vec![vk::QueueFamilyProperties::default(); count as usize];
        unsafe {
            (v10.get_physical_device_queue_family_properties)(
                physical_device.raw(),
                &mut count,
                properties.as_mut_ptr(),
            )
        };
        properties.truncate(count as usize);
        properties
    }

    /// Names of the extensions `physical_device` exposes.
    pub fn device_extensions(
        &self,
        physical_device: &Handle<'_, vk::PhysicalDevice>,
    ) -> Result<HashSet<String>, ScopeError> {
        let v10 = Vulkan10Fn::from_handle(physical_device);
        let mut count = 0;
        check("vkEnumerateDeviceExtensionProperties", unsafe {
            (v10.enumerate_device_extension_properties)(
                physical_device.raw(),
                ptr::null(),
                &mut count,
                ptr::null_mut(),
            )
        })?;

        let mut properties = vec![vk::ExtensionProperties::default(); count as usize];
        check("vkEnumerateDeviceExtensionProperties", unsafe {
            (v10.enumerate_device_extension_properties)(
                physical_device.raw(),
                ptr::null(),
                &mut count,
                properties.as_mut_ptr(),
            )
        })?;
        properties.truncate(count as usize);

        Ok(properties
            .iter()
            .map(|p| p.extension_name.to_string_lossy().into_owned())
            .collect())
    }

    /// Destroys the instance. Its capabilities go with it.
    pub fn destroy(self) {
        debug!("Destroying instance");
        let v10 = Vulkan10Fn::from_handle(&self);
        unsafe { (v10.destroy_instance)(self.handle, ptr::null()) };
    }
}

impl Dispatchable for Instance {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

/// Keeps the `requested` items whose name is `available`, in request order.
pub(crate) fn negotiate<T: Copy>(
    requested: Vec<T>,
    available: &HashSet<String>,
    name: fn(&T) -> &'static str,
) -> Vec<T> {
    requested
        .into_iter()
        .filter(|item| {
            let found = available.contains(name(item));
            if !found {
                warn_warning!("{} requested but not available, skipping it", name(item));
            }
            found
        })
        .collect()
}

/// The application name as passed to the driver.
///
/// # Errors
/// If `name` contains a nul byte.
fn application_name_c(name: &str) -> Result<CString, ScopeError> {
    CString::new(name).map_err(|_| ScopeError::InvalidName(name.to_string()))
}

/// Destroys an instance through `provider` directly, for when its capabilities lack `Vulkan10`.
/// Returns `false` if `vkDestroyInstance` cannot be found.
fn destroy_unusable<P: SymbolProvider + ?Sized>(provider: &P, handle: vk::Instance) -> bool {
    let Some(destroy) = provider.resolve(c"vkDestroyInstance") else {
        return false;
    };
    // `vkDestroyInstance` has this signature.
    let destroy = unsafe { mem::transmute::<RawFn, vk::PFN_vkDestroyInstance>(destroy) };
    unsafe { destroy(handle, ptr::null()) };
    debug!("Destroyed unusable instance {handle:?}");
    true
}

/// Nul-terminated copies of Vulkan names. Names never contain interior nul bytes.
pub(crate) fn c_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<CString> {
    names
        .into_iter()
        .filter_map(|name| CString::new(name).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gapi::extensions::DeviceExtension;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vulkanalia::vk::Handle as _;

    #[test]
    fn negotiation_keeps_request_order_and_drops_missing() {
        let available = ["VK_KHR_swapchain", "VK_KHR_dynamic_rendering", "VK_OTHER"]
            .map(str::to_string)
            .into_iter()
            .collect::<HashSet<_>>();
        let enabled = negotiate(
            vec![
                DeviceExtension::KhrDynamicRendering,
                DeviceExtension::KhrSynchronization2,
                DeviceExtension::KhrSwapchain,
            ],
            &available,
            DeviceExtension::name,
        );
        assert_eq!(enabled, [DeviceExtension::KhrDynamicRendering, DeviceExtension::KhrSwapchain]);
    }

    static DESTROYED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "system" fn record_destroy(
        instance: vk::Instance,
        _: *const vk::AllocationCallbacks,
    ) {
        DESTROYED.store(instance.as_raw(), Ordering::SeqCst);
    }

    #[test]
    fn unusable_instance_is_destroyed_through_the_provider() {
        let destroy = unsafe {
            mem::transmute::<vk::PFN_vkDestroyInstance, RawFn>(record_destroy as vk::PFN_vkDestroyInstance)
        };
        let provider = |name: &CStr| (name == c"vkDestroyInstance").then_some(destroy);

        assert!(destroy_unusable(&provider, vk::Instance::from_raw(0x42)));
        assert_eq!(DESTROYED.load(Ordering::SeqCst), 0x42);

        let nothing = |_: &CStr| -> Option<RawFn> { None };
        assert!(!destroy_unusable(&nothing, vk::Instance::from_raw(0x43)));
        assert_eq!(DESTROYED.load(Ordering::SeqCst), 0x42);
    }

    #[test]
    fn application_names_with_nul_bytes_are_rejected() {
        assert_eq!(application_name_c("demo").unwrap().as_bytes_with_nul(), b"demo\0");
        let err = application_name_c("de\0mo").unwrap_err();
        assert!(matches!(err, ScopeError::InvalidName(name) if name == "de\0mo"));
    }

    #[test]
    fn c_names_are_nul_terminated() {
        let names = c_names(["VK_KHR_surface"]);
        assert_eq!(names[0].as_bytes_with_nul(), b"VK_KHR_surface\0");
    }
}

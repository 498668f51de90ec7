use crate::caps::capabilities::DisplayVersion;
use crate::caps::groups::Vulkan10Fn;
use crate::caps::{
    Capabilities, DeclaredSupport, DeviceProcAddr, Dispatchable, Handle, SymbolProvider,
    TypedGroup,
};
use crate::errors::{check, ScopeError};
use crate::gapi::extensions::DeviceExtension;
use crate::gapi::instance::{c_names, negotiate, Instance};
use crate::{debug_success, info_success};
use log::{debug, trace};
use std::ffi::c_char;
use std::ptr;
use vulkanalia::vk;
use vulkanalia::vk::{Handle as _, HasBuilder};

/// Wraps the Vulkan logical device, its graphics queue, and the capabilities it was created with.
///
/// This object is responsible for:
/// - Creating the Vulkan device from a chosen physical device.
/// - Resolving the device capabilities. Device-level commands come from `vkGetDeviceProcAddr`;
///   the instance-level commands of mixed core groups fall back to the instance.
/// - Destroying the device at shutdown.
pub struct Device {
    handle: vk::Device,
    physical_device: vk::PhysicalDevice,
    queue_family: u32,
    capabilities: Capabilities,
    enabled_extensions: Vec<DeviceExtension>,
}

impl Device {
    pub fn new(
        instance: &Instance,
        physical_device: &Handle<'_, vk::PhysicalDevice>,
    ) -> Result<Self, ScopeError> {
        let properties = instance.physical_device_properties(physical_device);
        let api_version = properties.api_version.min(instance.capabilities().api_version());
        debug!(
            "Creating device on {} (Vulkan {})",
            properties.device_name.to_string_lossy(),
            DisplayVersion(api_version)
        );

        // 1. Pick the first family with graphics
        let queue_family = instance
            .queue_family_properties(physical_device)
            .iter()
            .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .ok_or(ScopeError::NoGraphicsQueue)? as u32;
        trace!("Using queue family {queue_family}");

        // 2. Enable the requested extensions the device has
        let extensions = negotiate(
            DeviceExtension::requested(),
            &instance.device_extensions(physical_device)?,
            DeviceExtension::name,
        );
        debug!("Enabled device extensions: \n\t{:?}", extensions);

        let extension_names = c_names(extensions.iter().map(DeviceExtension::name));
        let extension_ptrs = extension_names.iter().map(|n| n.as_ptr()).collect::<Vec<*const c_char>>();
        let priorities = [1.0];
        let queue_infos = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family)
            .queue_priorities(&priorities)
            .build()];
        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .build();

        // 3. Device creation
        let v10 = Vulkan10Fn::from_handle(physical_device);
        let mut handle = vk::Device::null();
        check("vkCreateDevice", unsafe {
            (v10.create_device)(physical_device.raw(), &create_info, ptr::null(), &mut handle)
        })?;
        info_success!("Vulkan Device created!");

        // 4. Capabilities
        let provider = unsafe { DeviceProcAddr::new(v10.get_device_proc_addr, handle) }
            .or_else(instance.provider().instance_level());
        let declared = DeclaredSupport::new(extensions.iter().map(DeviceExtension::name))
            .with_core_versions(instance.registry(), api_version);
        let capabilities = Capabilities::scoped(
            instance.capabilities().registry().clone(),
            api_version,
            &declared,
            &provider,
        );
        debug_success!("Device capabilities resolved: {:?}", capabilities);

        Ok(Self {
            handle,
            physical_device: physical_device.raw(),
            queue_family,
            capabilities,
            enabled_extensions: extensions,
        })
    }

    pub fn handle(&self) -> vk::Device {
        self.handle
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn enabled_extensions(&self) -> &[DeviceExtension] {
        &self.enabled_extensions
    }

    /// The graphics queue, sharing the device capabilities.
    pub fn queue(&self) -> Handle<'_, vk::Queue> {
        let v10 = Vulkan10Fn::from_handle(self);
        let mut queue = vk::Queue::null();
        unsafe { (v10.get_device_queue)(self.handle, self.queue_family, 0, &mut queue) };
        Handle::new(queue, &self.capabilities)
    }

    pub fn wait_idle(&self) -> Result<(), ScopeError> {
        let v10 = Vulkan10Fn::from_handle(self);
        check("vkDeviceWaitIdle", unsafe { (v10.device_wait_idle)(self.handle) })
    }

    /// Destroys the device. Must happen before the instance it was created from is destroyed.
    pub fn destroy(self) {
        debug!("Destroying device");
        let v10 = Vulkan10Fn::from_handle(&self);
        unsafe { (v10.destroy_device)(self.handle, ptr::null()) };
    }
}

impl Dispatchable for Device {
    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::sync::Arc;
use vkcaps::caps::{vulkan_registry, Dispatchable};
use vkcaps::errors::ScopeError;
use vkcaps::gapi::device::Device;
use vkcaps::gapi::entry::Entry;
use vkcaps::gapi::instance::Instance;
use vkcaps::info_success;
use vkcaps::logging::init_log;

fn main() -> Result<()> {
    if let Err(err) = run() {
        error!("Oops! Something went wrong: {}", err);

        let mut source = err.source();
        while let Some(cause) = source {
            error!("Caused by: {}", cause);
            source = cause.source();
        }

        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    init_log()?;

    debug!("Building registry...");
    let registry = Arc::new(vulkan_registry().context("invalid built-in registry")?);
    info_success!("Registry built with {} functional groups", registry.len());

    let entry = Entry::open(registry).context("cannot load Vulkan")?;
    info!("\n{}", entry.capabilities());

    let instance = Instance::new(&entry, "caps-report").context("cannot create instance")?;
    info!("\n{}", instance.capabilities());

    let report = report_device(&instance);
    instance.destroy();
    report?;

    info_success!("Done!");
    Ok(())
}

/// Creates a device on the first physical device and logs its capabilities.
fn report_device(instance: &Instance) -> Result<()> {
    let physical_devices = instance.enumerate_physical_devices()?;
    let (physical_device, others) = physical_devices
        .split_first()
        .ok_or(ScopeError::NoPhysicalDevice)?;
    for other in others {
        let properties = instance.physical_device_properties(other);
        warn!("Skipping physical device {}", properties.device_name.to_string_lossy());
    }

    let device = Device::new(instance, physical_device).context("cannot create device")?;
    info!("\n{}", device.capabilities());

    let idle = device.wait_idle();
    device.destroy();
    idle.map_err(Into::into)
}

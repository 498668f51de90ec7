//! The Vulkan scopes capabilities are resolved for: the loader [entry](entry::Entry), an
//! [instance](instance::Instance) and its [devices](device::Device).

pub mod device;
pub mod entry;
pub mod extensions;
pub mod instance;

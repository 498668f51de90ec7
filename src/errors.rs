use std::ffi::CString;
use thiserror::Error;
use vulkanalia::vk;

/// A [`Registry`](crate::caps::Registry) could not be built from the given declarations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two declarations share the same group name.
    #[error("functional group `{0}` is declared more than once")]
    DuplicateGroup(String),
    /// A declaration has an empty name.
    #[error("functional group names must not be empty")]
    EmptyName,
}

/// The "unsupported" outcome of resolving a group: one of its entry points has no address.
///
/// This is an expected, frequent result and is never turned into a construction failure of a
/// [`Capabilities`](crate::caps::Capabilities) object.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("`{group}` is missing entry point `{}`", symbol.to_string_lossy())]
pub struct MissingSymbol {
    pub group: String,
    pub symbol: CString,
}

/// The system Vulkan library could not be used as a symbol provider.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to open the Vulkan library `{name}`")]
    Library {
        name: String,
        #[source]
        source: libloading::Error,
    },
    #[error("the Vulkan library does not export `{symbol}`")]
    MissingBootstrap {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

/// A scope object (instance or device) could not be created or queried.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("{call} returned {result:?}")]
    Vulkan {
        call: &'static str,
        result: vk::Result,
    },
    #[error("required functional group `{0}` is not supported")]
    Unsupported(&'static str),
    #[error("no physical device is available")]
    NoPhysicalDevice,
    #[error("physical device has no graphics queue family")]
    NoGraphicsQueue,
    #[error("name {0:?} contains a nul byte")]
    InvalidName(String),
}

/// Maps a raw `vk::Result` to `Ok` or a [`ScopeError::Vulkan`] naming the failing call.
pub(crate) fn check(call: &'static str, result: vk::Result) -> Result<(), ScopeError> {
    if result == vk::Result::SUCCESS {
        Ok(())
    } else {
        Err(ScopeError::Vulkan { call, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_maps_non_success() {
        assert!(check("vkCreateInstance", vk::Result::SUCCESS).is_ok());
        let err = check("vkCreateInstance", vk::Result::ERROR_INITIALIZATION_FAILED).unwrap_err();
        assert!(err.to_string().starts_with("vkCreateInstance returned"));
    }

    #[test]
    fn missing_symbol_names_group_and_entry_point() {
        let err = MissingSymbol {
            group: "VK_KHR_surface".into(),
            symbol: CString::new("vkDestroySurfaceKHR").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "`VK_KHR_surface` is missing entry point `vkDestroySurfaceKHR`"
        );
    }
}

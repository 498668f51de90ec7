//! Compile-time switches, one per cargo feature.

/// Enable the Khronos validation layer and `VK_EXT_debug_utils` when they are available.
pub(crate) const VALIDATION_ENABLED: bool = cfg!(feature = "validation");
/// Also enable `VK_LAYER_LUNARG_api_dump` (only together with validation).
pub(crate) const API_DUMP_ENABLED: bool = cfg!(feature = "api_dump");
/// Trace every symbol lookup made while resolving a group.
pub(crate) const LOADER_DEBUG_ENABLED: bool = cfg!(feature = "loader_debug");

//! The Declaration Registry: every functional group the binding layer knows about.

use crate::errors::RegistryError;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ffi::CStr;

/// Precedence class of a functional group. Core groups resolve before extension groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupClass {
    Core,
    Extension,
}

/// Dense index of a group inside its [`Registry`], assigned once at registry construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// # Functional Group declaration
/// A named bundle of native entry points that is supported as a whole or not at all.
///
/// # Details
/// - `name` is the capability name: `Vulkan12` for core versions, the extension string
///   (`VK_KHR_swapchain`) for extensions.
/// - `entry_points` is fixed at construction. Slot `i` of the resolved table is the address of
///   `entry_points[i]`.
/// - A group without entry points is a marker: its support is only ever declared, never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDecl {
    name: Cow<'static, str>,
    class: GroupClass,
    version: Option<(u32, u32)>,
    entry_points: Box<[Cow<'static, CStr>]>,
}

impl GroupDecl {
    pub fn new<N, I, S>(name: N, class: GroupClass, entry_points: I) -> Self
    where
        N: Into<Cow<'static, str>>,
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, CStr>>,
    {
        Self {
            name: name.into(),
            class,
            version: None,
            entry_points: entry_points.into_iter().map(Into::into).collect(),
        }
    }

    /// A core version group, named `Vulkan{major}{minor}`.
    pub fn core_version<I, S>(major: u32, minor: u32, entry_points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, CStr>>,
    {
        let mut decl = Self::new(format!("Vulkan{major}{minor}"), GroupClass::Core, entry_points);
        decl.version = Some((major, minor));
        decl
    }

    pub fn extension<N, I, S>(name: N, entry_points: I) -> Self
    where
        N: Into<Cow<'static, str>>,
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, CStr>>,
    {
        Self::new(name, GroupClass::Extension, entry_points)
    }

    /// An extension that only exists as a declared capability.
    pub fn marker<N: Into<Cow<'static, str>>>(name: N) -> Self {
        Self::new(name, GroupClass::Extension, std::iter::empty::<&'static CStr>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> GroupClass {
        self.class
    }

    /// `(major, minor)` of a core version group.
    pub fn version(&self) -> Option<(u32, u32)> {
        self.version
    }

    pub fn entry_points(&self) -> &[Cow<'static, CStr>] {
        &self.entry_points
    }

    pub fn has_entry_points(&self) -> bool {
        !self.entry_points.is_empty()
    }

    /// Core first, then case-insensitive name. The exact name breaks ties so the order is total.
    fn precedence(&self, other: &Self) -> Ordering {
        self.class
            .cmp(&other.class)
            .then_with(|| {
                self.name
                    .to_ascii_lowercase()
                    .cmp(&other.name.to_ascii_lowercase())
            })
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// # Declaration Registry
/// An immutable, ordered collection of [`GroupDecl`].
///
/// # Details
/// The registry is built once and passed explicitly to every
/// [`Capabilities`](crate::caps::Capabilities) constructor. Building it:
/// 1. rejects empty and duplicated names,
/// 2. sorts the groups in precedence order (core before extensions, then by case-insensitive name),
/// 3. assigns each group a dense [`GroupId`] and indexes it by name.
///
/// The input order of the declarations has no effect on the result.
#[derive(Debug, Clone)]
pub struct Registry {
    groups: Box<[GroupDecl]>,
    index: HashMap<String, GroupId>,
}

impl Registry {
    pub fn new<I>(declarations: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = GroupDecl>,
    {
        let mut groups = declarations.into_iter().collect::<Vec<_>>();
        groups.sort_by(GroupDecl::precedence);

        let mut index = HashMap::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            if group.name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if index.insert(group.name.to_string(), GroupId(i)).is_some() {
                return Err(RegistryError::DuplicateGroup(group.name.to_string()));
            }
        }

        Ok(Self {
            groups: groups.into_boxed_slice(),
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Unknown names yield `None`; they are not an error.
    pub fn id(&self, name: &str) -> Option<GroupId> {
        self.index.get(name).copied()
    }

    /// Panics if `id` comes from another registry with fewer groups.
    pub fn group(&self, id: GroupId) -> &GroupDecl {
        &self.groups[id.0]
    }

    /// All groups in precedence order, with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &GroupDecl)> + '_ {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, group)| (GroupId(i), group))
    }

    /// Names of the core version groups promoted at or below `api_version`.
    ///
    /// `api_version` is a packed Vulkan version; its patch number is ignored.
    pub fn core_names_up_to(&self, api_version: u32) -> impl Iterator<Item = &str> + '_ {
        let api = major_minor(api_version);
        self.groups
            .iter()
            .filter(move |group| group.version.is_some_and(|version| version <= api))
            .map(GroupDecl::name)
    }
}

/// `(major, minor)` of a packed Vulkan version number.
pub(crate) fn major_minor(version: u32) -> (u32, u32) {
    ((version >> 22) & 0x7F, (version >> 12) & 0x3FF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulkanalia::vk;

    fn decls() -> Vec<GroupDecl> {
        vec![
            GroupDecl::extension("VK_KHR_swapchain", [c"vkCreateSwapchainKHR"]),
            GroupDecl::marker("VK_EXT_descriptor_indexing"),
            GroupDecl::core_version(1, 1, [c"vkGetPhysicalDeviceFeatures2"]),
            GroupDecl::extension("vk_amd_lowercase", [c"vkLowercaseAMD"]),
            GroupDecl::core_version(1, 0, [c"vkDestroyInstance"]),
        ]
    }

    #[test]
    fn core_groups_come_first_then_case_insensitive_names() {
        let registry = Registry::new(decls()).unwrap();
        let names = registry.iter().map(|(_, g)| g.name()).collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                "Vulkan10",
                "Vulkan11",
                "vk_amd_lowercase",
                "VK_EXT_descriptor_indexing",
                "VK_KHR_swapchain",
            ]
        );
    }

    #[test]
    fn ids_are_dense_and_follow_order() {
        let registry = Registry::new(decls()).unwrap();
        for (expected, (id, group)) in registry.iter().enumerate() {
            assert_eq!(id.index(), expected);
            assert_eq!(registry.id(group.name()), Some(id));
        }
        assert_eq!(registry.id("VK_NOT_KNOWN"), None);
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut groups = decls();
        groups.push(GroupDecl::marker("VK_KHR_swapchain"));
        assert_eq!(
            Registry::new(groups).unwrap_err(),
            RegistryError::DuplicateGroup("VK_KHR_swapchain".into())
        );
    }

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(
            Registry::new([GroupDecl::marker("")]).unwrap_err(),
            RegistryError::EmptyName
        );
    }

    #[test]
    fn core_version_names_and_promotion() {
        let registry = Registry::new(decls()).unwrap();
        let v1_0 = registry.core_names_up_to(vk::make_version(1, 0, 0)).collect::<Vec<_>>();
        let v1_3 = registry.core_names_up_to(vk::make_version(1, 3, 250)).collect::<Vec<_>>();
        assert_eq!(v1_0, ["Vulkan10"]);
        assert_eq!(v1_3, ["Vulkan10", "Vulkan11"]);
    }

    #[test]
    fn markers_have_no_entry_points() {
        let marker = GroupDecl::marker("VK_KHR_portability_subset");
        assert!(!marker.has_entry_points());
        assert_eq!(marker.class(), GroupClass::Extension);
        assert!(GroupDecl::core_version(1, 2, [c"vkWaitSemaphores"]).has_entry_points());
    }
}

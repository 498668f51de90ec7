use crate::caps::groups::TypedGroup;
use crate::caps::provider::SymbolProvider;
use crate::caps::registry::{major_minor, GroupId, Registry};
use crate::caps::table::FunctionTable;
use crate::{debug_warning, warn_warning};
use log::{debug, error, trace};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// # Declared-support set
/// Names of the capabilities a host explicitly enabled for an instance or a device.
///
/// # Details
/// Usually the enabled extension names, plus the core version groups unlocked by the negotiated
/// API version (see [`DeclaredSupport::with_core_versions`]). Only membership matters. Names the
/// registry does not know are kept and simply never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredSupport {
    names: HashSet<String>,
}

impl DeclaredSupport {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Adds every core version group of `registry` promoted at or below `api_version`.
    pub fn with_core_versions(mut self, registry: &Registry, api_version: u32) -> Self {
        self.names
            .extend(registry.core_names_up_to(api_version).map(str::to_string));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for DeclaredSupport {
    fn from_iter<I: IntoIterator<Item = S>>(names: I) -> Self {
        Self::new(names)
    }
}

/// # Capabilities
/// The immutable snapshot of which functional groups a provider scope (global, instance or
/// device) supports, and the bound tables of the supported ones.
///
/// # Details
/// Construction resolves every group of the registry exactly once, in registry (precedence)
/// order, and freezes the result:
/// - **Global** ([`Capabilities::global`]): no declaration exists yet. Groups with entry points are
///   resolved against the provider; marker groups are unsupported. The API version is 0.
/// - **Scoped** ([`Capabilities::scoped`]): a group with entry points is resolved only if its
///   name is declared, and is supported only if every entry point resolved. A marker group is
///   supported exactly when declared.
///
/// A group is supported if and only if it owns a complete table. The table of a declared marker
/// is empty.
/// There is no refresh; nothing changes after the constructor returns, so the object can be read
/// from any number of threads.
///
/// Unknown group names behave like unsupported groups.
pub struct Capabilities {
    registry: Arc<Registry>,
    api_version: u32,
    supported: Box<[bool]>,
    tables: Box<[Option<FunctionTable>]>,
}

impl Capabilities {
    /// Resolves the capabilities of the provider-global scope.
    pub fn global<P>(registry: Arc<Registry>, provider: &P) -> Self
    where
        P: SymbolProvider + ?Sized,
    {
        debug!("Resolving global capabilities ({} groups)...", registry.len());
        Self::resolve(registry, 0, None, provider)
    }

    /// Resolves the capabilities of an instance or device created with `api_version` and the
    /// capabilities in `declared` enabled.
    pub fn scoped<P>(
        registry: Arc<Registry>,
        api_version: u32,
        declared: &DeclaredSupport,
        provider: &P,
    ) -> Self
    where
        P: SymbolProvider + ?Sized,
    {
        debug!(
            "Resolving capabilities for API version {} ({} groups, {} declared)...",
            DisplayVersion(api_version),
            registry.len(),
            declared.len()
        );
        Self::resolve(registry, api_version, Some(declared), provider)
    }

    fn resolve<P>(
        registry: Arc<Registry>,
        api_version: u32,
        declared: Option<&DeclaredSupport>,
        provider: &P,
    ) -> Self
    where
        P: SymbolProvider + ?Sized,
    {
        let mut supported = Vec::with_capacity(registry.len());
        let mut tables = Vec::with_capacity(registry.len());

        for (id, group) in registry.iter() {
            let is_declared = declared.map(|declared| declared.contains(group.name()));

            if !group.has_entry_points() {
                trace!("{}: marker, declared: {:?}", group.name(), is_declared);
                let table = is_declared
                    .unwrap_or(false)
                    .then(|| FunctionTable::try_resolve(id, group, provider).ok())
                    .flatten();
                supported.push(table.is_some());
                tables.push(table);
                continue;
            }

            if is_declared == Some(false) {
                trace!("{}: not declared, skipped", group.name());
                supported.push(false);
                tables.push(None);
                continue;
            }

            match FunctionTable::try_resolve(id, group, provider) {
                Ok(table) => {
                    debug!("{}: {} entry points bound", group.name(), table.len());
                    supported.push(true);
                    tables.push(Some(table));
                }
                Err(missing) => {
                    if is_declared == Some(true) {
                        warn_warning!("{} was reported as available but {}", group.name(), missing);
                    } else {
                        debug_warning!("{}: unsupported ({})", group.name(), missing);
                    }
                    supported.push(false);
                    tables.push(None);
                }
            }
        }

        let capabilities = Self {
            registry,
            api_version,
            supported: supported.into_boxed_slice(),
            tables: tables.into_boxed_slice(),
        };
        debug!(
            "{} of {} functional groups supported",
            capabilities.supported_groups().count(),
            capabilities.registry.len()
        );
        capabilities
    }

    /// The Vulkan API version of the scope, 0 for the global scope.
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.registry
            .id(name)
            .is_some_and(|id| self.is_supported_by_id(id))
    }

    pub fn is_supported_by_id(&self, id: GroupId) -> bool {
        self.supported.get(id.index()).copied().unwrap_or(false)
    }

    /// The bound table of `name`, `None` if unsupported or unknown.
    pub fn table(&self, name: &str) -> Option<&FunctionTable> {
        self.registry.id(name).and_then(|id| self.table_by_id(id))
    }

    pub fn table_by_id(&self, id: GroupId) -> Option<&FunctionTable> {
        self.tables.get(id.index()).and_then(Option::as_ref)
    }

    /// The bound table of `name`.
    ///
    /// # Panics
    /// If the group is not supported. Reaching for an unsupported group's table is a bug in the
    /// caller, which must check [`Capabilities::is_supported`] first; it fails here, before any
    /// native call is attempted.
    #[track_caller]
    pub fn table_checked(&self, name: &str) -> &FunctionTable {
        match self.table(name) {
            Some(table) => table,
            None => unsupported(name),
        }
    }

    /// Typed view of a supported group, `None` otherwise.
    pub fn group<G: TypedGroup>(&self) -> Option<G> {
        self.table(G::NAME).map(G::from_table)
    }

    /// Typed view of a group the caller knows to be supported.
    ///
    /// # Panics
    /// If the group is not supported, see [`Capabilities::table_checked`].
    #[track_caller]
    pub fn group_checked<G: TypedGroup>(&self) -> G {
        G::from_table(self.table_checked(G::NAME))
    }

    /// Names of the supported groups, in precedence order.
    pub fn supported_groups(&self) -> impl Iterator<Item = &str> + '_ {
        self.registry
            .iter()
            .filter(|(id, _)| self.is_supported_by_id(*id))
            .map(|(_, group)| group.name())
    }
}

#[cold]
#[inline(never)]
#[track_caller]
fn unsupported(name: &str) -> ! {
    error!("Functional group `{name}` used without being supported");
    panic!("functional group `{name}` is not supported by these capabilities");
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("api_version", &DisplayVersion(self.api_version))
            .field("supported", &self.supported_groups().collect::<Vec<_>>())
            .finish()
    }
}

/// The capability listing: one line per group, in precedence order.
impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.api_version == 0 {
            writeln!(f, "Global capabilities")?;
        } else {
            writeln!(f, "Capabilities for Vulkan {}", DisplayVersion(self.api_version))?;
        }

        let width = self
            .registry
            .iter()
            .map(|(_, group)| group.name().len())
            .max()
            .unwrap_or(0);
        for (id, group) in self.registry.iter() {
            let mark = if self.is_supported_by_id(id) { '+' } else { '-' };
            write!(f, "  {mark} {:<width$}", group.name())?;
            match self.table_by_id(id) {
                _ if !group.has_entry_points() => writeln!(f, "  marker")?,
                Some(table) => writeln!(f, "  {} entry points", table.len())?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// `major.minor.patch` of a packed Vulkan version.
pub(crate) struct DisplayVersion(pub(crate) u32);

impl fmt::Display for DisplayVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = major_minor(self.0);
        write!(f, "{major}.{minor}.{}", self.0 & 0xFFF)
    }
}

impl fmt::Debug for DisplayVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

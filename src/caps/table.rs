use crate::caps::provider::{RawFn, SymbolProvider};
use crate::caps::registry::{GroupDecl, GroupId};
use crate::config::LOADER_DEBUG_ENABLED;
use crate::errors::MissingSymbol;
use crate::{trace_success, trace_warning};
use std::borrow::Cow;
use std::ffi::CStr;
use std::fmt;

/// # Function Table
/// The bound entry points of one functional group.
///
/// # Details
/// A table only comes out of [`FunctionTable::try_resolve`], which either binds every slot or
/// returns nothing. Slots hold non-nullable [`RawFn`] values, so a table in hand never has a hole.
///
/// Slots are addressed by declaration order: slot `i` is the address of the group's
/// `i`-th entry point.
pub struct FunctionTable {
    group: GroupId,
    name: Box<str>,
    symbols: Box<[Cow<'static, CStr>]>,
    slots: Box<[RawFn]>,
}

impl FunctionTable {
    /// Resolves every entry point of `decl` against `provider`.
    ///
    /// Stops at the first missing symbol; the partially filled staging slots are dropped and the
    /// missing symbol is returned. A group without entry points trivially resolves to an empty
    /// table (marker support is decided by declaration, see
    /// [`Capabilities`](crate::caps::Capabilities)).
    pub fn try_resolve<P>(
        group: GroupId,
        decl: &GroupDecl,
        provider: &P,
    ) -> Result<FunctionTable, MissingSymbol>
    where
        P: SymbolProvider + ?Sized,
    {
        let mut staging = Vec::with_capacity(decl.entry_points().len());
        for symbol in decl.entry_points() {
            let Some(address) = provider.resolve(symbol) else {
                if LOADER_DEBUG_ENABLED {
                    trace_warning!("{}: {:?} not found", decl.name(), symbol);
                }
                return Err(MissingSymbol {
                    group: decl.name().to_string(),
                    symbol: symbol.clone().into_owned(),
                });
            };
            if LOADER_DEBUG_ENABLED {
                trace_success!("{}: {:?} -> {:p}", decl.name(), symbol, address as *const ());
            }
            staging.push(address);
        }

        Ok(FunctionTable {
            group,
            name: decl.name().into(),
            symbols: decl.entry_points().into(),
            slots: staging.into_boxed_slice(),
        })
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Address bound to `slot`. Panics if `slot` is out of range.
    pub fn raw(&self, slot: usize) -> RawFn {
        self.slots[slot]
    }

    /// Entry point name of `slot`. Panics if `slot` is out of range.
    pub fn symbol(&self, slot: usize) -> &CStr {
        &self.symbols[slot]
    }

    pub fn slots(&self) -> &[RawFn] {
        &self.slots
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (symbol, address) in self.symbols.iter().zip(self.slots.iter()) {
            map.entry(symbol, &(*address as *const ()));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    unsafe extern "system" fn a() {}
    unsafe extern "system" fn b() {}
    unsafe extern "system" fn c() {}

    fn foo() -> GroupDecl {
        GroupDecl::extension("EXT_FOO", [c"vkFooA", c"vkFooB", c"vkFooC"])
    }

    fn lookup(name: &CStr) -> Option<RawFn> {
        match name.to_bytes() {
            b"vkFooA" => Some(a as RawFn),
            b"vkFooB" => Some(b as RawFn),
            b"vkFooC" => Some(c as RawFn),
            _ => None,
        }
    }

    #[test]
    fn slots_follow_declaration_order() {
        let table = FunctionTable::try_resolve(GroupId(3), &foo(), &lookup).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.group(), GroupId(3));
        assert_eq!(table.raw(0) as usize, a as RawFn as usize);
        assert_eq!(table.raw(1) as usize, b as RawFn as usize);
        assert_eq!(table.raw(2) as usize, c as RawFn as usize);
        assert_eq!(table.symbol(2), c"vkFooC");
    }

    #[test]
    fn one_missing_symbol_discards_the_table() {
        let partial = |name: &CStr| if name == c"vkFooB" { None } else { lookup(name) };
        let missing = FunctionTable::try_resolve(GroupId(0), &foo(), &partial).unwrap_err();
        assert_eq!(missing.group, "EXT_FOO");
        assert_eq!(missing.symbol.as_c_str(), c"vkFooB");
    }

    #[test]
    fn resolution_stops_at_first_missing_symbol() {
        let asked = RefCell::new(Vec::new());
        let recording = |name: &CStr| {
            asked.borrow_mut().push(name.to_owned());
            if name == c"vkFooA" { None } else { lookup(name) }
        };
        assert!(FunctionTable::try_resolve(GroupId(0), &foo(), &recording).is_err());
        assert_eq!(asked.into_inner(), [c"vkFooA".to_owned()]);
    }

    #[test]
    fn marker_groups_resolve_to_an_empty_table() {
        let marker = GroupDecl::marker("VK_KHR_portability_subset");
        let nothing = |_: &CStr| -> Option<RawFn> { None };
        let table = FunctionTable::try_resolve(GroupId(0), &marker, &nothing).unwrap();
        assert!(table.is_empty());
    }
}

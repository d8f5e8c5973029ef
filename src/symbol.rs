use crate::{
    types::{BaseKind, Type},
    util::intern::{Interned, Interner},
};

bitflags::bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        const PRIVATE = 1 << 0;
        const EXPOSED = 1 << 1;
        const DOABLE = 1 << 2;
        /// Declared without a body, resolved at link time.
        const EXTERNAL = 1 << 3;
        const VARIADIC = 1 << 4;
    }
}

/// An externally linked function every program may call.
pub struct PreludeFn {
    pub name: &'static str,
    pub ret: BaseKind,
    pub params: &'static [(&'static str, BaseKind)],
    pub attributes: Attributes,
}

impl PreludeFn {
    pub fn ty(&self) -> Type {
        Type::function(Type::primitive(self.ret))
    }
}

pub const PRELUDE: &[PreludeFn] = &[PreludeFn {
    name: "printf",
    ret: BaseKind::I32,
    params: &[("fmt", BaseKind::Str)],
    attributes: Attributes::EXTERNAL.union(Attributes::VARIADIC),
}];

/// Index of a scope in a [`SymbolTable`] arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct Symbol<V> {
    pub ident: Interned<str>,
    pub ty: Type,
    pub attributes: Attributes,
    /// The scope this symbol opens, for struct and scope marker symbols.
    pub scope: Option<ScopeId>,
    pub value: V,
}

#[derive(Debug)]
struct Scope<V> {
    parent: Option<ScopeId>,
    symbols: Vec<Symbol<V>>,
}

/// A tree of lexical scopes stored as an arena, with a cursor on the active
/// scope.
///
/// Popped scopes stay in the arena, so a [`ScopeId`] captured earlier (such as
/// a struct's member scope) remains valid for the lifetime of the table.
#[derive(Debug)]
pub struct SymbolTable<V> {
    scopes: Vec<Scope<V>>,
    current: ScopeId,
}

impl<V> Default for SymbolTable<V> {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl<V> SymbolTable<V> {
    pub fn new() -> SymbolTable<V> {
        SymbolTable::with_capacity(16)
    }

    pub fn with_capacity(capacity: usize) -> SymbolTable<V> {
        let mut scopes = Vec::with_capacity(capacity);
        scopes.push(Scope {
            parent: None,
            symbols: Vec::new(),
        });
        SymbolTable {
            scopes,
            current: ScopeId::ROOT,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Opens a child of the current scope and makes it current.
    ///
    /// If a `marker` is given, a symbol of that name linking to the new scope
    /// is appended to the enclosing scope first.
    pub fn new_scope(&mut self, marker: Option<Interned<str>>) -> ScopeId
    where
        V: Default,
    {
        let id = ScopeId(u32::try_from(self.scopes.len()).expect("scope arena out of capacity"));
        if let Some(marker) = marker {
            self.add(marker, Type::scope_marker(), V::default()).scope = Some(id);
        }
        self.scopes.push(Scope {
            parent: Some(self.current),
            symbols: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Makes the parent of the current scope current again.
    pub fn pop_scope(&mut self) {
        let parent = self.scopes[self.current.index()].parent;
        self.current = parent.expect("can't pop the root scope");
    }

    /// Appends a symbol to the current scope. Duplicates are not detected.
    pub fn add(&mut self, ident: Interned<str>, ty: Type, value: V) -> &mut Symbol<V> {
        let symbols = &mut self.scopes[self.current.index()].symbols;
        symbols.push(Symbol {
            ident,
            ty,
            attributes: Attributes::empty(),
            scope: None,
            value,
        });
        symbols.last_mut().expect("just pushed")
    }

    /// Binds every [`PRELUDE`] function in the current scope.
    pub fn declare_prelude(
        &mut self,
        ident_interner: &mut Interner<str>,
        mut value: impl FnMut(&PreludeFn) -> V,
    ) {
        for prelude in PRELUDE {
            let name = ident_interner.intern(prelude.name);
            self.add(name, prelude.ty(), value(prelude)).attributes = prelude.attributes;
        }
    }

    /// Searches the current scope only.
    pub fn get_local(&self, ident: Interned<str>) -> Option<&Symbol<V>> {
        self.get_in(self.current, ident)
    }

    /// Searches the given scope only.
    pub fn get_in(&self, scope: ScopeId, ident: Interned<str>) -> Option<&Symbol<V>> {
        self.scopes[scope.index()]
            .symbols
            .iter()
            .rev()
            .find(|symbol| symbol.ident == ident)
    }

    /// Returns the nearest binding visible from the current scope.
    pub fn get(&self, ident: Interned<str>) -> Option<&Symbol<V>> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(symbol) = self.get_in(id, ident) {
                return Some(symbol);
            }
            scope = self.scopes[id.index()].parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{types::BaseKind, util::intern::Interner};

    fn i32() -> Type {
        Type::primitive(BaseKind::I32)
    }

    #[test]
    fn nearest_binding_wins() {
        let mut i = Interner::with_capacity(2);
        let x = i.intern("x");
        let mut t = SymbolTable::<()>::new();

        t.add(x, i32(), ());
        let inner = t.new_scope(None);
        t.add(x, Type::primitive(BaseKind::F32), ());

        assert_eq!(t.current(), inner);
        assert_eq!(t.get(x).unwrap().ty, Type::primitive(BaseKind::F32));
        assert!(t.get_local(x).is_some());

        t.pop_scope();
        assert_eq!(t.current(), ScopeId::ROOT);
        assert_eq!(t.get(x).unwrap().ty, i32());
    }

    #[test]
    fn lookups_walk_parents_but_local_does_not() {
        let mut i = Interner::with_capacity(2);
        let (outer, missing) = (i.intern("outer"), i.intern("missing"));
        let mut t = SymbolTable::<()>::new();

        t.add(outer, i32(), ());
        t.new_scope(None);
        t.new_scope(None);
        assert!(t.get(outer).is_some());
        assert!(t.get_local(outer).is_none());
        assert!(t.get(missing).is_none());
    }

    #[test]
    fn popped_scopes_stay_addressable() {
        let mut i = Interner::with_capacity(3);
        let (marker, field, point) = (i.intern("Point_members"), i.intern("x"), i.intern("Point"));
        let mut t = SymbolTable::<()>::new();

        let members = t.new_scope(Some(marker));
        t.add(field, i32(), ());
        t.pop_scope();
        t.add(point, Type::structure(point), ()).scope = Some(members);

        assert!(t.get(field).is_none());
        assert_eq!(t.get_in(members, field).unwrap().ty, i32());

        let marker = t.get_local(marker).unwrap();
        assert_eq!(marker.ty.base(), BaseKind::Scope);
        assert_eq!(marker.scope, Some(members));
    }

    #[test]
    fn prelude_is_external_and_variadic() {
        let mut i = Interner::with_capacity(1);
        let mut t = SymbolTable::<()>::new();
        t.declare_prelude(&mut i, |_| ());

        let printf = t.get_local(i.intern("printf")).unwrap();
        assert_eq!(printf.ty.return_type(), Some(&i32()));
        assert!(printf.attributes.contains(Attributes::EXTERNAL | Attributes::VARIADIC));
    }

    #[test]
    #[should_panic = "can't pop the root scope"]
    fn popping_root_panics() {
        SymbolTable::<()>::new().pop_scope();
    }
}

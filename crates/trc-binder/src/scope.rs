//! Lexical scopes for local variables.
//!
//! Method, class and top-level scopes are hard boundaries: a method body
//! cannot see the locals around its `def`. Block scopes are soft and see
//! every local of the enclosing scopes up to the nearest hard boundary.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use trc_solver::TypeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    TopLevel,
    Class,
    Method,
    Block,
}

impl ScopeKind {
    fn is_boundary(self) -> bool {
        !matches!(self, ScopeKind::Block)
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    /// The annotation, for locals declared `name: T` and typed parameters.
    /// Assignments must stay within it.
    pub declared: Option<TypeId>,
    /// Type at the most recent assignment.
    pub ty: TypeId,
    pub pos: u32,
    pub end: u32,
    pub is_param: bool,
    pub read: bool,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    /// The type of `self` inside this scope.
    pub self_type: TypeId,
    symbols: IndexMap<String, SymbolId, FxBuildHasher>,
}

impl Scope {
    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.values().copied()
    }
}

/// A stack of scopes plus the storage for every symbol declared in them.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind, self_type: TypeId) {
        self.scopes.push(Scope {
            kind,
            self_type,
            symbols: IndexMap::default(),
        });
    }

    /// Close the innermost scope, returning it for unused-variable checks.
    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub fn self_type(&self) -> TypeId {
        self.scopes.last().map_or(TypeId::ANY, |scope| scope.self_type)
    }

    /// Kind of the nearest enclosing non-block scope.
    pub fn enclosing_boundary(&self) -> Option<ScopeKind> {
        self.scopes
            .iter()
            .rev()
            .map(|scope| scope.kind)
            .find(|kind| kind.is_boundary())
    }

    /// Declare `name` in the innermost scope, shadowing any outer symbol.
    pub fn declare(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        if let Some(scope) = self.scopes.last_mut() {
            scope.symbols.insert(symbol.name.clone(), id);
        }
        self.symbols.push(symbol);
        id
    }

    /// Find the visible symbol called `name`.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&id) = scope.symbols.get(name) {
                return Some(id);
            }
            if scope.kind.is_boundary() {
                break;
            }
        }
        None
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn mark_read(&mut self, id: SymbolId) {
        if let Some(symbol) = self.get_mut(id) {
            symbol.read = true;
        }
    }
}

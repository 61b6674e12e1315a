//! Binder for typed Ruby.
//!
//! Collects every declaration of a program (type aliases, interfaces,
//! classes and modules with their methods, attributes and instance
//! variables, top-level methods and constants) into a [`DeclarationTable`],
//! resolving each annotation to an interned type on the way.
//!
//! Binding runs in two phases:
//! 1. **Collect**: walk every file (the built-in prelude first) and register
//!    names. Duplicate aliases and interfaces are reported here.
//! 2. **Resolve**: lower annotations to `TypeId`s. Aliases resolve lazily
//!    with a visited-set guard, so a cycle is reported once per alias on it
//!    and every participant degrades to `Any`.
//!
//! The finished table is frozen behind an `Arc` and shared read-only by all
//! checker threads.

mod declarations;
mod errors;
mod prelude;
mod resolve;
pub mod scope;
mod state;
mod state_collect;
mod state_resolve;

use std::sync::Arc;

use trc_common::diagnostics::Diagnostic;
use trc_parser::ParsedFile;
use trc_solver::TypeInterner;
use tracing::info_span;

pub use declarations::{
    AliasInfo, ClassInfo, ClassKind, ConstantId, ConstantInfo, DeclSite, DeclarationTable,
    FileDeclarations, FileId, InterfaceInfo, IvarInfo, MethodId, MethodInfo, MethodKind,
    MethodLookup,
};
pub use errors::ResolveError;
pub use prelude::{PRELUDE_FILE_NAME, PRELUDE_SOURCE, prelude_file};
pub use resolve::TypeScope;
pub use scope::{Scope, ScopeKind, ScopeStack, Symbol, SymbolId};
pub use state::BinderState;
pub use state_collect::constant_path;

/// Declarations of a whole program plus the diagnostics binding produced.
#[derive(Clone)]
pub struct BindResult {
    pub table: Arc<DeclarationTable>,
    /// Binder diagnostics, already located, in file order.
    pub diagnostics: Vec<Diagnostic>,
}

impl BindResult {
    /// Diagnostics reported against one input file.
    pub fn diagnostics_for<'a>(&'a self, file_name: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.file == file_name)
    }
}

/// Bind a program. `files[i]` becomes [`FileId::input(i)`]; the prelude is
/// bound first under [`FileId::PRELUDE`].
pub fn bind_program(interner: Arc<TypeInterner>, files: &[Arc<ParsedFile>]) -> BindResult {
    let _span = info_span!("bind", files = files.len()).entered();
    let mut state = BinderState::new(interner);
    state.add_file(prelude_file());
    for file in files {
        state.add_file(Arc::clone(file));
    }
    state.collect_all();
    state.resolve_all();
    let (table, diagnostics) = state.finish();
    BindResult {
        table: Arc::new(table),
        diagnostics,
    }
}

//! Checker context: everything a file check reads and writes.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use trc_binder::{DeclarationTable, FileId, MethodId, ScopeStack, SymbolId};
use trc_common::interner::Atom;
use trc_common::options::{CheckName, CompilationContext};
use trc_parser::{NodeIndex, ParsedFile};
use trc_solver::{TypeId, TypeInterner};

use crate::error_reporter::ErrorReporter;
use crate::flow::FlowFacts;
use crate::infer::InferenceState;

/// Resolved types of one checked file.
///
/// Every expression node the checker visited has an entry in `node_types`.
/// Both emitters read this cache instead of re-deriving types.
#[derive(Clone, Debug, Default)]
pub struct TypeCache {
    pub node_types: FxHashMap<NodeIndex, TypeId>,
    /// Return types inferred for this file's methods that have no return
    /// annotation.
    pub method_returns: FxHashMap<MethodId, TypeId>,
    /// Types of instance variables assigned without a declaration, keyed by
    /// `(class, @name)`, in first-assignment order.
    pub ivar_types: IndexMap<(Atom, Atom), TypeId, FxBuildHasher>,
}

impl TypeCache {
    pub fn node_type(&self, node: NodeIndex) -> Option<TypeId> {
        self.node_types.get(&node).copied()
    }

    pub fn method_return(&self, method: MethodId) -> Option<TypeId> {
        self.method_returns.get(&method).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Method,
    Block,
    Lambda,
}

/// A callable body being checked: a method, a block or a lambda.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) kind: FrameKind,
    /// `return` values (method and lambda frames) or `next` values (blocks).
    pub(crate) exits: Vec<(TypeId, NodeIndex)>,
    pub(crate) method: Option<MethodId>,
    pub(crate) name: String,
    /// Type of the block the method receives, for `yield`.
    pub(crate) block: Option<TypeId>,
    /// The explicit `&block` parameter; `yield` reads it.
    pub(crate) block_param: Option<SymbolId>,
    /// Class and method type parameters visible to annotations.
    pub(crate) type_params: Vec<Atom>,
}

impl Frame {
    pub(crate) fn new(kind: FrameKind, name: impl Into<String>) -> Self {
        Frame {
            kind,
            exits: Vec::new(),
            method: None,
            name: name.into(),
            block: None,
            block_param: None,
            type_params: Vec::new(),
        }
    }
}

pub struct CheckerContext<'a> {
    pub table: &'a DeclarationTable,
    pub interner: &'a TypeInterner,
    pub file: &'a ParsedFile,
    pub file_id: FileId,
    pub options: &'a CompilationContext,
    pub types: TypeCache,

    pub(crate) reporter: ErrorReporter,
    pub(crate) inference: InferenceState,
    pub(crate) scopes: ScopeStack,
    pub(crate) facts: FlowFacts,
    pub(crate) frames: Vec<Frame>,
    /// Qualified name of the innermost class or module body.
    pub(crate) namespace: String,
    pub(crate) class_stack: Vec<Atom>,
    /// Type parameters of the enclosing class.
    pub(crate) class_type_params: Vec<Atom>,
    /// `Array#[]` / `Hash#[]` results widened with `nil` and not yet guarded.
    pub(crate) unchecked_index_nodes: FxHashSet<NodeIndex>,
    pub(crate) depth: u32,
    pub(crate) strict_nil: bool,
    pub(crate) unchecked_index: bool,
}

impl<'a> CheckerContext<'a> {
    pub fn new(
        table: &'a DeclarationTable,
        file_id: FileId,
        file: &'a ParsedFile,
        options: &'a CompilationContext,
        reporting: bool,
    ) -> Self {
        CheckerContext {
            table,
            interner: &**table.interner(),
            file,
            file_id,
            options,
            types: TypeCache::default(),
            reporter: ErrorReporter::new(&file.file_name, options.max_errors, reporting),
            inference: InferenceState::default(),
            scopes: ScopeStack::new(),
            facts: FlowFacts::default(),
            frames: Vec::new(),
            namespace: String::new(),
            class_stack: Vec::new(),
            class_type_params: Vec::new(),
            unchecked_index_nodes: FxHashSet::default(),
            depth: 0,
            strict_nil: options.is_enabled(CheckName::StrictNil),
            unchecked_index: options.is_enabled(CheckName::NoUncheckedIndexedAccess),
        }
    }

    pub fn current_class(&self) -> Option<Atom> {
        self.class_stack.last().copied()
    }
}

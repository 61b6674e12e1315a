//! Binder state: declarations collected so far and their resolution status.
//!
//! `impl BinderState` is split across files:
//! - `state.rs`: storage, file registration and the final freeze
//! - `state_collect.rs`: the collect phase (walk files, register names)
//! - `state_resolve.rs`: the resolve phase (annotations to types)

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};
use trc_common::diagnostics::Diagnostic;
use trc_common::interner::Atom;
use trc_parser::{NodeIndex, NodeKind, ParsedFile};
use trc_solver::{SubtypeChecker, TypeId, TypeInterner, TypeResolver, format_type};
use tracing::debug;

use crate::declarations::{
    AliasInfo, ClassInfo, ConstantId, ConstantInfo, DeclSite, DeclarationTable, FileDeclarations,
    FileId, FxIndexMap, InterfaceInfo, MethodId, MethodInfo,
};
use crate::errors::ResolveError;

// =============================================================================
// Entries
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AliasState {
    Unresolved,
    Resolving,
    Resolved(TypeId),
}

pub(crate) struct AliasEntry {
    pub(crate) name: Atom,
    pub(crate) site: DeclSite,
    pub(crate) node: NodeIndex,
    /// Namespace the alias was declared in.
    pub(crate) namespace: String,
    pub(crate) state: AliasState,
    /// Member of a reference cycle, reported once and resolved to `Any`.
    pub(crate) in_cycle: bool,
}

pub(crate) struct InterfaceEntry {
    pub(crate) info: InterfaceInfo,
}

/// A constant path written after `include` / `extend`.
pub(crate) struct ModuleRef {
    pub(crate) file: FileId,
    pub(crate) node: NodeIndex,
    pub(crate) namespace: String,
}

pub(crate) struct ClassEntry {
    pub(crate) info: ClassInfo,
    /// Namespace around the first `class` header, where its superclass is
    /// resolved.
    pub(crate) outer_namespace: String,
    /// `(file, class node)` of the first header that named a superclass.
    pub(crate) superclass_node: Option<(FileId, NodeIndex)>,
    pub(crate) include_refs: Vec<ModuleRef>,
    pub(crate) extend_refs: Vec<ModuleRef>,
    /// `IvarDecl` nodes found in the class body and its methods.
    pub(crate) ivar_decls: Vec<(FileId, NodeIndex)>,
}

/// An accessor generated by `attr_reader` / `attr_writer` / `attr_accessor`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AttrSource {
    pub(crate) item: usize,
    pub(crate) writer: bool,
}

pub(crate) struct MethodEntry {
    /// `signature` is `Any` until resolved.
    pub(crate) info: MethodInfo,
    /// Namespace the signature's names resolve in.
    pub(crate) namespace: String,
    pub(crate) attr: Option<AttrSource>,
}

/// An intersection written in an annotation, checked for conflicting
/// members once the table is complete.
pub(crate) struct PendingIntersection {
    pub(crate) file: FileId,
    pub(crate) members: Vec<TypeId>,
    pub(crate) pos: u32,
    pub(crate) end: u32,
}

// =============================================================================
// BinderState
// =============================================================================

pub struct BinderState {
    pub(crate) interner: Arc<TypeInterner>,
    pub(crate) files: Vec<Arc<ParsedFile>>,
    pub(crate) aliases: FxIndexMap<Atom, AliasEntry>,
    pub(crate) interfaces: FxIndexMap<Atom, InterfaceEntry>,
    pub(crate) classes: FxIndexMap<Atom, ClassEntry>,
    pub(crate) functions: FxIndexMap<Atom, MethodId>,
    pub(crate) constants: FxIndexMap<Atom, ConstantId>,
    pub(crate) constant_infos: Vec<ConstantInfo>,
    pub(crate) methods: Vec<MethodEntry>,
    pub(crate) method_nodes: FxHashMap<(FileId, NodeIndex), MethodId>,
    /// `private :name` calls, applied after every method is known.
    pub(crate) visibility_overrides: Vec<(Atom, Atom, trc_parser::Visibility)>,
    /// Alias indices currently being resolved, innermost last.
    pub(crate) alias_stack: Vec<usize>,
    /// File whose annotations are being resolved; intersections are
    /// attributed to it.
    pub(crate) current_file: FileId,
    pub(crate) pending_intersections: Vec<PendingIntersection>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl BinderState {
    pub fn new(interner: Arc<TypeInterner>) -> Self {
        BinderState {
            interner,
            files: Vec::new(),
            aliases: FxIndexMap::default(),
            interfaces: FxIndexMap::default(),
            classes: FxIndexMap::default(),
            functions: FxIndexMap::default(),
            constants: FxIndexMap::default(),
            constant_infos: Vec::new(),
            methods: Vec::new(),
            method_nodes: FxHashMap::default(),
            visibility_overrides: Vec::new(),
            alias_stack: Vec::new(),
            current_file: FileId::PRELUDE,
            pending_intersections: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Register a file. The first file added is [`FileId::PRELUDE`].
    pub fn add_file(&mut self, file: Arc<ParsedFile>) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(file);
        id
    }

    pub(crate) fn atom(&self, name: &str) -> Atom {
        self.interner.intern_string(name)
    }

    pub(crate) fn report(&mut self, file: FileId, error: &ResolveError) {
        let Some(parsed) = self.files.get(file.0 as usize) else {
            return;
        };
        debug!(file = %parsed.file_name, code = error.code(), "{error}");
        let diagnostic = error.to_diagnostic(&parsed.file_name, &parsed.line_map);
        self.diagnostics.push(diagnostic);
    }

    /// Freeze the collected declarations into a table and hand back every
    /// diagnostic binding produced, ordered by file then position.
    pub fn finish(mut self) -> (DeclarationTable, Vec<Diagnostic>) {
        let table = DeclarationTable {
            interner: Arc::clone(&self.interner),
            files: std::mem::take(&mut self.files),
            aliases: self
                .aliases
                .values()
                .map(|entry| {
                    let ty = match entry.state {
                        AliasState::Resolved(ty) => ty,
                        _ => TypeId::ANY,
                    };
                    let info = AliasInfo {
                        name: entry.name,
                        ty,
                        site: entry.site,
                    };
                    (entry.name, info)
                })
                .collect(),
            interfaces: self
                .interfaces
                .values()
                .map(|entry| (entry.info.name, entry.info.clone()))
                .collect(),
            classes: self
                .classes
                .values()
                .map(|entry| (entry.info.name, entry.info.clone()))
                .collect(),
            functions: std::mem::take(&mut self.functions),
            constants: std::mem::take(&mut self.constants),
            constant_infos: std::mem::take(&mut self.constant_infos),
            methods: self.methods.drain(..).map(|entry| entry.info).collect(),
            method_nodes: std::mem::take(&mut self.method_nodes),
            file_declarations: Vec::new(),
        };

        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        diagnostics.extend(check_intersections(&table, &self.pending_intersections));

        let file_declarations = (0..table.files.len())
            .map(|i| file_declarations(&table, FileId(i as u32)))
            .collect();
        let table = DeclarationTable {
            file_declarations,
            ..table
        };

        let order: FxHashMap<&str, usize> = table
            .files
            .iter()
            .enumerate()
            .map(|(i, file)| (file.file_name.as_str(), i))
            .collect();
        diagnostics.sort_by_key(|d| (order.get(d.file.as_str()).copied().unwrap_or(usize::MAX), d.start));
        (table, diagnostics)
    }
}

// =============================================================================
// Post-freeze passes
// =============================================================================

/// Report interface members that two intersected interfaces declare with
/// incompatible signatures. Compatible means one signature is a subtype of
/// the other; the intersection then uses the more specific one.
fn check_intersections(table: &DeclarationTable, pending: &[PendingIntersection]) -> Vec<Diagnostic> {
    let interner = &**table.interner();
    let mut out = Vec::new();
    for intersection in pending {
        let interfaces: Vec<Atom> = intersection
            .members
            .iter()
            .filter_map(|&member| trc_solver::interface_name(interner, member))
            .collect();
        for (i, &left) in interfaces.iter().enumerate() {
            let left_members = table.interface_members(left);
            for &right in &interfaces[i + 1..] {
                for (member, right_sig) in table.interface_members(right) {
                    let Some(&(_, left_sig)) = left_members.iter().find(|(name, _)| *name == member) else {
                        continue;
                    };
                    let mut checker = SubtypeChecker::new(interner, table);
                    if checker.is_subtype(left_sig, right_sig) || checker.is_subtype(right_sig, left_sig) {
                        continue;
                    }
                    let error = ResolveError::IntersectionConflict {
                        left: interner.resolve_atom(left).to_string(),
                        right: interner.resolve_atom(right).to_string(),
                        member: interner.resolve_atom(member).to_string(),
                        pos: intersection.pos,
                        end: intersection.end,
                    };
                    if let Some(file) = table.file(intersection.file) {
                        out.push(error.to_diagnostic(&file.file_name, &file.line_map));
                    }
                }
            }
        }
    }
    out
}

/// Names a file declares and mentions, and a hash of its declaration
/// surface.
fn file_declarations(table: &DeclarationTable, file: FileId) -> FileDeclarations {
    let interner = &**table.interner();
    let Some(parsed) = table.file(file) else {
        return FileDeclarations::default();
    };
    let mut declared: Vec<String> = Vec::new();
    let mut hasher = FxHasher::default();
    let name = |atom: Atom| interner.resolve_atom(atom).to_string();

    for alias in table.aliases.values().filter(|a| a.site.file == file) {
        declared.push(name(alias.name));
        (name(alias.name), format_type(interner, alias.ty)).hash(&mut hasher);
    }
    for interface in table.interfaces.values().filter(|i| i.site.file == file) {
        declared.push(name(interface.name));
        name(interface.name).hash(&mut hasher);
    }
    for class in table.classes.values() {
        if !class.sites.iter().any(|site| site.file == file) {
            continue;
        }
        declared.push(name(class.name));
        name(class.name).hash(&mut hasher);
        class.superclass.map(|ty| format_type(interner, ty)).hash(&mut hasher);
        for ivar in class.ivars.iter().filter(|(_, ivar)| ivar.site.file == file) {
            (name(*ivar.0), format_type(interner, ivar.1.ty)).hash(&mut hasher);
        }
    }
    for (&function, &id) in &table.functions {
        if table.method(id).is_some_and(|m| m.site.file == file) {
            declared.push(name(function));
        }
    }
    for constant in table.constant_infos.iter().filter(|c| c.site.file == file) {
        declared.push(name(constant.name));
        (name(constant.name), parsed.node_text(constant.value)).hash(&mut hasher);
    }
    for (_, method) in table.methods().filter(|(_, m)| m.site.file == file) {
        let owner = method.owner.map(name);
        (owner, name(method.name), method.singleton, method.visibility.as_str()).hash(&mut hasher);
        format_type(interner, method.signature).hash(&mut hasher);
        if method.needs_inference() {
            parsed.node_text(method.node).hash(&mut hasher);
        }
    }

    let mut referenced: Vec<String> = Vec::new();
    parsed.arena.walk(parsed.root, &mut |_, kind| collect_references(kind, &mut referenced));
    referenced.sort_unstable();
    referenced.dedup();
    declared.sort_unstable();
    declared.dedup();

    FileDeclarations {
        declared,
        referenced,
        surface_hash: hasher.finish(),
    }
}

fn collect_references(kind: &NodeKind, out: &mut Vec<String>) {
    let mut push = |name: &str| out.push(name.trim_start_matches("::").to_string());
    match kind {
        NodeKind::Constant { name, .. } | NodeKind::Identifier { name } => push(name),
        NodeKind::Call(call) => push(&call.method),
        NodeKind::TypeAlias { ty, .. } | NodeKind::TypedLocal { ty, .. } | NodeKind::IvarDecl { ty, .. } => {
            ty.for_each_name(&mut push);
        }
        NodeKind::Class { superclass, .. } => {
            if let Some(ty) = superclass {
                ty.for_each_name(&mut push);
            }
        }
        NodeKind::Method(decl) => {
            for param in &decl.params {
                if let Some(ty) = &param.ty {
                    ty.for_each_name(&mut push);
                }
            }
            if let Some(ty) = &decl.return_type {
                ty.for_each_name(&mut push);
            }
        }
        NodeKind::Attr { items, .. } => {
            for item in items {
                if let Some(ty) = &item.ty {
                    ty.for_each_name(&mut push);
                }
            }
        }
        NodeKind::Block { params, .. } | NodeKind::Lambda { params, .. } => {
            for param in params {
                if let Some(ty) = &param.ty {
                    ty.for_each_name(&mut push);
                }
            }
        }
        _ => {}
    }
}

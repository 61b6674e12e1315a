//! Collect phase: register every declaration by name.

use std::sync::Arc;

use trc_common::interner::Atom;
use trc_parser::{
    AttrItem, AttrKind, CallData, MethodDecl, NodeArena, NodeIndex, NodeKind, ParsedFile, Visibility,
};
use trc_solver::TypeId;
use tracing::{debug_span, trace};

use crate::declarations::{
    ClassInfo, ClassKind, ConstantId, ConstantInfo, DeclSite, DeclarationTable, FileId,
    InterfaceInfo, MethodId, MethodInfo, MethodKind,
};
use crate::errors::ResolveError;
use crate::state::{
    AliasEntry, AliasState, AttrSource, BinderState, ClassEntry, InterfaceEntry, MethodEntry,
    ModuleRef,
};

/// Source text of a constant path (`Admin::User`, `::Logger`).
pub fn constant_path(arena: &NodeArena, index: NodeIndex) -> Option<String> {
    match arena.kind(index)? {
        NodeKind::Constant {
            scope,
            name,
            top_level,
        } => {
            if scope.is_some() {
                Some(format!("{}::{name}", constant_path(arena, *scope)?))
            } else if *top_level {
                Some(format!("::{name}"))
            } else {
                Some(name.clone())
            }
        }
        _ => None,
    }
}

/// Span of `name` inside a declaration, falling back to the whole node.
fn name_span(parsed: &ParsedFile, pos: u32, end: u32, name: &str) -> (u32, u32) {
    let short = name.rsplit("::").next().unwrap_or(name);
    match parsed.slice(pos, end).find(short) {
        Some(offset) => {
            let start = pos + offset as u32;
            (start, start + short.len() as u32)
        }
        None => (pos, end),
    }
}

impl BinderState {
    pub fn collect_all(&mut self) {
        let _span = debug_span!("collect", files = self.files.len()).entered();
        for index in 0..self.files.len() {
            let file = FileId(index as u32);
            let parsed = Arc::clone(&self.files[index]);
            self.collect_statements(&parsed, file, parsed.statements(), "", None);
        }
    }

    fn collect_statements(
        &mut self,
        parsed: &ParsedFile,
        file: FileId,
        statements: &[NodeIndex],
        namespace: &str,
        owner: Option<Atom>,
    ) {
        let mut visibility = Visibility::Public;
        for &idx in statements {
            let Some(node) = parsed.arena.get(idx) else {
                continue;
            };
            match &node.kind {
                NodeKind::TypeAlias { name, .. } => {
                    let full = DeclarationTable::qualify(namespace, name);
                    let (pos, end) = name_span(parsed, node.pos, node.end, name);
                    self.declare_alias(idx, &full, DeclSite { file, pos, end }, namespace);
                }
                NodeKind::Interface { name, members } => {
                    let full = DeclarationTable::qualify(namespace, name);
                    let (pos, end) = name_span(parsed, node.pos, node.end, name);
                    self.declare_interface(parsed, file, &full, DeclSite { file, pos, end }, members, namespace);
                }
                NodeKind::Class {
                    name,
                    type_params,
                    superclass,
                    body,
                } => {
                    let full = DeclarationTable::qualify(namespace, name);
                    let params = type_params.iter().map(|p| self.atom(&p.name)).collect();
                    let (pos, end) = name_span(parsed, node.pos, node.end, name);
                    let header = ClassHeader {
                        full: &full,
                        kind: ClassKind::Class,
                        type_params: params,
                        has_superclass: superclass.is_some(),
                        site: DeclSite { file, pos, end },
                    };
                    if let Some(class) = self.declare_class(idx, header, namespace) {
                        self.collect_statements(parsed, file, body, &full, Some(class));
                    }
                }
                NodeKind::Module { name, body } => {
                    let full = DeclarationTable::qualify(namespace, name);
                    let (pos, end) = name_span(parsed, node.pos, node.end, name);
                    let header = ClassHeader {
                        full: &full,
                        kind: ClassKind::Module,
                        type_params: Vec::new(),
                        has_superclass: false,
                        site: DeclSite { file, pos, end },
                    };
                    if let Some(module) = self.declare_class(idx, header, namespace) {
                        self.collect_statements(parsed, file, body, &full, Some(module));
                    }
                }
                NodeKind::Method(decl) => {
                    // `private` sections never apply to `def self.name`.
                    let visibility = if decl.visibility != Visibility::Public || decl.singleton {
                        decl.visibility
                    } else {
                        visibility
                    };
                    self.declare_method(parsed, file, idx, decl, visibility, namespace, owner);
                }
                NodeKind::VisibilityMarker(marker) => visibility = *marker,
                NodeKind::Attr { kind, items } => {
                    if let Some(owner) = owner {
                        self.declare_attrs(file, idx, *kind, items, visibility, namespace, owner);
                    }
                }
                NodeKind::IvarDecl { .. } => {
                    if let Some(entry) = owner.and_then(|o| self.classes.get_mut(&o)) {
                        entry.ivar_decls.push((file, idx));
                    }
                }
                NodeKind::Assign { target, value } => {
                    if let Some(NodeKind::Constant { scope, name, .. }) = parsed.arena.kind(*target)
                        && scope.is_none()
                    {
                        let full = DeclarationTable::qualify(namespace, name);
                        let (pos, end) = parsed.arena.span(*target);
                        self.declare_constant(&full, *value, DeclSite { file, pos, end });
                    }
                }
                NodeKind::Call(call) if call.receiver.is_none() => {
                    if let Some(owner) = owner {
                        self.collect_class_call(parsed, file, call, namespace, owner);
                    }
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Whether `name` is already taken by a declaration of another kind.
    fn is_type_name_taken(&self, name: Atom) -> bool {
        self.aliases.contains_key(&name)
            || self.interfaces.contains_key(&name)
            || self.classes.contains_key(&name)
    }

    fn report_duplicate(&mut self, name: &str, site: DeclSite) {
        let error = ResolveError::DuplicateDeclaration {
            name: name.to_string(),
            pos: site.pos,
            end: site.end,
        };
        self.report(site.file, &error);
    }

    fn declare_alias(&mut self, node: NodeIndex, full: &str, site: DeclSite, namespace: &str) {
        let name = self.atom(full);
        if self.is_type_name_taken(name) {
            self.report_duplicate(full, site);
            return;
        }
        trace!(alias = full, "declare alias");
        self.aliases.insert(
            name,
            AliasEntry {
                name,
                site,
                node,
                namespace: namespace.to_string(),
                state: AliasState::Unresolved,
                in_cycle: false,
            },
        );
    }

    fn declare_interface(
        &mut self,
        parsed: &ParsedFile,
        file: FileId,
        full: &str,
        site: DeclSite,
        members: &[NodeIndex],
        namespace: &str,
    ) {
        let name = self.atom(full);
        if self.is_type_name_taken(name) {
            self.report_duplicate(full, site);
            return;
        }
        self.interfaces.insert(
            name,
            InterfaceEntry {
                info: InterfaceInfo {
                    name,
                    members: Default::default(),
                    site,
                },
            },
        );
        for &member in members {
            let Some(NodeKind::Method(decl)) = parsed.arena.kind(member) else {
                continue;
            };
            let info = self.method_info(file, member, decl, Visibility::Public, Some(name));
            let id = self.push_method(info, namespace, None);
            self.method_nodes.insert((file, member), id);
            let method_name = self.methods[id.0 as usize].info.name;
            if let Some(entry) = self.interfaces.get_mut(&name) {
                entry.info.members.insert(method_name, id);
            }
        }
    }

    /// Register a class or module, merging reopened declarations. Returns
    /// `None` when the name clashes with a declaration of another kind.
    fn declare_class(&mut self, node: NodeIndex, header: ClassHeader<'_>, outer_namespace: &str) -> Option<Atom> {
        let name = self.atom(header.full);
        let site = header.site;
        if self.aliases.contains_key(&name) || self.interfaces.contains_key(&name) {
            self.report_duplicate(header.full, site);
            return None;
        }
        if let Some(entry) = self.classes.get_mut(&name) {
            if entry.info.kind != header.kind {
                self.report_duplicate(header.full, site);
                return None;
            }
            entry.info.sites.push(site);
            if entry.info.type_params.is_empty() {
                entry.info.type_params = header.type_params;
            }
            if header.has_superclass && entry.superclass_node.is_none() {
                entry.superclass_node = Some((site.file, node));
            }
            return Some(name);
        }
        trace!(class = header.full, "declare class");
        self.classes.insert(
            name,
            ClassEntry {
                info: ClassInfo {
                    name,
                    kind: header.kind,
                    type_params: header.type_params,
                    superclass: None,
                    includes: Vec::new(),
                    extends: Vec::new(),
                    instance_methods: Default::default(),
                    singleton_methods: Default::default(),
                    ivars: Default::default(),
                    sites: vec![site],
                },
                outer_namespace: outer_namespace.to_string(),
                superclass_node: header.has_superclass.then_some((site.file, node)),
                include_refs: Vec::new(),
                extend_refs: Vec::new(),
                ivar_decls: Vec::new(),
            },
        );
        Some(name)
    }

    fn method_info(
        &self,
        file: FileId,
        node: NodeIndex,
        decl: &MethodDecl,
        visibility: Visibility,
        owner: Option<Atom>,
    ) -> MethodInfo {
        MethodInfo {
            name: self.atom(&decl.name),
            owner,
            singleton: decl.singleton,
            visibility,
            kind: if decl.signature_only {
                MethodKind::Signature
            } else {
                MethodKind::Def
            },
            signature: TypeId::ANY,
            has_return_annotation: decl.return_type.is_some(),
            site: DeclSite {
                file,
                pos: decl.name_pos,
                end: decl.name_pos + decl.name.len() as u32,
            },
            node,
        }
    }

    fn push_method(&mut self, info: MethodInfo, namespace: &str, attr: Option<AttrSource>) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(MethodEntry {
            info,
            namespace: namespace.to_string(),
            attr,
        });
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn declare_method(
        &mut self,
        parsed: &ParsedFile,
        file: FileId,
        node: NodeIndex,
        decl: &MethodDecl,
        visibility: Visibility,
        namespace: &str,
        owner: Option<Atom>,
    ) {
        let info = self.method_info(file, node, decl, visibility, owner);
        let name = info.name;
        let id = self.push_method(info, namespace, None);
        self.method_nodes.insert((file, node), id);

        let Some(entry) = owner.and_then(|o| self.classes.get_mut(&o)) else {
            self.functions.insert(name, id);
            return;
        };
        if decl.singleton {
            entry.info.singleton_methods.insert(name, id);
        } else {
            entry.info.instance_methods.insert(name, id);
        }
        for &statement in &decl.body {
            parsed.arena.walk(statement, &mut |index, kind| {
                if matches!(kind, NodeKind::IvarDecl { .. }) {
                    entry.ivar_decls.push((file, index));
                }
            });
        }
    }

    /// Each attribute item becomes a reader `name`, a writer `name=`, or both.
    #[allow(clippy::too_many_arguments)]
    fn declare_attrs(
        &mut self,
        file: FileId,
        node: NodeIndex,
        kind: AttrKind,
        items: &[AttrItem],
        visibility: Visibility,
        namespace: &str,
        owner: Atom,
    ) {
        for (item_index, item) in items.iter().enumerate() {
            let site = DeclSite {
                file,
                pos: item.pos,
                end: item.end,
            };
            let mut accessors = Vec::with_capacity(2);
            if matches!(kind, AttrKind::Reader | AttrKind::Accessor) {
                accessors.push((item.name.clone(), MethodKind::AttrReader, false));
            }
            if matches!(kind, AttrKind::Writer | AttrKind::Accessor) {
                accessors.push((format!("{}=", item.name), MethodKind::AttrWriter, true));
            }
            for (method_name, method_kind, writer) in accessors {
                let name = self.atom(&method_name);
                let info = MethodInfo {
                    name,
                    owner: Some(owner),
                    singleton: false,
                    visibility,
                    kind: method_kind,
                    signature: TypeId::ANY,
                    has_return_annotation: true,
                    site,
                    node,
                };
                let attr = AttrSource {
                    item: item_index,
                    writer,
                };
                let id = self.push_method(info, namespace, Some(attr));
                if let Some(entry) = self.classes.get_mut(&owner) {
                    entry.info.instance_methods.insert(name, id);
                }
            }
        }
    }

    fn declare_constant(&mut self, full: &str, value: NodeIndex, site: DeclSite) {
        let name = self.atom(full);
        if self.constants.contains_key(&name) {
            return;
        }
        let id = ConstantId(self.constant_infos.len() as u32);
        self.constant_infos.push(ConstantInfo { name, value, site });
        self.constants.insert(name, id);
    }

    /// `include M`, `extend M` and `private :name` inside a class body.
    fn collect_class_call(
        &mut self,
        parsed: &ParsedFile,
        file: FileId,
        call: &CallData,
        namespace: &str,
        owner: Atom,
    ) {
        let visibility = match call.method.as_str() {
            "include" | "prepend" | "extend" => {
                let refs: Vec<ModuleRef> = call
                    .args
                    .iter()
                    .filter(|&&arg| matches!(parsed.arena.kind(arg), Some(NodeKind::Constant { .. })))
                    .map(|&arg| ModuleRef {
                        file,
                        node: arg,
                        namespace: namespace.to_string(),
                    })
                    .collect();
                if let Some(entry) = self.classes.get_mut(&owner) {
                    if call.method == "extend" {
                        entry.extend_refs.extend(refs);
                    } else {
                        entry.include_refs.extend(refs);
                    }
                }
                return;
            }
            "private" => Visibility::Private,
            "public" => Visibility::Public,
            "protected" => Visibility::Protected,
            _ => return,
        };
        for &arg in &call.args {
            if let Some(NodeKind::Symbol { name }) = parsed.arena.kind(arg) {
                let name = self.atom(name);
                self.visibility_overrides.push((owner, name, visibility));
            }
        }
    }
}

struct ClassHeader<'a> {
    full: &'a str,
    kind: ClassKind,
    type_params: Vec<Atom>,
    has_superclass: bool,
    site: DeclSite,
}

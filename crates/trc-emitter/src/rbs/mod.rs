//! RBS emitter.
//!
//! Prints one `.rbs` signature per declaration of a checked file:
//!
//! ```ruby
//! # input.trb
//! class Box<T>
//!   attr_reader :value: T
//!   def initialize(value: T)
//!     @value = value
//!   end
//!   def map<U>(&block: Proc<T, U>): Box<U>
//!     Box.new(yield(@value))
//!   end
//! end
//! ```
//!
//! Generates:
//!
//! ```ruby
//! # input.rbs
//! class Box[T]
//!   attr_reader value: T
//!   def initialize: (T value) -> void
//!   def map: [U] () { (T) -> U } -> Box[U]
//! end
//! ```
//!
//! Types come from the declaration table, and unannotated returns from the
//! checker's [`TypeCache`], so the file agrees with what was checked.

mod types;

pub use types::{RbsTypePrinter, alias_name, interface_name};

use rustc_hash::FxHashSet;
use trc_binder::{DeclarationTable, FileId};
use trc_checker::TypeCache;
use trc_common::interner::Atom;
use trc_parser::{AttrItem, AttrKind, MethodDecl, NodeIndex, NodeKind, ParsedFile, Visibility};
use trc_solver::{TypeId, TypeInterner, widen_literal};
use tracing::{debug_span, trace};

use crate::source_writer::SourceWriter;

pub struct RbsEmitter<'a> {
    table: &'a DeclarationTable,
    interner: &'a TypeInterner,
    file: &'a ParsedFile,
    file_id: FileId,
    types: &'a TypeCache,
    writer: SourceWriter,
    namespace: String,
    /// `(class, ivar)` pairs already written, across reopened classes.
    ivars_written: FxHashSet<(Atom, Atom)>,
}

impl<'a> RbsEmitter<'a> {
    /// `None` when `file_id` is not part of the table.
    pub fn new(table: &'a DeclarationTable, file_id: FileId, types: &'a TypeCache) -> Option<Self> {
        let file: &ParsedFile = table.file(file_id)?;
        Some(RbsEmitter {
            table,
            interner: table.interner(),
            file,
            file_id,
            types,
            writer: SourceWriter::new(),
            namespace: String::new(),
            ivars_written: FxHashSet::default(),
        })
    }

    pub fn emit(mut self) -> String {
        let _span = debug_span!("emit_rbs", file = %self.file.file_name).entered();
        let statements = self.file.statements();
        self.emit_members(statements, None);
        self.writer.ensure_line();
        self.writer.into_output()
    }

    fn atom(&self, text: &str) -> Atom {
        self.interner.intern_string(text)
    }

    fn print_type(&self, ty: TypeId) -> String {
        RbsTypePrinter::new(self.interner).print(ty)
    }

    /// Members of the file or of a class/module body; `owner` is the
    /// enclosing class.
    fn emit_members(&mut self, statements: &[NodeIndex], owner: Option<Atom>) {
        for &statement in statements {
            let Some(kind) = self.file.arena.kind(statement) else {
                continue;
            };
            match kind {
                NodeKind::Class {
                    name,
                    superclass,
                    body,
                    ..
                } => self.emit_class(name, superclass.is_some(), body, false),
                NodeKind::Module { name, body } => self.emit_class(name, false, body, true),
                NodeKind::Method(decl) => self.emit_method(statement, decl),
                NodeKind::Attr { kind, items } => {
                    if let Some(owner) = owner {
                        self.emit_attrs(owner, *kind, items);
                    }
                }
                NodeKind::IvarDecl { name, .. } => {
                    if let Some(owner) = owner {
                        self.emit_ivar(owner, name);
                    }
                }
                NodeKind::TypeAlias { name, .. } => self.emit_alias(name),
                NodeKind::Interface { name, members } => self.emit_interface(name, members),
                NodeKind::VisibilityMarker(visibility) => {
                    if owner.is_some() && *visibility != Visibility::Protected {
                        self.writer.write(visibility.as_str());
                        self.writer.write_line();
                    }
                }
                NodeKind::Call(call) if call.receiver.is_none() && owner.is_some() => {
                    if matches!(call.method.as_str(), "include" | "extend" | "prepend") {
                        for &arg in &call.args {
                            if matches!(self.file.arena.kind(arg), Some(NodeKind::Constant { .. })) {
                                self.writer.write(&call.method);
                                self.writer.write_space();
                                self.writer.write(self.file.node_text(arg));
                                self.writer.write_line();
                            }
                        }
                    }
                }
                NodeKind::Assign { target, value } => self.emit_constant(*target, *value),
                _ => {}
            }
        }
    }

    // =========================================================================
    // Classes and modules
    // =========================================================================

    fn emit_class(&mut self, name: &str, has_superclass: bool, body: &[NodeIndex], module: bool) {
        let qualified = DeclarationTable::qualify(&self.namespace, name);
        let Some(info) = self.table.class_named(&qualified) else {
            return;
        };
        let class = info.name;
        self.writer.write(if module { "module " } else { "class " });
        self.writer.write(name.trim_start_matches("::"));
        if !info.type_params.is_empty() {
            let params: Vec<String> = info
                .type_params
                .iter()
                .map(|&p| self.interner.resolve_atom(p).to_string())
                .collect();
            self.writer.write(&format!("[{}]", params.join(", ")));
        }
        if has_superclass && let Some(superclass) = info.superclass {
            self.writer.write(" < ");
            self.writer.write(&self.print_type(superclass));
        }
        self.writer.write_line();

        let saved = std::mem::replace(&mut self.namespace, qualified);
        self.writer.increase_indent();
        self.emit_body_ivars(class, body);
        self.emit_members(body, Some(class));
        self.writer.decrease_indent();
        self.namespace = saved;

        self.writer.write("end");
        self.writer.write_line();
    }

    /// Instance variables declared inside method bodies, then those the
    /// checker inferred from assignments.
    fn emit_body_ivars(&mut self, class: Atom, body: &[NodeIndex]) {
        let arena = &self.file.arena;
        let mut declared = Vec::new();
        for &statement in body {
            if let Some(NodeKind::Method(decl)) = arena.kind(statement) {
                for &inner in &decl.body {
                    arena.walk(inner, &mut |_, kind| {
                        if let NodeKind::IvarDecl { name, .. } = kind {
                            declared.push(name.clone());
                        }
                    });
                }
            }
        }
        for name in declared {
            self.emit_ivar(class, &name);
        }

        let inferred: Vec<(Atom, TypeId)> = self
            .types
            .ivar_types
            .iter()
            .filter(|((owner, name), _)| *owner == class && self.table.ivar(class, *name).is_none())
            .map(|(&(_, name), &ty)| (name, ty))
            .collect();
        for (name, ty) in inferred {
            if self.ivars_written.insert((class, name)) {
                let ty = widen_literal(self.interner, ty);
                let line = format!("{}: {}", self.interner.resolve_atom(name), self.print_type(ty));
                self.writer.write(&line);
                self.writer.write_line();
            }
        }
    }

    fn emit_ivar(&mut self, class: Atom, name: &str) {
        let atom = self.atom(name);
        if !self.ivars_written.insert((class, atom)) {
            return;
        }
        let ty = self.table.ivar(class, atom).map_or(TypeId::ANY, |ivar| ivar.ty);
        let line = format!("{name}: {}", self.print_type(ty));
        self.writer.write(&line);
        self.writer.write_line();
    }

    fn emit_attrs(&mut self, class: Atom, kind: AttrKind, items: &[AttrItem]) {
        for item in items {
            let ty = self.attr_type(class, kind, &item.name);
            let line = format!("{} {}: {}", kind.keyword(), item.name, self.print_type(ty));
            self.writer.write(&line);
            self.writer.write_line();
            let ivar = self.atom(&format!("@{}", item.name));
            self.ivars_written.insert((class, ivar));
        }
    }

    /// The reader's return type, or the writer's parameter type.
    fn attr_type(&self, class: Atom, kind: AttrKind, name: &str) -> TypeId {
        let info = self.table.class(class);
        let method = match kind {
            AttrKind::Reader | AttrKind::Accessor => info.and_then(|c| c.instance_methods.get(&self.atom(name))),
            AttrKind::Writer => info.and_then(|c| c.instance_methods.get(&self.atom(&format!("{name}=")))),
        };
        let shape = method
            .and_then(|&id| self.table.method(id))
            .and_then(|m| self.table.signature_shape(m.signature));
        match (kind, shape) {
            (AttrKind::Writer, Some(shape)) => shape.params.first().map_or(TypeId::ANY, |p| p.ty),
            (_, Some(shape)) => shape.return_type,
            (_, None) => TypeId::ANY,
        }
    }

    // =========================================================================
    // Methods
    // =========================================================================

    fn emit_method(&mut self, node: NodeIndex, decl: &MethodDecl) {
        let Some(signature) = self.method_signature(node, decl) else {
            return;
        };
        trace!(method = %decl.name, "rbs signature");
        if decl.visibility == Visibility::Private {
            self.writer.write("private ");
        }
        self.writer.write("def ");
        if decl.singleton {
            self.writer.write("self.");
        }
        self.writer.write(&decl.name);
        self.writer.write(": ");
        self.writer.write(&signature);
        self.writer.write_line();
    }

    /// `initialize` always returns `void`; unannotated returns use the
    /// inferred type.
    fn method_signature(&self, node: NodeIndex, decl: &MethodDecl) -> Option<String> {
        let id = self.table.method_for_node(self.file_id, node)?;
        let info = self.table.method(id)?;
        let mut shape = (*self.table.signature_shape(info.signature)?).clone();
        if decl.name == "initialize" {
            shape.return_type = TypeId::VOID;
        } else if !info.has_return_annotation {
            shape.return_type = self.types.method_return(id).unwrap_or(TypeId::ANY);
        }
        Some(RbsTypePrinter::new(self.interner).print_function(&shape, true))
    }

    // =========================================================================
    // Type declarations
    // =========================================================================

    fn emit_alias(&mut self, name: &str) {
        let qualified = DeclarationTable::qualify(&self.namespace, name);
        let ty = self
            .table
            .alias(self.atom(&qualified))
            .map_or(TypeId::ANY, |alias| alias.ty);
        let line = format!("type {} = {}", alias_name(name), self.print_type(ty));
        self.writer.write(&line);
        self.writer.write_line();
    }

    fn emit_interface(&mut self, name: &str, members: &[NodeIndex]) {
        let qualified = DeclarationTable::qualify(&self.namespace, name);
        if self.table.interface(self.atom(&qualified)).is_none() {
            return;
        }
        self.writer.write("interface ");
        self.writer.write(&interface_name(name));
        self.writer.write_line();
        self.writer.increase_indent();
        for &member in members {
            if let Some(NodeKind::Method(decl)) = self.file.arena.kind(member) {
                self.emit_method(member, decl);
            }
        }
        self.writer.decrease_indent();
        self.writer.write("end");
        self.writer.write_line();
    }

    /// `LIMIT = 10` becomes `LIMIT: Integer`.
    fn emit_constant(&mut self, target: NodeIndex, value: NodeIndex) {
        let Some(NodeKind::Constant { name, scope, .. }) = self.file.arena.kind(target) else {
            return;
        };
        if scope.is_some() {
            return;
        }
        let ty = self
            .types
            .node_type(value)
            .map_or(TypeId::ANY, |ty| widen_literal(self.interner, ty));
        let line = format!("{name}: {}", self.print_type(ty));
        self.writer.write(&line);
        self.writer.write_line();
    }
}

/// Signatures for `file_id`, using the types its check recorded.
pub fn emit_rbs(table: &DeclarationTable, file_id: FileId, types: &TypeCache) -> String {
    RbsEmitter::new(table, file_id, types).map(RbsEmitter::emit).unwrap_or_default()
}

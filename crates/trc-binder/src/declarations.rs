//! The frozen declaration table and its queries.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use trc_common::interner::Atom;
use trc_common::limits::MAX_CLASS_CHAIN_DEPTH;
use trc_parser::{NodeIndex, ParsedFile, TypeExpr, Visibility};
use trc_solver::types::{FunctionShape, TypeKey};
use trc_solver::{
    TypeId, TypeInterner, TypeResolver, TypeSubstitution, function_shape_of, instantiate_type,
};

use crate::errors::ResolveError;
use crate::prelude::PRELUDE_FILE_NAME;
use crate::resolve::{NameBinding, NameLookup, TypeScope, namespace_candidates, resolve_type_expr};

pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

// =============================================================================
// Handles
// =============================================================================

/// A source file known to the binder. The prelude is file 0; input file `i`
/// is `FileId(i + 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    pub const PRELUDE: FileId = FileId(0);

    pub fn input(index: usize) -> FileId {
        FileId(index as u32 + 1)
    }

    /// Position in the caller's input list, `None` for the prelude.
    pub fn input_index(self) -> Option<usize> {
        (self != Self::PRELUDE).then(|| self.0 as usize - 1)
    }

    pub fn is_prelude(self) -> bool {
        self == Self::PRELUDE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MethodId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstantId(pub u32);

/// Where a declaration was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DeclSite {
    pub file: FileId,
    pub pos: u32,
    pub end: u32,
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ClassKind {
    Class,
    Module,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MethodKind {
    /// A `def` with a body.
    Def,
    /// A body-less signature (interface member or prelude declaration).
    Signature,
    AttrReader,
    AttrWriter,
}

#[derive(Clone, Debug, Serialize)]
pub struct MethodInfo {
    pub name: Atom,
    /// Declaring class, module or interface; `None` for top-level methods.
    pub owner: Option<Atom>,
    /// `def self.name`
    pub singleton: bool,
    pub visibility: Visibility,
    pub kind: MethodKind,
    /// Function type. Unannotated parameters are `Any`; an unannotated
    /// return is `Any` until the checker infers it.
    pub signature: TypeId,
    pub has_return_annotation: bool,
    pub site: DeclSite,
    /// The `Method` node, or the `Attr` node for accessors.
    pub node: NodeIndex,
}

impl MethodInfo {
    /// The return type comes from the body, not from an annotation.
    pub fn needs_inference(&self) -> bool {
        self.kind == MethodKind::Def && !self.has_return_annotation
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct IvarInfo {
    pub ty: TypeId,
    /// Written with an annotation (`@name: T` or a typed attr).
    pub declared: bool,
    pub site: DeclSite,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassInfo {
    /// Fully qualified (`Admin::User`).
    pub name: Atom,
    pub kind: ClassKind,
    pub type_params: Vec<Atom>,
    /// Superclass instance type, written in terms of `type_params`.
    pub superclass: Option<TypeId>,
    pub includes: Vec<TypeId>,
    pub extends: Vec<TypeId>,
    pub instance_methods: FxIndexMap<Atom, MethodId>,
    pub singleton_methods: FxIndexMap<Atom, MethodId>,
    pub ivars: FxIndexMap<Atom, IvarInfo>,
    /// Every `class`/`module` block that opened this declaration.
    pub sites: Vec<DeclSite>,
}

impl ClassInfo {
    pub fn is_module(&self) -> bool {
        self.kind == ClassKind::Module
    }

    /// The instance type with the class's own parameters as arguments.
    pub fn self_type(&self, interner: &TypeInterner) -> TypeId {
        let args = self
            .type_params
            .iter()
            .map(|&param| interner.type_param(param))
            .collect();
        interner.instance(self.name, args)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct InterfaceInfo {
    pub name: Atom,
    pub members: FxIndexMap<Atom, MethodId>,
    pub site: DeclSite,
}

#[derive(Clone, Debug, Serialize)]
pub struct AliasInfo {
    pub name: Atom,
    pub ty: TypeId,
    pub site: DeclSite,
}

/// `NAME = value`. The value's type is inferred by the checker.
#[derive(Clone, Debug, Serialize)]
pub struct ConstantInfo {
    /// Fully qualified.
    pub name: Atom,
    pub value: NodeIndex,
    pub site: DeclSite,
}

/// What one file contributes to and needs from the program, for cache
/// invalidation.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FileDeclarations {
    /// Names of classes, modules, aliases, interfaces, top-level methods and
    /// constants the file declares.
    pub declared: Vec<String>,
    /// Type, constant and method names the file mentions.
    pub referenced: Vec<String>,
    /// Hash of every signature the file declares. Equal hashes mean other
    /// files see the same declarations.
    pub surface_hash: u64,
}

/// A method found on a receiver type.
#[derive(Clone, Debug)]
pub struct MethodLookup {
    pub id: MethodId,
    /// Class or module the method was found in.
    pub owner: Atom,
    /// Signature with the owner's type parameters and `self` substituted.
    pub signature: TypeId,
    /// Maps the owner's type parameters to the receiver's arguments. Apply
    /// it to an inferred return type.
    pub substitution: TypeSubstitution,
}

// =============================================================================
// DeclarationTable
// =============================================================================

/// All declarations of a program, resolved and read-only.
pub struct DeclarationTable {
    pub(crate) interner: Arc<TypeInterner>,
    pub(crate) files: Vec<Arc<ParsedFile>>,
    pub(crate) aliases: FxIndexMap<Atom, AliasInfo>,
    pub(crate) interfaces: FxIndexMap<Atom, InterfaceInfo>,
    pub(crate) classes: FxIndexMap<Atom, ClassInfo>,
    pub(crate) functions: FxIndexMap<Atom, MethodId>,
    pub(crate) constants: FxIndexMap<Atom, ConstantId>,
    pub(crate) constant_infos: Vec<ConstantInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) method_nodes: FxHashMap<(FileId, NodeIndex), MethodId>,
    pub(crate) file_declarations: Vec<FileDeclarations>,
}

impl DeclarationTable {
    pub fn interner(&self) -> &Arc<TypeInterner> {
        &self.interner
    }

    // =========================================================================
    // Files
    // =========================================================================

    pub fn file(&self, id: FileId) -> Option<&Arc<ParsedFile>> {
        self.files.get(id.0 as usize)
    }

    pub fn file_name(&self, id: FileId) -> &str {
        self.file(id)
            .map_or(PRELUDE_FILE_NAME, |file| file.file_name.as_str())
    }

    pub fn file_declarations(&self, id: FileId) -> Option<&FileDeclarations> {
        self.file_declarations.get(id.0 as usize)
    }

    // =========================================================================
    // Declarations by name
    // =========================================================================

    pub fn class(&self, name: Atom) -> Option<&ClassInfo> {
        self.classes.get(&name)
    }

    pub fn class_named(&self, name: &str) -> Option<&ClassInfo> {
        self.class(self.interner.intern_string(name))
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    pub fn interface(&self, name: Atom) -> Option<&InterfaceInfo> {
        self.interfaces.get(&name)
    }

    pub fn alias(&self, name: Atom) -> Option<&AliasInfo> {
        self.aliases.get(&name)
    }

    pub fn method(&self, id: MethodId) -> Option<&MethodInfo> {
        self.methods.get(id.0 as usize)
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &MethodInfo)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, info)| (MethodId(i as u32), info))
    }

    /// The method declared by a `def` (or accessor) node.
    pub fn method_for_node(&self, file: FileId, node: NodeIndex) -> Option<MethodId> {
        self.method_nodes.get(&(file, node)).copied()
    }

    /// A top-level method.
    pub fn function(&self, name: Atom) -> Option<MethodId> {
        self.functions.get(&name).copied()
    }

    pub fn constant(&self, id: ConstantId) -> Option<&ConstantInfo> {
        self.constant_infos.get(id.0 as usize)
    }

    /// Resolve a constant reference written inside `namespace`: a class or
    /// module yields `Ok(class name)`, a value constant `Err(id)`.
    pub fn lookup_constant(&self, path: &str, namespace: &str) -> Option<Result<Atom, ConstantId>> {
        for candidate in namespace_candidates(path, namespace) {
            let atom = self.interner.intern_string(&candidate);
            if self.classes.contains_key(&atom) {
                return Some(Ok(atom));
            }
            if let Some(&id) = self.constants.get(&atom) {
                return Some(Err(id));
            }
        }
        None
    }

    /// Qualified name of the class a `class`/`module` header declares.
    pub fn qualify(namespace: &str, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix("::") {
            absolute.to_string()
        } else if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}::{name}")
        }
    }

    /// Resolve an annotation written inside a method body or block.
    pub fn resolve_type_expr(&self, expr: &TypeExpr, scope: &TypeScope<'_>) -> Result<TypeId, ResolveError> {
        resolve_type_expr(&mut FrozenLookup(self), expr, scope)
    }

    /// Type of instance variable `name` on `class`, searching superclasses.
    pub fn ivar(&self, class: Atom, name: Atom) -> Option<&IvarInfo> {
        let mut current = Some(class);
        for _ in 0..MAX_CLASS_CHAIN_DEPTH {
            let info = self.classes.get(&current?)?;
            if let Some(ivar) = info.ivars.get(&name) {
                return Some(ivar);
            }
            current = info
                .superclass
                .and_then(|sup| self.class_and_args(sup))
                .map(|(name, _)| name);
        }
        None
    }

    // =========================================================================
    // Method lookup
    // =========================================================================

    /// `(class name, type arguments)` whose methods apply to values of `ty`.
    ///
    /// Records use `Hash<Symbol, V>` with `V` the union of field types.
    pub fn class_and_args(&self, ty: TypeId) -> Option<(Atom, Vec<TypeId>)> {
        let interner = &*self.interner;
        match interner.lookup(ty)? {
            TypeKey::Intrinsic(kind) => Some((interner.intern_string(kind.class_name()?), Vec::new())),
            TypeKey::Literal(value) => self.class_and_args(value.primitive()),
            TypeKey::Instance(name, args) => Some((name, args)),
            TypeKey::Record(fields) => {
                let value = interner.union(fields.iter().map(|f| f.ty).collect());
                Some((interner.intern_string("Hash"), vec![TypeId::SYMBOL, value]))
            }
            TypeKey::Function(_) => Some((interner.intern_string("Proc"), Vec::new())),
            TypeKey::Singleton(_) => Some((interner.intern_string("Class"), Vec::new())),
            _ => None,
        }
    }

    /// Method resolution order for instances of `class`: the class, its
    /// included modules (last included first), then the superclass chain
    /// likewise. `Object`'s ancestors are appended for modules and for
    /// classes that do not reach `Object`.
    fn method_chain(&self, class: Atom, args: &[TypeId]) -> Vec<TypeId> {
        let interner = &*self.interner;
        let mut chain = vec![interner.instance(class, args.to_vec())];
        chain.extend(self.ancestors(class, args));
        let object = interner.intern_string("Object");
        let reaches_object = class == object
            || chain
                .iter()
                .any(|&ty| self.class_and_args(ty).is_some_and(|(name, _)| name == object));
        if !reaches_object && self.classes.contains_key(&object) {
            chain.push(interner.instance(object, Vec::new()));
            chain.extend(self.ancestors(object, &[]));
        }
        chain
    }

    /// Find instance method `name` on instances of `class<args>`; `self` in
    /// the signature becomes `self_type`.
    pub fn lookup_method_in_class(
        &self,
        class: Atom,
        args: &[TypeId],
        name: Atom,
        self_type: TypeId,
    ) -> Option<MethodLookup> {
        for ty in self.method_chain(class, args) {
            let Some((owner, owner_args)) = self.class_and_args(ty) else {
                continue;
            };
            let Some(info) = self.classes.get(&owner) else {
                continue;
            };
            if let Some(&id) = info.instance_methods.get(&name) {
                return Some(self.make_lookup(id, owner, &info.type_params, &owner_args, self_type));
            }
        }
        None
    }

    /// Find a method callable on a value of type `receiver`.
    ///
    /// Interfaces answer with their members, class objects with singleton
    /// methods, everything else through its class. Unions, type parameters
    /// and `Any` have no single answer and return `None`.
    pub fn lookup_instance_method(&self, receiver: TypeId, name: Atom) -> Option<MethodLookup> {
        match self.interner.lookup(receiver)? {
            TypeKey::Interface(interface) => {
                let info = self.interfaces.get(&interface)?;
                let id = *info.members.get(&name)?;
                let subst = TypeSubstitution::new().with_self(receiver);
                let method = self.method(id)?;
                Some(MethodLookup {
                    id,
                    owner: interface,
                    signature: instantiate_type(&self.interner, method.signature, &subst),
                    substitution: subst,
                })
            }
            TypeKey::Singleton(class) => self.lookup_singleton_method(class, name),
            _ => {
                let (class, args) = self.class_and_args(receiver)?;
                self.lookup_method_in_class(class, &args, name, receiver)
            }
        }
    }

    /// Find `Class.name`: singleton methods up the superclass chain, then
    /// methods of extended modules, then instance methods of `Class` (or
    /// `Module`).
    pub fn lookup_singleton_method(&self, class: Atom, name: Atom) -> Option<MethodLookup> {
        let interner = &*self.interner;
        let receiver = interner.singleton(class);
        let mut current = Some(class);
        let mut seen: FxHashSet<Atom> = FxHashSet::default();
        while let Some(name_now) = current {
            if !seen.insert(name_now) || seen.len() > MAX_CLASS_CHAIN_DEPTH as usize {
                break;
            }
            let Some(info) = self.classes.get(&name_now) else {
                break;
            };
            if let Some(&id) = info.singleton_methods.get(&name) {
                return Some(self.make_lookup(id, name_now, &[], &[], receiver));
            }
            for &extended in info.extends.iter().rev() {
                if let Some((module, args)) = self.class_and_args(extended) {
                    if let Some(found) = self.lookup_module_method(module, &args, name, receiver) {
                        return Some(found);
                    }
                }
            }
            current = info
                .superclass
                .and_then(|sup| self.class_and_args(sup))
                .map(|(sup, _)| sup);
        }
        let meta = match self.classes.get(&class) {
            Some(info) if info.is_module() => "Module",
            _ => "Class",
        };
        let meta = interner.intern_string(meta);
        self.lookup_method_in_class(meta, &[], name, receiver)
    }

    /// Instance methods of a module and the modules it includes, without the
    /// `Object` fallback.
    fn lookup_module_method(
        &self,
        module: Atom,
        args: &[TypeId],
        name: Atom,
        self_type: TypeId,
    ) -> Option<MethodLookup> {
        let mut chain = vec![self.interner.instance(module, args.to_vec())];
        chain.extend(self.ancestors(module, args));
        for ty in chain {
            let (owner, owner_args) = self.class_and_args(ty)?;
            let info = self.classes.get(&owner)?;
            if let Some(&id) = info.instance_methods.get(&name) {
                return Some(self.make_lookup(id, owner, &info.type_params, &owner_args, self_type));
            }
        }
        None
    }

    fn make_lookup(
        &self,
        id: MethodId,
        owner: Atom,
        params: &[Atom],
        args: &[TypeId],
        self_type: TypeId,
    ) -> MethodLookup {
        let substitution = TypeSubstitution::from_args(params, args).with_self(self_type);
        let signature = self
            .method(id)
            .map_or(TypeId::ANY, |m| instantiate_type(&self.interner, m.signature, &substitution));
        MethodLookup {
            id,
            owner,
            signature,
            substitution,
        }
    }

    /// Parameters and return type of a resolved signature.
    pub fn signature_shape(&self, signature: TypeId) -> Option<Arc<FunctionShape>> {
        function_shape_of(&self.interner, signature)
    }

    fn push_module_ancestors(
        &self,
        module: TypeId,
        out: &mut Vec<TypeId>,
        seen: &mut FxHashSet<Atom>,
    ) {
        let Some((name, args)) = self.class_and_args(module) else {
            return;
        };
        if !seen.insert(name) {
            return;
        }
        out.push(module);
        let Some(info) = self.classes.get(&name) else {
            return;
        };
        let subst = TypeSubstitution::from_args(&info.type_params, &args);
        for &included in info.includes.iter().rev() {
            let included = instantiate_type(&self.interner, included, &subst);
            self.push_module_ancestors(included, out, seen);
        }
    }
}

impl TypeResolver for DeclarationTable {
    fn ancestors(&self, class: Atom, args: &[TypeId]) -> Vec<TypeId> {
        let interner = &*self.interner;
        let mut out = Vec::new();
        let mut seen: FxHashSet<Atom> = FxHashSet::default();
        seen.insert(class);
        let mut current: (Atom, Vec<TypeId>) = (class, args.to_vec());
        for _ in 0..MAX_CLASS_CHAIN_DEPTH {
            let Some(info) = self.classes.get(&current.0) else {
                break;
            };
            let subst = TypeSubstitution::from_args(&info.type_params, &current.1);
            for &included in info.includes.iter().rev() {
                let included = instantiate_type(interner, included, &subst);
                self.push_module_ancestors(included, &mut out, &mut seen);
            }
            let Some(superclass) = info.superclass else {
                break;
            };
            let superclass = instantiate_type(interner, superclass, &subst);
            let Some(next) = self.class_and_args(superclass) else {
                break;
            };
            if !seen.insert(next.0) {
                break;
            }
            out.push(superclass);
            current = next;
        }
        out
    }

    fn interface_members(&self, name: Atom) -> Vec<(Atom, TypeId)> {
        let Some(info) = self.interfaces.get(&name) else {
            return Vec::new();
        };
        info.members
            .iter()
            .filter_map(|(&member, &id)| Some((member, self.method(id)?.signature)))
            .collect()
    }

    fn find_method(&self, receiver: TypeId, name: Atom) -> Option<TypeId> {
        self.lookup_instance_method(receiver, name)
            .map(|found| found.signature)
    }
}

/// Name lookup over a finished table: aliases are already resolved.
struct FrozenLookup<'a>(&'a DeclarationTable);

impl NameLookup for FrozenLookup<'_> {
    fn interner(&self) -> &TypeInterner {
        &self.0.interner
    }

    fn lookup_type_name(&mut self, name: &str, namespace: &str) -> NameBinding {
        let table = self.0;
        let candidates: SmallVec<[String; 4]> = namespace_candidates(name, namespace);
        for candidate in candidates {
            let atom = table.interner.intern_string(&candidate);
            if let Some(alias) = table.aliases.get(&atom) {
                return NameBinding::Type(alias.ty);
            }
            if table.interfaces.contains_key(&atom) {
                return NameBinding::Interface(atom);
            }
            if let Some(class) = table.classes.get(&atom) {
                return NameBinding::Class {
                    name: atom,
                    arity: class.type_params.len(),
                };
            }
        }
        NameBinding::Unknown
    }
}

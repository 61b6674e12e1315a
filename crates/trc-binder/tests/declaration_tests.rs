use std::sync::Arc;

use trc_binder::{BindResult, ClassKind, FileId, MethodKind, bind_program};
use trc_common::diagnostics::diagnostic_codes;
use trc_parser::{ParseOptions, Visibility, parse_source};
use trc_solver::{TypeId, TypeInterner, TypeResolver, format_type, is_subtype_of};

fn bind(sources: &[(&str, &str)]) -> BindResult {
    let interner = Arc::new(TypeInterner::new());
    let files: Vec<_> = sources
        .iter()
        .map(|(name, source)| Arc::new(parse_source(name, source, ParseOptions::default())))
        .collect();
    for file in &files {
        assert!(file.diagnostics.is_empty(), "syntax errors: {:?}", file.diagnostics);
    }
    bind_program(interner, &files)
}

fn bind_one(source: &str) -> BindResult {
    bind(&[("main.trb", source)])
}

fn codes(result: &BindResult) -> Vec<u32> {
    result.diagnostics.iter().map(|d| d.code).collect()
}

fn alias_type(result: &BindResult, name: &str) -> TypeId {
    let table = &result.table;
    let atom = table.interner().intern_string(name);
    table.alias(atom).expect("alias").ty
}

fn method_signature(result: &BindResult, receiver: TypeId, name: &str) -> String {
    let table = &result.table;
    let atom = table.interner().intern_string(name);
    let found = table
        .lookup_instance_method(receiver, atom)
        .unwrap_or_else(|| panic!("method {name} not found"));
    format_type(table.interner(), found.signature)
}

#[test]
fn prelude_binds_without_diagnostics() {
    let result = bind(&[]);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let string = result.table.class_named("String").expect("String");
    assert_eq!(string.kind, ClassKind::Class);
    assert!(result.table.class_named("Kernel").is_some_and(|k| k.is_module()));
}

#[test]
fn alias_resolves_to_its_target() {
    let result = bind_one("type UserId = Integer\ntype Name = String?\n");
    assert!(result.diagnostics.is_empty());
    assert_eq!(alias_type(&result, "UserId"), TypeId::INTEGER);
    let interner = result.table.interner();
    assert_eq!(alias_type(&result, "Name"), interner.optional(TypeId::STRING));
}

#[test]
fn alias_may_refer_to_a_later_alias() {
    let result = bind_one("type A = Array<B>\ntype B = Integer\n");
    assert!(result.diagnostics.is_empty());
    let interner = result.table.interner();
    assert_eq!(alias_type(&result, "A"), interner.array(TypeId::INTEGER));
}

#[test]
fn unknown_type_name_is_reported() {
    let result = bind_one("def greet(name: Strng): String\n  \"hi\"\nend\n");
    assert_eq!(codes(&result), vec![diagnostic_codes::CANNOT_FIND_TYPE]);
    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.file, "main.trb");
    assert_eq!(diagnostic.line, 1);
    assert!(diagnostic.message_text.contains("Strng"));
}

#[test]
fn every_alias_on_a_cycle_is_reported() {
    let result = bind_one("type A = B?\ntype B = A | String\n");
    assert_eq!(
        codes(&result),
        vec![
            diagnostic_codes::TYPE_ALIAS_CIRCULARLY_REFERENCES_ITSELF,
            diagnostic_codes::TYPE_ALIAS_CIRCULARLY_REFERENCES_ITSELF,
        ]
    );
    let lines: Vec<u32> = result.diagnostics.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![1, 2]);
    assert_eq!(alias_type(&result, "A"), TypeId::ANY);
    assert_eq!(alias_type(&result, "B"), TypeId::ANY);
}

#[test]
fn aliases_depending_on_a_cycle_degrade_silently() {
    let result = bind_one("type A = B\ntype B = A\ntype C = A | Integer\n");
    assert_eq!(result.diagnostics.len(), 2);
    assert_eq!(alias_type(&result, "C"), TypeId::ANY);
}

#[test]
fn duplicate_alias_is_reported() {
    let result = bind_one("type Id = Integer\ntype Id = String\n");
    assert_eq!(codes(&result), vec![diagnostic_codes::DUPLICATE_DECLARATION]);
    assert_eq!(result.diagnostics[0].line, 2);
    assert_eq!(alias_type(&result, "Id"), TypeId::INTEGER);
}

#[test]
fn class_clashing_with_alias_is_reported() {
    let result = bind_one("type User = String\nclass User\nend\n");
    assert_eq!(codes(&result), vec![diagnostic_codes::DUPLICATE_DECLARATION]);
}

#[test]
fn wrong_type_argument_count_is_reported() {
    let result = bind_one("def keys(map: Hash<String>): Integer\n  0\nend\n");
    assert_eq!(codes(&result), vec![diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS]);
    assert!(result.diagnostics[0].message_text.contains("expects 2"));
}

#[test]
fn bare_generic_class_gets_untyped_arguments() {
    let result = bind_one("type Items = Array\n");
    assert!(result.diagnostics.is_empty());
    let interner = result.table.interner();
    assert_eq!(alias_type(&result, "Items"), interner.array(TypeId::ANY));
}

#[test]
fn reopened_class_merges_methods() {
    let result = bind(&[
        ("a.trb", "class Point\n  def x: Integer\n    0\n  end\nend\n"),
        ("b.trb", "class Point\n  def y: Integer\n    0\n  end\nend\n"),
    ]);
    assert!(result.diagnostics.is_empty());
    let point = result.table.class_named("Point").expect("Point");
    assert_eq!(point.sites.len(), 2);
    assert_eq!(point.instance_methods.len(), 2);
    assert_eq!(point.sites[1].file, FileId::input(1));
}

#[test]
fn method_found_through_superclass_and_object() {
    let source = "class Animal\n  def speak: String\n    \"...\"\n  end\nend\n\nclass Dog < Animal\nend\n";
    let result = bind_one(source);
    assert!(result.diagnostics.is_empty());
    let table = &result.table;
    let interner = table.interner();
    let dog = interner.instance_named("Dog", Vec::new());
    let speak = interner.intern_string("speak");
    let found = table.lookup_instance_method(dog, speak).expect("speak");
    assert_eq!(&*interner.resolve_atom(found.owner), "Animal");

    let to_s = interner.intern_string("to_s");
    let found = table.lookup_instance_method(dog, to_s).expect("to_s");
    assert_eq!(&*interner.resolve_atom(found.owner), "Object");

    let animal = interner.instance_named("Animal", Vec::new());
    assert!(is_subtype_of(interner, &**table, dog, animal));
    assert!(!is_subtype_of(interner, &**table, animal, dog));
}

#[test]
fn kernel_methods_are_private() {
    let result = bind_one("class Job\nend\n");
    let table = &result.table;
    let interner = table.interner();
    let job = interner.instance_named("Job", Vec::new());
    let puts = interner.intern_string("puts");
    let found = table.lookup_instance_method(job, puts).expect("puts");
    assert_eq!(&*interner.resolve_atom(found.owner), "Kernel");
    let method = table.method(found.id).expect("method");
    assert_eq!(method.visibility, Visibility::Private);
}

#[test]
fn included_module_is_an_ancestor() {
    let source = "module Greeting\n  def hello: String\n    \"hi\"\n  end\nend\n\nclass Person\n  include Greeting\nend\n";
    let result = bind_one(source);
    assert!(result.diagnostics.is_empty());
    let table = &result.table;
    let interner = table.interner();
    let person = interner.instance_named("Person", Vec::new());
    let greeting = interner.instance_named("Greeting", Vec::new());
    let person_atom = interner.intern_string("Person");
    assert!(table.ancestors(person_atom, &[]).contains(&greeting));
    assert!(is_subtype_of(interner, &**table, person, greeting));
    assert_eq!(method_signature(&result, person, "hello"), "Proc<String>");
}

#[test]
fn generic_class_methods_are_instantiated() {
    let source = "class Box<T>\n  attr_reader :value: T\n\n  def initialize(value: T)\n    @value = value\n  end\n\n  def get: T\n    @value\n  end\nend\n";
    let result = bind_one(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let table = &result.table;
    let interner = table.interner();
    let boxed = interner.instance_named("Box", vec![TypeId::INTEGER]);
    assert_eq!(method_signature(&result, boxed, "get"), "Proc<Integer>");
    assert_eq!(method_signature(&result, boxed, "value"), "Proc<Integer>");

    let class = table.class_named("Box").expect("Box");
    let ivar = interner.intern_string("@value");
    let info = class.ivars.get(&ivar).expect("@value");
    assert!(info.declared);
}

#[test]
fn prelude_generics_flow_through_lookup() {
    let result = bind(&[]);
    let interner = result.table.interner();
    let strings = interner.array(TypeId::STRING);
    assert_eq!(method_signature(&result, strings, "first"), "Proc<String?>");
}

#[test]
fn attribute_accessors_become_methods() {
    let source = "class User\n  attr_accessor :name: String\n  attr_reader :age\nend\n";
    let result = bind_one(source);
    assert!(result.diagnostics.is_empty());
    let table = &result.table;
    let interner = table.interner();
    let user = table.class_named("User").expect("User");
    let name = interner.intern_string("name");
    let setter = interner.intern_string("name=");
    let age = interner.intern_string("age");
    let reader = table.method(user.instance_methods[&name]).expect("reader");
    assert_eq!(reader.kind, MethodKind::AttrReader);
    let writer = table.method(user.instance_methods[&setter]).expect("writer");
    assert_eq!(writer.kind, MethodKind::AttrWriter);
    assert_eq!(format_type(interner, writer.signature), "(String) -> String");
    let untyped = table.method(user.instance_methods[&age]).expect("age");
    assert_eq!(format_type(interner, untyped.signature), "Proc<untyped>");
    let ivar = user.ivars.get(&interner.intern_string("@age")).expect("@age");
    assert!(!ivar.declared);
}

#[test]
fn singleton_methods_and_extended_modules() {
    let source = "module Loader\n  def load_all: Integer\n    0\n  end\nend\n\nclass Config\n  extend Loader\n\n  def self.load(path: String): Config\n    Config.new\n  end\nend\n";
    let result = bind_one(source);
    assert!(result.diagnostics.is_empty());
    let table = &result.table;
    let interner = table.interner();
    let config = interner.intern_string("Config");
    let load = interner.intern_string("load");
    let found = table.lookup_singleton_method(config, load).expect("load");
    assert_eq!(&*interner.resolve_atom(found.owner), "Config");
    let load_all = interner.intern_string("load_all");
    let found = table.lookup_singleton_method(config, load_all).expect("load_all");
    assert_eq!(&*interner.resolve_atom(found.owner), "Loader");
    let name = interner.intern_string("name");
    let found = table.lookup_singleton_method(config, name).expect("Module#name");
    assert_eq!(&*interner.resolve_atom(found.owner), "Module");
}

#[test]
fn nested_names_resolve_innermost_first() {
    let source = "module Admin\n  class User\n  end\n\n  type Account = User\nend\n\nclass User\nend\n\ntype Plain = User\n";
    let result = bind_one(source);
    assert!(result.diagnostics.is_empty());
    let interner = result.table.interner();
    assert_eq!(alias_type(&result, "Admin::Account"), interner.instance_named("Admin::User", Vec::new()));
    assert_eq!(alias_type(&result, "Plain"), interner.instance_named("User", Vec::new()));
}

#[test]
fn private_symbol_call_changes_visibility() {
    let source = "class Vault\n  def secret: String\n    \"x\"\n  end\n  private :secret\nend\n";
    let result = bind_one(source);
    let table = &result.table;
    let vault = table.class_named("Vault").expect("Vault");
    let secret = table.interner().intern_string("secret");
    let method = table.method(vault.instance_methods[&secret]).expect("secret");
    assert_eq!(method.visibility, Visibility::Private);
}

#[test]
fn private_section_applies_to_later_defs() {
    let source = "class Vault\n  def open: Boolean\n    true\n  end\n\n  private\n\n  def combination: Integer\n    42\n  end\nend\n";
    let result = bind_one(source);
    let table = &result.table;
    let vault = table.class_named("Vault").expect("Vault");
    let interner = table.interner();
    let open = table.method(vault.instance_methods[&interner.intern_string("open")]).expect("open");
    let combination = table
        .method(vault.instance_methods[&interner.intern_string("combination")])
        .expect("combination");
    assert_eq!(open.visibility, Visibility::Public);
    assert_eq!(combination.visibility, Visibility::Private);
}

#[test]
fn conflicting_intersection_members_are_reported() {
    let source = "interface Named\n  def name: String\nend\n\ninterface Numbered\n  def name: Integer\nend\n\ntype Both = Named & Numbered\n";
    let result = bind_one(source);
    assert_eq!(codes(&result), vec![diagnostic_codes::CONFLICTING_INTERSECTION_MEMBER]);
    assert_eq!(result.diagnostics[0].line, 9);
}

#[test]
fn compatible_intersection_members_are_accepted() {
    let source = "interface Named\n  def name: String\nend\n\ninterface Labelled\n  def name: String\n  def label: String\nend\n\ntype Both = Named & Labelled\n";
    let result = bind_one(source);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn unannotated_method_needs_inference() {
    let result = bind_one("def add(a: Integer, b: Integer)\n  a + b\nend\n");
    let table = &result.table;
    let add = table.interner().intern_string("add");
    let method = table.method(table.function(add).expect("add")).expect("method");
    assert!(method.needs_inference());
    assert_eq!(format_type(table.interner(), method.signature), "(Integer, Integer) -> untyped");
}

#[test]
fn method_nodes_map_back_to_declarations() {
    let result = bind_one("def one: Integer\n  1\nend\n");
    let table = &result.table;
    let file = table.file(FileId::input(0)).expect("file");
    let node = file.statements()[0];
    let id = table.method_for_node(FileId::input(0), node).expect("method id");
    let method = table.method(id).expect("method");
    assert_eq!(&*table.interner().resolve_atom(method.name), "one");
    assert!(method.owner.is_none());
}

#[test]
fn file_declarations_track_names_and_surface() {
    let first = bind(&[
        ("user.trb", "class User\n  def name: String\n    \"a\"\n  end\nend\n"),
        ("app.trb", "u: User = User.new\nputs u.name\n"),
    ]);
    let table = &first.table;
    let user = table.file_declarations(FileId::input(0)).expect("user.trb");
    assert_eq!(user.declared, vec!["User".to_string()]);
    let app = table.file_declarations(FileId::input(1)).expect("app.trb");
    assert!(app.referenced.contains(&"User".to_string()));
    assert!(app.referenced.contains(&"name".to_string()));

    // A body-only edit keeps the surface; a signature edit changes it.
    let body_edit = bind(&[("user.trb", "class User\n  def name: String\n    \"b\"\n  end\nend\n")]);
    let signature_edit = bind(&[("user.trb", "class User\n  def name: Symbol\n    :b\n  end\nend\n")]);
    let hash = |result: &BindResult| {
        result
            .table
            .file_declarations(FileId::input(0))
            .expect("user.trb")
            .surface_hash
    };
    assert_eq!(hash(&first), hash(&body_edit));
    assert_ne!(hash(&first), hash(&signature_edit));
}

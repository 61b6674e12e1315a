use std::sync::Arc;

use trc_binder::{MethodKind, PRELUDE_FILE_NAME, bind_program, prelude_file};
use trc_solver::{TypeId, TypeInterner, TypeResolver, format_type, is_subtype_of};

#[test]
fn prelude_parses_cleanly() {
    let prelude = prelude_file();
    assert_eq!(prelude.file_name, PRELUDE_FILE_NAME);
    assert!(prelude.diagnostics.is_empty(), "{:?}", prelude.diagnostics);
    assert!(!prelude.statements().is_empty());
}

#[test]
fn prelude_is_shared() {
    assert!(Arc::ptr_eq(&prelude_file(), &prelude_file()));
}

#[test]
fn prelude_declares_core_hierarchy() {
    let result = bind_program(Arc::new(TypeInterner::new()), &[]);
    let table = &result.table;
    let interner = table.interner();

    for name in ["BasicObject", "Object", "Kernel", "String", "Integer", "Float", "Array", "Hash", "Range"] {
        assert!(table.class_named(name).is_some(), "missing {name}");
    }
    let numeric = interner.instance_named("Numeric", Vec::new());
    let comparable = interner.instance_named("Comparable", Vec::new());
    assert!(is_subtype_of(interner, &**table, TypeId::INTEGER, numeric));
    assert!(is_subtype_of(interner, &**table, TypeId::FLOAT, comparable));
    assert!(!is_subtype_of(interner, &**table, TypeId::STRING, numeric));

    let standard = interner.instance_named("StandardError", Vec::new());
    let key_error = interner.intern_string("KeyError");
    assert!(table.ancestors(key_error, &[]).contains(&standard));
}

#[test]
fn prelude_methods_are_signatures() {
    let result = bind_program(Arc::new(TypeInterner::new()), &[]);
    let table = &result.table;
    let interner = table.interner();
    let length = interner.intern_string("length");
    let found = table
        .lookup_instance_method(TypeId::STRING, length)
        .expect("String#length");
    let method = table.method(found.id).expect("method");
    assert_eq!(method.kind, MethodKind::Signature);
    assert!(!method.needs_inference());
    assert_eq!(format_type(interner, found.signature), "Proc<Integer>");
}

#[test]
fn hash_index_returns_value_type() {
    let result = bind_program(Arc::new(TypeInterner::new()), &[]);
    let table = &result.table;
    let interner = table.interner();
    let scores = interner.hash(TypeId::STRING, TypeId::INTEGER);
    let index = interner.intern_string("[]");
    let found = table.lookup_instance_method(scores, index).expect("Hash#[]");
    assert_eq!(format_type(interner, found.signature), "(String) -> Integer");
}

#[test]
fn math_functions_are_singleton_methods() {
    let result = bind_program(Arc::new(TypeInterner::new()), &[]);
    let table = &result.table;
    let interner = table.interner();
    let math = interner.intern_string("Math");
    let sqrt = interner.intern_string("sqrt");
    let found = table.lookup_singleton_method(math, sqrt).expect("Math.sqrt");
    let shape = table.signature_shape(found.signature).expect("shape");
    assert_eq!(shape.return_type, TypeId::FLOAT);
}

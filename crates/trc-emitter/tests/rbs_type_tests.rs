use super::*;
use trc_solver::types::{ParamInfo, RecordField};

fn print(interner: &TypeInterner, ty: TypeId) -> String {
    RbsTypePrinter::new(interner).print(ty)
}

#[test]
fn intrinsics_use_rbs_names() {
    let interner = TypeInterner::new();
    assert_eq!(print(&interner, TypeId::ANY), "untyped");
    assert_eq!(print(&interner, TypeId::BOOLEAN), "bool");
    assert_eq!(print(&interner, TypeId::NEVER), "bot");
    assert_eq!(print(&interner, TypeId::VOID), "void");
    assert_eq!(print(&interner, TypeId::SELF), "self");
}

#[test]
fn optionals_and_unions() {
    let interner = TypeInterner::new();
    let optional = interner.optional(TypeId::STRING);
    assert_eq!(print(&interner, optional), "String?");

    let either = interner.union(vec![TypeId::STRING, TypeId::INTEGER]);
    assert_eq!(print(&interner, either), "String | Integer");

    let optional_either = interner.union(vec![TypeId::INTEGER, TypeId::NIL, TypeId::STRING]);
    assert_eq!(print(&interner, optional_either), "(String | Integer)?");
}

#[test]
fn generic_instances_use_brackets() {
    let interner = TypeInterner::new();
    let list = interner.array(TypeId::STRING);
    assert_eq!(print(&interner, list), "Array[String]");
    let map = interner.hash(TypeId::SYMBOL, interner.optional(TypeId::INTEGER));
    assert_eq!(print(&interner, map), "Hash[Symbol, Integer?]");
}

#[test]
fn literals_and_records() {
    let interner = TypeInterner::new();
    assert_eq!(print(&interner, interner.literal_symbol("ok")), ":ok");
    assert_eq!(print(&interner, interner.literal_integer(42)), "42");

    let record = interner.record(vec![
        RecordField {
            name: interner.intern_string("id"),
            ty: TypeId::INTEGER,
            optional: false,
        },
        RecordField {
            name: interner.intern_string("label"),
            ty: TypeId::STRING,
            optional: true,
        },
    ]);
    assert_eq!(print(&interner, record), "{ id: Integer, ?label: String }");
}

#[test]
fn proc_types_print_as_function_literals() {
    let interner = TypeInterner::new();
    let mapper = interner.proc_type(vec![TypeId::INTEGER], TypeId::STRING);
    assert_eq!(print(&interner, mapper), "^(Integer) -> String");
}

#[test]
fn method_signature_with_every_parameter_kind() {
    let interner = TypeInterner::new();
    let name = |text: &str| Some(interner.intern_string(text));
    let shape = FunctionShape {
        type_params: Vec::new(),
        params: vec![
            ParamInfo {
                name: name("a"),
                ty: TypeId::INTEGER,
                kind: ParamKind::Required,
            },
            ParamInfo {
                name: name("b"),
                ty: TypeId::STRING,
                kind: ParamKind::Optional,
            },
            ParamInfo {
                name: name("rest"),
                ty: TypeId::SYMBOL,
                kind: ParamKind::Rest,
            },
            ParamInfo {
                name: name("key"),
                ty: TypeId::STRING,
                kind: ParamKind::Keyword,
            },
            ParamInfo {
                name: name("limit"),
                ty: TypeId::INTEGER,
                kind: ParamKind::OptionalKeyword,
            },
        ],
        return_type: TypeId::BOOLEAN,
        block: Some(interner.proc_type(vec![TypeId::INTEGER], TypeId::VOID)),
    };
    let text = RbsTypePrinter::new(&interner).print_function(&shape, true);
    assert_eq!(
        text,
        "(Integer a, ?String b, *Symbol rest, key: String, ?limit: Integer) { (Integer) -> void } -> bool"
    );
}

#[test]
fn union_return_is_parenthesized() {
    let interner = TypeInterner::new();
    let shape = FunctionShape::new(Vec::new(), interner.union(vec![TypeId::STRING, TypeId::INTEGER]));
    let text = RbsTypePrinter::new(&interner).print_function(&shape, true);
    assert_eq!(text, "() -> (String | Integer)");
}

#[test]
fn interface_and_alias_names() {
    assert_eq!(interface_name("Greeter"), "_Greeter");
    assert_eq!(interface_name("Admin::Greeter"), "Admin::_Greeter");
    assert_eq!(alias_name("UserId"), "user_id");
    assert_eq!(alias_name("Point3D"), "point3_d");
}

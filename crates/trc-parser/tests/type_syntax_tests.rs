use super::*;
use trc_common::diagnostics::diagnostic_codes;

/// Parse `x: <annotation> = nil` and return the annotation.
fn annotation(source_type: &str) -> TypeExpr {
    let source = format!("x: {source_type} = nil\n");
    let file = parse_source("types.trb", &source, ParseOptions::default());
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    match file.arena.kind(file.statements()[0]) {
        Some(NodeKind::TypedLocal { ty, .. }) => ty.clone(),
        other => panic!("expected typed local, got {other:?}"),
    }
}

fn name_of(ty: &TypeExpr) -> &str {
    match &ty.kind {
        TypeExprKind::Name { name, .. } => name,
        other => panic!("expected a named type, got {other:?}"),
    }
}

fn codes(source: &str) -> Vec<u32> {
    parse_source("types.trb", source, ParseOptions::default())
        .diagnostics
        .iter()
        .map(|d| d.code)
        .collect()
}

#[test]
fn optional_suffix() {
    let ty = annotation("String?");
    match &ty.kind {
        TypeExprKind::Optional(inner) => assert_eq!(name_of(inner), "String"),
        other => panic!("expected optional, got {other:?}"),
    }
}

#[test]
fn optional_untyped_is_one_identifier() {
    let ty = annotation("untyped?");
    match &ty.kind {
        TypeExprKind::Optional(inner) => assert_eq!(name_of(inner), "untyped"),
        other => panic!("expected optional, got {other:?}"),
    }
}

#[test]
fn nested_generic_arguments() {
    let ty = annotation("Hash<String, Array<Integer>>");
    match &ty.kind {
        TypeExprKind::Name { name, args } => {
            assert_eq!(name, "Hash");
            assert_eq!(args.len(), 2);
            assert_eq!(name_of(&args[0]), "String");
            match &args[1].kind {
                TypeExprKind::Name { name, args } => {
                    assert_eq!(name, "Array");
                    assert_eq!(name_of(&args[0]), "Integer");
                }
                other => panic!("expected Array<Integer>, got {other:?}"),
            }
        }
        other => panic!("expected Hash, got {other:?}"),
    }
}

#[test]
fn proc_type_arguments() {
    let ty = annotation("Proc<Integer, String>");
    assert!(matches!(&ty.kind, TypeExprKind::Name { name, args } if name == "Proc" && args.len() == 2));
}

#[test]
fn record_with_optional_field() {
    let ty = annotation("{ name: String, age?: Integer }");
    match &ty.kind {
        TypeExprKind::Record(fields) => {
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].name, "name");
            assert!(!fields[0].optional);
            assert_eq!(fields[1].name, "age");
            assert!(fields[1].optional);
        }
        other => panic!("expected record, got {other:?}"),
    }
}

#[test]
fn intersection_of_interfaces() {
    let ty = annotation("Comparable & Printable");
    assert!(matches!(&ty.kind, TypeExprKind::Intersection(members) if members.len() == 2));
}

#[test]
fn union_of_literals() {
    let ty = annotation("\"a\" | \"b\" | :c | 1");
    match &ty.kind {
        TypeExprKind::Union(members) => {
            assert_eq!(members.len(), 4);
            assert_eq!(members[0].kind, TypeExprKind::Literal(LiteralType::String("a".into())));
            assert_eq!(members[2].kind, TypeExprKind::Literal(LiteralType::Symbol("c".into())));
            assert_eq!(members[3].kind, TypeExprKind::Literal(LiteralType::Integer(1)));
        }
        other => panic!("expected union, got {other:?}"),
    }
}

#[test]
fn union_binds_looser_than_optional() {
    let ty = annotation("Integer | String?");
    match &ty.kind {
        TypeExprKind::Union(members) => {
            assert!(matches!(members[1].kind, TypeExprKind::Optional(_)));
        }
        other => panic!("expected union, got {other:?}"),
    }
}

#[test]
fn for_each_name_visits_nested_references() {
    let ty = annotation("Hash<Symbol, User | Admin>");
    let mut names = Vec::new();
    ty.for_each_name(&mut |name| names.push(name.to_string()));
    assert_eq!(names, ["Hash", "Symbol", "User", "Admin"]);
}

#[test]
fn tuple_type_is_unsupported() {
    assert_eq!(codes("x: [String, Integer] = nil\n"), [diagnostic_codes::UNSUPPORTED_TUPLE_TYPE]);
}

#[test]
fn mapped_type_is_unsupported() {
    assert_eq!(
        codes("type M = { [K in Keys]: String }\n"),
        [diagnostic_codes::UNSUPPORTED_MAPPED_TYPE]
    );
}

#[test]
fn conditional_type_is_unsupported() {
    assert_eq!(
        codes("type C = T extends String ? Integer : Float\n"),
        [diagnostic_codes::UNSUPPORTED_CONDITIONAL_TYPE]
    );
}

#[test]
fn unsupported_type_is_an_unsupported_feature_error() {
    let file = parse_source("types.trb", "x: [String] = nil\n", ParseOptions::default());
    assert_eq!(file.diagnostics[0].kind, trc_common::DiagnosticKind::UnsupportedFeatureError);
}

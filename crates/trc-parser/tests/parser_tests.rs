use super::*;

fn parse(source: &str) -> ParsedFile {
    parse_source("test.trb", source, ParseOptions::default())
}

fn parse_clean(source: &str) -> ParsedFile {
    let file = parse(source);
    assert!(
        file.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        file.diagnostics
    );
    file
}

fn kind(file: &ParsedFile, index: NodeIndex) -> &NodeKind {
    &file.arena.get(index).expect("node").kind
}

fn statement(file: &ParsedFile, n: usize) -> &NodeKind {
    kind(file, file.statements()[n])
}

fn method(file: &ParsedFile, n: usize) -> &MethodDecl {
    match statement(file, n) {
        NodeKind::Method(decl) => decl,
        other => panic!("expected method, got {other:?}"),
    }
}

fn call(file: &ParsedFile, index: NodeIndex) -> &CallData {
    match kind(file, index) {
        NodeKind::Call(call) => call,
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn method_with_typed_parameters_and_return_type() {
    let file = parse_clean("def add(a: Integer, b: Integer): Integer\n  a + b\nend\n");
    let decl = method(&file, 0);
    assert_eq!(decl.name, "add");
    assert_eq!(decl.params.len(), 2);
    assert_eq!(decl.params[0].name, "a");
    assert_eq!(decl.params[0].ty, Some(TypeExpr::name("Integer", 11, 18)));
    assert!(matches!(
        &decl.return_type,
        Some(TypeExpr { kind: TypeExprKind::Name { name, .. }, .. }) if name == "Integer"
    ));
    assert_eq!(decl.body.len(), 1);
    assert!(matches!(
        kind(&file, decl.body[0]),
        NodeKind::Binary { op: BinaryOp::Add, .. }
    ));
}

#[test]
fn keyword_group_parameters() {
    let file = parse_clean("def greet({ name: String, age: Integer = 0 }): String\n  name\nend\n");
    let decl = method(&file, 0);
    assert_eq!(decl.params.len(), 2);
    assert!(decl.params.iter().all(|p| p.kind == ParamKind::Keyword));
    assert!(!decl.params[0].is_optional());
    assert!(decl.params[1].is_optional());
}

#[test]
fn typed_local_and_command_call() {
    let file = parse_clean("x: Integer = 5\nputs x\n");
    assert!(matches!(statement(&file, 0), NodeKind::TypedLocal { name, .. } if name == "x"));
    let puts = call(&file, file.statements()[1]);
    assert_eq!(puts.method, "puts");
    assert_eq!(puts.args.len(), 1);
    assert!(matches!(kind(&file, puts.args[0]), NodeKind::Identifier { name } if name == "x"));
}

#[test]
fn local_variables_are_not_command_calls() {
    let file = parse_clean("x = 1\nx -1\n");
    assert!(matches!(
        statement(&file, 1),
        NodeKind::Binary { op: BinaryOp::Sub, .. }
    ));

    let file = parse_clean("foo -1\n");
    let foo = call(&file, file.statements()[0]);
    assert_eq!(foo.args.len(), 1);
    assert!(matches!(kind(&file, foo.args[0]), NodeKind::Integer { value: -1 }));
}

#[test]
fn brace_and_do_blocks_attach_to_calls() {
    let file = parse_clean("[1, 2].map { |n| n * 2 }\n");
    let map = call(&file, file.statements()[0]);
    assert_eq!(map.method, "map");
    match kind(&file, map.block) {
        NodeKind::Block { params, body, brace } => {
            assert!(*brace);
            assert_eq!(params.len(), 1);
            assert_eq!(params[0].name, "n");
            assert_eq!(body.len(), 1);
        }
        other => panic!("expected block, got {other:?}"),
    }

    let file = parse_clean("list.each do |item|\n  puts item\nend\n");
    let each = call(&file, file.statements()[0]);
    assert!(matches!(kind(&file, each.block), NodeKind::Block { brace: false, .. }));
}

#[test]
fn generic_class_with_superclass_and_typed_attr() {
    let source = "class Box<T> < Base\n  attr_reader :value: T\n  def initialize(value: T)\n    @value = value\n  end\nend\n";
    let file = parse_clean(source);
    match statement(&file, 0) {
        NodeKind::Class {
            name,
            type_params,
            superclass,
            body,
        } => {
            assert_eq!(name, "Box");
            assert_eq!(type_params.len(), 1);
            assert_eq!(type_params[0].name, "T");
            assert!(superclass.is_some());
            assert_eq!(body.len(), 2);
            match kind(&file, body[0]) {
                NodeKind::Attr { kind, items } => {
                    assert_eq!(*kind, AttrKind::Reader);
                    assert_eq!(items[0].name, "value");
                    assert!(items[0].ty.is_some());
                }
                other => panic!("expected attr, got {other:?}"),
            }
        }
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn interface_members_are_signatures() {
    let file = parse_clean("interface Greeter\n  def greet: String\n  def name(x: Integer): String\nend\n");
    match statement(&file, 0) {
        NodeKind::Interface { name, members } => {
            assert_eq!(name, "Greeter");
            assert_eq!(members.len(), 2);
            for member in members {
                assert!(matches!(kind(&file, *member), NodeKind::Method(decl) if decl.signature_only));
            }
        }
        other => panic!("expected interface, got {other:?}"),
    }
}

#[test]
fn type_alias_union() {
    let file = parse_clean("type UserId = Integer | String\n");
    match statement(&file, 0) {
        NodeKind::TypeAlias { name, ty } => {
            assert_eq!(name, "UserId");
            assert!(matches!(&ty.kind, TypeExprKind::Union(members) if members.len() == 2));
        }
        other => panic!("expected alias, got {other:?}"),
    }
}

#[test]
fn case_in_patterns() {
    let source = "case value\nin {name: String => n}\n  n\nin [Integer => a, *rest]\n  a\nin nil\n  0\nelse\n  1\nend\n";
    let file = parse_clean(source);
    match statement(&file, 0) {
        NodeKind::CaseIn {
            clauses,
            else_branch,
            ..
        } => {
            assert_eq!(clauses.len(), 3);
            assert!(else_branch.is_some());
            match &clauses[0].pattern {
                Pattern::Hash { entries, rest } => {
                    assert!(rest.is_none());
                    assert_eq!(entries[0].key, "name");
                    assert!(matches!(
                        &entries[0].value,
                        Some(Pattern::Capture { name, .. }) if name == "n"
                    ));
                }
                other => panic!("expected hash pattern, got {other:?}"),
            }
            match &clauses[1].pattern {
                Pattern::Array { pre, rest, post } => {
                    assert_eq!(pre.len(), 1);
                    assert_eq!(rest, &Some(RestPattern::Named("rest".to_string())));
                    assert!(post.is_empty());
                }
                other => panic!("expected array pattern, got {other:?}"),
            }
            assert!(matches!(&clauses[2].pattern, Pattern::Value(_)));
            // The binding introduced by the pattern is a local in the body.
            assert!(matches!(
                kind(&file, clauses[0].body[0]),
                NodeKind::Identifier { name } if name == "n"
            ));
        }
        other => panic!("expected case/in, got {other:?}"),
    }
}

#[test]
fn if_elsif_else_chain() {
    let file = parse_clean("if a\n  1\nelsif b\n  2\nelse\n  3\nend\n");
    match statement(&file, 0) {
        NodeKind::If {
            form,
            else_branch,
            ..
        } => {
            assert_eq!(*form, IfForm::If);
            assert_eq!(else_branch.len(), 1);
            assert!(matches!(
                kind(&file, else_branch[0]),
                NodeKind::If { form: IfForm::Elsif, else_branch, .. } if else_branch.len() == 1
            ));
        }
        other => panic!("expected if, got {other:?}"),
    }
}

#[test]
fn string_interpolation_parses_embedded_code() {
    let file = parse_clean("name = \"x\"\n\"hi #{name}!\"\n");
    match statement(&file, 1) {
        NodeKind::Str { parts, raw } => {
            assert!(!raw);
            assert_eq!(parts.len(), 3);
            let StringPart::Code(code) = parts[1] else {
                panic!("expected interpolation");
            };
            let node = file.arena.get(code).expect("node");
            assert!(matches!(&node.kind, NodeKind::Identifier { name } if name == "name"));
            assert_eq!(node.pos, 17);
            assert_eq!(file.node_text(code), "name");
        }
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn modifier_if_wraps_statement() {
    let file = parse_clean("return nil if x.nil?\n");
    match statement(&file, 0) {
        NodeKind::If {
            form, then_branch, ..
        } => {
            assert_eq!(*form, IfForm::Modifier);
            assert!(matches!(kind(&file, then_branch[0]), NodeKind::Return { .. }));
        }
        other => panic!("expected modifier if, got {other:?}"),
    }
}

#[test]
fn multiple_assignment() {
    let file = parse_clean("a, b = 1, 2\n");
    match statement(&file, 0) {
        NodeKind::MultiAssign { targets, value } => {
            assert_eq!(targets.len(), 2);
            assert!(matches!(kind(&file, *value), NodeKind::Array { elements } if elements.len() == 2));
        }
        other => panic!("expected multi-assign, got {other:?}"),
    }
}

#[test]
fn safe_navigation_and_ternary() {
    let file = parse_clean("user&.name\nx = flag ? 1 : 2\n");
    assert!(call(&file, file.statements()[0]).safe_nav);
    match statement(&file, 1) {
        NodeKind::Assign { value, .. } => {
            assert!(matches!(kind(&file, *value), NodeKind::If { form: IfForm::Ternary, .. }));
        }
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn endless_method_definition() {
    let file = parse_clean("def double(x: Integer): Integer = x * 2\n");
    let decl = method(&file, 0);
    assert!(decl.endless);
    assert_eq!(decl.body.len(), 1);
}

#[test]
fn hash_shorthand_argument() {
    let file = parse_clean("name = 1\nfoo(name:)\n");
    let foo = call(&file, file.statements()[1]);
    assert_eq!(foo.args.len(), 1);
    match kind(&file, foo.args[0]) {
        NodeKind::Hash { entries, braces } => {
            assert!(!braces);
            assert_eq!(entries[0].key, HashKey::Shorthand("name".to_string()));
        }
        other => panic!("expected hash, got {other:?}"),
    }
}

#[test]
fn rescue_clause_in_method_body() {
    let file = parse_clean("def f\n  risky\nrescue StandardError => e\n  nil\nend\n");
    let decl = method(&file, 0);
    assert_eq!(decl.body.len(), 1);
    match kind(&file, decl.body[0]) {
        NodeKind::Begin {
            rescues, implicit, ..
        } => {
            assert!(*implicit);
            assert_eq!(rescues.len(), 1);
            assert_eq!(rescues[0].binding.as_deref(), Some("e"));
        }
        other => panic!("expected begin, got {other:?}"),
    }
}

#[test]
fn declaration_mode_reads_signatures_without_bodies() {
    let options = ParseOptions {
        declaration_mode: true,
        ..ParseOptions::default()
    };
    let file = parse_source(
        "prelude.trb",
        "class String\n  def upcase: String\n  def center(width: Integer): String\nend\n",
        options,
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    match statement(&file, 0) {
        NodeKind::Class { body, .. } => {
            assert_eq!(body.len(), 2);
            assert!(body
                .iter()
                .all(|m| matches!(kind(&file, *m), NodeKind::Method(decl) if decl.signature_only)));
        }
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn comments_are_kept_in_source_order() {
    let file = parse_clean("# leading\nx = 1 # trailing\n");
    assert_eq!(file.comments.len(), 2);
    assert_eq!(file.comments[0].text, "# leading");
}

#[test]
fn syntax_error_is_located() {
    let file = parse("x = 1\ny = )\n");
    assert_eq!(file.diagnostics.len(), 1);
    let diagnostic = &file.diagnostics[0];
    assert_eq!(diagnostic.code, trc_common::diagnostics::diagnostic_codes::EXPRESSION_EXPECTED);
    assert_eq!(diagnostic.line, 2);
    assert_eq!(diagnostic.column, 5);
}

use super::*;

fn kinds(source: &str) -> Vec<SyntaxKind> {
    let mut scanner = ScannerState::new(source);
    let mut out = Vec::new();
    loop {
        let kind = scanner.scan();
        if kind == SyntaxKind::EndOfFile {
            break;
        }
        out.push(kind);
    }
    out
}

#[test]
fn typed_parameter_uses_bare_colon() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("def add(a: Integer): Integer"),
        vec![DefKeyword, Identifier, OpenParen, Identifier, Colon, Constant, CloseParen, Colon, Constant]
    );
}

#[test]
fn symbols_after_whitespace_or_open_tokens() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("attr_reader :name: String"),
        vec![Identifier, SymbolLiteral, Colon, Constant]
    );
    assert_eq!(kinds("f(:ok)"), vec![Identifier, OpenParen, SymbolLiteral, CloseParen]);
    assert_eq!(kinds("x ? :a : :b"), vec![Identifier, Question, SymbolLiteral, Colon, SymbolLiteral]);
    assert_eq!(kinds("A::B"), vec![Constant, ColonColon, Constant]);
}

#[test]
fn predicate_names_absorb_question_mark() {
    let mut scanner = ScannerState::new("x.nil? && y != z");
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.scan(), SyntaxKind::Dot);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "nil?");
    assert_eq!(scanner.scan(), SyntaxKind::AmpAmp);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.scan(), SyntaxKind::BangEq);
}

#[test]
fn keywords_after_dot_are_method_names() {
    use SyntaxKind::*;
    assert_eq!(kinds("user.class"), vec![Identifier, Dot, Identifier]);
    assert_eq!(kinds("{if: 1}"), vec![OpenBrace, Identifier, Colon, IntegerLiteral, CloseBrace]);
}

#[test]
fn newlines_collapse_and_continue_after_operators() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("a = 1\n\n\nb = a +\n  2\n"),
        vec![Identifier, Eq, IntegerLiteral, Newline, Identifier, Eq, Identifier, Plus, IntegerLiteral, Newline]
    );
}

#[test]
fn leading_dot_continues_method_chain() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("list\n  .map(&:to_s)\n  # note\n  .first"),
        vec![
            Identifier, Dot, Identifier, OpenParen, Amp, SymbolLiteral, CloseParen, Dot, Identifier
        ]
    );
}

#[test]
fn optional_type_suffix_does_not_join_lines() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("def f: String?\nend"),
        vec![DefKeyword, Identifier, Colon, Constant, Question, Newline, EndKeyword]
    );
}

#[test]
fn string_interpolation_segments_carry_offsets() {
    let source = "\"hi #{name}!\"";
    let mut scanner = ScannerState::new(source);
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    let segments = scanner.segments().to_vec();
    assert_eq!(
        segments,
        vec![
            StringSegment::Text("hi ".to_string()),
            StringSegment::Interpolation {
                source: "name".to_string(),
                offset: 6,
            },
            StringSegment::Text("!".to_string()),
        ]
    );
}

#[test]
fn nested_scanner_reports_absolute_positions() {
    let mut scanner = ScannerState::new_at("name", 6);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_start(), 6);
    assert_eq!(scanner.token_end(), 10);
}

#[test]
fn comments_are_collected_with_placement() {
    let mut scanner = ScannerState::new("# header\nx = 1 # trailing\n");
    while scanner.scan() != SyntaxKind::EndOfFile {}
    let comments = scanner.take_comments();
    assert_eq!(comments.len(), 2);
    assert!(comments[0].own_line);
    assert_eq!(comments[0].text, "# header");
    assert!(!comments[1].own_line);
}

#[test]
fn unterminated_string_is_reported() {
    let mut scanner = ScannerState::new("\"oops");
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    let diagnostics = scanner.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].code,
        trc_common::diagnostics::diagnostic_codes::UNTERMINATED_STRING_LITERAL
    );
}

#[test]
fn numbers_and_ranges() {
    use SyntaxKind::*;
    assert_eq!(kinds("1..10"), vec![IntegerLiteral, DotDot, IntegerLiteral]);
    assert_eq!(kinds("1.5e3"), vec![FloatLiteral]);
    let mut scanner = ScannerState::new("1_000");
    scanner.scan();
    assert_eq!(scanner.token_value(), "1000");
}

#[test]
fn regex_versus_division() {
    use SyntaxKind::*;
    assert_eq!(kinds("a / b"), vec![Identifier, Slash, Identifier]);
    assert_eq!(kinds("x =~ /ab+c/i"), vec![Identifier, EqTilde, RegexLiteral]);
}

#[test]
fn snapshot_restores_position() {
    let mut scanner = ScannerState::new("foo bar");
    scanner.scan();
    let snapshot = scanner.snapshot();
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.token_value(), "bar");
    scanner.restore(snapshot);
    assert_eq!(scanner.token_value(), "foo");
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert!(scanner.preceded_by_space());
}

#[test]
fn block_comments_and_line_comments_end_at_newlines() {
    let source = "=begin\nnotes\n=end\nx = 1 # trailing\n  # indented\ny\n";
    let identifiers = kinds(source)
        .into_iter()
        .filter(|kind| *kind == SyntaxKind::Identifier)
        .count();
    assert_eq!(identifiers, 2);

    let mut scanner = ScannerState::new(source);
    while scanner.scan() != SyntaxKind::EndOfFile {}
    let comments = scanner.take_comments();
    assert_eq!(comments.len(), 2);
    assert_eq!((comments[0].pos, comments[0].end), (24, 34));
    assert_eq!(comments[0].text, "# trailing");
    assert!(!comments[0].own_line);
    assert_eq!(comments[1].text, "# indented");
    assert!(comments[1].own_line);
}

use super::*;

#[test]
fn from_code_fills_template_and_kind() {
    let diag = Diagnostic::from_code(
        diagnostic_codes::TYPE_NOT_ASSIGNABLE,
        "app.trb",
        4,
        3,
        &["String", "Integer"],
    );
    assert_eq!(
        diag.message_text,
        "Type 'String' is not assignable to type 'Integer'."
    );
    assert_eq!(diag.kind, DiagnosticKind::TypeMismatchError);
    assert_eq!(diag.category, DiagnosticCategory::Error);
}

#[test]
fn kinds_follow_code_ranges() {
    use diagnostic_codes::*;
    assert_eq!(DiagnosticKind::from_code(UNEXPECTED_TOKEN), DiagnosticKind::SyntaxError);
    assert_eq!(
        DiagnosticKind::from_code(UNSUPPORTED_TUPLE_TYPE),
        DiagnosticKind::UnsupportedFeatureError
    );
    assert_eq!(
        DiagnosticKind::from_code(WRONG_NUMBER_OF_TYPE_ARGUMENTS),
        DiagnosticKind::UnresolvedTypeError
    );
    assert_eq!(
        DiagnosticKind::from_code(CIRCULAR_INFERENCE),
        DiagnosticKind::CircularInferenceError
    );
    assert_eq!(
        DiagnosticKind::from_code(NIL_NOT_IN_RETURN_TYPE),
        DiagnosticKind::MissingReturnTypeError
    );
    assert_eq!(
        DiagnosticKind::from_code(DYNAMIC_DISPATCH),
        DiagnosticKind::DynamicDispatchHint
    );
}

#[test]
fn every_code_has_a_unique_entry() {
    let mut codes: Vec<u32> = DIAGNOSTIC_MESSAGES.iter().map(|m| m.code).collect();
    let total = codes.len();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), total);
    assert_eq!(
        get_diagnostic_category(diagnostic_codes::UNUSED_VARIABLE),
        Some(DiagnosticCategory::Warning)
    );
}

#[test]
fn locate_is_one_based() {
    let map = LineMap::build("x = 1\ny = z\n");
    let mut diag = Diagnostic::from_code(diagnostic_codes::UNDEFINED_VARIABLE, "a.trb", 10, 1, &["z"]);
    diag.locate(&map);
    assert_eq!((diag.line, diag.column), (2, 5));
}

//! Diagnostic code and message tables.
//!
//! Code ranges: 1xxx parser, 2xxx binder, 3xxx type checking, 4xxx strictness
//! checks, 5xxx hints.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const UNEXPECTED_TOKEN: u32 = 1001;
    pub const EXPECTED: u32 = 1002;
    pub const UNTERMINATED_STRING_LITERAL: u32 = 1003;
    pub const INVALID_CHARACTER: u32 = 1004;
    pub const EXPRESSION_EXPECTED: u32 = 1005;
    pub const TYPE_EXPECTED: u32 = 1006;
    pub const IDENTIFIER_EXPECTED: u32 = 1007;
    pub const NESTING_TOO_DEEP: u32 = 1008;
    pub const UNSUPPORTED_TUPLE_TYPE: u32 = 1101;
    pub const UNSUPPORTED_CONDITIONAL_TYPE: u32 = 1102;
    pub const UNSUPPORTED_MAPPED_TYPE: u32 = 1103;

    pub const CANNOT_FIND_TYPE: u32 = 2001;
    pub const TYPE_ALIAS_CIRCULARLY_REFERENCES_ITSELF: u32 = 2002;
    pub const CONFLICTING_INTERSECTION_MEMBER: u32 = 2003;
    pub const DUPLICATE_DECLARATION: u32 = 2004;
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: u32 = 2005;

    pub const TYPE_NOT_ASSIGNABLE: u32 = 3001;
    pub const ARGUMENT_NOT_ASSIGNABLE: u32 = 3002;
    pub const UNDEFINED_METHOD: u32 = 3003;
    pub const METHOD_ON_POSSIBLY_NIL: u32 = 3004;
    pub const WRONG_ARGUMENT_COUNT: u32 = 3005;
    pub const UNDEFINED_VARIABLE: u32 = 3006;
    pub const CIRCULAR_INFERENCE: u32 = 3007;
    pub const RETURN_TYPE_MISMATCH: u32 = 3008;
    pub const UNKNOWN_KEYWORD_ARGUMENT: u32 = 3009;
    pub const MISSING_KEYWORD_ARGUMENT: u32 = 3010;
    pub const UNDEFINED_CONSTANT: u32 = 3011;
    pub const UNKNOWN_RECORD_KEY: u32 = 3012;

    pub const IMPLICIT_ANY_PARAMETER: u32 = 4001;
    pub const IMPLICIT_ANY_ATTRIBUTE: u32 = 4002;
    pub const UNUSED_VARIABLE: u32 = 4003;
    pub const UNSAFE_INDEXED_ACCESS: u32 = 4004;
    pub const NIL_NOT_IN_RETURN_TYPE: u32 = 4005;
    pub const MISSING_RETURN_TYPE: u32 = 4006;

    pub const DYNAMIC_DISPATCH: u32 = 5001;
}

pub mod diagnostic_messages {
    pub const UNEXPECTED_TOKEN: &str = "Unexpected token '{0}'.";
    pub const EXPECTED: &str = "'{0}' expected.";
    pub const UNTERMINATED_STRING_LITERAL: &str = "Unterminated string literal.";
    pub const INVALID_CHARACTER: &str = "Invalid character.";
    pub const EXPRESSION_EXPECTED: &str = "Expression expected.";
    pub const TYPE_EXPECTED: &str = "Type expected.";
    pub const IDENTIFIER_EXPECTED: &str = "Identifier expected.";
    pub const NESTING_TOO_DEEP: &str = "Expression is nested too deeply.";
    pub const UNSUPPORTED_TUPLE_TYPE: &str = "Tuple types are not supported; use 'Array<T>'.";
    pub const UNSUPPORTED_CONDITIONAL_TYPE: &str = "Conditional types are not supported.";
    pub const UNSUPPORTED_MAPPED_TYPE: &str = "Mapped types are not supported.";

    pub const CANNOT_FIND_TYPE: &str = "Cannot find type '{0}'.";
    pub const TYPE_ALIAS_CIRCULARLY_REFERENCES_ITSELF: &str =
        "Type alias '{0}' circularly references itself.";
    pub const CONFLICTING_INTERSECTION_MEMBER: &str =
        "Intersection of '{0}' and '{1}' has conflicting signatures for '{2}'.";
    pub const DUPLICATE_DECLARATION: &str = "Duplicate declaration of '{0}'.";
    pub const WRONG_NUMBER_OF_TYPE_ARGUMENTS: &str =
        "Type '{0}' expects {1} type argument(s), but got {2}.";

    pub const TYPE_NOT_ASSIGNABLE: &str = "Type '{0}' is not assignable to type '{1}'.";
    pub const ARGUMENT_NOT_ASSIGNABLE: &str =
        "Argument of type '{0}' is not assignable to parameter '{1}' of type '{2}'.";
    pub const UNDEFINED_METHOD: &str = "Undefined method '{0}' for type '{1}'.";
    pub const METHOD_ON_POSSIBLY_NIL: &str =
        "Method '{0}' called on a possibly nil value of type '{1}'.";
    pub const WRONG_ARGUMENT_COUNT: &str = "Expected {0} arguments, but got {1}.";
    pub const UNDEFINED_VARIABLE: &str = "Undefined local variable or method '{0}'.";
    pub const CIRCULAR_INFERENCE: &str =
        "Return type of '{0}' depends on itself; add an explicit return type.";
    pub const RETURN_TYPE_MISMATCH: &str =
        "Method '{0}' returns '{1}', which is not assignable to its return type '{2}'.";
    pub const UNKNOWN_KEYWORD_ARGUMENT: &str = "Unknown keyword argument '{0}'.";
    pub const MISSING_KEYWORD_ARGUMENT: &str = "Missing required keyword argument '{0}'.";
    pub const UNDEFINED_CONSTANT: &str = "Uninitialized constant '{0}'.";
    pub const UNKNOWN_RECORD_KEY: &str = "Key '{0}' does not exist on type '{1}'.";

    pub const IMPLICIT_ANY_PARAMETER: &str = "Parameter '{0}' implicitly has type 'Any'.";
    pub const IMPLICIT_ANY_ATTRIBUTE: &str = "Attribute '{0}' implicitly has type 'Any'.";
    pub const UNUSED_VARIABLE: &str = "'{0}' is declared but its value is never read.";
    pub const UNSAFE_INDEXED_ACCESS: &str =
        "Indexed access '{0}' may be nil; check it before using it as '{1}'.";
    pub const NIL_NOT_IN_RETURN_TYPE: &str =
        "Method '{0}' may return nil, but its return type '{1}' does not include nil.";
    pub const MISSING_RETURN_TYPE: &str = "Public method '{0}' is missing a return type annotation.";

    pub const DYNAMIC_DISPATCH: &str = "'{0}' is dispatched dynamically; its result is 'Any'.";
}

macro_rules! message {
    ($name:ident, $category:ident) => {
        DiagnosticMessage {
            code: diagnostic_codes::$name,
            category: DiagnosticCategory::$category,
            message: diagnostic_messages::$name,
        }
    };
}

/// Every diagnostic the compiler can produce, with its default category.
pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    message!(UNEXPECTED_TOKEN, Error),
    message!(EXPECTED, Error),
    message!(UNTERMINATED_STRING_LITERAL, Error),
    message!(INVALID_CHARACTER, Error),
    message!(EXPRESSION_EXPECTED, Error),
    message!(TYPE_EXPECTED, Error),
    message!(IDENTIFIER_EXPECTED, Error),
    message!(NESTING_TOO_DEEP, Error),
    message!(UNSUPPORTED_TUPLE_TYPE, Error),
    message!(UNSUPPORTED_CONDITIONAL_TYPE, Error),
    message!(UNSUPPORTED_MAPPED_TYPE, Error),
    message!(CANNOT_FIND_TYPE, Error),
    message!(TYPE_ALIAS_CIRCULARLY_REFERENCES_ITSELF, Error),
    message!(CONFLICTING_INTERSECTION_MEMBER, Error),
    message!(DUPLICATE_DECLARATION, Error),
    message!(WRONG_NUMBER_OF_TYPE_ARGUMENTS, Error),
    message!(TYPE_NOT_ASSIGNABLE, Error),
    message!(ARGUMENT_NOT_ASSIGNABLE, Error),
    message!(UNDEFINED_METHOD, Error),
    message!(METHOD_ON_POSSIBLY_NIL, Error),
    message!(WRONG_ARGUMENT_COUNT, Error),
    message!(UNDEFINED_VARIABLE, Error),
    message!(CIRCULAR_INFERENCE, Error),
    message!(RETURN_TYPE_MISMATCH, Error),
    message!(UNKNOWN_KEYWORD_ARGUMENT, Error),
    message!(MISSING_KEYWORD_ARGUMENT, Error),
    message!(UNDEFINED_CONSTANT, Error),
    message!(UNKNOWN_RECORD_KEY, Error),
    message!(IMPLICIT_ANY_PARAMETER, Error),
    message!(IMPLICIT_ANY_ATTRIBUTE, Error),
    message!(UNUSED_VARIABLE, Warning),
    message!(UNSAFE_INDEXED_ACCESS, Error),
    message!(NIL_NOT_IN_RETURN_TYPE, Error),
    message!(MISSING_RETURN_TYPE, Error),
    message!(DYNAMIC_DISPATCH, Hint),
];

//! Character classification for Ruby identifiers and literals.

#[inline]
pub fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || !c.is_ascii()
}

#[inline]
pub fn is_identifier_part(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric() || !c.is_ascii()
}

/// Constants (class names, `FOO`) start with an uppercase letter.
#[inline]
pub fn is_constant_start(c: char) -> bool {
    c.is_ascii_uppercase()
}

#[inline]
pub fn is_line_break(c: char) -> bool {
    c == '\n'
}

#[inline]
pub fn is_inline_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\u{000C}')
}

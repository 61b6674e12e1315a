use super::*;

#[test]
fn indents_only_at_line_start() {
    let mut writer = SourceWriter::new();
    writer.write("class A");
    writer.write_line();
    writer.increase_indent();
    writer.write("def f");
    writer.write_space();
    writer.write("# note");
    writer.write_line();
    writer.decrease_indent();
    writer.write("end");
    assert_eq!(writer.into_output(), "class A\n  def f # note\nend");
}

#[test]
fn multi_line_text_is_not_reindented() {
    let mut writer = SourceWriter::new();
    writer.increase_indent();
    writer.write("x = 'a\nb'");
    assert!(!writer.is_at_line_start());
    writer.write_line();
    writer.write("y");
    assert_eq!(writer.into_output(), "  x = 'a\nb'\n  y");
}

#[test]
fn text_ending_in_newline_starts_a_line() {
    let mut writer = SourceWriter::new();
    writer.write("a\n");
    assert!(writer.is_at_line_start());
    writer.ensure_line();
    assert_eq!(writer.len(), 2);
}

#[test]
fn blank_lines_never_stack() {
    let mut writer = SourceWriter::new();
    writer.blank_line();
    assert!(writer.is_empty());
    writer.write("a");
    writer.blank_line();
    writer.blank_line();
    writer.write("b");
    assert_eq!(writer.into_output(), "a\n\nb");
}

#[test]
fn decrease_indent_saturates() {
    let mut writer = SourceWriter::new();
    writer.decrease_indent();
    assert_eq!(writer.indent_level(), 0);
    writer.write_char('x');
    assert_eq!(writer.take_output(), "x");
    assert!(writer.is_empty());
}

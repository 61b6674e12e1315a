//! Annotation erasure at the default target.

use trc_common::options::CompilationContext;
use trc_emitter::emit_ruby;
use trc_parser::{ParseOptions, parse_source};

fn emit(source: &str) -> String {
    let file = parse_source("main.trb", source, ParseOptions::default());
    assert!(file.diagnostics.is_empty(), "syntax errors: {:?}", file.diagnostics);
    emit_ruby(&file, &CompilationContext::default())
}

#[test]
fn method_annotations_are_erased() {
    let output = emit("def add(a: Integer, b: Integer): Integer\n  a + b\nend\n");
    assert_eq!(output, "def add(a, b)\n  a + b\nend\n");
}

#[test]
fn one_line_method_is_printed_as_a_block() {
    let output = emit("def add(a: Integer, b: Integer): Integer; a + b; end\n");
    assert_eq!(output, "def add(a, b)\n  a + b\nend\n");
}

#[test]
fn typed_local_keeps_its_value() {
    assert_eq!(emit("x: Integer = 5\nputs x\n"), "x = 5\nputs x\n");
}

#[test]
fn typed_local_without_value_becomes_nil() {
    assert_eq!(emit("name: String?\n"), "name = nil\n");
}

#[test]
fn type_declarations_disappear() {
    let source = "type UserId = Integer\ninterface Greeter\n  def greet: String\nend\nputs 1\n";
    assert_eq!(emit(source), "puts 1\n");
}

#[test]
fn class_members_lose_their_types() {
    let source = "class User\n  attr_reader :name: String\n  @email: String?\n\n  def initialize(name: String)\n    @name = name\n  end\nend\n";
    let expected = "class User\n  attr_reader :name\n\n  def initialize(name)\n    @name = name\n  end\nend\n";
    assert_eq!(emit(source), expected);
}

#[test]
fn initialized_ivar_declaration_keeps_the_assignment() {
    let source = "class Counter\n  def initialize\n    @count: Integer = 0\n  end\nend\n";
    let expected = "class Counter\n  def initialize\n    @count = 0\n  end\nend\n";
    assert_eq!(emit(source), expected);
}

#[test]
fn generic_class_erases_type_parameters() {
    assert_eq!(emit("class Box<T> < Base\nend\n"), "class Box < Base\nend\n");
}

#[test]
fn keyword_parameters_keep_defaults() {
    let output = emit("def greet({ name: String, age: Integer = 0 }): String\n  name\nend\n");
    assert_eq!(output, "def greet(name:, age: 0)\n  name\nend\n");
}

#[test]
fn comments_are_preserved() {
    let source = "# leading\nx = 1 # trailing\n";
    assert_eq!(emit(source), "# leading\nx = 1 # trailing\n");
}

#[test]
fn comment_before_erased_alias_survives() {
    let source = "# ids\ntype UserId = Integer\nx = 1\n";
    assert_eq!(emit(source), "# ids\nx = 1\n");
}

#[test]
fn single_blank_lines_are_kept() {
    assert_eq!(emit("x = 1\n\n\ny = 2\n"), "x = 1\n\ny = 2\n");
}

#[test]
fn block_parameter_types_are_erased() {
    let output = emit("[1, 2].map { |n: Integer| n * 2 }\n");
    assert_eq!(output, "[1, 2].map { |n| n * 2 }\n");
}

#[test]
fn do_blocks_stay_multi_line() {
    let source = "list.each do |item|\n  puts item\nend\n";
    assert_eq!(emit(source), source);
}

#[test]
fn rescue_in_method_body() {
    let source = "def f\n  risky\nrescue StandardError => e\n  nil\nend\n";
    assert_eq!(emit(source), source);
}

#[test]
fn control_flow_round_trips() {
    let source = "if x > 1\n  a\nelsif x < 0\n  b\nelse\n  c\nend\n";
    assert_eq!(emit(source), source);

    let source = "return nil if x.nil?\n";
    assert_eq!(emit(source), source);
}

#[test]
fn class_body_ivar_initializer_gets_a_constructor() {
    let source = "class C\n  @count: Integer = 0\n\n  def inc: Integer\n    @count + 1\n  end\nend\n";
    let expected = "class C\n  def initialize\n    @count = 0\n  end\n\n  def inc\n    @count + 1\n  end\nend\n";
    assert_eq!(emit(source), expected);
}

#[test]
fn class_body_ivar_initializers_open_the_existing_constructor() {
    let source = "class Counter\n  @count: Integer = 0\n  @label: String = \"c\"\n  def initialize(step: Integer)\n    @step = step\n  end\nend\n";
    let expected = "class Counter\n  def initialize(step)\n    @count = 0\n    @label = \"c\"\n    @step = step\n  end\nend\n";
    assert_eq!(emit(source), expected);
}

#[test]
fn subclass_constructor_for_ivar_initializers_calls_super() {
    let source = "class Admin < User\n  @level: Integer = 1\nend\n";
    let expected = "class Admin < User\n  def initialize(*args, **kwargs, &block)\n    super\n    @level = 1\n  end\nend\n";
    assert_eq!(emit(source), expected);
}

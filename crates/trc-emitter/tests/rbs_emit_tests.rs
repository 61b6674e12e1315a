//! RBS output for checked files.

use std::sync::Arc;

use trc_binder::{FileId, bind_program};
use trc_checker::check_file;
use trc_common::options::CompilationContext;
use trc_emitter::emit_rbs;
use trc_parser::{ParseOptions, parse_source};
use trc_solver::TypeInterner;

fn rbs(source: &str) -> String {
    let file = Arc::new(parse_source("main.trb", source, ParseOptions::default()));
    assert!(file.diagnostics.is_empty(), "syntax errors: {:?}", file.diagnostics);
    let bound = bind_program(Arc::new(TypeInterner::new()), &[file]);
    assert!(bound.diagnostics.is_empty(), "binder errors: {:?}", bound.diagnostics);
    let result = check_file(&bound.table, FileId::input(0), &CompilationContext::default());
    emit_rbs(&bound.table, FileId::input(0), &result.types)
}

#[test]
fn top_level_method_signature() {
    let output = rbs("def add(a: Integer, b: Integer): Integer\n  a + b\nend\n");
    assert_eq!(output, "def add: (Integer a, Integer b) -> Integer\n");
}

#[test]
fn unannotated_return_uses_the_inferred_type() {
    let output = rbs("def double(x: Integer)\n  x * 2\nend\n");
    assert_eq!(output, "def double: (Integer x) -> Integer\n");
}

#[test]
fn generic_class_with_attr_and_initializer() {
    let source = "class Box<T>\n  attr_reader :value: T\n  def initialize(value: T)\n    @value = value\n  end\nend\n";
    let expected = "class Box[T]\n  attr_reader value: T\n  def initialize: (T value) -> void\nend\n";
    assert_eq!(rbs(source), expected);
}

#[test]
fn declared_ivar_is_listed_once() {
    let source = "class Account\n  @balance: Integer\n  def initialize\n    @balance = 0\n  end\nend\n";
    let expected = "class Account\n  @balance: Integer\n  def initialize: () -> void\nend\n";
    assert_eq!(rbs(source), expected);
}

#[test]
fn assigned_ivar_gets_its_inferred_type() {
    let source = "class Counter\n  def initialize\n    @count = 0\n  end\nend\n";
    let expected = "class Counter\n  @count: Integer\n  def initialize: () -> void\nend\n";
    assert_eq!(rbs(source), expected);
}

#[test]
fn alias_and_interface_declarations() {
    let source = "type UserId = Integer\ninterface Greeter\n  def greet(name: String): String\nend\n";
    let expected = "type user_id = Integer\ninterface _Greeter\n  def greet: (String name) -> String\nend\n";
    assert_eq!(rbs(source), expected);
}

#[test]
fn nested_module_and_private_section() {
    let source = "\
module Admin
  class User
    def name: String
      \"x\"
    end

    private

    def secret: Integer
      1
    end
  end
end
";
    let expected = "\
module Admin
  class User
    def name: () -> String
    private
    def secret: () -> Integer
  end
end
";
    assert_eq!(rbs(source), expected);
}

#[test]
fn optional_parameter_and_return() {
    let output = rbs("def find(id: Integer, name: String? = nil): String?\n  name\nend\n");
    assert_eq!(output, "def find: (Integer id, ?String? name) -> String?\n");
}

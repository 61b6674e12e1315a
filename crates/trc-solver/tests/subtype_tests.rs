use super::*;
use crate::types::{FunctionShape, ParamInfo, ParamKind, RecordField};
use rustc_hash::FxHashMap;

/// Declarations for tests: class ancestors, interface members and methods
/// by class name.
#[derive(Default)]
struct TestResolver {
    ancestors: FxHashMap<Atom, Vec<TypeId>>,
    interfaces: FxHashMap<Atom, Vec<(Atom, TypeId)>>,
    methods: FxHashMap<(TypeId, Atom), TypeId>,
}

impl TypeResolver for TestResolver {
    fn ancestors(&self, class: Atom, _args: &[TypeId]) -> Vec<TypeId> {
        self.ancestors.get(&class).cloned().unwrap_or_default()
    }

    fn interface_members(&self, name: Atom) -> Vec<(Atom, TypeId)> {
        self.interfaces.get(&name).cloned().unwrap_or_default()
    }

    fn find_method(&self, receiver: TypeId, name: Atom) -> Option<TypeId> {
        self.methods.get(&(receiver, name)).copied()
    }
}

fn subtype(interner: &TypeInterner, source: TypeId, target: TypeId) -> bool {
    is_subtype_of(interner, &NoopResolver, source, target)
}

#[test]
fn top_and_bottom() {
    let interner = TypeInterner::new();
    let user = interner.instance_named("User", vec![]);
    for ty in [TypeId::STRING, TypeId::NIL, user, interner.array(TypeId::INTEGER)] {
        assert!(subtype(&interner, ty, TypeId::ANY));
        assert!(subtype(&interner, TypeId::NEVER, ty));
        assert!(subtype(&interner, ty, ty));
    }
    assert!(!subtype(&interner, TypeId::ANY, TypeId::STRING));
}

#[test]
fn union_rules() {
    let interner = TypeInterner::new();
    let string_or_int = interner.union(vec![TypeId::STRING, TypeId::INTEGER]);
    assert!(subtype(&interner, TypeId::STRING, string_or_int));
    assert!(!subtype(&interner, string_or_int, TypeId::STRING));
    let wider = interner.union(vec![TypeId::STRING, TypeId::INTEGER, TypeId::SYMBOL]);
    assert!(subtype(&interner, string_or_int, wider));
    assert!(!subtype(&interner, wider, string_or_int));
}

#[test]
fn literals_are_subtypes_of_their_primitive() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let one = interner.literal_integer(1);
    assert!(subtype(&interner, a, TypeId::STRING));
    assert!(!subtype(&interner, a, TypeId::INTEGER));
    assert!(!subtype(&interner, TypeId::STRING, a));
    let a_or_b = interner.union(vec![a, interner.literal_string("b")]);
    assert!(subtype(&interner, a, a_or_b));
    assert!(!subtype(&interner, one, a_or_b));
    assert!(subtype(&interner, interner.literal_bool(true), TypeId::BOOLEAN));
}

#[test]
fn nil_is_only_assignable_when_strict_nil_is_off() {
    let interner = TypeInterner::new();
    let optional = interner.optional(TypeId::STRING);
    assert!(!is_assignable_to(&interner, &NoopResolver, TypeId::NIL, TypeId::STRING, true));
    assert!(is_assignable_to(&interner, &NoopResolver, TypeId::NIL, TypeId::STRING, false));
    assert!(!is_assignable_to(&interner, &NoopResolver, optional, TypeId::STRING, true));
    assert!(is_assignable_to(&interner, &NoopResolver, optional, TypeId::STRING, false));
    assert!(is_assignable_to(&interner, &NoopResolver, TypeId::NIL, optional, true));
}

#[test]
fn any_is_gradual_only_in_assignability() {
    let interner = TypeInterner::new();
    let any_array = interner.array(TypeId::ANY);
    let string_array = interner.array(TypeId::STRING);
    assert!(is_assignable_to(&interner, &NoopResolver, TypeId::ANY, TypeId::STRING, true));
    assert!(is_assignable_to(&interner, &NoopResolver, any_array, string_array, true));
    assert!(!subtype(&interner, any_array, string_array));
    assert!(subtype(&interner, string_array, any_array));
}

#[test]
fn classes_are_nominal_along_ancestors() {
    let interner = TypeInterner::new();
    let mut resolver = TestResolver::default();
    let admin = interner.intern_string("Admin");
    let user = interner.instance_named("User", vec![]);
    let base = interner.instance_named("Base", vec![]);
    resolver.ancestors.insert(admin, vec![user, base]);
    let admin_ty = interner.instance(admin, vec![]);

    assert!(is_subtype_of(&interner, &resolver, admin_ty, user));
    assert!(is_subtype_of(&interner, &resolver, admin_ty, base));
    assert!(!is_subtype_of(&interner, &resolver, user, admin_ty));
    let object = interner.instance_named("Object", vec![]);
    assert!(is_subtype_of(&interner, &resolver, admin_ty, object));
    assert!(is_subtype_of(&interner, &resolver, TypeId::INTEGER, object));
}

#[test]
fn primitives_reach_their_ancestors() {
    let interner = TypeInterner::new();
    let mut resolver = TestResolver::default();
    let numeric = interner.instance_named("Numeric", vec![]);
    resolver
        .ancestors
        .insert(interner.intern_string("Integer"), vec![numeric]);
    assert!(is_subtype_of(&interner, &resolver, TypeId::INTEGER, numeric));
    assert!(is_subtype_of(&interner, &resolver, interner.literal_integer(3), numeric));
    assert!(!is_subtype_of(&interner, &resolver, TypeId::STRING, numeric));
}

#[test]
fn generic_arguments_are_covariant() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    let literal_array = interner.array(a);
    let string_array = interner.array(TypeId::STRING);
    assert!(subtype(&interner, literal_array, string_array));
    assert!(!subtype(&interner, string_array, literal_array));
    assert!(!subtype(&interner, interner.array(TypeId::INTEGER), string_array));
}

#[test]
fn records_compare_by_width_and_depth() {
    let interner = TypeInterner::new();
    let name = interner.intern_string("name");
    let age = interner.intern_string("age");
    let field = |n, ty, optional| RecordField { name: n, ty, optional };

    let wide = interner.record(vec![field(name, TypeId::STRING, false), field(age, TypeId::INTEGER, false)]);
    let narrow = interner.record(vec![field(name, TypeId::STRING, false)]);
    let optional_age = interner.record(vec![field(name, TypeId::STRING, false), field(age, TypeId::INTEGER, true)]);

    assert!(subtype(&interner, wide, narrow));
    assert!(!subtype(&interner, narrow, wide));
    assert!(subtype(&interner, narrow, optional_age));
    assert!(!subtype(&interner, optional_age, wide));

    let symbol_hash = interner.hash(TypeId::SYMBOL, interner.union(vec![TypeId::STRING, TypeId::INTEGER]));
    assert!(subtype(&interner, wide, symbol_hash));
    assert!(!subtype(&interner, wide, interner.hash(TypeId::SYMBOL, TypeId::STRING)));
}

#[test]
fn interfaces_are_structural() {
    let interner = TypeInterner::new();
    let mut resolver = TestResolver::default();
    let greeter = interner.intern_string("Greeter");
    let greet = interner.intern_string("greet");
    let signature = interner.function(FunctionShape::new(vec![], TypeId::STRING));
    resolver.interfaces.insert(greeter, vec![(greet, signature)]);

    let person = interner.instance_named("Person", vec![]);
    let robot = interner.instance_named("Robot", vec![]);
    let rock = interner.instance_named("Rock", vec![]);
    resolver.methods.insert((person, greet), signature);
    let literal_greeting = interner.function(FunctionShape::new(vec![], interner.literal_string("beep")));
    resolver.methods.insert((robot, greet), literal_greeting);

    let greeter_ty = interner.interface(greeter);
    assert!(is_subtype_of(&interner, &resolver, person, greeter_ty));
    // Covariant return.
    assert!(is_subtype_of(&interner, &resolver, robot, greeter_ty));
    assert!(!is_subtype_of(&interner, &resolver, rock, greeter_ty));
}

#[test]
fn interface_parameters_are_invariant_and_arity_must_match() {
    let interner = TypeInterner::new();
    let mut resolver = TestResolver::default();
    let sink = interner.intern_string("Sink");
    let push = interner.intern_string("push");
    let required = interner.function(FunctionShape::new(vec![ParamInfo::unnamed(TypeId::STRING)], TypeId::NIL));
    resolver.interfaces.insert(sink, vec![(push, required)]);

    let exact = interner.instance_named("Exact", vec![]);
    let wider = interner.instance_named("Wider", vec![]);
    let two_args = interner.instance_named("TwoArgs", vec![]);
    resolver.methods.insert((exact, push), required);
    let wider_param = interner.union(vec![TypeId::STRING, TypeId::INTEGER]);
    resolver.methods.insert(
        (wider, push),
        interner.function(FunctionShape::new(vec![ParamInfo::unnamed(wider_param)], TypeId::NIL)),
    );
    resolver.methods.insert(
        (two_args, push),
        interner.function(FunctionShape::new(
            vec![ParamInfo::unnamed(TypeId::STRING), ParamInfo::unnamed(TypeId::STRING)],
            TypeId::NIL,
        )),
    );

    let sink_ty = interner.interface(sink);
    assert!(is_subtype_of(&interner, &resolver, exact, sink_ty));
    assert!(!is_subtype_of(&interner, &resolver, wider, sink_ty));
    assert!(!is_subtype_of(&interner, &resolver, two_args, sink_ty));
}

#[test]
fn self_referential_interface_is_coinductive() {
    let interner = TypeInterner::new();
    let mut resolver = TestResolver::default();
    let node = interner.intern_string("Node");
    let next = interner.intern_string("next");
    let node_ty = interner.interface(node);
    let signature = interner.function(FunctionShape::new(vec![], node_ty));
    resolver.interfaces.insert(node, vec![(next, signature)]);

    let list = interner.instance_named("List", vec![]);
    let list_signature = interner.function(FunctionShape::new(vec![], list));
    resolver.methods.insert((list, next), list_signature);
    assert!(is_subtype_of(&interner, &resolver, list, node_ty));
}

#[test]
fn procs_have_contravariant_parameters() {
    let interner = TypeInterner::new();
    let string_or_int = interner.union(vec![TypeId::STRING, TypeId::INTEGER]);
    let accepts_wide = interner.proc_type(vec![string_or_int], TypeId::STRING);
    let accepts_string = interner.proc_type(vec![TypeId::STRING], TypeId::STRING);
    assert!(subtype(&interner, accepts_wide, accepts_string));
    assert!(!subtype(&interner, accepts_string, accepts_wide));
    let proc_class = interner.instance_named("Proc", vec![]);
    assert!(subtype(&interner, accepts_string, proc_class));
}

#[test]
fn keyword_parameters_match_by_name() {
    let interner = TypeInterner::new();
    let name = interner.intern_string("name");
    let keyword = |kind| ParamInfo {
        name: Some(name),
        ty: TypeId::STRING,
        kind,
    };
    let required = interner.function(FunctionShape::new(vec![keyword(ParamKind::Keyword)], TypeId::NIL));
    let optional = interner.function(FunctionShape::new(vec![keyword(ParamKind::OptionalKeyword)], TypeId::NIL));
    let none = interner.function(FunctionShape::new(vec![], TypeId::NIL));
    assert!(subtype(&interner, optional, required));
    assert!(!subtype(&interner, required, none));
}

#[test]
fn singletons_follow_ancestors() {
    let interner = TypeInterner::new();
    let mut resolver = TestResolver::default();
    let admin = interner.intern_string("Admin");
    let user = interner.intern_string("User");
    resolver.ancestors.insert(admin, vec![interner.instance(user, vec![])]);
    let admin_class = interner.singleton(admin);
    let user_class = interner.singleton(user);
    assert!(is_subtype_of(&interner, &resolver, admin_class, user_class));
    assert!(!is_subtype_of(&interner, &resolver, user_class, admin_class));
    assert!(!is_subtype_of(&interner, &resolver, admin_class, interner.instance(admin, vec![])));
}

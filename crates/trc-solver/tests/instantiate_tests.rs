use super::*;
use crate::types::ParamKind;

#[test]
fn substitutes_type_parameters_in_nested_positions() {
    let interner = TypeInterner::new();
    let t = interner.intern_string("T");
    let t_param = interner.type_param(t);
    let optional_t = interner.optional(t_param);
    let array_of_t = interner.array(t_param);

    let subst = TypeSubstitution::from_args(&[t], &[TypeId::STRING]);
    assert_eq!(instantiate_type(&interner, optional_t, &subst), interner.optional(TypeId::STRING));
    assert_eq!(instantiate_type(&interner, array_of_t, &subst), interner.array(TypeId::STRING));
}

#[test]
fn missing_arguments_become_any() {
    let interner = TypeInterner::new();
    let k = interner.intern_string("K");
    let v = interner.intern_string("V");
    let subst = TypeSubstitution::from_args(&[k, v], &[TypeId::SYMBOL]);
    assert_eq!(subst.get(k), Some(TypeId::SYMBOL));
    assert_eq!(subst.get(v), Some(TypeId::ANY));
}

#[test]
fn function_shapes_are_rebuilt() {
    let interner = TypeInterner::new();
    let t = interner.intern_string("T");
    let t_param = interner.type_param(t);
    let shape = FunctionShape::new(
        vec![ParamInfo {
            name: Some(interner.intern_string("value")),
            ty: t_param,
            kind: ParamKind::Required,
        }],
        interner.array(t_param),
    );
    let generic = interner.function(shape);
    let subst = TypeSubstitution::from_args(&[t], &[TypeId::INTEGER]);
    let concrete = instantiate_type(&interner, generic, &subst);
    let shape = crate::visitor::function_shape_of(&interner, concrete).expect("function");
    assert_eq!(shape.params[0].ty, TypeId::INTEGER);
    assert_eq!(shape.return_type, interner.array(TypeId::INTEGER));
}

#[test]
fn method_type_parameters_shadow_outer_ones() {
    let interner = TypeInterner::new();
    let t = interner.intern_string("T");
    let t_param = interner.type_param(t);
    let mut shape = FunctionShape::new(vec![], t_param);
    shape.type_params = vec![t];
    let generic = interner.function(shape);
    let subst = TypeSubstitution::from_args(&[t], &[TypeId::INTEGER]);
    assert_eq!(instantiate_type(&interner, generic, &subst), generic);
}

#[test]
fn self_is_replaced_by_the_receiver() {
    let interner = TypeInterner::new();
    let user = interner.instance_named("User", vec![]);
    let returns_self = interner.proc_type(vec![], TypeId::SELF);
    let expected = interner.proc_type(vec![], user);
    assert_eq!(substitute_self_type(&interner, returns_self, user), expected);
    assert_eq!(substitute_self_type(&interner, TypeId::SELF, user), user);
}

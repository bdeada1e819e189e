use std::mem;

use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{Expr, ExprKind, NodeId, Program},
        types::Type,
    },
    errors::errors::ErrorImpl,
};

use super::{
    builtins::{lookup_builtin_function, lookup_builtin_type},
    cache::{ExprKey, TypeCache},
    compat::{can_cast, fits_int, is_compatible, is_lvalue, promote, same_type},
    context::ContextTracker,
    infer::char_code,
    type_checker::{CheckerOptions, TypeChecker},
};

fn empty_checker() -> TypeChecker {
    TypeChecker::new(Program { modules: vec![] }, CheckerOptions::default())
}

fn key(node: u32) -> ExprKey {
    ExprKey {
        module: 0,
        node: NodeId(node),
        kind: mem::discriminant(&ExprKind::Unreachable),
    }
}

#[test]
fn test_fits_int_bounds() {
    assert!(fits_int(255, false, 8));
    assert!(!fits_int(256, false, 8));
    assert!(!fits_int(-1, false, 8));
    assert!(fits_int(-128, true, 8));
    assert!(!fits_int(128, true, 8));
    assert!(fits_int(1, false, 1));
    assert!(!fits_int(2, false, 1));
    assert!(fits_int(i128::MAX, false, 128));
}

#[test]
fn test_promotion() {
    assert_eq!(promote(&Type::comptime_int(None), &Type::int(true, 16)), Type::int(true, 16));
    assert_eq!(promote(&Type::u8(), &Type::int(true, 16)), Type::int(true, 16));
    assert_eq!(promote(&Type::float(32), &Type::float(64)), Type::float(64));
    assert_eq!(promote(&Type::i32(), &Type::float(32)), Type::float(32));
    assert_eq!(promote(&Type::int(true, 64), &Type::float(32)), Type::float(64));
    assert_eq!(promote(&Type::float(16), &Type::int(false, 48)), Type::float(64));
    assert_eq!(
        promote(&Type::comptime_int(Some(1)), &Type::comptime_float()),
        Type::comptime_float()
    );
}

#[test]
fn test_compatibility_is_reflexive() {
    let mut checker = empty_checker();
    let types = vec![
        Type::i32(),
        Type::u8(),
        Type::bool(),
        Type::float(64),
        Type::optional(Type::i32()),
        Type::pointer(Type::i32(), true),
        Type::array(Type::u8(), Some(3), false),
        Type::Tuple(vec![Type::i32(), Type::bool()]),
        Type::ErrSet(vec![String::from("NotFound")]),
    ];

    for ty in types {
        assert!(is_compatible(&mut checker, &ty, &ty, None), "{} against itself", ty);
        let wrapped = Type::paren(ty.clone());
        assert!(is_compatible(&mut checker, &wrapped, &ty, None), "({}) against {}", ty, ty);
        assert!(is_compatible(&mut checker, &ty, &wrapped, None), "{} against ({})", ty, ty);
    }
}

#[test]
fn test_comptime_int_fits_unsigned_target() {
    let mut checker = empty_checker();

    assert!(is_compatible(&mut checker, &Type::u8(), &Type::comptime_int(Some(255)), None));
    assert!(!is_compatible(&mut checker, &Type::u8(), &Type::comptime_int(Some(256)), None));
    assert!(!is_compatible(&mut checker, &Type::u8(), &Type::comptime_int(Some(-1)), None));
    assert!(is_compatible(&mut checker, &Type::int(false, 1), &Type::comptime_int(Some(1)), None));
}

#[test]
fn test_runtime_widths_only_widen() {
    let mut checker = empty_checker();

    assert!(is_compatible(&mut checker, &Type::int(true, 64), &Type::i32(), None));
    assert!(!is_compatible(&mut checker, &Type::int(true, 16), &Type::i32(), None));
    assert!(is_compatible(&mut checker, &Type::float(64), &Type::i32(), None));
    assert!(!is_compatible(&mut checker, &Type::i32(), &Type::float(32), None));
    assert!(!is_compatible(&mut checker, &Type::i32(), &Type::bool(), None));
}

#[test]
fn test_optional_and_null() {
    let mut checker = empty_checker();
    let optional = Type::optional(Type::i32());

    assert!(is_compatible(&mut checker, &optional, &Type::null(), None));
    assert!(is_compatible(&mut checker, &optional, &Type::comptime_int(Some(3)), None));
    assert!(!is_compatible(&mut checker, &Type::i32(), &Type::null(), None));
    assert!(!is_compatible(&mut checker, &optional, &Type::optional(Type::int(true, 16)), None));
}

#[test]
fn test_pointer_mutability() {
    let mut checker = empty_checker();

    assert!(is_compatible(
        &mut checker,
        &Type::pointer(Type::i32(), false),
        &Type::pointer(Type::i32(), true),
        None
    ));
    assert!(!is_compatible(
        &mut checker,
        &Type::pointer(Type::i32(), true),
        &Type::pointer(Type::i32(), false),
        None
    ));
}

#[test]
fn test_same_type_rules() {
    assert!(same_type(&Type::comptime_int(Some(1)), &Type::comptime_int(Some(2))));
    assert!(same_type(
        &Type::array(Type::u8(), Some(2), true),
        &Type::array(Type::u8(), Some(2), false)
    ));
    assert!(!same_type(&Type::pointer(Type::u8(), true), &Type::pointer(Type::u8(), false)));
    assert!(!same_type(&Type::i32(), &Type::int(false, 32)));
}

#[test]
fn test_cast_matrix() {
    let mut checker = empty_checker();

    assert!(can_cast(&mut checker, &Type::i32(), &Type::bool()));
    assert!(!can_cast(&mut checker, &Type::float(32), &Type::bool()));
    assert!(can_cast(&mut checker, &Type::i32(), &Type::float(64)));
    assert!(can_cast(&mut checker, &Type::pointer(Type::u8(), false), &Type::usize()));
    assert!(!can_cast(&mut checker, &Type::bool(), &Type::i32()));
}

#[test]
fn test_lvalues() {
    assert!(is_lvalue(&Expr::ident("x")));
    assert!(is_lvalue(&Expr::paren(Expr::ident("x"))));
    assert!(is_lvalue(&Expr::deref(Expr::ident("p"))));
    assert!(is_lvalue(&Expr::member(Expr::ident("point"), "x")));
    assert!(!is_lvalue(&Expr::call(Expr::ident("f"), vec![])));
    assert!(!is_lvalue(&Expr::int("1")));
}

#[test]
fn test_cache_evicts_oldest_half() {
    let mut cache = TypeCache::new(4);
    for node in 0..4 {
        cache.insert(key(node), Type::i32());
    }
    assert_eq!(cache.len(), 4);

    cache.insert(key(4), Type::bool());

    assert_eq!(cache.len(), 3);
    assert!(cache.get(&key(0)).is_none());
    assert!(cache.get(&key(1)).is_none());
    assert_eq!(cache.get(&key(2)), Some(&Type::i32()));
    assert_eq!(cache.get(&key(4)), Some(&Type::bool()));
}

#[test]
fn test_cache_trial_rolls_back_inserts() {
    let mut cache = TypeCache::new(8);
    cache.insert(key(0), Type::i32());

    cache.begin_trial();
    cache.insert(key(0), Type::bool());
    cache.insert(key(1), Type::u8());
    assert_eq!(cache.get(&key(1)), Some(&Type::u8()));
    cache.rollback_trial();

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&key(0)), Some(&Type::i32()));
    assert!(cache.get(&key(1)).is_none());
}

#[test]
fn test_cache_with_zero_capacity_stores_nothing() {
    let mut cache = TypeCache::new(0);
    cache.insert(key(0), Type::i32());

    assert!(cache.is_empty());
}

#[test]
fn test_char_codes() {
    assert_eq!(char_code("a"), Some(97));
    assert_eq!(char_code("€"), Some(0x20AC));
    assert_eq!(char_code("\\n"), Some(10));
    assert_eq!(char_code("\\x7f"), Some(127));
    assert_eq!(char_code("\\u{1F600}"), Some(0x1F600));
    assert_eq!(char_code("\\'"), Some(39));
    assert_eq!(char_code(""), None);
}

#[test]
fn test_builtin_types() {
    assert_eq!(lookup_builtin_type("u7"), Ok(Some(Type::int(false, 7))));
    assert_eq!(lookup_builtin_type("i128"), Ok(Some(Type::int(true, 128))));
    assert_eq!(lookup_builtin_type("usize"), Ok(Some(Type::usize())));
    assert_eq!(lookup_builtin_type("f80"), Ok(Some(Type::float(80))));
    assert_eq!(lookup_builtin_type("Point"), Ok(None));
    assert_eq!(
        lookup_builtin_type("i129"),
        Err(ErrorImpl::InvalidTypeWidth {
            type_: String::from("i129")
        })
    );
    assert!(lookup_builtin_type("u0").is_err());
    assert!(lookup_builtin_type("f24").is_err());
}

#[test]
fn test_builtin_functions() {
    let assert_fn = lookup_builtin_function("@assert").unwrap();
    assert_eq!(assert_fn.params.len(), 1);
    assert!(!assert_fn.variadic);
    assert!(lookup_builtin_function("@print").unwrap().variadic);
    assert!(lookup_builtin_function("@nope").is_none());
}

#[test]
fn test_context_expected_types_mask() {
    let mut context = ContextTracker::new();
    context.push_expected(Some(Type::i32()));
    context.push_expected(None);
    assert_eq!(context.current_expected(), None);

    context.pop_expected();
    assert_eq!(context.current_expected(), Some(&Type::i32()));
}

#[test]
fn test_context_snapshot_restores_loops() {
    let mut context = ContextTracker::new();
    context.enter_loop();
    let snapshot = context.snapshot();

    context.enter_loop();
    context.push_declaration("x");
    assert_eq!(context.loop_depth(), 2);

    context.restore(snapshot);
    assert_eq!(context.loop_depth(), 1);
    assert_eq!(context.current_declaration(), None);

    let saved = context.reset_loops();
    assert!(!context.is_in_loop());
    context.restore_loops(saved);
    assert!(context.is_in_loop());
}

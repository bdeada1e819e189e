//! Integration tests for whole-program checking.
//!
//! These tests build programs with the AST constructors, run a full
//! `TypeChecker::handle` pass over them and look at the diagnostics and
//! symbol types it leaves behind.

use pretty_assertions::assert_eq;
use sema::{
    ast::{
        ast::{Expr, Module, Mutability, Program, Stmt, Visibility},
        expressions::{BinaryOp, PrefixOp},
        statements::{EnumDef, ErrorDecl, FieldDecl, FuncDef, Param, StructDef, VariantDecl},
        types::Type,
    },
    errors::errors::ErrorImpl,
    CheckerOptions, TypeChecker,
};

fn checker_for(modules: Vec<Module>, options: CheckerOptions) -> TypeChecker {
    TypeChecker::new(Program { modules }, options)
}

/// Checks a single `main` module and returns the finished session.
fn check(body: Vec<Stmt>) -> (bool, TypeChecker) {
    let mut checker = checker_for(vec![Module::new("main", body)], CheckerOptions::default());
    let ok = checker.handle();
    (ok, checker)
}

fn type_of(checker: &TypeChecker, name: &str) -> Option<Type> {
    checker
        .scopes()
        .all_symbols()
        .find(|symbol| symbol.name == name)
        .and_then(|symbol| symbol.ty.clone())
}

fn let_(name: &str, ty: Option<Type>, value: Expr) -> Stmt {
    Stmt::let_(name, Mutability::Immutable, ty, Some(value))
}

fn error_set(name: &str, members: &[&str]) -> Stmt {
    Stmt::def(
        name,
        None,
        Expr::type_expr(Type::ErrSet(members.iter().map(|member| member.to_string()).collect())),
    )
}

fn color_enum() -> Stmt {
    Stmt::enum_def(EnumDef::new(
        "Color",
        vec![
            VariantDecl::new("Red", None),
            VariantDecl::new("Green", None),
            VariantDecl::new("Blue", None),
        ],
        vec![],
    ))
}

fn color(variant: &str) -> Expr {
    Expr::member(Expr::ident("Color"), variant)
}

// LITERALS AND DECLARATIONS

#[test]
fn test_comptime_literal_fits_unsigned() {
    let (ok, checker) = check(vec![let_("a", Some(Type::u8()), Expr::int("255"))]);
    assert!(ok);
    assert!(checker.diagnostics().is_empty());

    let (ok, checker) = check(vec![let_("b", Some(Type::u8()), Expr::int("256"))]);
    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch"]);

    let (_, checker) = check(vec![let_("c", Some(Type::u8()), Expr::int("-1"))]);
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch"]);
}

#[test]
fn test_signed_literal_overflow() {
    let (ok, checker) = check(vec![let_("c", Some(Type::int(true, 8)), Expr::int("200"))]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ArithmeticOverflow"]);
}

#[test]
fn test_array_size_mismatch() {
    let (ok, checker) = check(vec![let_(
        "x",
        Some(Type::array(Type::i32(), Some(3), false)),
        Expr::array(vec![Expr::int("1"), Expr::int("2")]),
    )]);

    assert!(!ok);
    let errors: Vec<&ErrorImpl> = checker.diagnostics().iter().map(|d| d.error.get_impl()).collect();
    assert_eq!(
        errors,
        vec![&ErrorImpl::ArraySizeMismatch {
            expected: 3,
            received: 2
        }]
    );
}

#[test]
fn test_character_literal_ranges() {
    let (ok, _) = check(vec![let_("c", Some(Type::u8()), Expr::char_lit("a"))]);
    assert!(ok);

    let (ok, checker) = check(vec![let_("c", Some(Type::u8()), Expr::char_lit("€"))]);
    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ArithmeticOverflow"]);

    let (ok, checker) = check(vec![let_("c", None, Expr::char_lit("€"))]);
    assert!(ok);
    assert_eq!(type_of(&checker, "c"), Some(Type::int(false, 21)));

    let (ok, checker) = check(vec![let_("c", None, Expr::char_lit("\\u{1F600}"))]);
    assert!(ok);
    assert_eq!(type_of(&checker, "c"), Some(Type::int(false, 21)));
}

#[test]
fn test_mutable_bindings_concretize_comptime_numbers() {
    let (ok, checker) = check(vec![
        Stmt::let_("n", Mutability::Mutable, None, Some(Expr::int("5"))),
        Stmt::let_("f", Mutability::Mutable, None, Some(Expr::float("1.5"))),
        let_("k", None, Expr::int("5")),
    ]);

    assert!(ok);
    assert_eq!(type_of(&checker, "n"), Some(Type::i32()));
    assert_eq!(type_of(&checker, "f"), Some(Type::float(64)));
    assert_eq!(type_of(&checker, "k"), Some(Type::comptime_int(Some(5))));
}

#[test]
fn test_let_without_type_or_value() {
    let (ok, checker) = check(vec![Stmt::let_("x", Mutability::Mutable, None, None)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["CannotInferType"]);
}

#[test]
fn test_undefined_identifier() {
    let (ok, checker) = check(vec![let_("y", None, Expr::ident("z"))]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["UndefinedIdentifier"]);
}

#[test]
fn test_module_symbols_are_hoisted() {
    let func = FuncDef::new("f", vec![], Some(Type::i32()), vec![Stmt::ret(Some(Expr::ident("later")))]);
    let (ok, checker) = check(vec![Stmt::func(func), let_("later", Some(Type::i32()), Expr::int("1"))]);

    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_index_out_of_bounds() {
    let (ok, checker) = check(vec![
        let_("a", None, Expr::array(vec![Expr::int("1"), Expr::int("2"), Expr::int("3")])),
        let_("b", None, Expr::index(Expr::ident("a"), Expr::int("5"))),
    ]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["IndexOutOfBounds"]);
}

// TYPE DEFINITIONS

#[test]
fn test_self_referential_struct_is_circular() {
    let node = StructDef::new(
        "Node",
        vec![
            FieldDecl::new("value", Type::i32()),
            FieldDecl::new("next", Type::ident("Node")),
        ],
        vec![],
    );
    let (ok, checker) = check(vec![Stmt::struct_def(node)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["CircularTypeDependency"]);
}

#[test]
fn test_indirection_breaks_struct_cycles() {
    for next in [
        Type::optional(Type::ident("Node")),
        Type::pointer(Type::ident("Node"), false),
    ] {
        let node = StructDef::new(
            "Node",
            vec![FieldDecl::new("value", Type::i32()), FieldDecl::new("next", next)],
            vec![],
        );
        let (ok, checker) = check(vec![Stmt::struct_def(node)]);
        assert!(ok, "{:?}", checker.diagnostics().names());
    }
}

#[test]
fn test_static_fields_cannot_be_mutable() {
    let config = StructDef::new(
        "Config",
        vec![FieldDecl::new("limit", Type::i32())
            .with_visibility(Visibility::Static)
            .with_default(Expr::int("3"))],
        vec![],
    );
    let (ok, checker) = check(vec![Stmt::struct_def(config)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["MutabilityMismatch"]);
}

#[test]
fn test_static_field_access() {
    let counter = StructDef::new(
        "Counter",
        vec![
            FieldDecl::new("count", Type::i32())
                .with_visibility(Visibility::Static)
                .with_mutability(Mutability::Immutable)
                .with_default(Expr::int("0")),
            FieldDecl::new("value", Type::i32()),
        ],
        vec![],
    );
    let (ok, checker) = check(vec![
        Stmt::struct_def(counter),
        let_("c", None, Expr::object(Some("Counter"), vec![("value", Expr::int("1"))])),
        let_("through_type", None, Expr::member(Expr::ident("Counter"), "count")),
        let_("through_instance", None, Expr::member(Expr::ident("c"), "count")),
    ]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["InvalidStaticAccess"]);
    assert_eq!(type_of(&checker, "through_type"), Some(Type::i32()));
}

#[test]
fn test_struct_construction_requires_fields() {
    let point = StructDef::new(
        "Point",
        vec![FieldDecl::new("x", Type::i32()), FieldDecl::new("y", Type::i32())],
        vec![],
    );
    let (ok, checker) = check(vec![
        Stmt::struct_def(point),
        let_("p", None, Expr::object(Some("Point"), vec![("x", Expr::int("1"))])),
        let_(
            "q",
            None,
            Expr::object(
                Some("Point"),
                vec![("x", Expr::int("1")), ("y", Expr::int("2")), ("z", Expr::int("3"))],
            ),
        ),
    ]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["MissingStructField", "SymbolNotFound"]);
}

#[test]
fn test_anonymous_literal_takes_expected_struct() {
    let point = StructDef::new(
        "Point",
        vec![FieldDecl::new("x", Type::i32()), FieldDecl::new("y", Type::i32())],
        vec![],
    );
    let (ok, checker) = check(vec![
        Stmt::struct_def(point),
        let_(
            "p",
            Some(Type::ident("Point")),
            Expr::object(None, vec![("x", Expr::int("1")), ("y", Expr::int("2"))]),
        ),
    ]);

    assert!(ok, "{:?}", checker.diagnostics().names());
}

fn nested_union_program(inner_field: &str) -> Vec<Stmt> {
    let record = |name: &str, field: &str, ty: Type| Stmt::struct_def(StructDef::new(name, vec![FieldDecl::new(field, ty)], vec![]));
    vec![
        record("S1", "p", Type::i32()),
        record("S2", "q", Type::i32()),
        record("A", "inner", Type::ident("S1")),
        record("B", "inner", Type::ident("S2")),
        let_(
            "v",
            Some(Type::Union(vec![Type::ident("A"), Type::ident("B")])),
            Expr::object(None, vec![("inner", Expr::object(None, vec![(inner_field, Expr::int("1"))]))]),
        ),
    ]
}

#[test]
fn test_anonymous_literal_picks_fitting_union_member() {
    let (ok, checker) = check(nested_union_program("q"));
    assert!(ok, "{:?}", checker.diagnostics().names());

    let (ok, checker) = check(nested_union_program("p"));
    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_anonymous_literal_fitting_no_union_member() {
    let (ok, checker) = check(nested_union_program("r"));

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch"]);
}

#[test]
fn test_enums_are_compatible_only_with_themselves() {
    let shade = Stmt::enum_def(EnumDef::new(
        "Shade",
        vec![
            VariantDecl::new("Red", None),
            VariantDecl::new("Green", None),
            VariantDecl::new("Blue", None),
        ],
        vec![],
    ));
    let func = FuncDef::new(
        "f",
        vec![Param::new("c", Type::ident("Color"))],
        None,
        vec![
            let_("same", Some(Type::ident("Color")), Expr::ident("c")),
            let_("other", Some(Type::ident("Shade")), Expr::ident("c")),
        ],
    );
    let (ok, checker) = check(vec![color_enum(), shade, Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch"]);
}

#[test]
fn test_method_visibility() {
    let method = |visibility| {
        FuncDef::new(
            "get",
            vec![],
            Some(Type::i32()),
            vec![Stmt::ret(Some(Expr::member(Expr::ident("self"), "x")))],
        )
        .with_visibility(visibility)
    };
    let program = |visibility| {
        vec![
            Stmt::struct_def(StructDef::new(
                "Point",
                vec![FieldDecl::new("x", Type::i32())],
                vec![method(visibility)],
            )),
            let_("p", None, Expr::object(Some("Point"), vec![("x", Expr::int("1"))])),
            let_("v", None, Expr::call(Expr::member(Expr::ident("p"), "get"), vec![])),
        ]
    };

    let (ok, checker) = check(program(Visibility::Public));
    assert!(ok, "{:?}", checker.diagnostics().names());
    assert_eq!(type_of(&checker, "v"), Some(Type::i32()));

    let (ok, checker) = check(program(Visibility::Private));
    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["SymbolNotAccessible"]);
}

#[test]
fn test_payload_variant_needs_construction() {
    let shape = EnumDef::new(
        "Shape",
        vec![
            VariantDecl::new("Circle", Some(Type::float(64))),
            VariantDecl::new("Empty", None),
        ],
        vec![],
    );
    let (ok, checker) = check(vec![
        Stmt::enum_def(shape),
        let_(
            "built",
            None,
            Expr::call(Expr::member(Expr::ident("Shape"), "Circle"), vec![Expr::float("1.5")]),
        ),
        let_("bare", None, Expr::member(Expr::ident("Shape"), "Circle")),
    ]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch"]);
}

// FUNCTIONS

#[test]
fn test_missing_return_statement() {
    let func = FuncDef::new("f", vec![], Some(Type::i32()), vec![let_("x", None, Expr::int("1"))]);
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["MissingReturnStatement"]);
}

#[test]
fn test_throw_satisfies_return_with_error_type() {
    let func = FuncDef::new(
        "f",
        vec![],
        Some(Type::i32()),
        vec![Stmt::throw(Expr::member(Expr::ident("FileError"), "NotFound"))],
    )
    .with_error(ErrorDecl::Any);
    let (ok, checker) = check(vec![error_set("FileError", &["NotFound"]), Stmt::func(func)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_call_arity_honors_defaults() {
    let add = FuncDef::new(
        "add",
        vec![
            Param::new("a", Type::i32()),
            Param::new("b", Type::i32()).with_default(Expr::int("0")),
        ],
        Some(Type::i32()),
        vec![Stmt::ret(Some(Expr::binary(BinaryOp::Add, Expr::ident("a"), Expr::ident("b"))))],
    );
    let call = |args: Vec<Expr>| Expr::call(Expr::ident("add"), args);
    let (ok, checker) = check(vec![
        Stmt::func(add),
        let_("none", None, call(vec![])),
        let_("one", None, call(vec![Expr::int("1")])),
        let_("three", None, call(vec![Expr::int("1"), Expr::int("2"), Expr::int("3")])),
    ]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["TooFewArguments", "TooManyArguments"]);
    assert_eq!(type_of(&checker, "one"), Some(Type::i32()));
}

#[test]
fn test_parameters_cannot_be_public() {
    let mut param = Param::new("a", Type::i32());
    param.visibility = Visibility::Public;
    let func = FuncDef::new("f", vec![param], None, vec![]);
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["InvalidParameterVisibility"]);
}

#[test]
fn test_return_outside_function() {
    let (ok, checker) = check(vec![Stmt::ret(None)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ReturnOutsideFunction"]);
}

// ERRORS

#[test]
fn test_throw_must_match_declared_error_set() {
    let open = |thrown: Expr| {
        FuncDef::new("open", vec![], None, vec![Stmt::throw(thrown)])
            .with_error(ErrorDecl::Ident(String::from("FileError")))
    };
    let sets = || {
        vec![
            error_set("FileError", &["NotFound", "Denied"]),
            error_set("NetError", &["Timeout"]),
        ]
    };

    let mut body = sets();
    body.push(Stmt::func(open(Expr::member(Expr::ident("NetError"), "Timeout"))));
    let (ok, checker) = check(body);
    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ThrowTypeMismatch"]);

    let mut body = sets();
    body.push(Stmt::func(open(Expr::member(Expr::ident("FileError"), "NotFound"))));
    let (ok, checker) = check(body);
    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_throw_through_self_group() {
    let func = FuncDef::new(
        "f",
        vec![],
        None,
        vec![Stmt::throw(Expr::member(Expr::ident("selferr"), "Bad"))],
    )
    .with_error(ErrorDecl::SelfGroup(vec![String::from("Bad")]));
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_throw_without_error_type() {
    let func = FuncDef::new(
        "f",
        vec![],
        None,
        vec![Stmt::throw(Expr::member(Expr::ident("FileError"), "NotFound"))],
    );
    let (ok, checker) = check(vec![error_set("FileError", &["NotFound"]), Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ThrowWithoutErrorType"]);
}

#[test]
fn test_self_group_only_accepts_selferr_members() {
    let func = FuncDef::new(
        "f",
        vec![],
        None,
        vec![Stmt::throw(Expr::member(Expr::ident("Other"), "Bad"))],
    )
    .with_error(ErrorDecl::SelfGroup(vec![String::from("Bad")]));
    let (ok, checker) = check(vec![error_set("Other", &["Bad"]), Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ThrowTypeMismatch"]);
}

// REFERENCES AND ASSIGNMENT

#[test]
fn test_reference_requires_lvalue() {
    let f = FuncDef::new("f", vec![], Some(Type::i32()), vec![Stmt::ret(Some(Expr::int("1")))]);
    let (ok, checker) = check(vec![
        Stmt::func(f),
        let_("p", None, Expr::reference(Expr::call(Expr::ident("f"), vec![]))),
    ]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["InvalidReference"]);
}

#[test]
fn test_reference_to_mutable_local() {
    let g = FuncDef::new(
        "g",
        vec![],
        None,
        vec![
            Stmt::let_("x", Mutability::Mutable, Some(Type::i32()), Some(Expr::int("5"))),
            let_("p", None, Expr::reference(Expr::ident("x"))),
        ],
    );
    let (ok, checker) = check(vec![Stmt::func(g)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
    assert_eq!(type_of(&checker, "p"), Some(Type::pointer(Type::i32(), true)));
}

#[test]
fn test_assignment_to_immutable_binding() {
    let body = |mutability| {
        vec![Stmt::func(FuncDef::new(
            "f",
            vec![],
            None,
            vec![
                Stmt::let_("x", mutability, Some(Type::i32()), Some(Expr::int("1"))),
                Stmt::expr(Expr::assign(Expr::ident("x"), Expr::int("2"))),
            ],
        ))]
    };

    let (ok, _) = check(body(Mutability::Mutable));
    assert!(ok);

    let (ok, checker) = check(body(Mutability::Immutable));
    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["MutabilityMismatch"]);
}

#[test]
fn test_assignment_through_const_pointer() {
    let func = FuncDef::new(
        "f",
        vec![Param::new("p", Type::pointer(Type::i32(), false))],
        None,
        vec![Stmt::expr(Expr::assign(Expr::deref(Expr::ident("p")), Expr::int("2")))],
    );
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["MutabilityMismatch"]);
}

#[test]
fn test_logical_not_requires_bool() {
    let (ok, checker) = check(vec![let_("b", None, Expr::prefix(PrefixOp::Not, Expr::int("1")))]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch"]);
    assert_eq!(type_of(&checker, "b"), Some(Type::bool()));
}

#[test]
fn test_orelse_results() {
    let func = FuncDef::new(
        "f",
        vec![
            Param::new("o", Type::optional(Type::i32())),
            Param::new("backup", Type::optional(Type::i32())),
        ],
        None,
        vec![
            let_("either", None, Expr::orelse(Expr::ident("o"), Expr::null())),
            let_("chained", None, Expr::orelse(Expr::ident("o"), Expr::ident("backup"))),
            let_("unwrapped", None, Expr::orelse(Expr::ident("o"), Expr::int("5"))),
        ],
    );
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
    assert_eq!(type_of(&checker, "either"), Some(Type::Union(vec![Type::i32(), Type::null()])));
    assert_eq!(type_of(&checker, "chained"), Some(Type::optional(Type::i32())));
    assert_eq!(type_of(&checker, "unwrapped"), Some(Type::i32()));
}

#[test]
fn test_string_concatenation_mutability() {
    let func = FuncDef::new(
        "f",
        vec![
            Param::new("buffer", Type::array(Type::u8(), Some(3), true)),
            Param::new("frozen", Type::array(Type::u8(), Some(2), false)),
        ],
        None,
        vec![
            let_("joined", None, Expr::binary(BinaryOp::Add, Expr::ident("buffer"), Expr::string("hi"))),
            let_("mixed", None, Expr::binary(BinaryOp::Add, Expr::ident("buffer"), Expr::ident("frozen"))),
        ],
    );
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["MutabilityMismatch"]);
    assert_eq!(type_of(&checker, "joined"), Some(Type::array(Type::u8(), Some(5), true)));
}

#[test]
fn test_member_access_through_nested_optionals() {
    let point = StructDef::new("Point", vec![FieldDecl::new("x", Type::i32())], vec![]);
    let func = FuncDef::new(
        "f",
        vec![Param::new("p", Type::optional(Type::optional(Type::ident("Point"))))],
        None,
        vec![let_("x_of", None, Expr::member(Expr::ident("p"), "x"))],
    );
    let (ok, checker) = check(vec![Stmt::struct_def(point), Stmt::func(func)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
    assert_eq!(type_of(&checker, "x_of"), Some(Type::optional(Type::i32())));
}

#[test]
fn test_typeof_and_sizeof() {
    let (ok, checker) = check(vec![
        let_("t", None, Expr::typeof_(Expr::int("5"))),
        let_("size", None, Expr::sizeof(Expr::type_expr(Type::int(false, 32)))),
    ]);

    assert!(ok, "{:?}", checker.diagnostics().names());
    assert_eq!(type_of(&checker, "t"), Some(Type::meta()));
    assert_eq!(type_of(&checker, "size"), Some(Type::comptime_int(Some(4))));
}

#[test]
fn test_sizeof_unsized_type() {
    let (ok, checker) = check(vec![let_("size", None, Expr::sizeof(Expr::type_expr(Type::any())))]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["CannotInferType"]);
    assert_eq!(type_of(&checker, "size"), Some(Type::comptime_int(Some(0))));
}

#[test]
fn test_tuple_indexing() {
    let (ok, checker) = check(vec![
        let_("pair", None, Expr::tuple(vec![Expr::int("1"), Expr::bool_lit(true)])),
        let_("second", None, Expr::index(Expr::ident("pair"), Expr::int("1"))),
        let_("third", None, Expr::index(Expr::ident("pair"), Expr::int("2"))),
    ]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["IndexOutOfBounds"]);
    assert_eq!(type_of(&checker, "second"), Some(Type::bool()));
}

#[test]
fn test_type_operands_in_arithmetic() {
    let (ok, checker) = check(vec![let_(
        "bad",
        None,
        Expr::binary(BinaryOp::Add, Expr::type_expr(Type::i32()), Expr::int("1")),
    )]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch"]);
}

// MATCH

#[test]
fn test_non_exhaustive_enum_match() {
    let paint = FuncDef::new(
        "paint",
        vec![Param::new("c", Type::ident("Color"))],
        None,
        vec![Stmt::expr(Expr::match_(
            Expr::ident("c"),
            vec![
                (vec![color("Red")], Stmt::block(vec![])),
                (vec![color("Green")], Stmt::block(vec![])),
            ],
            None,
        ))],
    );
    let (ok, checker) = check(vec![color_enum(), Stmt::func(paint)]);

    assert!(!ok);
    let errors: Vec<&ErrorImpl> = checker.diagnostics().iter().map(|d| d.error.get_impl()).collect();
    assert_eq!(
        errors,
        vec![&ErrorImpl::NonExhaustiveMatch {
            missing: vec![String::from("Blue")]
        }]
    );
}

#[test]
fn test_default_case_makes_match_exhaustive() {
    let paint = FuncDef::new(
        "paint",
        vec![Param::new("c", Type::ident("Color"))],
        None,
        vec![Stmt::expr(Expr::match_(
            Expr::ident("c"),
            vec![(vec![color("Red")], Stmt::block(vec![]))],
            Some(Stmt::block(vec![])),
        ))],
    );
    let (ok, checker) = check(vec![color_enum(), Stmt::func(paint)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_bool_match_needs_both_values() {
    let func = FuncDef::new(
        "f",
        vec![Param::new("b", Type::bool())],
        None,
        vec![Stmt::expr(Expr::match_(
            Expr::ident("b"),
            vec![(vec![Expr::bool_lit(true)], Stmt::block(vec![]))],
            None,
        ))],
    );
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["NonExhaustiveMatch"]);
}

// CONTROL FLOW

#[test]
fn test_code_after_return_is_unreachable() {
    let func = FuncDef::new(
        "f",
        vec![],
        Some(Type::i32()),
        vec![Stmt::ret(Some(Expr::int("1"))), let_("y", None, Expr::int("2"))],
    );
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["UnreachableCode"]);
}

#[test]
fn test_return_inside_if_keeps_following_code_reachable() {
    let func = FuncDef::new(
        "f",
        vec![Param::new("b", Type::bool())],
        Some(Type::i32()),
        vec![
            Stmt::expr(Expr::if_(
                Expr::ident("b"),
                Stmt::block(vec![Stmt::ret(Some(Expr::int("1")))]),
                None,
            )),
            Stmt::ret(Some(Expr::int("2"))),
        ],
    );
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_break_outside_loop() {
    let outside = FuncDef::new("f", vec![], None, vec![Stmt::break_()]);
    let (ok, checker) = check(vec![Stmt::func(outside)]);
    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ControlFlowOutsideLoop"]);

    let inside = FuncDef::new(
        "g",
        vec![],
        None,
        vec![Stmt::while_(Expr::bool_lit(true), vec![Stmt::break_()])],
    );
    let (ok, checker) = check(vec![Stmt::func(inside)]);
    assert!(ok, "{:?}", checker.diagnostics().names());
}

#[test]
fn test_for_binds_element_type() {
    let func = FuncDef::new(
        "f",
        vec![],
        None,
        vec![Stmt::for_(
            "i",
            Expr::range(Some(Expr::int("0")), Some(Expr::int("10"))),
            vec![Stmt::continue_()],
        )],
    );
    let (ok, checker) = check(vec![Stmt::func(func)]);

    assert!(ok, "{:?}", checker.diagnostics().names());
    assert_eq!(type_of(&checker, "i"), Some(Type::usize()));
}

// MODULES

#[test]
fn test_module_not_found() {
    let (ok, checker) = check(vec![Stmt::use_("missing", None, false)]);

    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["ModuleNotFound"]);
}

#[test]
fn test_module_members_must_be_exported() {
    let square = FuncDef::new(
        "square",
        vec![Param::new("n", Type::i32())],
        Some(Type::i32()),
        vec![Stmt::ret(Some(Expr::binary(BinaryOp::Mul, Expr::ident("n"), Expr::ident("n"))))],
    )
    .with_visibility(Visibility::Public);
    let math = Module::new(
        "math",
        vec![Stmt::func(square), let_("secret", Some(Type::i32()), Expr::int("7"))],
    );
    let main = Module::new(
        "main",
        vec![
            Stmt::use_("math", None, false),
            let_(
                "nine",
                None,
                Expr::call(Expr::member(Expr::ident("math"), "square"), vec![Expr::int("3")]),
            ),
            let_("hidden", None, Expr::member(Expr::ident("math"), "secret")),
        ],
    );
    let mut checker = checker_for(vec![math, main], CheckerOptions::default());

    assert!(!checker.handle());
    assert_eq!(checker.diagnostics().names(), vec!["SymbolNotExported"]);
    assert_eq!(type_of(&checker, "nine"), Some(Type::i32()));
}

// SESSION

#[test]
fn test_cast_severity_follows_options() {
    let body = || vec![let_("f", None, Expr::cast(Expr::bool_lit(true), Type::float(32)))];

    let (ok, checker) = check(body());
    assert!(!ok);
    assert_eq!(checker.diagnostics().names(), vec!["InvalidCast"]);

    let options = CheckerOptions {
        strict_casts: false,
        ..CheckerOptions::default()
    };
    let mut checker = checker_for(vec![Module::new("main", body())], options);
    assert!(checker.handle());
    assert_eq!(checker.diagnostics().names(), vec!["InvalidCast"]);
    assert_eq!(type_of(&checker, "f"), Some(Type::float(32)));
}

#[test]
fn test_handle_after_reset_checks_again() {
    let body = vec![let_("b", Some(Type::u8()), Expr::int("256"))];
    let mut checker = checker_for(vec![Module::new("main", body)], CheckerOptions::default());

    assert!(!checker.handle());
    checker.reset();
    assert!(!checker.handle());
    assert_eq!(checker.diagnostics().names(), vec!["TypeMismatch", "TypeMismatch"]);
}

#[test]
fn test_clean_program_passes() {
    let (ok, checker) = check(vec![
        let_("limit", Some(Type::usize()), Expr::int("10")),
        Stmt::func(FuncDef::new(
            "double",
            vec![Param::new("n", Type::i32())],
            Some(Type::i32()),
            vec![Stmt::ret(Some(Expr::binary(BinaryOp::Mul, Expr::ident("n"), Expr::int("2"))))],
        )),
        let_("four", None, Expr::call(Expr::ident("double"), vec![Expr::int("2")])),
    ]);

    assert!(ok, "{:?}", checker.diagnostics().names());
    assert!(!checker.diagnostics().has_errors());
    assert_eq!(type_of(&checker, "four"), Some(Type::i32()));
}

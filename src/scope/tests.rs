use pretty_assertions::assert_eq;

use crate::{
    ast::{
        ast::{Expr, Module, Mutability, Program, Stmt, Visibility},
        statements::{FieldDecl, FuncDef, Param, StructDef},
        types::Type,
    },
    errors::diagnostics::Diagnostics,
};

use super::{
    collector::{collect, SELF},
    scope::{ScopeKind, ScopeTree, SymbolKind},
};

fn collect_program(modules: Vec<Module>) -> (ScopeTree, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tree = collect(&Program { modules }, &mut diagnostics);
    (tree, diagnostics)
}

#[test]
fn test_module_scopes_hang_off_global() {
    let (tree, diagnostics) = collect_program(vec![Module::new("main", vec![]), Module::new("math", vec![])]);

    assert!(diagnostics.is_empty());
    let main = tree.module_scope("main").unwrap();
    assert_eq!(tree.scope_parent(main), Some(tree.global_scope()));
    assert_eq!(tree.find_scope_by_name("math", ScopeKind::Module), tree.module_scope("math"));
}

#[test]
fn test_duplicate_symbol_is_reported() {
    let (_, diagnostics) = collect_program(vec![Module::new(
        "main",
        vec![
            Stmt::let_("x", Mutability::Immutable, Some(Type::i32()), Some(Expr::int("1"))),
            Stmt::let_("x", Mutability::Immutable, Some(Type::i32()), Some(Expr::int("2"))),
        ],
    )]);

    assert_eq!(diagnostics.names(), vec!["DuplicateSymbol"]);
}

#[test]
fn test_undeclared_local_is_skipped_by_lookup() {
    let func = FuncDef::new(
        "f",
        vec![],
        None,
        vec![Stmt::let_("x", Mutability::Mutable, None, Some(Expr::int("1")))],
    );
    let func_id = func.id;
    let (mut tree, _) = collect_program(vec![Module::new(
        "main",
        vec![
            Stmt::let_("x", Mutability::Immutable, Some(Type::bool()), Some(Expr::bool_lit(true))),
            Stmt::func(func),
        ],
    )]);

    let module = tree.module_scope("main").unwrap();
    let body = tree.scope_for_node(func_id).unwrap();
    let outer = tree.lookup_local(module, "x").unwrap();
    let inner = tree.lookup_local(body, "x").unwrap();

    assert_eq!(tree.lookup_from(body, "x"), Some(outer));
    tree.get_symbol_mut(inner).declared = true;
    tree.set_current_scope(body);
    assert_eq!(tree.lookup_symbol("x"), Some(inner));
}

#[test]
fn test_instance_methods_get_implicit_self() {
    let method = FuncDef::new("area", vec![], Some(Type::i32()), vec![]);
    let constructor = FuncDef::new("new", vec![Param::new("w", Type::i32())], None, vec![])
        .with_visibility(Visibility::Static);
    let (method_id, constructor_id) = (method.id, constructor.id);
    let def = StructDef::new("Rect", vec![FieldDecl::new("w", Type::i32())], vec![method, constructor]);
    let (tree, diagnostics) = collect_program(vec![Module::new("main", vec![Stmt::struct_def(def)])]);

    assert!(diagnostics.is_empty());
    let method_scope = tree.scope_for_node(method_id).unwrap();
    let receiver = tree.lookup_local(method_scope, SELF).unwrap();
    let receiver = tree.get_symbol(receiver);
    assert_eq!(receiver.kind, SymbolKind::Parameter);
    assert!(matches!(&receiver.ty, Some(Type::Struct(s)) if s.name == "Rect"));

    let constructor_scope = tree.scope_for_node(constructor_id).unwrap();
    assert_eq!(tree.lookup_local(constructor_scope, SELF), None);
    assert!(tree.is_within(constructor_scope, tree.module_scope("main").unwrap()));
}

#[test]
fn test_wildcard_import_exposes_public_symbols_only() {
    let mut exported = Stmt::let_("pi", Mutability::Immutable, Some(Type::float(64)), Some(Expr::float("3.14")));
    if let crate::ast::ast::StmtKind::Let(let_stmt) = &mut exported.kind {
        let_stmt.visibility = Visibility::Public;
    }
    let hidden = Stmt::let_("tau", Mutability::Immutable, Some(Type::float(64)), Some(Expr::float("6.28")));
    let (tree, _) = collect_program(vec![
        Module::new("main", vec![Stmt::use_("math", None, true)]),
        Module::new("math", vec![exported, hidden]),
    ]);

    let main = tree.module_scope("main").unwrap();
    assert!(tree.lookup_from(main, "pi").is_some());
    assert_eq!(tree.lookup_from(main, "tau"), None);

    let module_symbol = tree.get_symbol(tree.lookup_from(main, "math").unwrap());
    assert_eq!(module_symbol.kind, SymbolKind::Use);
    assert_eq!(module_symbol.metadata.scope, tree.module_scope("math"));
}

#[test]
fn test_error_set_definition_creates_member_scope() {
    let (tree, _) = collect_program(vec![Module::new(
        "main",
        vec![Stmt::def(
            "FileError",
            None,
            Expr::type_expr(Type::ErrSet(vec!["NotFound".to_string(), "Denied".to_string()])),
        )],
    )]);

    let main = tree.module_scope("main").unwrap();
    let set = tree.find_child_scope_by_name(main, "FileError", ScopeKind::ErrorSet).unwrap();
    let members: Vec<&str> = tree
        .get_scope(set)
        .symbols()
        .iter()
        .map(|id| tree.get_symbol(*id).name.as_str())
        .collect();
    assert_eq!(members, vec!["NotFound", "Denied"]);
    assert!(tree.get_symbol(tree.lookup_local(main, "FileError").unwrap()).metadata.denotes_type);
}

#[test]
fn test_default_arguments_lower_required_count() {
    let func = FuncDef::new(
        "greet",
        vec![
            Param::new("name", Type::string(0)),
            Param::new("times", Type::i32()).with_default(Expr::int("1")),
        ],
        None,
        vec![],
    );
    let (tree, _) = collect_program(vec![Module::new("main", vec![Stmt::func(func)])]);

    let main = tree.module_scope("main").unwrap();
    let greet = tree.get_symbol(tree.lookup_local(main, "greet").unwrap());
    assert_eq!(greet.metadata.required_params(), 1);
    assert_eq!(greet.metadata.default_arg_indices(), vec![1]);
}

use tracing::debug;

use crate::{
    ast::{
        ast::{Expr, ExprKind, Module, Stmt, StmtKind},
        expressions::{BinaryExpr, BinaryOp, Literal, MemberExpr, Postfix},
        statements::{Block, DefStmt, ErrorMode, ForStmt, LetStmt, UseStmt, WhileStmt},
        types::{ArraySize, PrimitiveType, Type},
    },
    errors::errors::{Error, ErrorImpl},
    scope::{
        collector::SELF_ERR,
        scope::{SymbolId, SymbolKind},
    },
    Span, MISMATCH, REPORT,
};

use super::{
    compat::{fits_int, is_compatible},
    functions::validate_function,
    infer::{char_code, infer_expr, infer_with_expected},
    resolve::{concretize, contains_type, expr_as_type, normalize, resolve_type},
    structs::{validate_enum, validate_struct},
    type_checker::TypeChecker,
};

#[tracing::instrument(skip_all, fields(module = %module.name))]
pub fn validate_module(type_checker: &mut TypeChecker, module: &Module) -> Result<(), Error> {
    let scope = type_checker.scopes.scope_for_node(module.id).ok_or_else(|| {
        Error::internal(format!("module `{}` has no scope", module.name), Span::null())
    })?;

    type_checker.context.set_module(&module.name, &module.path);
    debug!(statements = module.body.len(), "validating module");

    type_checker.with_scope(scope, |type_checker| validate_statements(type_checker, &module.body));
    Ok(())
}

/// Validates a statement list in order. Everything after a statement that
/// always exits is reported as unreachable and not checked further.
pub fn validate_statements(type_checker: &mut TypeChecker, stmts: &[Stmt]) {
    let mut exited = false;
    for stmt in stmts {
        if exited {
            REPORT!(type_checker, ErrorImpl::UnreachableCode, stmt.span);
            mark_declared(type_checker, stmt);
            continue;
        }
        if let Err(error) = validate_stmt(type_checker, stmt) {
            type_checker.report_internal(error);
        }
        exited = always_exits(stmt);
    }
}

fn always_exits(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) | StmtKind::Throw(_) => true,
        StmtKind::Expression(expr) => matches!(expr.unparen().kind, ExprKind::Unreachable),
        StmtKind::Block(block) => block.iter().any(always_exits),
        _ => false,
    }
}

/// Unreachable bindings still shadow outer ones for the rest of the block.
fn mark_declared(type_checker: &mut TypeChecker, stmt: &Stmt) {
    let name = match &stmt.kind {
        StmtKind::Let(let_stmt) => &let_stmt.name,
        StmtKind::Def(def) => &def.name,
        _ => return,
    };
    let scope = type_checker.scopes.current_scope();
    if let Some(id) = type_checker.scopes.lookup_local(scope, name) {
        type_checker.scopes.get_symbol_mut(id).declared = true;
    }
}

pub fn validate_stmt(type_checker: &mut TypeChecker, stmt: &Stmt) -> Result<(), Error> {
    type_checker.context.push_span(stmt.span.clone());
    let result = validate_stmt_kind(type_checker, stmt);
    type_checker.context.pop_span();
    result
}

fn validate_stmt_kind(type_checker: &mut TypeChecker, stmt: &Stmt) -> Result<(), Error> {
    match &stmt.kind {
        StmtKind::Expression(expr) => {
            infer_expr(type_checker, expr);
            Ok(())
        }
        StmtKind::Block(block) => validate_block(type_checker, block),
        StmtKind::Let(let_stmt) => validate_let(type_checker, let_stmt, stmt),
        StmtKind::Def(def) => validate_def(type_checker, def, stmt),
        StmtKind::Func(func) => validate_function(type_checker, func, None),
        StmtKind::Struct(def) => validate_struct(type_checker, def),
        StmtKind::Enum(def) => validate_enum(type_checker, def),
        StmtKind::Use(use_stmt) => {
            validate_use(type_checker, use_stmt, &stmt.span);
            Ok(())
        }
        StmtKind::Return(value) => {
            validate_return(type_checker, value.as_ref(), &stmt.span);
            Ok(())
        }
        StmtKind::Throw(value) => {
            validate_throw(type_checker, value, &stmt.span);
            Ok(())
        }
        StmtKind::While(while_stmt) => validate_while(type_checker, while_stmt),
        StmtKind::For(for_stmt) => validate_for(type_checker, for_stmt),
        StmtKind::Break | StmtKind::Continue => {
            if !type_checker.context.is_in_loop() {
                let keyword = if matches!(stmt.kind, StmtKind::Break) {
                    "break"
                } else {
                    "continue"
                };
                REPORT!(
                    type_checker,
                    ErrorImpl::ControlFlowOutsideLoop {
                        keyword: keyword.to_string()
                    },
                    stmt.span
                );
            }
            Ok(())
        }
    }
}

pub fn validate_block(type_checker: &mut TypeChecker, block: &Block) -> Result<(), Error> {
    let scope = type_checker
        .scopes
        .scope_for_node(block.id)
        .ok_or_else(|| Error::internal("block has no scope", block.span.clone()))?;
    type_checker.with_scope(scope, |type_checker| validate_statements(type_checker, &block.body));
    Ok(())
}

/// The symbol a declaration statement introduced in the current scope.
fn declared_symbol(type_checker: &TypeChecker, name: &str, span: &Span) -> Result<SymbolId, Error> {
    let scope = type_checker.scopes.current_scope();
    type_checker
        .scopes
        .lookup_local(scope, name)
        .ok_or_else(|| Error::internal(format!("`{}` was never collected", name), span.clone()))
}

// DECLARATIONS

fn validate_let(type_checker: &mut TypeChecker, let_stmt: &LetStmt, stmt: &Stmt) -> Result<(), Error> {
    let id = declared_symbol(type_checker, &let_stmt.name, &stmt.span)?;
    type_checker.context.push_declaration(&let_stmt.name);

    if let Some(value) = &let_stmt.value {
        check_bare_variant(type_checker, value);
    }

    let ty = match (&let_stmt.ty, &let_stmt.value) {
        (Some(annotation), value) => {
            let target = resolve_type(type_checker, annotation, &stmt.span);
            if let (Some(target), Some(value)) = (&target, value) {
                check_initializer(type_checker, target, value);
            }
            target
        }
        (None, Some(value)) => infer_with_expected(type_checker, value, None).map(|ty| {
            if let_stmt.mutability.is_mutable() {
                concretize(&ty)
            } else {
                ty
            }
        }),
        (None, None) => {
            REPORT!(
                type_checker,
                ErrorImpl::CannotInferType {
                    subject: format!("`{}` without a type or value", let_stmt.name),
                },
                stmt.span
            );
            None
        }
    };

    type_checker.context.pop_declaration();
    let symbol = type_checker.scopes.get_symbol_mut(id);
    symbol.declared = true;
    symbol.initialized |= let_stmt.value.is_some();
    symbol.is_type_checked = true;
    if symbol.ty.is_none() {
        symbol.ty = ty;
    }
    Ok(())
}

/// A variant carrying a payload names a constructor, not a value.
fn check_bare_variant(type_checker: &mut TypeChecker, value: &Expr) {
    let ExprKind::Postfix(Postfix::Member(member)) = &value.unparen().kind else {
        return;
    };
    let Some(Type::Enum(enumeration)) = expr_as_type(type_checker, &member.base) else {
        return;
    };
    if let Some(payload) = enumeration.variant(&member.member).and_then(|variant| variant.payload.as_ref()) {
        REPORT!(
            type_checker,
            MISMATCH!(format!("{}({})", member.member, payload), enumeration.name),
            value.span
        );
    }
}

/// Checks `value` against a declared type. Array literals are checked
/// element by element after their length.
pub fn check_initializer(type_checker: &mut TypeChecker, target: &Type, value: &Expr) {
    let resolved = normalize(type_checker, target);
    match (&value.unparen().kind, &resolved) {
        (
            ExprKind::Literal(Literal::Array(elements)),
            Type::Array {
                target: element_type,
                size,
                ..
            },
        ) => {
            if let Some(ArraySize::Fixed(length)) = size {
                let received = elements.len() as u64;
                if received != *length {
                    REPORT!(
                        type_checker,
                        ErrorImpl::ArraySizeMismatch {
                            expected: *length,
                            received,
                        },
                        value.span
                    );
                    return;
                }
            }
            for element in elements {
                check_initializer(type_checker, element_type, element);
            }
        }
        (
            ExprKind::Literal(Literal::Char(text)),
            Type::Primitive(PrimitiveType::Int { signed: false, bits }),
        ) => {
            if let Some(code) = char_code(text) {
                if !fits_int(i128::from(code), false, *bits) {
                    REPORT!(
                        type_checker,
                        ErrorImpl::ArithmeticOverflow {
                            value: format!("'{}'", text),
                            ty: resolved.to_string(),
                        },
                        value.span
                    );
                }
            }
        }
        _ => {
            let Some(ty) = infer_with_expected(type_checker, value, Some(target.clone())) else {
                return;
            };
            if is_compatible(type_checker, target, &ty, Some(value)) {
                check_literal_overflow(type_checker, target, &ty, &value.span);
            } else {
                REPORT!(type_checker, MISMATCH!(target, ty), value.span);
            }
        }
    }
}

/// Reports a known comptime integer that does not fit the integer type it
/// flows into.
pub fn check_literal_overflow(type_checker: &mut TypeChecker, target: &Type, source: &Type, span: &Span) {
    let Some(PrimitiveType::ComptimeInt(Some(value))) = source.as_primitive() else {
        return;
    };
    if let Type::Primitive(PrimitiveType::Int { signed, bits }) = normalize(type_checker, target) {
        if !fits_int(*value, signed, bits) {
            REPORT!(
                type_checker,
                ErrorImpl::ArithmeticOverflow {
                    value: value.to_string(),
                    ty: target.to_string(),
                },
                span
            );
        }
    }
}

fn validate_def(type_checker: &mut TypeChecker, def: &DefStmt, stmt: &Stmt) -> Result<(), Error> {
    let id = declared_symbol(type_checker, &def.name, &stmt.span)?;
    type_checker.context.push_declaration(&def.name);

    match &def.value.kind {
        ExprKind::Type(Type::ErrSet(_)) => {}
        ExprKind::Type(ty) => {
            if contains_type(type_checker, id, ty) {
                REPORT!(
                    type_checker,
                    ErrorImpl::CircularTypeDependency {
                        name: def.name.clone()
                    },
                    stmt.span
                );
            } else {
                resolve_type(type_checker, &Type::ident(&def.name), &stmt.span);
            }
        }
        _ => {
            check_bare_variant(type_checker, &def.value);
            let ty = match &def.ty {
                Some(annotation) => {
                    let target = resolve_type(type_checker, annotation, &stmt.span);
                    if let Some(target) = &target {
                        check_initializer(type_checker, target, &def.value);
                    }
                    target
                }
                None => infer_with_expected(type_checker, &def.value, None),
            };
            let symbol = type_checker.scopes.get_symbol_mut(id);
            if symbol.ty.is_none() {
                symbol.ty = ty;
            }
        }
    }

    type_checker.context.pop_declaration();
    let symbol = type_checker.scopes.get_symbol_mut(id);
    symbol.declared = true;
    symbol.is_type_checked = true;
    Ok(())
}

fn validate_use(type_checker: &mut TypeChecker, use_stmt: &UseStmt, span: &Span) {
    if type_checker.scopes.module_scope(&use_stmt.module).is_none() {
        REPORT!(
            type_checker,
            ErrorImpl::ModuleNotFound {
                module: use_stmt.module.clone()
            },
            span
        );
    }
}

// CONTROL FLOW

fn validate_return(type_checker: &mut TypeChecker, value: Option<&Expr>, span: &Span) {
    let Some(frame) = type_checker.frame.as_mut() else {
        REPORT!(type_checker, ErrorImpl::ReturnOutsideFunction, span);
        if let Some(value) = value {
            infer_expr(type_checker, value);
        }
        return;
    };
    frame.has_return = true;
    let expected = frame.return_type.clone();

    let Some(value) = value else {
        if let Some(expected) = expected {
            let resolved = normalize(type_checker, &expected);
            if !resolved.is_void() {
                REPORT!(type_checker, MISMATCH!(expected, "void"), span);
            }
        }
        return;
    };

    let Some(ty) = infer_with_expected(type_checker, value, expected.clone()) else {
        return;
    };
    let Some(expected) = expected else {
        return;
    };
    let resolved = normalize(type_checker, &expected);

    if ty.is_meta() && !resolved.is_meta() {
        REPORT!(type_checker, MISMATCH!(expected, "type"), value.span);
    } else if !is_compatible(type_checker, &expected, &ty, Some(value)) {
        REPORT!(type_checker, MISMATCH!(expected, ty), value.span);
    } else {
        check_literal_overflow(type_checker, &expected, &ty, &value.span);
    }
}

fn validate_throw(type_checker: &mut TypeChecker, value: &Expr, span: &Span) {
    let frame = match type_checker.frame.as_mut() {
        Some(frame) if frame.error_mode.is_some() => {
            frame.has_throw = true;
            frame.clone()
        }
        frame => {
            let function = frame.map_or_else(|| String::from("<module>"), |frame| frame.name.clone());
            REPORT!(type_checker, ErrorImpl::ThrowWithoutErrorType { function }, span);
            infer_expr(type_checker, value);
            return;
        }
    };

    let Some(thrown) = infer_expr(type_checker, value) else {
        return;
    };
    let thrown = normalize(type_checker, &thrown);

    if frame.error_mode == Some(ErrorMode::AnyError) {
        if !matches!(thrown, Type::ErrSet(_)) && !matches!(thrown.as_primitive(), Some(PrimitiveType::Err)) {
            REPORT!(
                type_checker,
                ErrorImpl::ThrowTypeMismatch {
                    expected: String::from("err"),
                    received: thrown.to_string(),
                },
                value.span
            );
        }
        return;
    }

    if frame.error_mode == Some(ErrorMode::SelfGroup) {
        let member = match &value.unparen().kind {
            ExprKind::Postfix(Postfix::Member(MemberExpr { base, member })) if base.ident_name() == Some(SELF_ERR) => {
                Some(member)
            }
            _ => None,
        };
        if !member.is_some_and(|member| frame.self_group.contains(member)) {
            REPORT!(
                type_checker,
                ErrorImpl::ThrowTypeMismatch {
                    expected: format!("{}{{{}}}", SELF_ERR, frame.self_group.join(", ")),
                    received: thrown.to_string(),
                },
                value.span
            );
        }
        return;
    }

    // Remaining modes throw members of one declared set.
    let allowed = match frame.error_type.as_ref().map(|ty| normalize(type_checker, ty)) {
        Some(Type::ErrSet(members)) => members,
        _ => return,
    };
    let members = thrown_members(value, &thrown);
    if members.is_empty() || members.iter().any(|member| !allowed.contains(member)) {
        REPORT!(
            type_checker,
            ErrorImpl::ThrowTypeMismatch {
                expected: Type::ErrSet(allowed).to_string(),
                received: thrown.to_string(),
            },
            value.span
        );
    }
}

/// Members a throw may raise: the named member for `Set.Member`, the whole
/// set otherwise.
fn thrown_members(value: &Expr, thrown: &Type) -> Vec<String> {
    let Type::ErrSet(members) = thrown else {
        return vec![];
    };
    match &value.unparen().kind {
        ExprKind::Postfix(Postfix::Member(MemberExpr { member, .. })) if members.contains(member) => {
            vec![member.clone()]
        }
        _ => members.clone(),
    }
}

fn validate_while(type_checker: &mut TypeChecker, while_stmt: &WhileStmt) -> Result<(), Error> {
    if let Some(condition) = infer_expr(type_checker, &while_stmt.condition) {
        let condition = normalize(type_checker, &condition);
        if !condition.is_bool() {
            REPORT!(type_checker, MISMATCH!("bool", condition), while_stmt.condition.span);
        }
    }
    type_checker.with_loop(|type_checker| validate_block(type_checker, &while_stmt.body))
}

fn validate_for(type_checker: &mut TypeChecker, for_stmt: &ForStmt) -> Result<(), Error> {
    let element = element_type(type_checker, &for_stmt.iterable);

    let scope = type_checker
        .scopes
        .scope_for_node(for_stmt.body.id)
        .ok_or_else(|| Error::internal("for body has no scope", for_stmt.body.span.clone()))?;
    if let Some(binding) = type_checker.scopes.lookup_local(scope, &for_stmt.binding) {
        type_checker.scopes.get_symbol_mut(binding).ty = element;
    }

    type_checker.with_loop(|type_checker| validate_block(type_checker, &for_stmt.body))
}

fn element_type(type_checker: &mut TypeChecker, iterable: &Expr) -> Option<Type> {
    let ty = infer_expr(type_checker, iterable)?;
    if matches!(iterable.unparen().kind, ExprKind::Range(_)) {
        return Some(Type::usize());
    }

    let resolved = match normalize(type_checker, &ty) {
        Type::Pointer { target, .. } => normalize(type_checker, &target),
        other => other,
    };
    match resolved {
        Type::Array { target, .. } => Some(*target),
        other => {
            REPORT!(type_checker, MISMATCH!("an array or range", other), iterable.span);
            None
        }
    }
}

// ASSIGNMENT

/// Validates `target = value` and the compound assignments.
pub fn validate_assignment(type_checker: &mut TypeChecker, binary: &BinaryExpr, expr: &Expr) -> Option<Type> {
    check_assignable(type_checker, &binary.left)?;
    let target = infer_expr(type_checker, &binary.left)?;
    let value = infer_with_expected(type_checker, &binary.right, Some(target.clone()))?;

    if binary.op != BinaryOp::Assign {
        let resolved = normalize(type_checker, &target);
        if !resolved.is_numeric() {
            REPORT!(type_checker, MISMATCH!("numeric", resolved), binary.left.span);
            return None;
        }
        let value = normalize(type_checker, &value);
        if !value.is_numeric() {
            REPORT!(type_checker, MISMATCH!("numeric", value), binary.right.span);
            return None;
        }
    }

    if !is_compatible(type_checker, &target, &value, Some(&binary.right)) {
        REPORT!(type_checker, MISMATCH!(target, value), expr.span);
        return None;
    }
    check_literal_overflow(type_checker, &target, &value, &binary.right.span);
    Some(target)
}

fn immutable(type_checker: &mut TypeChecker, name: &str, detail: &str, span: &Span) -> Option<()> {
    REPORT!(
        type_checker,
        ErrorImpl::MutabilityMismatch {
            name: name.to_string(),
            detail: detail.to_string(),
        },
        span
    );
    None
}

/// Whether the place `target` denotes may be written.
fn check_assignable(type_checker: &mut TypeChecker, target: &Expr) -> Option<()> {
    let target = target.unparen();
    match &target.kind {
        ExprKind::Ident(name) => check_binding(type_checker, name, &target.span),
        ExprKind::Postfix(Postfix::Deref(pointer)) => {
            let ty = infer_expr(type_checker, pointer)?;
            match normalize(type_checker, &ty) {
                Type::Pointer { mutable: false, .. } => {
                    immutable(type_checker, "*", "cannot assign through a pointer to const", &target.span)
                }
                _ => Some(()),
            }
        }
        ExprKind::Postfix(Postfix::Member(member)) => check_field(type_checker, member, &target.span),
        ExprKind::Postfix(Postfix::Index(index)) => check_container(type_checker, &index.base),
        _ => {
            REPORT!(type_checker, MISMATCH!("an assignable place", "a temporary value"), target.span);
            None
        }
    }
}

fn check_binding(type_checker: &mut TypeChecker, name: &str, span: &Span) -> Option<()> {
    let Some(id) = type_checker.scopes.lookup_symbol(name) else {
        // Reported as undefined when the target is inferred.
        return Some(());
    };
    let symbol = type_checker.scopes.get_symbol(id);
    match symbol.kind {
        SymbolKind::StructField if symbol.is_static() => {
            immutable(type_checker, name, "static fields cannot be assigned", span)
        }
        SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::StructField => {
            if symbol.mutability.is_mutable() {
                Some(())
            } else {
                immutable(type_checker, name, "cannot assign to an immutable binding", span)
            }
        }
        _ => immutable(type_checker, name, "only variables and fields can be assigned", span),
    }
}

fn check_field(type_checker: &mut TypeChecker, member: &MemberExpr, span: &Span) -> Option<()> {
    if let Some(Type::Struct(structure)) = expr_as_type(type_checker, &member.base) {
        let is_static = structure
            .scope
            .and_then(|scope| type_checker.scopes.lookup_local(scope, &member.member))
            .is_some_and(|id| type_checker.scopes.get_symbol(id).is_static());
        if is_static {
            return immutable(type_checker, &member.member, "static fields cannot be assigned", span);
        }
        return Some(());
    }
    if let Some(name) = member.base.ident_name() {
        let is_module = type_checker
            .scopes
            .lookup_symbol(name)
            .is_some_and(|id| type_checker.scopes.get_symbol(id).kind == SymbolKind::Use);
        if is_module {
            return Some(());
        }
    }

    let base = infer_expr(type_checker, &member.base)?;
    let base = match normalize(type_checker, &base) {
        Type::Pointer { target, .. } => normalize(type_checker, &target),
        other => other,
    };
    if let Type::Struct(structure) = &base {
        let field = structure
            .scope
            .and_then(|scope| type_checker.scopes.lookup_local(scope, &member.member));
        if let Some(id) = field {
            let symbol = type_checker.scopes.get_symbol(id);
            if symbol.kind == SymbolKind::StructField {
                if symbol.is_static() {
                    return immutable(type_checker, &member.member, "static fields cannot be assigned", span);
                }
                if !symbol.mutability.is_mutable() {
                    return immutable(type_checker, &member.member, "field is immutable", span);
                }
            }
        }
    }
    check_container(type_checker, &member.base)
}

/// A place inside `base` is writable when `base` is a pointer to mutable
/// storage or itself writable.
fn check_container(type_checker: &mut TypeChecker, base: &Expr) -> Option<()> {
    let ty = infer_expr(type_checker, base)?;
    match normalize(type_checker, &ty) {
        Type::Pointer { mutable: true, .. } => Some(()),
        Type::Pointer { mutable: false, .. } => {
            immutable(type_checker, "*", "cannot assign through a pointer to const", &base.span)
        }
        _ => check_assignable(type_checker, base),
    }
}

use tracing::trace;

use crate::{
    ast::{
        ast::{Expr, ExprKind, Visibility},
        expressions::{CallExpr, IndexExpr, MemberExpr, Postfix},
        types::{EnumType, PrimitiveType, StructType, Type},
    },
    errors::errors::ErrorImpl,
    scope::scope::{ScopeId, SymbolId, SymbolKind},
    Span, MISMATCH, REPORT,
};

use super::{
    builtins::{is_builtin_name, lookup_builtin_function, BuiltinArg, BuiltinReturn},
    compat::is_compatible,
    infer::{function_type_of, infer_expr, infer_with_expected, symbol_type},
    resolve::{const_int, expr_as_type, normalize, resolve_member_type, resolve_type},
    type_checker::TypeChecker,
    validate::check_literal_overflow,
};

/// Name of the length pseudo-member of arrays and tuples.
const LEN: &str = "len";

pub fn infer_postfix(type_checker: &mut TypeChecker, postfix: &Postfix, expr: &Expr) -> Option<Type> {
    match postfix {
        Postfix::Call(call) => infer_call(type_checker, call, expr),
        Postfix::Index(index) => infer_index(type_checker, index),
        Postfix::Member(member) => infer_member(type_checker, member, expr),
        Postfix::Increment(operand) | Postfix::Decrement(operand) => {
            let ty = infer_expr(type_checker, operand)?;
            let ty = normalize(type_checker, &ty);
            if !ty.is_numeric() {
                REPORT!(type_checker, MISMATCH!("numeric", ty), operand.span);
                return None;
            }
            Some(ty)
        }
        Postfix::Deref(operand) => {
            let ty = infer_expr(type_checker, operand)?;
            match normalize(type_checker, &ty) {
                Type::Pointer { target, .. } => Some(*target),
                other => {
                    REPORT!(type_checker, MISMATCH!("pointer", other), operand.span);
                    None
                }
            }
        }
    }
}

// CALLS

fn infer_call(type_checker: &mut TypeChecker, call: &CallExpr, expr: &Expr) -> Option<Type> {
    let callee = call.callee.unparen();

    if let Some(name) = callee.ident_name() {
        if is_builtin_name(name) {
            return infer_builtin_call(type_checker, name, call, expr);
        }
    }

    if let ExprKind::Postfix(Postfix::Member(member)) = &callee.kind {
        if let Some(result) = infer_member_call(type_checker, member, call, expr) {
            return result;
        }
    }

    let callee_type = infer_expr(type_checker, callee)?;
    let function = match normalize(type_checker, &callee_type) {
        Type::Function(function) => function,
        Type::Pointer { target, .. } => match normalize(type_checker, &target) {
            Type::Function(function) => function,
            other => return not_callable(type_checker, &other, &call.callee.span),
        },
        other => return not_callable(type_checker, &other, &call.callee.span),
    };

    let required = callee_symbol(type_checker, callee)
        .map(|id| type_checker.scopes.get_symbol(id).metadata.required_params())
        .unwrap_or(function.params.len());
    check_call_args(type_checker, &function.params, required, &call.args, &expr.span);
    Some(*function.return_type)
}

fn not_callable(type_checker: &mut TypeChecker, ty: &Type, span: &Span) -> Option<Type> {
    REPORT!(type_checker, ErrorImpl::NotCallable { ty: ty.to_string() }, span);
    None
}

/// The function symbol a callee names, directly or through a module.
fn callee_symbol(type_checker: &TypeChecker, callee: &Expr) -> Option<SymbolId> {
    let id = match &callee.kind {
        ExprKind::Ident(name) => type_checker.scopes.lookup_symbol(name)?,
        ExprKind::Postfix(Postfix::Member(member)) => {
            let module = type_checker.scopes.lookup_symbol(member.base.ident_name()?)?;
            let module = type_checker.scopes.get_symbol(module);
            if module.kind != SymbolKind::Use {
                return None;
            }
            type_checker.scopes.lookup_local(module.metadata.scope?, &member.member)?
        }
        _ => return None,
    };
    (type_checker.scopes.get_symbol(id).kind == SymbolKind::Function).then_some(id)
}

/// Checks call arguments against resolved parameter types. Arguments past
/// `required` may be left out.
pub fn check_call_args(type_checker: &mut TypeChecker, params: &[Type], required: usize, args: &[Expr], span: &Span) {
    if args.len() < required {
        REPORT!(
            type_checker,
            ErrorImpl::TooFewArguments {
                expected: required,
                received: args.len(),
            },
            span
        );
    } else if args.len() > params.len() {
        REPORT!(
            type_checker,
            ErrorImpl::TooManyArguments {
                expected: params.len(),
                received: args.len(),
            },
            span
        );
    }

    for (param, arg) in params.iter().zip(args) {
        let Some(ty) = infer_with_expected(type_checker, arg, Some(param.clone())) else {
            continue;
        };
        if is_compatible(type_checker, param, &ty, Some(arg)) {
            check_literal_overflow(type_checker, param, &ty, &arg.span);
        } else {
            REPORT!(type_checker, MISMATCH!(param, ty), arg.span);
        }
    }
    for extra in args.iter().skip(params.len()) {
        infer_expr(type_checker, extra);
    }
}

/// Signature of a function symbol: resolved parameter types, required
/// argument count and return type.
fn signature_of(type_checker: &mut TypeChecker, id: SymbolId) -> Option<(Vec<Type>, usize, Type)> {
    let Type::Function(function) = function_type_of(type_checker, id)? else {
        return None;
    };
    let required = type_checker.scopes.get_symbol(id).metadata.required_params();
    Some((function.params, required, *function.return_type))
}

fn call_function(type_checker: &mut TypeChecker, id: SymbolId, call: &CallExpr, span: &Span) -> Option<Type> {
    type_checker.scopes.get_symbol_mut(id).used = true;
    let (params, required, return_type) = signature_of(type_checker, id)?;
    check_call_args(type_checker, &params, required, &call.args, span);
    Some(return_type)
}

fn infer_builtin_call(type_checker: &mut TypeChecker, name: &str, call: &CallExpr, expr: &Expr) -> Option<Type> {
    let Some(builtin) = lookup_builtin_function(name) else {
        REPORT!(
            type_checker,
            ErrorImpl::UndefinedBuiltin {
                name: name.to_string()
            },
            call.callee.span
        );
        for arg in &call.args {
            infer_expr(type_checker, arg);
        }
        return None;
    };

    let expected = builtin.params.len();
    if call.args.len() < expected {
        REPORT!(
            type_checker,
            ErrorImpl::TooFewArguments {
                expected,
                received: call.args.len(),
            },
            expr.span
        );
    } else if call.args.len() > expected && !builtin.variadic {
        REPORT!(
            type_checker,
            ErrorImpl::TooManyArguments {
                expected,
                received: call.args.len(),
            },
            expr.span
        );
    }

    let mut type_argument = None;
    for (index, arg) in call.args.iter().enumerate() {
        let kind = builtin.params.get(index).copied().unwrap_or(BuiltinArg::Any);
        if kind == BuiltinArg::Type {
            let ty = expr_as_type(type_checker, arg);
            if ty.is_none() {
                let received = infer_expr(type_checker, arg).map(|ty| ty.to_string()).unwrap_or_default();
                REPORT!(type_checker, MISMATCH!("type", received), arg.span);
            }
            if index == 0 {
                type_argument = ty;
            }
            continue;
        }

        let Some(ty) = infer_expr(type_checker, arg) else {
            continue;
        };
        let ty = normalize(type_checker, &ty);
        let (accepted, expected) = match kind {
            BuiltinArg::Any | BuiltinArg::Type => (true, "any"),
            BuiltinArg::Bool => (ty.is_bool(), "bool"),
            BuiltinArg::Integer => (ty.is_integer(), "integer"),
            BuiltinArg::String => (ty.is_string_like(), "string"),
        };
        if !accepted {
            REPORT!(type_checker, MISMATCH!(expected, ty), arg.span);
        }
    }

    match builtin.returns {
        BuiltinReturn::Fixed(constructor) => Some(constructor()),
        BuiltinReturn::FirstArgType => type_argument,
    }
}

/// Calls through a member access: enum variant constructors and methods.
///
/// Returns `None` when the callee is not a method, so it is called as a
/// plain value.
fn infer_member_call(
    type_checker: &mut TypeChecker,
    member: &MemberExpr,
    call: &CallExpr,
    expr: &Expr,
) -> Option<Option<Type>> {
    if let Some(type_id) = type_symbol(type_checker, &member.base) {
        return Some(call_on_type(type_checker, type_id, member, call, expr));
    }
    if let Some(id) = member.base.ident_name().and_then(|name| type_checker.scopes.lookup_symbol(name)) {
        if type_checker.scopes.get_symbol(id).kind == SymbolKind::Use {
            return None;
        }
    }

    let Some(base) = infer_expr(type_checker, &member.base) else {
        return Some(None);
    };
    let scope = match deref_once(type_checker, &base) {
        Type::Struct(StructType { scope: Some(scope), .. }) | Type::Enum(EnumType { scope: Some(scope), .. }) => scope,
        _ => return None,
    };
    let id = type_checker.scopes.lookup_local(scope, &member.member)?;
    if type_checker.scopes.get_symbol(id).kind != SymbolKind::Function {
        return None;
    }

    Some(instance_member_access(type_checker, id, scope, &member.member, &expr.span).and_then(|_| {
        call_function(type_checker, id, call, &expr.span)
    }))
}

/// `Type.member(...)`: a variant constructor or a static method.
fn call_on_type(
    type_checker: &mut TypeChecker,
    type_id: SymbolId,
    member: &MemberExpr,
    call: &CallExpr,
    expr: &Expr,
) -> Option<Type> {
    let name = type_checker.scopes.get_symbol(type_id).name.clone();
    match resolve_type(type_checker, &Type::ident(&name), &member.base.span)? {
        Type::Enum(enumeration) if enumeration.variant(&member.member).is_some() => {
            construct_variant(type_checker, &enumeration, &member.member, call, expr)
        }
        Type::Enum(EnumType { scope: Some(scope), .. }) | Type::Struct(StructType { scope: Some(scope), .. }) => {
            let id = static_member(type_checker, scope, &name, &member.member, &expr.span)?;
            if type_checker.scopes.get_symbol(id).kind != SymbolKind::Function {
                let ty = symbol_type(type_checker, id)?;
                return not_callable(type_checker, &ty, &expr.span);
            }
            call_function(type_checker, id, call, &expr.span)
        }
        other => not_callable(type_checker, &other, &expr.span),
    }
}

fn construct_variant(
    type_checker: &mut TypeChecker,
    enumeration: &EnumType,
    variant: &str,
    call: &CallExpr,
    expr: &Expr,
) -> Option<Type> {
    let payload = enumeration
        .variant(variant)
        .and_then(|variant| variant.payload.clone());
    let params = match (payload, enumeration.scope) {
        (Some(payload), Some(scope)) => {
            let resolved = type_checker.with_scope(scope, |type_checker| resolve_type(type_checker, &payload, &expr.span));
            vec![resolved?]
        }
        (Some(payload), None) => vec![resolve_type(type_checker, &payload, &expr.span)?],
        (None, _) => vec![],
    };
    check_call_args(type_checker, &params, params.len(), &call.args, &expr.span);
    Some(Type::Enum(enumeration.clone()))
}

// INDEXING

fn infer_index(type_checker: &mut TypeChecker, index: &IndexExpr) -> Option<Type> {
    let base = infer_expr(type_checker, &index.base)?;
    let base = normalize(type_checker, &base);

    if matches!(index.index.unparen().kind, ExprKind::Range(_)) {
        infer_expr(type_checker, &index.index);
        return Some(base);
    }

    let index_type = infer_with_expected(type_checker, &index.index, Some(Type::usize()))?;
    let index_type = normalize(type_checker, &index_type);
    if !index_type.is_integer() {
        REPORT!(type_checker, MISMATCH!("integer", index_type), index.index.span);
        return None;
    }
    let constant = match index_type.as_primitive() {
        Some(PrimitiveType::ComptimeInt(value)) => *value,
        _ => None,
    };

    match deref_once(type_checker, &base) {
        Type::Tuple(fields) => {
            let Some(position) = constant.or_else(|| const_int(type_checker, &index.index)) else {
                REPORT!(
                    type_checker,
                    ErrorImpl::CannotInferType {
                        subject: String::from("tuple element at a runtime index"),
                    },
                    index.index.span
                );
                return None;
            };
            match usize::try_from(position).ok().and_then(|i| fields.get(i)) {
                Some(field) => Some(field.clone()),
                None => {
                    REPORT!(
                        type_checker,
                        ErrorImpl::IndexOutOfBounds {
                            index: position,
                            length: fields.len() as u64,
                        },
                        index.index.span
                    );
                    None
                }
            }
        }
        array @ Type::Array { .. } => {
            if let (Some(position), Some(length)) = (constant, array.array_len()) {
                if position < 0 || position as u64 >= length {
                    REPORT!(
                        type_checker,
                        ErrorImpl::IndexOutOfBounds {
                            index: position,
                            length,
                        },
                        index.index.span
                    );
                }
            }
            match array {
                Type::Array { target, .. } => Some(*target),
                _ => None,
            }
        }
        other => {
            REPORT!(type_checker, MISMATCH!("array or tuple", other), index.base.span);
            None
        }
    }
}

/// Looks through one level of pointer.
fn deref_once(type_checker: &mut TypeChecker, ty: &Type) -> Type {
    match normalize(type_checker, ty) {
        Type::Pointer { target, .. } => normalize(type_checker, &target),
        other => other,
    }
}

// MEMBER ACCESS

fn infer_member(type_checker: &mut TypeChecker, member: &MemberExpr, expr: &Expr) -> Option<Type> {
    if let Some(name) = member.base.ident_name() {
        if let Some(id) = type_checker.scopes.lookup_symbol(name) {
            if type_checker.scopes.get_symbol(id).kind == SymbolKind::Use {
                return infer_module_member(type_checker, id, member, expr);
            }
        }
    }
    if let Some(type_id) = type_symbol(type_checker, &member.base) {
        return infer_type_member(type_checker, type_id, member, expr);
    }

    let base = infer_expr(type_checker, &member.base)?;
    infer_value_member(type_checker, &base, member, expr)
}

/// The type definition `base` names, if it names one.
fn type_symbol(type_checker: &TypeChecker, base: &Expr) -> Option<SymbolId> {
    let id = type_checker.scopes.lookup_symbol(base.ident_name()?)?;
    let symbol = type_checker.scopes.get_symbol(id);
    (symbol.kind == SymbolKind::Definition && symbol.metadata.denotes_type).then_some(id)
}

fn infer_module_member(type_checker: &mut TypeChecker, use_id: SymbolId, member: &MemberExpr, expr: &Expr) -> Option<Type> {
    let symbol = type_checker.scopes.get_symbol(use_id);
    let module = symbol.metadata.module.clone().unwrap_or_else(|| symbol.name.clone());
    let Some(scope) = symbol.metadata.scope else {
        REPORT!(type_checker, ErrorImpl::ModuleNotFound { module }, expr.span);
        return None;
    };

    let Some(id) = type_checker.scopes.lookup_local(scope, &member.member) else {
        REPORT!(
            type_checker,
            ErrorImpl::SymbolNotFound {
                name: member.member.clone()
            },
            expr.span
        );
        return None;
    };
    if !type_checker.scopes.get_symbol(id).is_public() {
        REPORT!(
            type_checker,
            ErrorImpl::SymbolNotExported {
                name: member.member.clone(),
                module,
            },
            expr.span
        );
        return None;
    }

    value_of_symbol(type_checker, id)
}

fn value_of_symbol(type_checker: &mut TypeChecker, id: SymbolId) -> Option<Type> {
    type_checker.scopes.get_symbol_mut(id).used = true;
    let symbol = type_checker.scopes.get_symbol(id);
    match symbol.kind {
        SymbolKind::Definition if symbol.metadata.denotes_type => Some(Type::meta()),
        SymbolKind::Function => function_type_of(type_checker, id),
        SymbolKind::Error | SymbolKind::EnumVariant => symbol.ty.clone(),
        _ => symbol_type(type_checker, id),
    }
}

/// `Type.member`: enum variants, error set members and static members.
fn infer_type_member(type_checker: &mut TypeChecker, type_id: SymbolId, member: &MemberExpr, expr: &Expr) -> Option<Type> {
    let name = type_checker.scopes.get_symbol(type_id).name.clone();
    match resolve_type(type_checker, &Type::ident(&name), &member.base.span)? {
        Type::Enum(enumeration) if enumeration.variant(&member.member).is_some() => Some(Type::Enum(enumeration)),
        Type::ErrSet(members) => {
            if members.contains(&member.member) {
                Some(Type::ErrSet(members))
            } else {
                REPORT!(
                    type_checker,
                    ErrorImpl::ErrorMemberNotFound {
                        set: name,
                        member: member.member.clone(),
                    },
                    expr.span
                );
                None
            }
        }
        Type::Enum(EnumType { scope: Some(scope), .. }) | Type::Struct(StructType { scope: Some(scope), .. }) => {
            let id = static_member(type_checker, scope, &name, &member.member, &expr.span)?;
            value_of_symbol(type_checker, id)
        }
        other => {
            REPORT!(
                type_checker,
                ErrorImpl::SymbolNotFound {
                    name: format!("{}.{}", other, member.member),
                },
                expr.span
            );
            None
        }
    }
}

/// A member reached through its type: it has to exist and be static.
fn static_member(type_checker: &mut TypeChecker, scope: ScopeId, type_name: &str, name: &str, span: &Span) -> Option<SymbolId> {
    let Some(id) = type_checker.scopes.lookup_local(scope, name) else {
        REPORT!(
            type_checker,
            ErrorImpl::SymbolNotFound {
                name: format!("{}.{}", type_name, name),
            },
            span
        );
        return None;
    };
    if !type_checker.scopes.get_symbol(id).is_static() {
        REPORT!(
            type_checker,
            ErrorImpl::InvalidStaticAccess {
                name: name.to_string(),
                detail: format!("instance member accessed through `{}`", type_name),
            },
            span
        );
        return None;
    }
    Some(id)
}

/// A member reached through a value: it must not be static, and private
/// members are only visible inside their type.
fn instance_member_access(type_checker: &mut TypeChecker, id: SymbolId, scope: ScopeId, name: &str, span: &Span) -> Option<()> {
    let visibility = type_checker.scopes.get_symbol(id).visibility;
    match visibility {
        Visibility::Static => {
            REPORT!(
                type_checker,
                ErrorImpl::InvalidStaticAccess {
                    name: name.to_string(),
                    detail: String::from("static member accessed through an instance"),
                },
                span
            );
            None
        }
        Visibility::Private if !type_checker.scopes.is_within(type_checker.scopes.current_scope(), scope) => {
            REPORT!(type_checker, ErrorImpl::SymbolNotAccessible { name: name.to_string() }, span);
            None
        }
        _ => Some(()),
    }
}

fn infer_value_member(type_checker: &mut TypeChecker, base: &Type, member: &MemberExpr, expr: &Expr) -> Option<Type> {
    let mut ty = normalize(type_checker, base);
    let mut depth = 0;
    while let Type::Optional(inner) = ty {
        ty = normalize(type_checker, &inner);
        depth += 1;
    }
    if depth > 1 {
        trace!(depth, "member access through nested optionals");
    }
    let ty = deref_once(type_checker, &ty);

    let result = match &ty {
        Type::Array { .. } | Type::Tuple(_) if member.member == LEN => Some(Type::usize()),
        Type::Struct(structure) => struct_member(type_checker, structure, member, expr),
        Type::Enum(EnumType { scope: Some(scope), .. }) => {
            match type_checker.scopes.lookup_local(*scope, &member.member) {
                Some(id) if type_checker.scopes.get_symbol(id).kind == SymbolKind::Function => {
                    instance_member_access(type_checker, id, *scope, &member.member, &expr.span)?;
                    value_of_symbol(type_checker, id)
                }
                _ => member_not_found(type_checker, &ty, member, expr),
            }
        }
        Type::ErrSet(members) => {
            if members.contains(&member.member) {
                Some(ty.clone())
            } else {
                REPORT!(
                    type_checker,
                    ErrorImpl::ErrorMemberNotFound {
                        set: ty.to_string(),
                        member: member.member.clone(),
                    },
                    expr.span
                );
                None
            }
        }
        _ => member_not_found(type_checker, &ty, member, expr),
    }?;

    Some(if depth > 0 { Type::optional(result) } else { result })
}

fn member_not_found(type_checker: &mut TypeChecker, ty: &Type, member: &MemberExpr, expr: &Expr) -> Option<Type> {
    REPORT!(
        type_checker,
        ErrorImpl::SymbolNotFound {
            name: format!("{}.{}", ty, member.member),
        },
        expr.span
    );
    None
}

fn struct_member(type_checker: &mut TypeChecker, structure: &StructType, member: &MemberExpr, expr: &Expr) -> Option<Type> {
    let Some(scope) = structure.scope else {
        return match structure.member(&member.member) {
            Some(field) => resolve_member_type(type_checker, structure, field),
            None => member_not_found(type_checker, &Type::Struct(structure.clone()), member, expr),
        };
    };

    let Some(id) = type_checker.scopes.lookup_local(scope, &member.member) else {
        return member_not_found(type_checker, &Type::Struct(structure.clone()), member, expr);
    };
    instance_member_access(type_checker, id, scope, &member.member, &expr.span)?;
    value_of_symbol(type_checker, id)
}

use tracing::trace;

use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{parse_int_literal, AsExpr, CatchExpr, IfExpr, Literal, OrelseExpr, RangeExpr},
        statements::ErrorDecl,
        types::{PrimitiveType, Type},
    },
    errors::errors::{Error, ErrorImpl},
    scope::{
        collector::SELF,
        scope::{SymbolId, SymbolKind},
    },
    Span, MISMATCH, REPORT,
};

use super::{
    builtins::lookup_builtin_type,
    compat::{can_cast, is_compatible},
    infer_ops::{infer_binary, infer_prefix},
    infer_postfix::infer_postfix,
    matching::validate_match,
    objects::infer_object,
    resolve::{concretize, expr_as_type, normalize, resolve_layout, resolve_type, try_resolve},
    type_checker::TypeChecker,
    validate::validate_stmt,
};

/// Infers the type of `expr`, reporting what is wrong with it.
///
/// Results are memoized per node. An expression whose inference is already
/// in flight yields `None` without a diagnostic.
pub fn infer_expr(type_checker: &mut TypeChecker, expr: &Expr) -> Option<Type> {
    let key = type_checker.expr_key(expr);
    if let Some(ty) = type_checker.cache.get(&key) {
        trace!(node = key.node.0, "type cache hit");
        return Some(ty.clone());
    }
    if !type_checker.inference_stack.insert(key) {
        trace!(node = key.node.0, "inference re-entered");
        return None;
    }

    type_checker.context.push_span(expr.span.clone());
    let result = infer_uncached(type_checker, expr);
    type_checker.context.pop_span();
    type_checker.inference_stack.remove(&key);

    if let Some(ty) = &result {
        type_checker.cache.insert(key, ty.clone());
    }
    result
}

/// Infers `expr` where the surrounding code expects `expected`.
pub fn infer_with_expected(type_checker: &mut TypeChecker, expr: &Expr, expected: Option<Type>) -> Option<Type> {
    type_checker.with_expected(expected, |type_checker| infer_expr(type_checker, expr))
}

fn infer_uncached(type_checker: &mut TypeChecker, expr: &Expr) -> Option<Type> {
    match &expr.kind {
        ExprKind::Literal(literal) => infer_literal(type_checker, literal, expr),
        ExprKind::Ident(name) => infer_identifier(type_checker, name, &expr.span),
        ExprKind::Paren(inner) => infer_expr(type_checker, inner),
        ExprKind::Tuple(fields) => infer_tuple(type_checker, fields),
        ExprKind::Object(object) => infer_object(type_checker, object, expr),
        ExprKind::Type(ty) => {
            resolve_type(type_checker, ty, &expr.span)?;
            Some(Type::meta())
        }
        ExprKind::Binary(binary) => infer_binary(type_checker, binary, expr),
        ExprKind::Prefix(prefix) => infer_prefix(type_checker, prefix, expr),
        ExprKind::Postfix(postfix) => infer_postfix(type_checker, postfix, expr),
        ExprKind::As(cast) => infer_cast(type_checker, cast, expr),
        ExprKind::Typeof(operand) => {
            infer_expr(type_checker, operand)?;
            Some(Type::meta())
        }
        ExprKind::Sizeof(operand) => Some(infer_sizeof(type_checker, operand, expr)),
        ExprKind::Orelse(orelse) => infer_orelse(type_checker, orelse),
        ExprKind::Range(range) => infer_range(type_checker, range),
        ExprKind::Try(operand) => infer_expr(type_checker, operand),
        ExprKind::Catch(catch) => infer_catch(type_checker, catch, expr),
        ExprKind::If(if_expr) => {
            validate_if(type_checker, if_expr);
            Some(Type::void())
        }
        ExprKind::Match(match_expr) => {
            if let Err(error) = validate_match(type_checker, match_expr, &expr.span) {
                type_checker.report_internal(error);
            }
            Some(Type::void())
        }
        ExprKind::Unreachable => Some(Type::noreturn()),
    }
}

// LITERALS

fn infer_literal(type_checker: &mut TypeChecker, literal: &Literal, expr: &Expr) -> Option<Type> {
    match literal {
        Literal::Str(text) => Some(Type::string(text.len() as u64)),
        Literal::Int(text) => match parse_int_literal(text) {
            Some(value) => Some(Type::comptime_int(Some(value))),
            None => {
                REPORT!(
                    type_checker,
                    ErrorImpl::ArithmeticOverflow {
                        value: text.clone(),
                        ty: String::from("comptime_int"),
                    },
                    expr.span
                );
                Some(Type::comptime_int(None))
            }
        },
        Literal::Float(_) => Some(Type::comptime_float()),
        Literal::Char(text) => Some(infer_char(type_checker, text)),
        Literal::Bool(_) => Some(Type::bool()),
        Literal::Null => Some(Type::null()),
        Literal::Undefined => Some(Type::undefined()),
        Literal::Array(elements) => infer_array_literal(type_checker, elements),
    }
}

/// Code point of a character literal, decoding `\n`, `\xNN` and
/// `\u{...}` style escapes.
pub fn char_code(text: &str) -> Option<u32> {
    let Some(escape) = text.strip_prefix('\\') else {
        return text.chars().next().map(u32::from);
    };
    let mut chars = escape.chars();
    let code = match chars.next()? {
        'n' => 10,
        't' => 9,
        'r' => 13,
        '0' => 0,
        'x' => u32::from_str_radix(chars.as_str(), 16).ok()?,
        'u' => {
            let digits = chars.as_str().strip_prefix('{')?.strip_suffix('}')?;
            u32::from_str_radix(digits, 16).ok()?
        }
        other => u32::from(other),
    };
    Some(code)
}

fn infer_char(type_checker: &mut TypeChecker, text: &str) -> Type {
    match char_code(text) {
        None => match type_checker.context.current_expected() {
            Some(expected) if expected.is_integer() => expected.clone(),
            _ => Type::u8(),
        },
        Some(code) if code <= 127 => Type::u8(),
        Some(_) => Type::int(false, 21),
    }
}

fn infer_array_literal(type_checker: &mut TypeChecker, elements: &[Expr]) -> Option<Type> {
    let Some((first, rest)) = elements.split_first() else {
        return Some(Type::array(Type::any(), Some(0), false));
    };

    let element_expected = match type_checker.context.current_expected() {
        Some(Type::Array { target, .. }) => Some(target.as_ref().clone()),
        _ => None,
    };

    let element = infer_with_expected(type_checker, first, element_expected.clone())?;
    for other in rest {
        let Some(ty) = infer_with_expected(type_checker, other, element_expected.clone()) else {
            continue;
        };
        if !is_compatible(type_checker, &element, &ty, Some(other)) {
            REPORT!(type_checker, MISMATCH!(element, ty), other.span);
        }
    }

    let element = match element {
        Type::Primitive(PrimitiveType::ComptimeInt(_)) => Type::comptime_int(None),
        other => other,
    };
    Some(Type::array(element, Some(elements.len() as u64), false))
}

fn infer_tuple(type_checker: &mut TypeChecker, fields: &[Expr]) -> Option<Type> {
    let expected = match type_checker.context.current_expected() {
        Some(Type::Tuple(types)) if types.len() == fields.len() => types.clone(),
        _ => vec![],
    };

    let mut types = Vec::with_capacity(fields.len());
    for (index, field) in fields.iter().enumerate() {
        types.push(infer_with_expected(type_checker, field, expected.get(index).cloned())?);
    }
    Some(Type::Tuple(types))
}

// IDENTIFIERS

fn infer_identifier(type_checker: &mut TypeChecker, name: &str, span: &Span) -> Option<Type> {
    let in_static = type_checker.frame.as_ref().is_some_and(|frame| frame.is_static);

    let Some(id) = type_checker.scopes.lookup_symbol(name) else {
        if name == SELF && in_static {
            REPORT!(
                type_checker,
                ErrorImpl::InvalidStaticAccess {
                    name: name.to_string(),
                    detail: String::from("static methods have no instance"),
                },
                span
            );
            return None;
        }
        match lookup_builtin_type(name) {
            Ok(Some(_)) => return Some(Type::meta()),
            Ok(None) => REPORT!(
                type_checker,
                ErrorImpl::UndefinedIdentifier {
                    name: name.to_string()
                },
                span
            ),
            Err(error) => REPORT!(type_checker, error, span),
        }
        return None;
    };

    if in_static && is_instance_member(type_checker, id) {
        REPORT!(
            type_checker,
            ErrorImpl::InvalidStaticAccess {
                name: name.to_string(),
                detail: String::from("instance member used in a static method"),
            },
            span
        );
        return None;
    }

    type_checker.scopes.get_symbol_mut(id).used = true;
    let symbol = type_checker.scopes.get_symbol(id);
    match symbol.kind {
        SymbolKind::Definition if symbol.metadata.denotes_type => Some(Type::meta()),
        SymbolKind::Use => {
            REPORT!(
                type_checker,
                ErrorImpl::CannotInferType {
                    subject: format!("module `{}` used as a value", name),
                },
                span
            );
            None
        }
        SymbolKind::Function => function_type_of(type_checker, id),
        SymbolKind::Error | SymbolKind::EnumVariant => symbol.ty.clone(),
        _ => symbol_type(type_checker, id),
    }
}

/// Non-static fields and methods of the struct whose static method is
/// being validated.
fn is_instance_member(type_checker: &TypeChecker, id: SymbolId) -> bool {
    let Some(struct_scope) = type_checker.frame.as_ref().and_then(|frame| frame.struct_scope) else {
        return false;
    };
    let symbol = type_checker.scopes.get_symbol(id);
    symbol.scope == struct_scope
        && matches!(symbol.kind, SymbolKind::StructField | SymbolKind::Function)
        && !symbol.is_static()
}

/// Type of a value symbol, computed on first use from its annotation or
/// initializer and memoized on the symbol.
pub fn symbol_type(type_checker: &mut TypeChecker, id: SymbolId) -> Option<Type> {
    let symbol = type_checker.scopes.get_symbol(id);
    if let Some(ty) = &symbol.ty {
        return Some(ty.clone());
    }
    match symbol.kind {
        SymbolKind::Function => return function_type_of(type_checker, id),
        SymbolKind::Definition if symbol.metadata.denotes_type => return Some(Type::meta()),
        _ => {}
    }

    if type_checker.circular_stack.contains(&id) {
        trace!(name = %symbol.name, "symbol typing re-entered");
        return None;
    }

    let annotation = symbol.metadata.annotation.clone();
    let initializer = symbol.metadata.initializer.clone();
    let scope = symbol.scope;
    let concretized = symbol.kind == SymbolKind::Variable && symbol.mutability.is_mutable();

    let ty = type_checker.with_circular_guard(id, |type_checker| {
        type_checker.with_scope(scope, |type_checker| match (&annotation, &initializer) {
            (Some(annotation), _) => try_resolve(type_checker, annotation),
            (None, Some(initializer)) => infer_with_expected(type_checker, initializer, None),
            (None, None) => None,
        })
    })?;
    let ty = if concretized { concretize(&ty) } else { ty };

    trace!(symbol = id.0, ty = %ty, "symbol typed lazily");
    type_checker.scopes.get_symbol_mut(id).ty = Some(ty.clone());
    Some(ty)
}

/// The function type of a function symbol, synthesized from its signature.
pub fn function_type_of(type_checker: &mut TypeChecker, id: SymbolId) -> Option<Type> {
    let symbol = type_checker.scopes.get_symbol(id);
    if let Some(ty) = &symbol.ty {
        return Some(ty.clone());
    }

    let params: Vec<Type> = symbol.metadata.params.iter().map(|param| param.ty.clone()).collect();
    let return_type = symbol.metadata.return_type.clone().unwrap_or_else(Type::void);
    let error_type = symbol.metadata.error.as_ref().map(ErrorDecl::as_type);
    let scope = symbol.metadata.scope.unwrap_or(symbol.scope);

    let ty = type_checker.with_scope(scope, |type_checker| {
        let params = params
            .iter()
            .map(|param| try_resolve(type_checker, param))
            .collect::<Option<Vec<_>>>()?;
        let return_type = try_resolve(type_checker, &return_type)?;
        let error_type = match &error_type {
            Some(error) => Some(try_resolve(type_checker, error)?),
            None => None,
        };
        Some(Type::function(params, return_type, error_type))
    })?;

    type_checker.scopes.get_symbol_mut(id).ty = Some(ty.clone());
    Some(ty)
}

// SPECIAL FORMS

fn infer_cast(type_checker: &mut TypeChecker, cast: &AsExpr, expr: &Expr) -> Option<Type> {
    let source = infer_with_expected(type_checker, &cast.expr, None)?;
    let target = resolve_type(type_checker, &cast.target, &expr.span)?;

    if !can_cast(type_checker, &target, &source) {
        type_checker.report_cast(
            ErrorImpl::InvalidCast {
                from: source.to_string(),
                to: target.to_string(),
            },
            &expr.span,
        );
    }
    Some(target)
}

/// The type `sizeof` measures: a type expression, a name denoting a type,
/// or the type of a value.
fn sized_type(type_checker: &mut TypeChecker, operand: &Expr) -> Option<Type> {
    if let Some(ty) = expr_as_type(type_checker, operand) {
        return Some(ty);
    }
    infer_expr(type_checker, operand).map(|ty| concretize(&ty))
}

fn infer_sizeof(type_checker: &mut TypeChecker, operand: &Expr, expr: &Expr) -> Type {
    let size = sized_type(type_checker, operand).and_then(|ty| {
        let layout = resolve_layout(type_checker, &ty)?;
        type_checker.evaluator.compute_type_size(&layout)
    });

    match size {
        Some(size) => Type::comptime_int(Some(i128::from(size))),
        None => {
            REPORT!(
                type_checker,
                ErrorImpl::CannotInferType {
                    subject: String::from("size of operand"),
                },
                expr.span
            );
            Type::comptime_int(Some(0))
        }
    }
}

fn infer_orelse(type_checker: &mut TypeChecker, orelse: &OrelseExpr) -> Option<Type> {
    let left = infer_expr(type_checker, &orelse.left)?;
    let Type::Optional(inner) = normalize(type_checker, &left) else {
        infer_expr(type_checker, &orelse.right);
        return Some(left);
    };
    let inner = *inner;

    let right = infer_with_expected(type_checker, &orelse.right, Some(inner.clone()))?;
    match normalize(type_checker, &right) {
        right if right.is_null() => Some(Type::Union(vec![inner, Type::null()])),
        Type::Optional(right_inner) => {
            if !is_compatible(type_checker, &inner, &right_inner, None) {
                REPORT!(type_checker, MISMATCH!(Type::optional(inner.clone()), right), orelse.right.span);
            }
            Some(Type::optional(inner))
        }
        right => {
            if !is_compatible(type_checker, &inner, &right, Some(&orelse.right)) {
                REPORT!(type_checker, MISMATCH!(inner, right), orelse.right.span);
            }
            Some(inner)
        }
    }
}

fn infer_range(type_checker: &mut TypeChecker, range: &RangeExpr) -> Option<Type> {
    for bound in [&range.start, &range.end].into_iter().flatten() {
        let Some(ty) = infer_expr(type_checker, bound) else {
            continue;
        };
        let ty = normalize(type_checker, &ty);
        if !ty.is_integer() {
            REPORT!(type_checker, MISMATCH!("integer", ty), bound.span);
        }
    }
    Some(Type::meta())
}

fn infer_catch(type_checker: &mut TypeChecker, catch: &CatchExpr, expr: &Expr) -> Option<Type> {
    let left = infer_expr(type_checker, &catch.expr);

    let result = match type_checker.scopes.scope_for_node(expr.id) {
        Some(scope) => type_checker.with_saved_state(|type_checker| {
            type_checker.with_scope(scope, |type_checker| validate_stmt(type_checker, &catch.handler))
        }),
        None => Err(Error::internal("catch handler has no scope", expr.span.clone())),
    };
    if let Err(error) = result {
        type_checker.report_internal(error);
    }
    left
}

fn validate_if(type_checker: &mut TypeChecker, if_expr: &IfExpr) {
    if let Some(condition) = infer_expr(type_checker, &if_expr.condition) {
        let condition = normalize(type_checker, &condition);
        if !condition.is_bool() {
            REPORT!(type_checker, MISMATCH!("bool", condition), if_expr.condition.span);
        }
    }

    let branches = std::iter::once(if_expr.then_branch.as_ref()).chain(if_expr.else_branch.as_deref());
    for branch in branches {
        let result = type_checker.with_saved_state(|type_checker| validate_stmt(type_checker, branch));
        if let Err(error) = result {
            type_checker.report_internal(error);
        }
    }
}

use crate::{
    ast::{
        ast::{Expr, ExprKind},
        expressions::{BinaryExpr, BinaryOp, OpClass, Postfix, PrefixExpr, PrefixOp},
        types::{PrimitiveType, Type},
    },
    errors::errors::ErrorImpl,
    Span, MISMATCH, REPORT,
};

use super::{
    compat::{is_lvalue, promote},
    infer::{infer_expr, infer_with_expected},
    resolve::normalize,
    type_checker::TypeChecker,
    validate::validate_assignment,
};

pub fn infer_binary(type_checker: &mut TypeChecker, binary: &BinaryExpr, expr: &Expr) -> Option<Type> {
    let class = binary.op.class();
    if class == OpClass::Assignment {
        return validate_assignment(type_checker, binary, expr);
    }

    let left = infer_with_expected(type_checker, &binary.left, None)?;
    let right = infer_with_expected(type_checker, &binary.right, None)?;
    let left = normalize(type_checker, &left);
    let right = normalize(type_checker, &right);

    if left.is_meta() || right.is_meta() {
        REPORT!(type_checker, MISMATCH!("a value", "type"), expr.span);
        return None;
    }

    match class {
        OpClass::Additive if binary.op == BinaryOp::Add && left.is_string_like() && right.is_string_like() => {
            infer_concat(type_checker, binary, &left, &right, &expr.span)
        }
        OpClass::Additive | OpClass::Multiplicative | OpClass::Power => {
            require(type_checker, &left, &binary.left.span, "numeric", Type::is_numeric)?;
            require(type_checker, &right, &binary.right.span, "numeric", Type::is_numeric)?;
            Some(fold_or_promote(binary.op, &left, &right))
        }
        OpClass::Shift | OpClass::Bitwise => {
            require(type_checker, &left, &binary.left.span, "integer", Type::is_integer)?;
            require(type_checker, &right, &binary.right.span, "integer", Type::is_integer)?;
            if let Some(folded) = fold_comptime(binary.op, &left, &right) {
                return Some(folded);
            }
            if class == OpClass::Shift {
                Some(left)
            } else {
                Some(promote(&left, &right))
            }
        }
        OpClass::Equality | OpClass::Relational => {
            if null_against_value(&left, &right) || null_against_value(&right, &left) {
                REPORT!(type_checker, MISMATCH!(left, right), expr.span);
            }
            Some(Type::bool())
        }
        OpClass::Logical => {
            require(type_checker, &left, &binary.left.span, "bool", Type::is_bool);
            require(type_checker, &right, &binary.right.span, "bool", Type::is_bool);
            Some(Type::bool())
        }
        OpClass::Assignment => None,
    }
}

/// Reports `ty` unless `predicate` holds for it.
fn require(
    type_checker: &mut TypeChecker,
    ty: &Type,
    span: &Span,
    expected: &str,
    predicate: fn(&Type) -> bool,
) -> Option<()> {
    if predicate(ty) {
        Some(())
    } else {
        REPORT!(type_checker, MISMATCH!(expected, ty), span);
        None
    }
}

fn null_against_value(null: &Type, other: &Type) -> bool {
    null.is_null()
        && !(other.is_null()
            || other.is_optional()
            || other.is_pointer()
            || matches!(other.as_primitive(), Some(PrimitiveType::Any)))
}

fn infer_concat(
    type_checker: &mut TypeChecker,
    binary: &BinaryExpr,
    left: &Type,
    right: &Type,
    span: &Span,
) -> Option<Type> {
    let mutable = |ty: &Type| matches!(ty, Type::Array { mutable: true, .. });
    let wildcard = binary.left.is_literal() || binary.right.is_literal();

    if !wildcard && mutable(left) != mutable(right) {
        REPORT!(
            type_checker,
            ErrorImpl::MutabilityMismatch {
                name: String::from("+"),
                detail: String::from("concatenated strings differ in mutability"),
            },
            span
        );
        return None;
    }

    let size = match (left.array_len(), right.array_len()) {
        (Some(left), Some(right)) => Some(left + right),
        _ => None,
    };
    Some(Type::array(Type::u8(), size, mutable(left) || mutable(right)))
}

fn fold_or_promote(op: BinaryOp, left: &Type, right: &Type) -> Type {
    fold_comptime(op, left, right).unwrap_or_else(|| promote(left, right))
}

/// Folds an operation on two comptime integers whose values are known.
fn fold_comptime(op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
    let (
        Some(PrimitiveType::ComptimeInt(Some(left))),
        Some(PrimitiveType::ComptimeInt(Some(right))),
    ) = (left.as_primitive(), right.as_primitive())
    else {
        return None;
    };
    let (left, right) = (*left, *right);

    let value = match op {
        BinaryOp::Add => left.checked_add(right),
        BinaryOp::Sub => left.checked_sub(right),
        BinaryOp::Mul => left.checked_mul(right),
        BinaryOp::Div => left.checked_div(right),
        BinaryOp::Rem => left.checked_rem(right),
        BinaryOp::Pow => u32::try_from(right).ok().and_then(|exp| left.checked_pow(exp)),
        BinaryOp::Shl => u32::try_from(right).ok().and_then(|shift| left.checked_shl(shift)),
        BinaryOp::Shr => u32::try_from(right).ok().and_then(|shift| left.checked_shr(shift)),
        BinaryOp::BitAnd => Some(left & right),
        BinaryOp::BitOr => Some(left | right),
        BinaryOp::BitXor => Some(left ^ right),
        _ => None,
    };
    Some(Type::comptime_int(value))
}

pub fn infer_prefix(type_checker: &mut TypeChecker, prefix: &PrefixExpr, expr: &Expr) -> Option<Type> {
    if prefix.op == PrefixOp::Reference {
        return infer_reference(type_checker, prefix, expr);
    }

    let operand = infer_expr(type_checker, &prefix.operand)?;
    let operand = normalize(type_checker, &operand);
    let span = &prefix.operand.span;

    match prefix.op {
        PrefixOp::Plus | PrefixOp::Increment | PrefixOp::Decrement => {
            require(type_checker, &operand, span, "numeric", Type::is_numeric)?;
            Some(operand)
        }
        PrefixOp::Minus => {
            require(type_checker, &operand, span, "numeric", Type::is_numeric)?;
            Some(match operand {
                Type::Primitive(PrimitiveType::ComptimeInt(value)) => {
                    Type::comptime_int(value.and_then(i128::checked_neg))
                }
                Type::Primitive(PrimitiveType::Int { signed: false, bits }) => Type::int(true, bits),
                other => other,
            })
        }
        PrefixOp::Not => {
            require(type_checker, &operand, span, "bool", Type::is_bool);
            Some(Type::bool())
        }
        PrefixOp::BitNot => {
            require(type_checker, &operand, span, "integer", Type::is_integer)?;
            Some(operand)
        }
        PrefixOp::Reference => None,
    }
}

fn infer_reference(type_checker: &mut TypeChecker, prefix: &PrefixExpr, expr: &Expr) -> Option<Type> {
    if !is_lvalue(&prefix.operand) {
        REPORT!(type_checker, ErrorImpl::InvalidReference, expr.span);
        return None;
    }
    let pointee = infer_expr(type_checker, &prefix.operand)?;
    let mutable = lvalue_mutability(type_checker, &prefix.operand);
    Some(Type::pointer(pointee, mutable))
}

/// Whether the storage an lvalue denotes may be written.
pub fn lvalue_mutability(type_checker: &mut TypeChecker, expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Ident(name) => type_checker
            .scopes
            .lookup_symbol(name)
            .is_some_and(|id| type_checker.scopes.get_symbol(id).mutability.is_mutable()),
        ExprKind::Paren(inner) => lvalue_mutability(type_checker, inner),
        ExprKind::Postfix(Postfix::Member(member)) => lvalue_mutability(type_checker, &member.base),
        ExprKind::Postfix(Postfix::Index(index)) => lvalue_mutability(type_checker, &index.base),
        ExprKind::Postfix(Postfix::Deref(pointer)) => match infer_expr(type_checker, pointer) {
            Some(ty) => matches!(normalize(type_checker, &ty), Type::Pointer { mutable: true, .. }),
            None => false,
        },
        ExprKind::Prefix(prefix) => lvalue_mutability(type_checker, &prefix.operand),
        _ => false,
    }
}

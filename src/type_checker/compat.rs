use crate::ast::{
    ast::{Expr, ExprKind},
    expressions::{Postfix, PrefixOp},
    types::{PrimitiveType, StructType, Type},
};

use super::{
    builtins::FLOAT_WIDTHS,
    resolve::{normalize, resolve_member_type},
    type_checker::TypeChecker,
};

/// Type identity after normalization. Comptime integers are one type
/// whatever their value; array mutability is not part of the identity.
pub fn same_type(left: &Type, right: &Type) -> bool {
    match (left.unparen(), right.unparen()) {
        (
            Type::Primitive(PrimitiveType::ComptimeInt(_)),
            Type::Primitive(PrimitiveType::ComptimeInt(_)),
        ) => true,
        (Type::Primitive(left), Type::Primitive(right)) => left == right,
        (Type::Ident(left), Type::Ident(right)) => left == right,
        (
            Type::Pointer {
                target: left,
                mutable: left_mutable,
            },
            Type::Pointer {
                target: right,
                mutable: right_mutable,
            },
        ) => left_mutable == right_mutable && same_type(left, right),
        (Type::Optional(left), Type::Optional(right)) => same_type(left, right),
        (
            Type::Array {
                target: left,
                size: left_size,
                ..
            },
            Type::Array {
                target: right,
                size: right_size,
                ..
            },
        ) => left_size == right_size && same_type(left, right),
        (Type::Tuple(left), Type::Tuple(right)) | (Type::Union(left), Type::Union(right)) => {
            same_types(left, right)
        }
        (Type::Struct(left), Type::Struct(right)) => same_struct(left, right),
        (Type::Enum(left), Type::Enum(right)) => match (left.scope, right.scope) {
            (Some(left), Some(right)) => left == right,
            _ => left.name == right.name,
        },
        (Type::ErrSet(left), Type::ErrSet(right)) => {
            left.len() == right.len() && left.iter().all(|member| right.contains(member))
        }
        (Type::Function(left), Type::Function(right)) => {
            same_types(&left.params, &right.params)
                && same_type(&left.return_type, &right.return_type)
                && match (&left.error_type, &right.error_type) {
                    (Some(left), Some(right)) => same_type(left, right),
                    (None, None) => true,
                    _ => false,
                }
        }
        _ => false,
    }
}

fn same_types(left: &[Type], right: &[Type]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(l, r)| same_type(l, r))
}

fn same_struct(left: &StructType, right: &StructType) -> bool {
    if let (Some(left), Some(right)) = (left.scope, right.scope) {
        return left == right;
    }
    if !left.is_anonymous() && !right.is_anonymous() {
        return left.name == right.name;
    }
    left.members.len() == right.members.len()
        && left
            .members
            .iter()
            .zip(&right.members)
            .all(|(l, r)| l.name == r.name && same_type(&l.ty, &r.ty))
}

/// Whether `value` is representable in an integer of the given shape.
pub fn fits_int(value: i128, signed: bool, bits: u16) -> bool {
    if signed {
        if bits >= 128 {
            return true;
        }
        let half = 1i128 << (bits - 1);
        (-half..half).contains(&value)
    } else if bits >= 127 {
        value >= 0
    } else {
        (0..(1i128 << bits)).contains(&value)
    }
}

/// Whether a value of type `source` may flow where `target` is expected.
///
/// `source_expr` is the expression producing the value, when there is one;
/// a value read through a dereference must match exactly.
pub fn is_compatible(
    type_checker: &mut TypeChecker,
    target: &Type,
    source: &Type,
    source_expr: Option<&Expr>,
) -> bool {
    if source_expr.is_some_and(Expr::is_deref) {
        let target = normalize(type_checker, target);
        let source = normalize(type_checker, source);
        return matches!(target.as_primitive(), Some(PrimitiveType::Any)) || same_type(&target, &source);
    }

    let target = normalize(type_checker, target);
    let source = normalize(type_checker, source);
    compatible(type_checker, &target, &source)
}

fn compatible(type_checker: &mut TypeChecker, target: &Type, source: &Type) -> bool {
    if same_type(target, source) {
        return true;
    }
    match source.as_primitive() {
        Some(PrimitiveType::NoReturn | PrimitiveType::Undefined) => return true,
        _ => {}
    }

    match (target, source) {
        (Type::Primitive(PrimitiveType::Any), _) => true,

        (Type::Primitive(PrimitiveType::Err), Type::ErrSet(_) | Type::Primitive(PrimitiveType::Err)) => true,
        (Type::ErrSet(members), Type::ErrSet(thrown)) => {
            thrown.iter().all(|member| members.contains(member))
        }

        (Type::Primitive(target), Type::Primitive(source)) => numeric_compatible(target, source),

        (Type::Union(targets), Type::Union(sources)) => sources.iter().all(|source| {
            targets
                .iter()
                .any(|target| compatible(type_checker, target, source))
        }),
        (Type::Union(targets), Type::Optional(inner)) => {
            targets.iter().any(Type::is_null)
                && targets
                    .iter()
                    .any(|target| compatible(type_checker, target, inner))
        }
        (Type::Union(targets), _) => targets
            .iter()
            .any(|target| compatible(type_checker, target, source)),
        (_, Type::Union(sources)) => sources
            .iter()
            .all(|source| compatible(type_checker, target, source)),

        (Type::Optional(_), Type::Primitive(PrimitiveType::Null)) => true,
        (Type::Optional(_), Type::Optional(_)) => false,
        (Type::Optional(inner), _) => compatible(type_checker, inner, source),

        (
            Type::Array {
                target: target_element,
                ..
            },
            Type::Array {
                target: source_element,
                ..
            },
        ) => {
            if matches!(source_element.as_primitive(), Some(PrimitiveType::Any)) {
                return true;
            }
            let sizes_agree = match (target.array_len(), source.array_len()) {
                (Some(expected), Some(received)) => expected == received,
                _ => true,
            };
            sizes_agree && compatible(type_checker, target_element, source_element)
        }

        (Type::Pointer { .. }, Type::Primitive(PrimitiveType::Null)) => true,
        (
            Type::Pointer {
                target: target_pointee,
                mutable: target_mutable,
            },
            Type::Pointer {
                target: source_pointee,
                mutable: source_mutable,
            },
        ) => {
            if *target_mutable && !*source_mutable {
                return false;
            }
            let target_pointee = normalize(type_checker, target_pointee);
            let source_pointee = normalize(type_checker, source_pointee);
            same_type(&target_pointee, &source_pointee)
                || matches!(&target_pointee, Type::Optional(inner) if same_type(inner, &source_pointee))
        }

        (Type::Tuple(targets), Type::Tuple(sources)) => {
            targets.len() == sources.len()
                && targets
                    .iter()
                    .zip(sources)
                    .all(|(target, source)| compatible(type_checker, target, source))
        }

        (Type::Struct(target_struct), Type::Struct(source_struct)) => {
            struct_compatible(type_checker, target_struct, source_struct)
        }

        (Type::Enum(_), _) => false,

        (Type::Primitive(PrimitiveType::Type), _) => true,

        _ => false,
    }
}

fn numeric_compatible(target: &PrimitiveType, source: &PrimitiveType) -> bool {
    match (target, source) {
        (PrimitiveType::Bool, _) | (_, PrimitiveType::Bool) => false,

        (PrimitiveType::Int { signed: false, bits }, PrimitiveType::ComptimeInt(value)) => {
            value.map_or(true, |value| fits_int(value, false, *bits))
        }
        (
            PrimitiveType::Int { .. } | PrimitiveType::Float { .. },
            PrimitiveType::ComptimeInt(_) | PrimitiveType::ComptimeFloat,
        ) => true,
        (PrimitiveType::ComptimeInt(_) | PrimitiveType::ComptimeFloat, source) => is_number(source),

        (PrimitiveType::Int { bits: target_bits, .. }, PrimitiveType::Int { bits: source_bits, .. })
        | (PrimitiveType::Float { bits: target_bits }, PrimitiveType::Int { bits: source_bits, .. })
        | (PrimitiveType::Float { bits: target_bits }, PrimitiveType::Float { bits: source_bits }) => {
            source_bits <= target_bits
        }

        (PrimitiveType::Type, _) => true,
        _ => false,
    }
}

fn is_number(primitive: &PrimitiveType) -> bool {
    matches!(
        primitive,
        PrimitiveType::Int { .. }
            | PrimitiveType::Float { .. }
            | PrimitiveType::ComptimeInt(_)
            | PrimitiveType::ComptimeFloat
    )
}

fn struct_compatible(type_checker: &mut TypeChecker, target: &StructType, source: &StructType) -> bool {
    if target.scope.is_some() && target.scope == source.scope {
        return true;
    }
    if !target.is_anonymous() && !source.is_anonymous() {
        return target.name == source.name;
    }
    if target.members.len() != source.members.len() {
        return false;
    }

    for member in &target.members {
        let Some(provided) = source.member(&member.name) else {
            return false;
        };
        let (Some(expected), Some(received)) = (
            resolve_member_type(type_checker, target, member),
            resolve_member_type(type_checker, source, provided),
        ) else {
            return false;
        };
        if !compatible(type_checker, &expected, &received) {
            return false;
        }
    }
    true
}

/// Result type of an arithmetic operation on two numeric operands.
///
/// Mixed integer and float operands give the narrowest float at least as
/// wide as both.
pub fn promote(left: &Type, right: &Type) -> Type {
    match (left.is_comptime(), right.is_comptime()) {
        (true, true) => {
            if left.is_float() || right.is_float() {
                Type::comptime_float()
            } else {
                Type::comptime_int(None)
            }
        }
        (true, false) => right.unparen().clone(),
        (false, true) => left.unparen().clone(),
        (false, false) => {
            if left.is_float() || right.is_float() {
                let bits = left.bits().max(right.bits()).unwrap_or(32);
                let bits = FLOAT_WIDTHS.iter().copied().find(|width| *width >= bits).unwrap_or(128);
                Type::float(bits)
            } else {
                let bits = left.bits().max(right.bits()).unwrap_or(32);
                Type::int(left.is_signed() || right.is_signed(), bits)
            }
        }
    }
}

/// The looser conversion matrix of `as`.
pub fn can_cast(type_checker: &mut TypeChecker, target: &Type, source: &Type) -> bool {
    if is_compatible(type_checker, target, source, None) {
        return true;
    }

    let target = normalize(type_checker, target);
    let source = normalize(type_checker, source);
    let is_any = |ty: &Type| matches!(ty.as_primitive(), Some(PrimitiveType::Any));

    if is_any(&target) || is_any(&source) {
        return true;
    }
    if source.is_bool() {
        return target.is_integer();
    }
    if target.is_numeric() && source.is_numeric() {
        return true;
    }

    match (&target, &source) {
        (Type::Enum(_), _) => source.is_integer(),
        (_, Type::Enum(_)) => target.is_integer(),
        (Type::Pointer { .. }, Type::Pointer { .. }) => true,
        (Type::Pointer { .. }, _) => source.is_integer(),
        (_, Type::Pointer { .. }) => target.is_integer(),
        (Type::Optional(inner), _) => can_cast(type_checker, inner, &source),
        _ => false,
    }
}

/// Whether `expr` denotes a storage location.
pub fn is_lvalue(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Ident(_) => true,
        ExprKind::Paren(inner) => is_lvalue(inner),
        ExprKind::Postfix(Postfix::Deref(_) | Postfix::Index(_) | Postfix::Member(_)) => true,
        ExprKind::Prefix(prefix) => match prefix.op {
            PrefixOp::Increment | PrefixOp::Decrement | PrefixOp::Reference => is_lvalue(&prefix.operand),
            _ => false,
        },
        _ => false,
    }
}

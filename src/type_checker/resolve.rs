use tracing::trace;

use crate::{
    ast::{
        ast::{Expr, ExprKind},
        types::{ArraySize, FunctionType, PrimitiveType, StructMember, StructType, Type},
    },
    errors::errors::ErrorImpl,
    scope::scope::{SymbolId, SymbolKind},
    Span, REPORT,
};

use super::{builtins::lookup_builtin_type, infer::infer_expr, type_checker::TypeChecker};

/// Resolves a written type into the checker's view of it: parentheses are
/// dropped, builtin names and aliases replaced by what they stand for and
/// array sizes folded. Unknown names are reported.
pub fn resolve_type(type_checker: &mut TypeChecker, ty: &Type, span: &Span) -> Option<Type> {
    resolve_with(type_checker, ty, span, true)
}

/// Silent resolution for comparisons; falls back to the type with its
/// parentheses removed.
pub fn normalize(type_checker: &mut TypeChecker, ty: &Type) -> Type {
    resolve_with(type_checker, ty, &Span::null(), false).unwrap_or_else(|| strip_parens(ty))
}

/// The type an expression names, when it is a type expression or the name
/// of a type. Values yield `None`.
pub fn expr_as_type(type_checker: &mut TypeChecker, expr: &Expr) -> Option<Type> {
    let expr = expr.unparen();
    if let ExprKind::Type(ty) = &expr.kind {
        return resolve_type(type_checker, ty, &expr.span);
    }

    let name = expr.ident_name()?;
    let denotes_type = match type_checker.scopes.lookup_symbol(name) {
        Some(id) => type_checker.scopes.get_symbol(id).metadata.denotes_type,
        None => !matches!(lookup_builtin_type(name), Ok(None)),
    };
    if denotes_type {
        resolve_type(type_checker, &Type::ident(name), &expr.span)
    } else {
        None
    }
}

/// Silent resolution; `None` when something in `ty` does not resolve.
pub fn try_resolve(type_checker: &mut TypeChecker, ty: &Type) -> Option<Type> {
    resolve_with(type_checker, ty, &Span::null(), false)
}

/// Resolves `ty` together with the member types of the structs and enums
/// it contains by value, as needed to lay it out in memory.
pub fn resolve_layout(type_checker: &mut TypeChecker, ty: &Type) -> Option<Type> {
    layout_with_depth(type_checker, ty, 0)
}

const MAX_LAYOUT_DEPTH: usize = 32;

fn layout_with_depth(type_checker: &mut TypeChecker, ty: &Type, depth: usize) -> Option<Type> {
    if depth > MAX_LAYOUT_DEPTH {
        return None;
    }
    let resolved = try_resolve(type_checker, ty)?;
    match resolved {
        Type::Struct(structure) => {
            let mut members = Vec::with_capacity(structure.members.len());
            for member in &structure.members {
                let ty = resolve_member_type(type_checker, &structure, member)?;
                members.push(StructMember {
                    name: member.name.clone(),
                    ty: layout_with_depth(type_checker, &ty, depth + 1)?,
                });
            }
            Some(Type::Struct(StructType { members, ..structure }))
        }
        Type::Enum(mut enumeration) => {
            let scope = enumeration.scope;
            for variant in &mut enumeration.variants {
                if let Some(payload) = &variant.payload {
                    let payload = match scope {
                        Some(scope) => type_checker.with_scope(scope, |type_checker| try_resolve(type_checker, payload)),
                        None => try_resolve(type_checker, payload),
                    }?;
                    variant.payload = Some(layout_with_depth(type_checker, &payload, depth + 1)?);
                }
            }
            Some(Type::Enum(enumeration))
        }
        Type::Array {
            target,
            size: Some(size),
            mutable,
        } => Some(Type::Array {
            target: Box::new(layout_with_depth(type_checker, &target, depth + 1)?),
            size: Some(size),
            mutable,
        }),
        Type::Tuple(fields) => {
            let mut laid_out = Vec::with_capacity(fields.len());
            for field in &fields {
                laid_out.push(layout_with_depth(type_checker, field, depth + 1)?);
            }
            Some(Type::Tuple(laid_out))
        }
        Type::Optional(inner) => Some(Type::Optional(Box::new(layout_with_depth(
            type_checker,
            &inner,
            depth + 1,
        )?))),
        Type::Union(types) => {
            let mut laid_out = Vec::with_capacity(types.len());
            for member in &types {
                laid_out.push(layout_with_depth(type_checker, member, depth + 1)?);
            }
            Some(Type::Union(laid_out))
        }
        other => Some(other),
    }
}

pub fn strip_parens(ty: &Type) -> Type {
    match ty {
        Type::Paren(inner) => strip_parens(inner),
        Type::Pointer { target, mutable } => Type::Pointer {
            target: Box::new(strip_parens(target)),
            mutable: *mutable,
        },
        Type::Optional(inner) => Type::Optional(Box::new(strip_parens(inner))),
        Type::Array { target, size, mutable } => Type::Array {
            target: Box::new(strip_parens(target)),
            size: size.clone(),
            mutable: *mutable,
        },
        Type::Tuple(fields) => Type::Tuple(fields.iter().map(strip_parens).collect()),
        Type::Union(types) => Type::Union(types.iter().map(strip_parens).collect()),
        other => other.clone(),
    }
}

fn resolve_all(type_checker: &mut TypeChecker, types: &[Type], span: &Span, report: bool) -> Option<Vec<Type>> {
    let mut resolved = Vec::with_capacity(types.len());
    for ty in types {
        resolved.push(resolve_with(type_checker, ty, span, report)?);
    }
    Some(resolved)
}

fn resolve_with(type_checker: &mut TypeChecker, ty: &Type, span: &Span, report: bool) -> Option<Type> {
    match ty {
        Type::Primitive(_) | Type::ErrSet(_) | Type::Enum(_) => Some(ty.clone()),
        Type::Struct(structure) if structure.scope.is_some() => Some(ty.clone()),
        Type::Struct(structure) => {
            let mut members = Vec::with_capacity(structure.members.len());
            for member in &structure.members {
                members.push(StructMember {
                    name: member.name.clone(),
                    ty: resolve_with(type_checker, &member.ty, span, report)?,
                });
            }
            Some(Type::Struct(StructType {
                name: structure.name.clone(),
                members,
                scope: None,
            }))
        }
        Type::Paren(inner) => resolve_with(type_checker, inner, span, report),
        Type::Pointer { target, mutable } => Some(Type::Pointer {
            target: Box::new(resolve_with(type_checker, target, span, report)?),
            mutable: *mutable,
        }),
        Type::Optional(inner) => Some(Type::Optional(Box::new(resolve_with(
            type_checker,
            inner,
            span,
            report,
        )?))),
        Type::Array { target, size, mutable } => {
            let target = resolve_with(type_checker, target, span, report)?;
            let size = match size {
                Some(ArraySize::Expr(expr)) => match const_int(type_checker, expr) {
                    Some(len) if len >= 0 => Some(ArraySize::Fixed(len as u64)),
                    _ => Some(ArraySize::Expr(expr.clone())),
                },
                other => other.clone(),
            };
            Some(Type::Array {
                target: Box::new(target),
                size,
                mutable: *mutable,
            })
        }
        Type::Tuple(fields) => Some(Type::Tuple(resolve_all(type_checker, fields, span, report)?)),
        Type::Union(types) => Some(Type::Union(resolve_all(type_checker, types, span, report)?)),
        Type::Function(function) => {
            let params = resolve_all(type_checker, &function.params, span, report)?;
            let return_type = resolve_with(type_checker, &function.return_type, span, report)?;
            let error_type = match &function.error_type {
                Some(error) => Some(Box::new(resolve_with(type_checker, error, span, report)?)),
                None => None,
            };
            Some(Type::Function(FunctionType {
                params,
                return_type: Box::new(return_type),
                error_type,
            }))
        }
        Type::Ident(name) => resolve_named(type_checker, name, span, report),
    }
}

fn resolve_named(type_checker: &mut TypeChecker, name: &str, span: &Span, report: bool) -> Option<Type> {
    match lookup_builtin_type(name) {
        Ok(Some(ty)) => return Some(ty),
        Ok(None) => {}
        Err(error) => {
            if report {
                REPORT!(type_checker, error, span);
            }
            return None;
        }
    }

    let unknown = || ErrorImpl::UnknownType {
        type_: name.to_string(),
    };
    let Some(id) = type_checker.scopes.lookup_symbol(name) else {
        if report {
            REPORT!(type_checker, unknown(), span);
        }
        return None;
    };

    let symbol = type_checker.scopes.get_symbol(id);
    match symbol.kind {
        SymbolKind::Definition if symbol.metadata.denotes_type => {
            if let Some(ty) = &symbol.ty {
                return Some(ty.clone());
            }
            let value = symbol.metadata.type_value.clone()?;
            let scope = symbol.scope;

            if type_checker.circular_stack.contains(&id) {
                trace!(name, "alias resolution re-entered");
                if report {
                    REPORT!(
                        type_checker,
                        ErrorImpl::CircularTypeDependency {
                            name: name.to_string()
                        },
                        span
                    );
                }
                return None;
            }

            let resolved = type_checker.with_circular_guard(id, |type_checker| {
                type_checker.with_scope(scope, |type_checker| resolve_with(type_checker, &value, span, report))
            });
            if let Some(resolved) = &resolved {
                type_checker.scopes.get_symbol_mut(id).ty = Some(resolved.clone());
            }
            resolved
        }
        SymbolKind::Error => symbol.ty.clone(),
        _ => {
            if report {
                REPORT!(type_checker, unknown(), span);
            }
            None
        }
    }
}

/// Type of a struct member, resolved where the struct was declared.
pub fn resolve_member_type(type_checker: &mut TypeChecker, structure: &StructType, member: &StructMember) -> Option<Type> {
    match structure.scope {
        Some(scope) => type_checker.with_scope(scope, |type_checker| {
            resolve_with(type_checker, &member.ty, &Span::null(), false)
        }),
        None => resolve_with(type_checker, &member.ty, &Span::null(), false),
    }
}

/// Whether `ty` contains the type defined by `root` by value.
///
/// Pointers, optionals, slices and functions break the containment. Named
/// types reached along the way are expanded once each.
pub fn contains_type(type_checker: &mut TypeChecker, root: SymbolId, ty: &Type) -> bool {
    match ty {
        Type::Primitive(_) | Type::ErrSet(_) => false,
        Type::Pointer { .. } | Type::Optional(_) | Type::Function(_) => false,
        Type::Paren(inner) => contains_type(type_checker, root, inner),
        Type::Array { target, size, .. } => size.is_some() && contains_type(type_checker, root, target),
        Type::Tuple(types) | Type::Union(types) => types
            .iter()
            .any(|member| contains_type(type_checker, root, member)),
        Type::Struct(structure) => {
            let root_scope = type_checker.scopes.get_symbol(root).metadata.scope;
            if structure.scope.is_some() && structure.scope == root_scope {
                return true;
            }
            structure.scope.is_none()
                && structure
                    .members
                    .iter()
                    .any(|member| contains_type(type_checker, root, &member.ty))
        }
        Type::Enum(enumeration) => {
            let root_scope = type_checker.scopes.get_symbol(root).metadata.scope;
            enumeration.scope.is_some() && enumeration.scope == root_scope
        }
        Type::Ident(name) => {
            let Some(id) = type_checker.scopes.lookup_symbol(name) else {
                return false;
            };
            if id == root {
                return true;
            }
            if type_checker.circular_stack.contains(&id) {
                return false;
            }

            let symbol = type_checker.scopes.get_symbol(id);
            if symbol.kind != SymbolKind::Definition || !symbol.metadata.denotes_type {
                return false;
            }
            let inner: Vec<Type> = match (&symbol.ty, &symbol.metadata.type_value) {
                (Some(Type::Struct(structure)), _) => structure.members.iter().map(|m| m.ty.clone()).collect(),
                (Some(Type::Enum(enumeration)), _) => enumeration
                    .variants
                    .iter()
                    .filter_map(|variant| variant.payload.clone())
                    .collect(),
                (_, Some(value)) => vec![value.clone()],
                _ => vec![],
            };
            let scope = symbol.metadata.scope.unwrap_or(symbol.scope);

            type_checker.with_circular_guard(id, |type_checker| {
                type_checker.with_scope(scope, |type_checker| {
                    inner.iter().any(|member| contains_type(type_checker, root, member))
                })
            })
        }
    }
}

/// Fixes comptime numbers to the default runtime types.
pub fn concretize(ty: &Type) -> Type {
    match ty {
        Type::Primitive(PrimitiveType::ComptimeInt(_)) => Type::i32(),
        Type::Primitive(PrimitiveType::ComptimeFloat) => Type::float(64),
        Type::Array { target, size, mutable } => Type::Array {
            target: Box::new(concretize(target)),
            size: size.clone(),
            mutable: *mutable,
        },
        Type::Tuple(fields) => Type::Tuple(fields.iter().map(concretize).collect()),
        other => other.clone(),
    }
}

/// Integer value of a constant expression: literal arithmetic, or anything
/// whose inferred type carries a known comptime value.
pub fn const_int(type_checker: &mut TypeChecker, expr: &Expr) -> Option<i128> {
    if let Some(value) = type_checker.evaluator.extract_integer_value(expr) {
        return Some(value);
    }
    match infer_expr(type_checker, expr)? {
        Type::Primitive(PrimitiveType::ComptimeInt(value)) => value,
        _ => None,
    }
}

use rustc_hash::FxHashSet;

use crate::{
    ast::{
        ast::Expr,
        expressions::ObjectExpr,
        types::{StructMember, StructType, Type, ANONYMOUS},
    },
    errors::errors::ErrorImpl,
    scope::scope::SymbolKind,
    MISMATCH, REPORT,
};

use super::{
    compat::is_compatible,
    infer::{infer_with_expected, symbol_type},
    resolve::{normalize, resolve_member_type, resolve_type},
    structs::validate_struct_construction,
    type_checker::TypeChecker,
};

/// Infers an object literal.
///
/// `Name { ... }` constructs the named struct. An anonymous literal takes
/// the struct the surrounding code expects, or the struct member of an
/// expected union its shape fits; otherwise it gets an anonymous struct
/// type of its own.
pub fn infer_object(type_checker: &mut TypeChecker, object: &ObjectExpr, expr: &Expr) -> Option<Type> {
    if !unique_fields(type_checker, object) {
        return None;
    }
    if let Some(name) = &object.name {
        return construct_named(type_checker, name, object, expr);
    }

    if let Some(expected) = type_checker.context.current_expected().cloned() {
        match normalize(type_checker, &expected) {
            Type::Struct(structure) if structure.scope.is_some() => {
                validate_struct_construction(type_checker, &structure, object, &expr.span);
                return Some(Type::Struct(structure));
            }
            Type::Union(members) => {
                if let Some(matched) = match_member(type_checker, &members, object, expr) {
                    return Some(matched);
                }
            }
            Type::Optional(inner) => {
                if let Some(matched) = match_member(type_checker, &[*inner], object, expr) {
                    return Some(matched);
                }
            }
            _ => {}
        }
    }

    synthesize(type_checker, object)
}

fn unique_fields(type_checker: &mut TypeChecker, object: &ObjectExpr) -> bool {
    let mut seen = FxHashSet::default();
    let mut unique = true;
    for field in &object.fields {
        if !seen.insert(field.name.as_str()) {
            REPORT!(
                type_checker,
                ErrorImpl::DuplicateSymbol {
                    name: field.name.clone()
                },
                field.span
            );
            unique = false;
        }
    }
    unique
}

fn construct_named(type_checker: &mut TypeChecker, name: &str, object: &ObjectExpr, expr: &Expr) -> Option<Type> {
    let structure = match resolve_type(type_checker, &Type::ident(name), &expr.span)? {
        Type::Struct(structure) => structure,
        other => {
            REPORT!(type_checker, MISMATCH!("struct", other), expr.span);
            return None;
        }
    };

    if let Some(expected) = type_checker.context.current_expected().cloned() {
        if let Type::Struct(expected) = normalize(type_checker, &expected) {
            if expected.scope.is_some() && expected.scope != structure.scope {
                REPORT!(type_checker, MISMATCH!(expected.name, name), expr.span);
                return None;
            }
        }
    }

    validate_struct_construction(type_checker, &structure, object, &expr.span);
    Some(Type::Struct(structure))
}

/// First struct among `candidates` the literal's shape fits. Candidates are
/// tried silently; only the chosen one is validated for real.
fn match_member(
    type_checker: &mut TypeChecker,
    candidates: &[Type],
    object: &ObjectExpr,
    expr: &Expr,
) -> Option<Type> {
    for candidate in candidates {
        let candidate = normalize(type_checker, candidate);
        let Type::Struct(structure) = &candidate else {
            continue;
        };
        let (fits, failed) = type_checker.speculate(|type_checker| fits_shape(type_checker, structure, object));
        if fits && !failed {
            validate_struct_construction(type_checker, structure, object, &expr.span);
            return Some(candidate);
        }
    }
    None
}

/// Every provided field exists with a compatible value, and every field
/// left out is static or has a default.
fn fits_shape(type_checker: &mut TypeChecker, structure: &StructType, object: &ObjectExpr) -> bool {
    let mut fields: Vec<(String, Option<Type>, bool)> = vec![];
    match structure.scope {
        Some(scope) => {
            let ids = type_checker.scopes.get_scope(scope).symbols().to_vec();
            for id in ids {
                let symbol = type_checker.scopes.get_symbol(id);
                if symbol.kind != SymbolKind::StructField || symbol.is_static() {
                    continue;
                }
                let name = symbol.name.clone();
                let optional = symbol.metadata.initializer.is_some();
                fields.push((name, symbol_type(type_checker, id), optional));
            }
        }
        None => {
            for member in &structure.members {
                let ty = resolve_member_type(type_checker, structure, member);
                fields.push((member.name.clone(), ty, false));
            }
        }
    }

    if object
        .fields
        .iter()
        .any(|provided| !fields.iter().any(|(name, _, _)| *name == provided.name))
    {
        return false;
    }

    for (name, ty, optional) in fields {
        let Some(provided) = object.fields.iter().find(|field| field.name == name) else {
            if optional {
                continue;
            }
            return false;
        };
        let Some(expected) = ty else {
            return false;
        };
        let Some(received) = infer_with_expected(type_checker, &provided.value, Some(expected.clone())) else {
            return false;
        };
        if !is_compatible(type_checker, &expected, &received, Some(&provided.value)) {
            return false;
        }
    }
    true
}

fn synthesize(type_checker: &mut TypeChecker, object: &ObjectExpr) -> Option<Type> {
    let mut members = Vec::with_capacity(object.fields.len());
    for field in &object.fields {
        members.push(StructMember {
            name: field.name.clone(),
            ty: infer_with_expected(type_checker, &field.value, None)?,
        });
    }
    Some(Type::Struct(StructType {
        name: ANONYMOUS.to_string(),
        members,
        scope: None,
    }))
}

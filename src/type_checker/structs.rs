use crate::{
    ast::{
        ast::{Mutability, NodeId, Visibility},
        expressions::{ObjectExpr, ObjectField},
        statements::{EnumDef, FuncDef, StructDef},
        types::{StructType, Type},
    },
    errors::errors::{Error, ErrorImpl},
    scope::scope::{ScopeId, SymbolId, SymbolKind},
    Span, MISMATCH, REPORT,
};

use super::{
    compat::is_compatible,
    functions::validate_function,
    infer::{infer_with_expected, symbol_type},
    resolve::{contains_type, resolve_member_type, resolve_type},
    type_checker::TypeChecker,
    validate::{check_initializer, check_literal_overflow},
};

/// Member scope of a declaration and the symbol naming it.
fn declaration(type_checker: &TypeChecker, id: NodeId, name: &str, span: &Span) -> Result<(ScopeId, Option<SymbolId>), Error> {
    let scope = type_checker
        .scopes
        .scope_for_node(id)
        .ok_or_else(|| Error::internal(format!("`{}` has no member scope", name), span.clone()))?;
    let symbol = type_checker
        .scopes
        .scope_parent(scope)
        .and_then(|parent| type_checker.scopes.lookup_local(parent, name))
        .filter(|symbol| type_checker.scopes.get_symbol(*symbol).metadata.scope == Some(scope));
    Ok((scope, symbol))
}

fn report_cycle(type_checker: &mut TypeChecker, symbol: Option<SymbolId>, ty: &Type, name: &str, span: &Span) -> bool {
    let Some(symbol) = symbol else {
        return false;
    };
    if contains_type(type_checker, symbol, ty) {
        REPORT!(
            type_checker,
            ErrorImpl::CircularTypeDependency {
                name: name.to_string()
            },
            span
        );
        return true;
    }
    false
}

pub fn validate_struct(type_checker: &mut TypeChecker, def: &StructDef) -> Result<(), Error> {
    let (scope, symbol) = declaration(type_checker, def.id, &def.name, &def.span)?;

    type_checker.with_scope(scope, |type_checker| {
        for field in &def.fields {
            if field.visibility == Visibility::Static && field.mutability == Mutability::Mutable {
                REPORT!(
                    type_checker,
                    ErrorImpl::MutabilityMismatch {
                        name: field.name.clone(),
                        detail: String::from("static fields cannot be mutable"),
                    },
                    field.span
                );
            }
            if report_cycle(type_checker, symbol, &field.ty, &def.name, &field.span) {
                continue;
            }

            let Some(ty) = resolve_type(type_checker, &field.ty, &field.span) else {
                continue;
            };
            if let Some(id) = type_checker.scopes.lookup_local(scope, &field.name) {
                let member = type_checker.scopes.get_symbol_mut(id);
                if member.ty.is_none() {
                    member.ty = Some(ty.clone());
                }
                member.is_type_checked = true;
            }
            if let Some(default) = &field.default {
                check_initializer(type_checker, &ty, default);
            }
        }
    });

    validate_methods(type_checker, &def.methods, scope)
}

pub fn validate_enum(type_checker: &mut TypeChecker, def: &EnumDef) -> Result<(), Error> {
    let (scope, symbol) = declaration(type_checker, def.id, &def.name, &def.span)?;

    type_checker.with_scope(scope, |type_checker| {
        for variant in &def.variants {
            let Some(payload) = &variant.payload else {
                continue;
            };
            if !report_cycle(type_checker, symbol, payload, &def.name, &variant.span) {
                resolve_type(type_checker, payload, &variant.span);
            }
        }
    });

    validate_methods(type_checker, &def.methods, scope)
}

fn validate_methods(type_checker: &mut TypeChecker, methods: &[FuncDef], scope: ScopeId) -> Result<(), Error> {
    type_checker.with_scope(scope, |type_checker| {
        for method in methods {
            if let Err(error) = validate_function(type_checker, method, Some(scope)) {
                type_checker.report_internal(error);
            }
        }
    });
    Ok(())
}

/// Checks the fields of a struct literal against `structure`.
///
/// Every provided field must exist, be settable from here and hold a value
/// of its type. Every instance field without a default must be provided.
pub fn validate_struct_construction(
    type_checker: &mut TypeChecker,
    structure: &StructType,
    object: &ObjectExpr,
    span: &Span,
) -> bool {
    let Some(scope) = structure.scope else {
        return construct_anonymous(type_checker, structure, object, span);
    };
    let mut valid = true;

    for field in &object.fields {
        let qualified = format!("{}.{}", structure.name, field.name);
        let found = type_checker
            .scopes
            .lookup_local(scope, &field.name)
            .filter(|id| type_checker.scopes.get_symbol(*id).kind == SymbolKind::StructField);
        let Some(id) = found else {
            REPORT!(type_checker, ErrorImpl::SymbolNotFound { name: qualified }, field.span);
            valid = false;
            continue;
        };

        let visibility = type_checker.scopes.get_symbol(id).visibility;
        if visibility == Visibility::Static {
            REPORT!(
                type_checker,
                ErrorImpl::InvalidStaticAccess {
                    name: qualified,
                    detail: String::from("static fields cannot be set by a constructor"),
                },
                field.span
            );
            valid = false;
            continue;
        }
        if visibility == Visibility::Private && !type_checker.scopes.is_within(type_checker.scopes.current_scope(), scope) {
            REPORT!(type_checker, ErrorImpl::SymbolNotAccessible { name: qualified }, field.span);
            valid = false;
            continue;
        }

        let Some(expected) = symbol_type(type_checker, id) else {
            valid = false;
            continue;
        };
        valid &= check_field_value(type_checker, &expected, field);
    }

    let members = type_checker.scopes.get_scope(scope).symbols().to_vec();
    for id in members {
        let symbol = type_checker.scopes.get_symbol(id);
        let required = symbol.kind == SymbolKind::StructField
            && !symbol.is_static()
            && symbol.metadata.initializer.is_none();
        if required && !object.fields.iter().any(|field| field.name == symbol.name) {
            let field = symbol.name.clone();
            REPORT!(
                type_checker,
                ErrorImpl::MissingStructField {
                    structure: structure.name.clone(),
                    field,
                },
                span
            );
            valid = false;
        }
    }
    valid
}

fn construct_anonymous(type_checker: &mut TypeChecker, structure: &StructType, object: &ObjectExpr, span: &Span) -> bool {
    let mut valid = true;
    for field in &object.fields {
        let Some(member) = structure.member(&field.name) else {
            REPORT!(
                type_checker,
                ErrorImpl::SymbolNotFound {
                    name: field.name.clone()
                },
                field.span
            );
            valid = false;
            continue;
        };
        let Some(expected) = resolve_member_type(type_checker, structure, member) else {
            valid = false;
            continue;
        };
        valid &= check_field_value(type_checker, &expected, field);
    }
    for member in &structure.members {
        if !object.fields.iter().any(|field| field.name == member.name) {
            REPORT!(
                type_checker,
                ErrorImpl::MissingStructField {
                    structure: structure.name.clone(),
                    field: member.name.clone(),
                },
                span
            );
            valid = false;
        }
    }
    valid
}

fn check_field_value(type_checker: &mut TypeChecker, expected: &Type, field: &ObjectField) -> bool {
    let Some(received) = infer_with_expected(type_checker, &field.value, Some(expected.clone())) else {
        return false;
    };
    if !is_compatible(type_checker, expected, &received, Some(&field.value)) {
        REPORT!(type_checker, MISMATCH!(expected, received), field.span);
        return false;
    }
    check_literal_overflow(type_checker, expected, &received, &field.value.span);
    true
}

use tracing::trace;

use crate::{
    ast::{
        ast::Visibility,
        statements::{ErrorDecl, FuncDef},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    scope::{collector::SELF, scope::ScopeId},
    MISMATCH, REPORT,
};

use super::{
    infer::function_type_of,
    resolve::resolve_type,
    type_checker::{FunctionFrame, TypeChecker},
    validate::{check_initializer, validate_statements},
};

/// Validates a function declaration and its body.
///
/// `struct_scope` is the member scope of the struct or enum declaring the
/// function when it is a method.
pub fn validate_function(
    type_checker: &mut TypeChecker,
    func: &FuncDef,
    struct_scope: Option<ScopeId>,
) -> Result<(), Error> {
    let body = type_checker
        .scopes
        .scope_for_node(func.id)
        .ok_or_else(|| Error::internal(format!("function `{}` has no scope", func.name), func.span.clone()))?;
    trace!(function = %func.name, "validating function");

    let outer = type_checker.scopes.current_scope();
    if let Some(id) = type_checker.scopes.lookup_local(outer, &func.name) {
        function_type_of(type_checker, id);
        type_checker.scopes.get_symbol_mut(id).is_type_checked = true;
    }

    let frame = type_checker.with_scope(body, |type_checker| {
        validate_params(type_checker, func, body, struct_scope.is_some());

        let return_type = match &func.return_type {
            Some(ty) => resolve_type(type_checker, ty, &func.span),
            None => Some(Type::void()),
        };
        let error_type = match &func.error {
            Some(error) => resolve_error_type(type_checker, error, func),
            None => None,
        };

        FunctionFrame {
            name: func.name.clone(),
            return_type,
            error_type,
            error_mode: func.error.as_ref().map(ErrorDecl::mode),
            self_group: func.error.as_ref().map(|error| error.self_group().to_vec()).unwrap_or_default(),
            has_return: false,
            has_throw: false,
            is_static: func.is_static(),
            struct_scope,
        }
    });

    let (finished, ()) = type_checker.with_function_frame(frame, |type_checker| {
        type_checker.with_scope(body, |type_checker| validate_statements(type_checker, &func.body.body))
    });
    let Some(finished) = finished else {
        return Err(Error::internal("function frame lost", func.span.clone()));
    };

    let returns_value = finished
        .return_type
        .as_ref()
        .is_some_and(|ty| !ty.is_void() && !ty.is_noreturn());
    let exits = finished.has_return || (finished.error_mode.is_some() && finished.has_throw);
    if returns_value && !exits {
        REPORT!(
            type_checker,
            ErrorImpl::MissingReturnStatement {
                function: func.name.clone()
            },
            func.span
        );
    }
    Ok(())
}

fn validate_params(type_checker: &mut TypeChecker, func: &FuncDef, body: ScopeId, is_method: bool) {
    for param in &func.params {
        if param.visibility != Visibility::Private {
            REPORT!(
                type_checker,
                ErrorImpl::InvalidParameterVisibility {
                    name: param.name.clone()
                },
                param.span
            );
        }
        if is_method && param.name == SELF {
            continue;
        }

        let Some(ty) = resolve_type(type_checker, &param.ty, &param.span) else {
            continue;
        };
        if let Some(id) = type_checker.scopes.lookup_local(body, &param.name) {
            let symbol = type_checker.scopes.get_symbol_mut(id);
            if symbol.ty.is_none() {
                symbol.ty = Some(ty.clone());
            }
        }
        if let Some(default) = &param.default {
            check_initializer(type_checker, &ty, default);
        }
    }
}

/// The error type throws inside the function are checked against.
fn resolve_error_type(type_checker: &mut TypeChecker, error: &ErrorDecl, func: &FuncDef) -> Option<Type> {
    let ty = resolve_type(type_checker, &error.as_type(), &func.span)?;
    match (error, &ty) {
        (ErrorDecl::Ident(_), Type::ErrSet(_)) | (ErrorDecl::Any, _) => Some(ty),
        (ErrorDecl::Ident(_), _) => {
            REPORT!(type_checker, MISMATCH!("error set", ty), func.span);
            None
        }
        _ => Some(ty),
    }
}

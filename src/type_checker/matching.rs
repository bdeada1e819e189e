use rustc_hash::FxHashSet;

use crate::{
    ast::{
        ast::{Expr, ExprKind, Stmt},
        expressions::{Literal, MatchExpr, Postfix},
        types::{EnumType, Type},
    },
    errors::errors::{Error, ErrorImpl},
    Span, MISMATCH, REPORT,
};

use super::{
    compat::is_compatible,
    infer::{infer_expr, infer_with_expected},
    resolve::normalize,
    type_checker::TypeChecker,
    validate::validate_stmt,
};

/// Validates a `match`: its patterns against the subject, every arm, and
/// exhaustiveness over enum and bool subjects when there is no default.
pub fn validate_match(type_checker: &mut TypeChecker, match_expr: &MatchExpr, span: &Span) -> Result<(), Error> {
    let subject = infer_expr(type_checker, &match_expr.subject).map(|ty| normalize(type_checker, &ty));

    for case in &match_expr.cases {
        for pattern in &case.patterns {
            check_pattern(type_checker, subject.as_ref(), pattern);
        }
        validate_arm(type_checker, &case.body);
    }
    if let Some(default) = &match_expr.default {
        validate_arm(type_checker, default);
    }

    if match_expr.default.is_none() {
        if let Some(subject) = &subject {
            let missing = missing_cases(subject, match_expr);
            if !missing.is_empty() {
                REPORT!(type_checker, ErrorImpl::NonExhaustiveMatch { missing }, span);
            }
        }
    }
    Ok(())
}

fn validate_arm(type_checker: &mut TypeChecker, body: &Stmt) {
    let result = type_checker.with_saved_state(|type_checker| validate_stmt(type_checker, body));
    if let Err(error) = result {
        type_checker.report_internal(error);
    }
}

/// Variant a pattern names: `.Red`, `Color.Red`, `Color.Rgb(c)` or `Red`.
fn pattern_variant(pattern: &Expr) -> Option<&str> {
    match &pattern.unparen().kind {
        ExprKind::Ident(name) => Some(name),
        ExprKind::Postfix(Postfix::Member(member)) => Some(&member.member),
        ExprKind::Postfix(Postfix::Call(call)) => pattern_variant(&call.callee),
        _ => None,
    }
}

fn check_pattern(type_checker: &mut TypeChecker, subject: Option<&Type>, pattern: &Expr) {
    match subject {
        Some(Type::Enum(enumeration)) => check_variant_pattern(type_checker, enumeration, pattern),
        _ if matches!(pattern.unparen().kind, ExprKind::Range(_)) => {
            infer_expr(type_checker, pattern);
        }
        Some(subject) => {
            let Some(ty) = infer_with_expected(type_checker, pattern, Some(subject.clone())) else {
                return;
            };
            if !is_compatible(type_checker, subject, &ty, Some(pattern)) {
                REPORT!(type_checker, MISMATCH!(subject, ty), pattern.span);
            }
        }
        None => {}
    }
}

fn check_variant_pattern(type_checker: &mut TypeChecker, enumeration: &EnumType, pattern: &Expr) {
    match pattern_variant(pattern) {
        Some(name) if enumeration.variant(name).is_some() => {}
        Some(name) => REPORT!(
            type_checker,
            ErrorImpl::SymbolNotFound {
                name: format!("{}.{}", enumeration.name, name),
            },
            pattern.span
        ),
        None => REPORT!(type_checker, MISMATCH!(enumeration.name, "pattern"), pattern.span),
    }
}

fn missing_cases(subject: &Type, match_expr: &MatchExpr) -> Vec<String> {
    let patterns = || match_expr.cases.iter().flat_map(|case| case.patterns.iter());

    match subject {
        Type::Enum(enumeration) => {
            let covered: FxHashSet<&str> = patterns().filter_map(pattern_variant).collect();
            enumeration
                .variants
                .iter()
                .filter(|variant| !covered.contains(variant.name.as_str()))
                .map(|variant| variant.name.clone())
                .collect()
        }
        subject if subject.is_bool() => {
            let covered: FxHashSet<bool> = patterns()
                .filter_map(|pattern| match pattern.unparen().kind {
                    ExprKind::Literal(Literal::Bool(value)) => Some(value),
                    _ => None,
                })
                .collect();
            [true, false]
                .into_iter()
                .filter(|value| !covered.contains(value))
                .map(|value| value.to_string())
                .collect()
        }
        _ => vec![],
    }
}

//! Unit tests for error handling.
//!
//! This module contains tests for error types and the diagnostics sink.

use std::rc::Rc;

use crate::errors::diagnostics::{Diagnostics, Severity};
use crate::errors::errors::{Error, ErrorImpl, ErrorTip};
use crate::Span;

fn span_at(start: u32, end: u32) -> Span {
    Span::new(&Rc::new("test.lang".to_string()), start, end)
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UndefinedIdentifier {
            name: "foo".to_string(),
        },
        span_at(10, 13),
    );

    assert_eq!(error.get_error_name(), "UndefinedIdentifier");
}

#[test]
fn test_error_span() {
    let error = Error::new(
        ErrorImpl::SymbolNotFound {
            name: "bar".to_string(),
        },
        span_at(42, 45),
    );

    assert_eq!(error.get_span().start.0, 42);
    assert_eq!(error.get_span().end.0, 45);
    assert_eq!(error.get_span().file(), "test.lang");
}

#[test]
fn test_type_mismatch_error() {
    let error = Error::new(
        ErrorImpl::TypeMismatch {
            expected: "i32".to_string(),
            received: "bool".to_string(),
        },
        Span::null(),
    );

    assert_eq!(error.get_error_name(), "TypeMismatch");
    assert_eq!(
        error.to_string(),
        "types do not match: expected i32, received bool"
    );
}

#[test]
fn test_error_tip_for_array_size() {
    let error = Error::new(
        ErrorImpl::ArraySizeMismatch {
            expected: 3,
            received: 2,
        },
        Span::null(),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert_eq!(tip, "Expected 3 elements, received 2"),
        ErrorTip::None => panic!("Expected a suggestion"),
    }
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(ErrorImpl::UnreachableCode, Span::null());

    assert!(matches!(error.get_tip(), ErrorTip::None));
    assert_eq!(format!("{}", error.get_tip()), "");
}

#[test]
fn test_non_exhaustive_tip_lists_variants() {
    let error = Error::new(
        ErrorImpl::NonExhaustiveMatch {
            missing: vec!["Blue".to_string(), "Green".to_string()],
        },
        Span::null(),
    );

    assert_eq!(
        error.get_tip().to_string(),
        "Add cases for Blue, Green or a default case"
    );
}

#[test]
fn test_internal_error_helper() {
    let error = Error::internal("scope missing", Span::null());

    assert_eq!(error.get_error_name(), "InternalError");
    assert_eq!(error.to_string(), "internal error: scope missing");
}

#[test]
fn test_diagnostics_warnings_do_not_count_as_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report_warning(
        ErrorImpl::InvalidCast {
            from: "bool".to_string(),
            to: "f32".to_string(),
        },
        Span::null(),
    );

    assert_eq!(diagnostics.len(), 1);
    assert!(!diagnostics.has_errors());

    diagnostics.report_error(ErrorImpl::UnreachableCode, Span::null());
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.errors_since(1), 1);
    assert_eq!(diagnostics.names(), vec!["InvalidCast", "UnreachableCode"]);
}

#[test]
fn test_diagnostics_severity_and_clear() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report_error(ErrorImpl::ReturnOutsideFunction, Span::null());

    let first = diagnostics.iter().next().map(|d| d.severity);
    assert_eq!(first, Some(Severity::Error));

    diagnostics.clear();
    assert!(diagnostics.is_empty());
}

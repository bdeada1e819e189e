//! Utility macros for the checker.
//!
//! This module defines helper macros used throughout the type checker:
//!
//! - `MK_ERROR!` - Creates an Error instance from a variant and a span
//! - `MISMATCH!` - Creates a type mismatch error payload
//! - `REPORT!` - Records an error-severity diagnostic on the checker
//!
//! These macros reduce boilerplate in the inference and validation code.

/// Creates an Error instance.
///
/// # Arguments
///
/// * `$impl` - The ErrorImpl variant
/// * `$span` - The source span (cloned)
///
/// # Example
///
/// ```ignore
/// return Err(MK_ERROR!(ErrorImpl::InternalError { message }, stmt.span));
/// ```
#[macro_export]
macro_rules! MK_ERROR {
    ($impl:expr, $span:expr) => {
        $crate::errors::errors::Error::new($impl, $span.clone())
    };
}

/// Creates a `TypeMismatch` payload from anything displayable.
///
/// # Example
///
/// ```ignore
/// REPORT!(type_checker, MISMATCH!("bool", condition_type), expr.span);
/// ```
#[macro_export]
macro_rules! MISMATCH {
    ($expected:expr, $received:expr) => {
        $crate::errors::errors::ErrorImpl::TypeMismatch {
            expected: $expected.to_string(),
            received: $received.to_string(),
        }
    };
}

/// Reports an error on the checker's diagnostics sink.
///
/// # Arguments
///
/// * `$checker` - The TypeChecker
/// * `$impl` - The ErrorImpl variant
/// * `$span` - The source span (cloned)
#[macro_export]
macro_rules! REPORT {
    ($checker:expr, $impl:expr, $span:expr) => {
        $checker.diagnostics.report_error($impl, $span.clone())
    };
}

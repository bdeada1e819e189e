//! Error types and diagnostics for semantic analysis.
//!
//! This module defines the errors the checker reports and the sink that
//! collects them. It includes:
//!
//! - Error structures with source span information
//! - One error variant per diagnostic code
//! - Helpful suggestions attached to the common errors
//! - A diagnostics sink that separates errors from warnings

pub mod diagnostics;
pub mod errors;

#[cfg(test)]
mod tests;
